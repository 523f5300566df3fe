//! Rent schedule definitions.

use common::{Date, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, Context};

/// A single installment of a `Lease` rent schedule.
#[derive(Clone, Debug, From, Into)]
pub struct Entry(domain::schedule::Entry);

/// A single installment of a `Lease` rent schedule.
#[graphql_object(name = "ScheduleEntry", context = Context)]
impl Entry {
    /// Unique identifier of this `ScheduleEntry`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the `Lease` this `ScheduleEntry` belongs to.
    #[must_use]
    pub fn lease_id(&self) -> api::lease::Id {
        self.0.lease_id.into()
    }

    /// Date the rent is due on.
    #[must_use]
    pub fn due_date(&self) -> Date {
        self.0.due_date
    }

    /// Amount expected to be paid.
    #[must_use]
    pub fn expected(&self) -> Money {
        self.0.expected
    }

    /// Amount matched from payments, unless nothing is.
    #[must_use]
    pub fn paid(&self) -> Option<Money> {
        self.0.paid.map(|amount| Money {
            amount,
            currency: self.0.expected.currency,
        })
    }

    /// Status of this `ScheduleEntry`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }
}

/// Unique identifier of a `ScheduleEntry`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::schedule::Id)]
#[into(domain::schedule::Id)]
#[graphql(name = "ScheduleEntryId", transparent)]
pub struct Id(Uuid);

/// Status of a `ScheduleEntry`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ScheduleStatus")]
pub enum Status {
    /// Not paid, due date hasn't passed yet.
    Due,

    /// Paid in part.
    Partial,

    /// Paid in full.
    Paid,

    /// Not paid, due date has passed.
    Overdue,
}

impl From<domain::schedule::Status> for Status {
    fn from(status: domain::schedule::Status) -> Self {
        use domain::schedule::Status as S;
        match status {
            S::Due => Self::Due,
            S::Partial => Self::Partial,
            S::Paid => Self::Paid,
            S::Overdue => Self::Overdue,
        }
    }
}
