//! [`Lease`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, read, Query as _};
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

/// A lease of a `Property` to a `Tenant`.
#[derive(Clone, Debug, From, Into)]
pub struct Lease(domain::Lease);

/// A lease of a `Property` to a `Tenant`.
#[graphql_object(context = Context)]
impl Lease {
    /// Unique identifier of this `Lease`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the leased `Property`.
    #[must_use]
    pub fn property_id(&self) -> api::property::Id {
        self.0.property_id.into()
    }

    /// ID of the `Tenant` renting the `Property`.
    #[must_use]
    pub fn tenant_id(&self) -> api::tenant::Id {
        self.0.tenant_id.into()
    }

    /// First day of this `Lease`.
    #[must_use]
    pub fn start_date(&self) -> Date {
        self.0.period.start()
    }

    /// Last day of this `Lease`.
    #[must_use]
    pub fn end_date(&self) -> Date {
        self.0.period.end()
    }

    /// Frequency the rent of this `Lease` is due with.
    #[must_use]
    pub fn frequency(&self) -> Frequency {
        self.0.frequency.into()
    }

    /// Rent due for every installment of this `Lease`.
    #[must_use]
    pub fn rent(&self) -> Money {
        self.0.rent
    }

    /// Day of month the rent of this `Lease` is due on.
    #[must_use]
    pub fn due_day(&self) -> i32 {
        self.0.due_day.get().into()
    }

    /// Security deposit of this `Lease`, if any.
    #[must_use]
    pub fn security_deposit(&self) -> Option<Money> {
        self.0.security_deposit
    }

    /// Date this `Lease` was terminated early on, if any.
    #[must_use]
    pub fn termination_date(&self) -> Option<Date> {
        self.0.termination_date
    }

    /// `DateTime` when this `Lease` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Lease` was archived, if it is.
    #[must_use]
    pub fn archived_at(&self) -> Option<DateTime> {
        self.0.archived_at.map(|at| at.coerce())
    }

    /// Rent schedule of this `Lease`, ordered by due date.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Lease.schedule",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn schedule(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::schedule::Entry>, Error> {
        api::Query::schedule(self.0.id.into(), ctx).await
    }

    /// Balance of the rent schedule of this `Lease`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Lease.balance",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn balance(&self, ctx: &Context) -> Result<Balance, Error> {
        api::Query::lease_balance(self.0.id.into(), ctx).await
    }
}

/// Unique identifier of a `Lease`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::lease::Id)]
#[into(domain::lease::Id)]
#[graphql(name = "LeaseId", transparent)]
pub struct Id(Uuid);

/// Frequency a `Lease` rent is due with.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "LeaseFrequency")]
pub enum Frequency {
    /// Every month.
    Monthly,

    /// Every three months.
    Quarterly,

    /// Every twelve months.
    Yearly,

    /// Agreed individually, scheduled monthly.
    Custom,
}

impl From<domain::lease::Frequency> for Frequency {
    fn from(frequency: domain::lease::Frequency) -> Self {
        use domain::lease::Frequency as F;
        match frequency {
            F::Monthly => Self::Monthly,
            F::Quarterly => Self::Quarterly,
            F::Yearly => Self::Yearly,
            F::Custom => Self::Custom,
        }
    }
}

impl From<Frequency> for domain::lease::Frequency {
    fn from(frequency: Frequency) -> Self {
        match frequency {
            Frequency::Monthly => Self::Monthly,
            Frequency::Quarterly => Self::Quarterly,
            Frequency::Yearly => Self::Yearly,
            Frequency::Custom => Self::Custom,
        }
    }
}

/// Parses the provided day of month as a [`domain::lease::DueDay`].
///
/// # Errors
///
/// With `INVALID_RANGE` code if the `day` is not in `1..=31` range.
pub(crate) fn due_day(day: i32) -> Result<domain::lease::DueDay, Error> {
    u8::try_from(day)
        .ok()
        .and_then(domain::lease::DueDay::new)
        .ok_or_else(|| {
            api::ReconciliationError::InvalidRange.because(
                &format!("due day must be within 1..=31, but got {day}"),
            )
        })
}

/// Balance of a `Lease` rent schedule.
#[derive(Clone, Copy, Debug, From)]
pub struct Balance(read::lease::Balance);

/// Balance of a `Lease` rent schedule.
#[graphql_object(name = "LeaseBalance", context = Context)]
impl Balance {
    /// Total amount expected by the schedule.
    #[must_use]
    pub fn expected(&self) -> Money {
        self.0.expected
    }

    /// Total amount paid against the schedule.
    #[must_use]
    pub fn paid(&self) -> Money {
        self.0.paid
    }

    /// Amount still owed by the schedule.
    #[must_use]
    pub fn outstanding(&self) -> Money {
        self.0.outstanding
    }

    /// Amount still owed by the installments whose due date has passed.
    #[must_use]
    pub fn overdue(&self) -> Money {
        self.0.overdue
    }
}

impl AsError for domain::lease::TerminationError {
    fn try_as_error(&self) -> Option<Error> {
        let error = match self {
            Self::AlreadyTerminated(_) => {
                api::ReconciliationError::InvalidTransition
            }
            Self::OutOfPeriod(_) => api::ReconciliationError::InvalidRange,
        };
        Some(Error::from(error).with_message(self))
    }
}

/// Returns the `NOT_FOUND` [`Error`] of a missing `Lease`.
pub(crate) fn not_found(id: impl Into<domain::lease::Id>) -> Error {
    let id = id.into();
    api::ReconciliationError::NotFound
        .because(&format!("`Lease(id: {id})` does not exist"))
}

/// Fetches the `Lease` by its ID, reporting `NOT_FOUND` if it's missing or
/// inaccessible.
pub(crate) async fn fetch(
    id: domain::lease::Id,
    ctx: &Context,
) -> Result<domain::Lease, Error> {
    let caller = ctx.caller().await?;
    ctx.service()
        .execute(query::lease::ById {
            caller,
            lease_id: id,
        })
        .await
        .map_err(AsError::into_error)
        .map_err(ctx.error())?
        .ok_or_else(|| not_found(id))
        .map_err(ctx.error())
}
