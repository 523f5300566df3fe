//! [`Cheque`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{command, domain};
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A post-dated cheque handed over by a `Tenant`.
#[derive(Clone, Debug, From, Into)]
pub struct Cheque(domain::Cheque);

/// A post-dated cheque handed over by a `Tenant`.
#[graphql_object(context = Context)]
impl Cheque {
    /// Unique identifier of this `Cheque`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the `Lease` this `Cheque` pays for.
    #[must_use]
    pub fn lease_id(&self) -> api::lease::Id {
        self.0.lease_id.into()
    }

    /// Number printed on this `Cheque`.
    #[must_use]
    pub fn number(&self) -> Number {
        self.0.number.clone().into()
    }

    /// Name of the bank this `Cheque` is drawn on.
    #[must_use]
    pub fn bank_name(&self) -> BankName {
        self.0.bank_name.clone().into()
    }

    /// Date this `Cheque` is written for.
    #[must_use]
    pub fn date(&self) -> Date {
        self.0.date
    }

    /// Amount of this `Cheque`.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// Label of the rent period this `Cheque` covers, if any.
    #[must_use]
    pub fn covers_period(&self) -> Option<CoversPeriod> {
        self.0.covers_period.clone().map(Into::into)
    }

    /// Current status of this `Cheque`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Date this `Cheque` was deposited on, if it was.
    #[must_use]
    pub fn deposited_on(&self) -> Option<Date> {
        self.0.deposited_on
    }

    /// Date this `Cheque` was cleared or bounced on, if it was.
    #[must_use]
    pub fn settled_on(&self) -> Option<Date> {
        self.0.settled_on
    }

    /// Reason this `Cheque` bounced for, if it did.
    #[must_use]
    pub fn bounce_reason(&self) -> Option<BounceReason> {
        self.0.bounce_reason.clone().map(Into::into)
    }

    /// ID of the `Cheque` replacing this one, if any.
    #[must_use]
    pub fn replaced_by(&self) -> Option<Id> {
        self.0.replaced_by.map(Into::into)
    }

    /// `DateTime` when this `Cheque` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Cheque`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::cheque::Id)]
#[into(domain::cheque::Id)]
#[graphql(name = "ChequeId", transparent)]
pub struct Id(Uuid);

/// Number printed on a `Cheque`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "ChequeNumber", with = scalar::Via::<domain::cheque::Number>)]
pub struct Number(domain::cheque::Number);

/// Name of the bank a `Cheque` is drawn on.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ChequeBankName",
    with = scalar::Via::<domain::cheque::BankName>,
)]
pub struct BankName(domain::cheque::BankName);

/// Label of the rent period a `Cheque` covers.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ChequeCoversPeriod",
    with = scalar::Via::<domain::cheque::CoversPeriod>,
)]
pub struct CoversPeriod(domain::cheque::CoversPeriod);

/// Reason of a `Cheque` bounce.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ChequeBounceReason",
    with = scalar::Via::<domain::cheque::BounceReason>,
)]
pub struct BounceReason(domain::cheque::BounceReason);

/// Status of a `Cheque`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ChequeStatus")]
pub enum Status {
    /// Handed over by the `Tenant`.
    Received,

    /// Deposited into the bank.
    Deposited,

    /// Cleared by the bank.
    Cleared,

    /// Bounced by the bank.
    Bounced,

    /// Replaced with another `Cheque`.
    Replaced,
}

impl From<domain::cheque::Status> for Status {
    fn from(status: domain::cheque::Status) -> Self {
        use domain::cheque::Status as S;
        match status {
            S::Received => Self::Received,
            S::Deposited => Self::Deposited,
            S::Cleared => Self::Cleared,
            S::Bounced => Self::Bounced,
            S::Replaced => Self::Replaced,
        }
    }
}

impl From<Status> for domain::cheque::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Received => Self::Received,
            Status::Deposited => Self::Deposited,
            Status::Cleared => Self::Cleared,
            Status::Bounced => Self::Bounced,
            Status::Replaced => Self::Replaced,
        }
    }
}

/// Result of a `Cheque` status change.
#[derive(Clone, Debug, From)]
pub struct StatusUpdate(command::update_cheque_status::Output);

/// Result of a `Cheque` status change.
#[graphql_object(name = "ChequeStatusUpdate", context = Context)]
impl StatusUpdate {
    /// Updated `Cheque`.
    #[must_use]
    pub fn cheque(&self) -> Cheque {
        self.0.cheque.clone().into()
    }

    /// `Payment` produced by the cleared `Cheque`, if any.
    #[must_use]
    pub fn payment(&self) -> Option<api::Payment> {
        self.0.payment.clone().map(Into::into)
    }

    /// Reason the `Payment` of the cleared `Cheque` was not produced.
    ///
    /// `settleCheque` mutation retries producing it.
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.0.warning.as_deref()
    }
}

impl AsError for domain::cheque::TransitionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(api::ReconciliationError::InvalidTransition.because(self))
    }
}
