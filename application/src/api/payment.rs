//! [`Payment`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use rust_decimal::Decimal;
use service::{command, domain};
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// Funds received for a `Lease`.
#[derive(Clone, Debug, From, Into)]
pub struct Payment(domain::Payment);

/// Funds received for a `Lease`.
#[graphql_object(context = Context)]
impl Payment {
    /// Unique identifier of this `Payment`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the `Lease` this `Payment` is received for.
    #[must_use]
    pub fn lease_id(&self) -> api::lease::Id {
        self.0.lease_id.into()
    }

    /// ID of the cleared `Cheque` that produced this `Payment`, if any.
    #[must_use]
    pub fn cheque_id(&self) -> Option<api::cheque::Id> {
        self.0.cheque_id.map(Into::into)
    }

    /// Date the funds were received on.
    #[must_use]
    pub fn date(&self) -> Date {
        self.0.date
    }

    /// Received amount.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// Method the funds were received with.
    #[must_use]
    pub fn method(&self) -> Method {
        self.0.method.into()
    }

    /// Reference of this `Payment`, if any.
    #[must_use]
    pub fn reference(&self) -> Option<Reference> {
        self.0.reference.clone().map(Into::into)
    }

    /// `DateTime` when this `Payment` was recorded.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Payment`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::payment::Id)]
#[into(domain::payment::Id)]
#[graphql(name = "PaymentId", transparent)]
pub struct Id(Uuid);

/// Reference of a `Payment`, like a bank transaction ID.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PaymentReference",
    with = scalar::Via::<domain::payment::Reference>,
)]
pub struct Reference(domain::payment::Reference);

/// Exact decimal amount without a currency, like `1500.50`.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = scalar::Via::<Decimal>)]
pub struct Amount(Decimal);

/// Method a `Payment` was received with.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PaymentMethod")]
pub enum Method {
    /// Cash.
    Cash,

    /// Bank transfer.
    BankTransfer,

    /// Cleared `Cheque`.
    Cheque,

    /// Unified Payments Interface.
    Upi,

    /// Debit or credit card.
    Card,

    /// Anything else.
    Other,
}

impl From<domain::payment::Method> for Method {
    fn from(method: domain::payment::Method) -> Self {
        use domain::payment::Method as M;
        match method {
            M::Cash => Self::Cash,
            M::BankTransfer => Self::BankTransfer,
            M::Cheque => Self::Cheque,
            M::Upi => Self::Upi,
            M::Card => Self::Card,
            M::Other => Self::Other,
        }
    }
}

impl From<Method> for domain::payment::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Cash => Self::Cash,
            Method::BankTransfer => Self::BankTransfer,
            Method::Cheque => Self::Cheque,
            Method::Upi => Self::Upi,
            Method::Card => Self::Card,
            Method::Other => Self::Other,
        }
    }
}

/// Amount of a `Payment` allocated to a `ScheduleEntry`.
#[derive(Clone, Copy, Debug, From)]
pub struct Match(domain::payment::Match);

/// Amount of a `Payment` allocated to a `ScheduleEntry`.
#[graphql_object(name = "PaymentMatch", context = Context)]
impl Match {
    /// ID of the matched `Payment`.
    #[must_use]
    pub fn payment_id(&self) -> Id {
        self.0.payment_id.into()
    }

    /// ID of the matched `ScheduleEntry`.
    #[must_use]
    pub fn schedule_entry_id(&self) -> api::schedule::Id {
        self.0.schedule_id.into()
    }

    /// Allocated amount in the `Payment` currency.
    #[must_use]
    pub fn amount(&self) -> Amount {
        self.0.amount.into()
    }
}

/// Requested allocation of a `Payment` amount to a `ScheduleEntry`.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "PaymentAllocationInput")]
pub struct AllocationInput {
    /// ID of the `ScheduleEntry` to allocate to.
    pub schedule_entry_id: api::schedule::Id,

    /// Amount to allocate in the `Payment` currency.
    ///
    /// Zero removes the match with the `ScheduleEntry`.
    pub amount: Amount,
}

impl From<AllocationInput> for domain::payment::allocation::Requested {
    fn from(input: AllocationInput) -> Self {
        Self {
            schedule_id: input.schedule_entry_id.into(),
            amount: input.amount.into(),
        }
    }
}

/// Recorded `Payment` along with its automatic matches.
#[derive(Clone, Debug, From)]
pub struct Recorded(command::create_payment::Output);

/// Recorded `Payment` along with its automatic matches.
#[graphql_object(name = "RecordedPayment", context = Context)]
impl Recorded {
    /// Recorded `Payment`.
    #[must_use]
    pub fn payment(&self) -> Payment {
        self.0.payment.clone().into()
    }

    /// Matches the `Payment` was auto-matched with, oldest due first.
    #[must_use]
    pub fn matches(&self) -> Vec<Match> {
        self.0.matches.iter().copied().map(Into::into).collect()
    }
}

impl AsError for domain::payment::allocation::Error {
    fn try_as_error(&self) -> Option<Error> {
        use api::ReconciliationError as E;

        let error = match self {
            Self::EntryNotExists(_) => E::NotFound,
            Self::InvalidAmount(_) => E::InvalidAmount,
            Self::MismatchedLease(_) => E::MismatchedLease,
            Self::OverAllocation { .. } => E::OverAllocation,
        };
        Some(Error::from(error).with_message(self))
    }
}
