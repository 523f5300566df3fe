//! [`Payment`] definitions.

pub mod allocation;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{schedule::Entry, Cheque, Lease, Property, Tenant};
use crate::domain::{cheque, lease, property, schedule, tenant};

/// Funds received for a [`Lease`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the [`Lease`] this [`Payment`] is received for.
    pub lease_id: lease::Id,

    /// ID of the [`Property`] of the [`Lease`].
    pub property_id: property::Id,

    /// ID of the [`Tenant`] of the [`Lease`].
    pub tenant_id: tenant::Id,

    /// ID of the [`Cheque`] this [`Payment`] was produced by, if any.
    pub cheque_id: Option<cheque::Id>,

    /// [`Date`] the funds were received on.
    pub date: Date,

    /// Received amount.
    pub amount: Money,

    /// [`Method`] the funds were received with.
    pub method: Method,

    /// [`Reference`] of this [`Payment`], if any.
    pub reference: Option<Reference>,

    /// [`DateTime`] when this [`Payment`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Payment`] was archived, if it was.
    pub archived_at: Option<ArchivationDateTime>,
}

/// ID of a [`Payment`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Method a [`Payment`] was received with."]
    enum Method {
        #[doc = "Cash."]
        Cash = 1,

        #[doc = "Bank transfer (NEFT, RTGS, IMPS, wire)."]
        BankTransfer = 2,

        #[doc = "Cleared [`Cheque`]."]
        Cheque = 3,

        #[doc = "Unified Payments Interface."]
        Upi = 4,

        #[doc = "Debit or credit card."]
        Card = 5,

        #[doc = "Anything else."]
        Other = 6,
    }
}

/// Free-form reference of a [`Payment`], like a bank transaction ID.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Reference(String);

impl Reference {
    /// Creates a new [`Reference`] if the given `reference` is valid.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Option<Self> {
        let reference = reference.into();
        Self::check(&reference).then_some(Self(reference))
    }

    /// Checks whether the given `reference` is a valid [`Reference`].
    fn check(reference: impl AsRef<str>) -> bool {
        let reference = reference.as_ref();
        reference.trim() == reference
            && !reference.is_empty()
            && reference.len() <= 256
    }
}

impl FromStr for Reference {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Reference`")
    }
}

/// Part of a [`Payment`] applied to a schedule [`Entry`].
///
/// At most one [`Match`] exists for a pair of a [`Payment`] and an [`Entry`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Match {
    /// ID of the matched [`Payment`].
    pub payment_id: Id,

    /// ID of the schedule [`Entry`] the amount is applied to.
    pub schedule_id: schedule::Id,

    /// Applied amount, always positive.
    pub amount: Decimal,
}

/// [`DateTime`] when a [`Payment`] was created.
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

/// [`DateTime`] when a [`Payment`] was archived.
pub type ArchivationDateTime = DateTimeOf<(Payment, unit::Archivation)>;
