//! [`Property`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, money::Currency, unit, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{account, lease, Lease};

/// Owner-scoped rentable asset.
#[derive(Clone, Debug)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// ID of the account owning this [`Property`].
    pub owner_id: account::Id,

    /// [`Name`] of this [`Property`].
    pub name: Name,

    /// [`Country`] this [`Property`] is located in.
    pub country: Country,

    /// [`Currency`] the rent of this [`Property`] is tracked in.
    pub currency: Currency,

    /// Derived [`Occupancy`] of this [`Property`].
    pub occupancy: Occupancy,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Property`] was archived, if it was.
    pub archived_at: Option<ArchivationDateTime>,
}

impl Property {
    /// Checks whether the provided `amount` may be recorded against this
    /// [`Property`]: it must be positive and in the [`Property`]'s
    /// [`Currency`].
    ///
    /// # Errors
    ///
    /// If the `amount` is not positive or is in another [`Currency`].
    pub fn check_amount(&self, amount: Money) -> Result<(), AmountError> {
        if amount.currency != self.currency {
            return Err(AmountError::CurrencyMismatch {
                expected: self.currency,
                actual: amount.currency,
            });
        }
        if amount.amount.is_sign_negative() || amount.amount.is_zero() {
            return Err(AmountError::NotPositive(amount));
        }
        Ok(())
    }
}

/// Error of [`Property::check_amount()`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum AmountError {
    /// Amount is in another [`Currency`] than the [`Property`] is tracked in.
    #[display("expected amount in `{expected}`, but got `{actual}`")]
    CurrencyMismatch {
        /// [`Currency`] of the [`Property`].
        expected: Currency,

        /// [`Currency`] of the amount.
        actual: Currency,
    },

    /// Amount is zero or negative.
    #[display("amount must be positive, but got {_0}")]
    NotPositive(#[error(not(source))] Money),
}

/// ID of a [`Property`].
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

/// Name of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

define_kind! {
    #[doc = "Country a [`Property`] is located in."]
    enum Country {
        #[doc = "India."]
        India = 1,

        #[doc = "United Arab Emirates (Dubai)."]
        Uae = 2,
    }
}

impl Country {
    /// Returns the [`Currency`] rent is natively tracked in this [`Country`].
    #[must_use]
    pub const fn currency(self) -> Currency {
        match self {
            Self::India => Currency::Inr,
            Self::Uae => Currency::Aed,
        }
    }
}

define_kind! {
    #[doc = "Occupancy of a [`Property`]."]
    enum Occupancy {
        #[doc = "No [`Lease`] is currently active."]
        Vacant = 1,

        #[doc = "At least one [`Lease`] is currently active."]
        Occupied = 2,
    }
}

impl Occupancy {
    /// Derives the [`Occupancy`] of a [`Property`] from all its `leases`.
    ///
    /// The [`Lease`] with the `excluded` ID (if any) is not taken into
    /// account, as if it was already gone.
    pub fn derive<'l>(
        leases: impl IntoIterator<Item = &'l Lease>,
        today: Date,
        excluded: Option<lease::Id>,
    ) -> Self {
        let occupied = leases
            .into_iter()
            .filter(|l| Some(l.id) != excluded)
            .any(|l| l.is_active(today));
        if occupied {
            Self::Occupied
        } else {
            Self::Vacant
        }
    }
}

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

/// [`DateTime`] when a [`Property`] was archived.
pub type ArchivationDateTime = DateTimeOf<(Property, unit::Archivation)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, DateTime, Money};

    use crate::domain::{account, lease, property, tenant, Lease};

    use super::{AmountError, Occupancy, Property};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn lease(start: &str, end: &str) -> Lease {
        Lease {
            id: lease::Id::new(),
            property_id: property::Id::new(),
            tenant_id: tenant::Id::new(),
            period: lease::Period::new(date(start), date(end)).unwrap(),
            frequency: lease::Frequency::Monthly,
            rent: Money {
                amount: "50000".parse().unwrap(),
                currency: Currency::Inr,
            },
            due_day: lease::DueDay::new(1).unwrap(),
            security_deposit: None,
            termination_date: None,
            created_at: lease::CreationDateTime::now(),
            archived_at: None,
        }
    }

    #[test]
    fn vacant_without_leases() {
        assert_eq!(
            Occupancy::derive(&[], date("2026-06-01"), None),
            Occupancy::Vacant,
        );
    }

    #[test]
    fn occupied_by_current_lease() {
        let leases = [lease("2026-01-01", "2026-12-31")];

        assert_eq!(
            Occupancy::derive(&leases, date("2026-06-01"), None),
            Occupancy::Occupied,
        );
        assert_eq!(
            Occupancy::derive(&leases, date("2026-12-31"), None),
            Occupancy::Occupied,
        );
        assert_eq!(
            Occupancy::derive(&leases, date("2027-01-01"), None),
            Occupancy::Vacant,
        );
    }

    #[test]
    fn future_lease_occupies() {
        let leases = [lease("2027-01-01", "2027-12-31")];

        assert_eq!(
            Occupancy::derive(&leases, date("2026-06-01"), None),
            Occupancy::Occupied,
        );
    }

    #[test]
    fn ignores_archived_terminated_and_excluded() {
        let mut archived = lease("2026-01-01", "2026-12-31");
        archived.archived_at = Some(lease::ArchivationDateTime::now());

        let mut terminated = lease("2026-01-01", "2026-12-31");
        terminated.termination_date = Some(date("2026-06-01"));

        let excluded = lease("2026-01-01", "2026-12-31");

        let today = date("2026-06-01");
        let leases = [archived, terminated, excluded.clone()];
        assert_eq!(
            Occupancy::derive(&leases, today, Some(excluded.id)),
            Occupancy::Vacant,
        );
        assert_eq!(
            Occupancy::derive(&leases, today, None),
            Occupancy::Occupied,
        );
    }

    #[test]
    fn termination_in_future_still_occupies() {
        let mut terminated = lease("2026-01-01", "2026-12-31");
        terminated.termination_date = Some(date("2026-06-02"));

        assert_eq!(
            Occupancy::derive(&[terminated], date("2026-06-01"), None),
            Occupancy::Occupied,
        );
    }

    #[test]
    fn checks_amount() {
        let property = Property {
            id: property::Id::new(),
            owner_id: account::Id::new(),
            name: property::Name::new("Palm View 7").unwrap(),
            country: property::Country::Uae,
            currency: Currency::Aed,
            occupancy: Occupancy::Vacant,
            created_at: DateTime::now().coerce(),
            archived_at: None,
        };
        let money = |amount: &str, currency| Money {
            amount: amount.parse().unwrap(),
            currency,
        };

        assert_eq!(property.check_amount(money("0.01", Currency::Aed)), Ok(()));
        assert_eq!(
            property.check_amount(money("100", Currency::Inr)),
            Err(AmountError::CurrencyMismatch {
                expected: Currency::Aed,
                actual: Currency::Inr,
            }),
        );
        for amount in ["0", "-5"] {
            let m = money(amount, Currency::Aed);
            assert_eq!(
                property.check_amount(m),
                Err(AmountError::NotPositive(m)),
            );
        }
    }
}
