//! [`Tenant`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::account;
#[cfg(doc)]
use crate::domain::Lease;

/// Owner-scoped person renting a property.
///
/// A [`Tenant`] may appear in [`Lease`]s of properties owned by a different
/// account than its nominal owner.
#[derive(Clone, Debug)]
pub struct Tenant {
    /// ID of this [`Tenant`].
    pub id: Id,

    /// ID of the account this [`Tenant`] nominally belongs to.
    pub owner_id: account::Id,

    /// [`Name`] of this [`Tenant`].
    pub name: Name,

    /// [`Email`] of this [`Tenant`], if known.
    pub email: Option<Email>,

    /// [`Phone`] of this [`Tenant`], if known.
    pub phone: Option<Phone>,

    /// [`DateTime`] when this [`Tenant`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Tenant`].
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

/// Full name of a [`Tenant`].
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

/// Email address of a [`Tenant`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 254 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Phone number of a [`Tenant`].
///
/// Accepts international numbers with an optional `+` prefix and single
/// space or dash separators, like `+91 98765 43210` or `+971-50-123-4567`.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Phone`] format: 9 to 15 digits.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?\d(?:[\s-]?\d){8,14}$").expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// [`DateTime`] when a [`Tenant`] was created.
pub type CreationDateTime = DateTimeOf<(Tenant, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Email, Name, Phone};

    #[test]
    fn name() {
        assert!(Name::new("Priya Sharma").is_some());
        assert!(Name::new(" Priya").is_none());
        assert!(Name::new("").is_none());
    }

    #[test]
    fn email() {
        assert!(Email::new("tenant@example.ae").is_some());
        assert!(Email::new("a.b+c@mail.example.in").is_some());
        assert!(Email::new("tenant@example").is_none());
        assert!(Email::new("tenant example@mail.in").is_none());
        assert!(Email::new("@example.in").is_none());
    }

    #[test]
    fn phone() {
        assert!(Phone::new("+91 98765 43210").is_some());
        assert!(Phone::new("+971-50-123-4567").is_some());
        assert!(Phone::new("9876543210").is_some());
        assert!(Phone::new("12345").is_none());
        assert!(Phone::new("+91  98765 43210").is_none());
        assert!(Phone::new("phone").is_none());
    }
}
