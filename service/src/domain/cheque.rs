//! [`Cheque`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Lease, Payment, Property, Tenant};
use crate::domain::{lease, property, tenant};

/// Post-dated cheque handed over for a [`Lease`].
#[derive(Clone, Debug)]
pub struct Cheque {
    /// ID of this [`Cheque`].
    pub id: Id,

    /// ID of the [`Lease`] this [`Cheque`] pays for.
    pub lease_id: lease::Id,

    /// ID of the [`Property`] of the [`Lease`].
    pub property_id: property::Id,

    /// ID of the [`Tenant`] who issued this [`Cheque`].
    pub tenant_id: tenant::Id,

    /// [`Number`] of this [`Cheque`].
    pub number: Number,

    /// [`BankName`] this [`Cheque`] is drawn on.
    pub bank_name: BankName,

    /// [`Date`] written on this [`Cheque`].
    pub date: Date,

    /// Amount of this [`Cheque`].
    pub amount: Money,

    /// Label of the rent period this [`Cheque`] covers, if any.
    pub covers_period: Option<CoversPeriod>,

    /// Current [`Status`] of this [`Cheque`].
    pub status: Status,

    /// [`Date`] this [`Cheque`] was deposited on, if it was.
    pub deposited_on: Option<Date>,

    /// [`Date`] this [`Cheque`] was cleared or bounced on, if it was.
    pub settled_on: Option<Date>,

    /// [`BounceReason`] reported by the bank, if this [`Cheque`] bounced.
    pub bounce_reason: Option<BounceReason>,

    /// ID of the [`Cheque`] replacing this bounced one, if any.
    pub replaced_by: Option<Id>,

    /// [`DateTime`] when this [`Cheque`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Cheque`] was archived, if it was.
    pub archived_at: Option<ArchivationDateTime>,
}

impl Cheque {
    /// Applies the provided [`Transition`] to this [`Cheque`].
    ///
    /// Dates not provided in the [`Transition`] default to `today`.
    ///
    /// # Errors
    ///
    /// - If the target [`Status`] is not reachable from the current one.
    /// - If a [`Status::Replaced`] target misses the replacement.
    pub fn transition(
        &mut self,
        transition: Transition,
        today: Date,
    ) -> Result<(), TransitionError> {
        let Transition {
            to,
            date,
            bounce_reason,
            replaced_by,
        } = transition;

        if !self.status.allows(to) {
            return Err(TransitionError::NotAllowed {
                from: self.status,
                to,
            });
        }

        let date = date.unwrap_or(today);
        match to {
            Status::Deposited => self.deposited_on = Some(date),
            Status::Cleared => self.settled_on = Some(date),
            Status::Bounced => {
                self.settled_on = Some(date);
                self.bounce_reason = bounce_reason;
            }
            Status::Replaced => {
                self.replaced_by = Some(
                    replaced_by.ok_or(TransitionError::MissingReplacement)?,
                );
            }
            Status::Received => {}
        }
        self.status = to;
        Ok(())
    }

    /// Returns the [`Date`] a [`Payment`] produced by this [`Cheque`] is
    /// dated at.
    #[must_use]
    pub fn payment_date(&self) -> Date {
        self.settled_on.unwrap_or(self.date)
    }

    /// Returns the reference a [`Payment`] produced by this [`Cheque`] is
    /// tagged with.
    #[must_use]
    pub fn payment_reference(&self) -> String {
        format!("Cheque #{} ({}), id: {}", self.number, self.bank_name, self.id)
    }
}

/// Requested change of a [`Cheque`] [`Status`].
#[derive(Clone, Debug)]
pub struct Transition {
    /// Target [`Status`].
    pub to: Status,

    /// [`Date`] the change happened on.
    pub date: Option<Date>,

    /// [`BounceReason`] for a [`Status::Bounced`] target.
    pub bounce_reason: Option<BounceReason>,

    /// ID of the replacing [`Cheque`], required for a [`Status::Replaced`]
    /// target.
    pub replaced_by: Option<Id>,
}

impl Transition {
    /// Creates a new [`Transition`] to the provided [`Status`] happening
    /// today.
    #[must_use]
    pub const fn to(status: Status) -> Self {
        Self {
            to: status,
            date: None,
            bounce_reason: None,
            replaced_by: None,
        }
    }
}

/// Error of [`Cheque::transition()`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum TransitionError {
    /// Target [`Status`] is not reachable from the current one.
    #[display("`Cheque` cannot change its status from `{from}` to `{to}`")]
    NotAllowed {
        /// Current [`Status`].
        from: Status,

        /// Requested [`Status`].
        to: Status,
    },

    /// [`Status::Replaced`] target misses the replacing [`Cheque`].
    #[display("`REPLACED` status requires the replacing `Cheque`")]
    MissingReplacement,
}

/// ID of a [`Cheque`].
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
    #[doc = "Status of a [`Cheque`]."]
    enum Status {
        #[doc = "Handed over by the [`Tenant`]."]
        Received = 1,

        #[doc = "Deposited into the bank."]
        Deposited = 2,

        #[doc = "Cleared by the bank. Terminal."]
        Cleared = 3,

        #[doc = "Bounced by the bank."]
        Bounced = 4,

        #[doc = "Replaced with another [`Cheque`]. Terminal."]
        Replaced = 5,
    }
}

impl Status {
    /// Returns the [`Status`]es reachable from this one.
    #[must_use]
    pub const fn next(self) -> &'static [Self] {
        match self {
            Self::Received => &[Self::Deposited],
            Self::Deposited => &[Self::Cleared, Self::Bounced],
            Self::Bounced => &[Self::Replaced],
            Self::Cleared | Self::Replaced => &[],
        }
    }

    /// Indicates whether the provided [`Status`] is reachable from this one.
    #[must_use]
    pub fn allows(self, to: Self) -> bool {
        self.next().contains(&to)
    }

    /// Indicates whether this [`Status`] has no outgoing transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.next().is_empty()
    }
}

/// Number printed on a [`Cheque`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Number`].
    fn check(number: impl AsRef<str>) -> bool {
        let number = number.as_ref();
        !number.is_empty()
            && number.len() <= 32
            && number.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Number`")
    }
}

/// Name of the bank a [`Cheque`] is drawn on.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct BankName(String);

impl BankName {
    /// Creates a new [`BankName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`BankName`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for BankName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `BankName`")
    }
}

/// Free-form label of the rent period a [`Cheque`] covers, like `Q1 2026`.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct CoversPeriod(String);

impl CoversPeriod {
    /// Creates a new [`CoversPeriod`] if the given `label` is valid.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Option<Self> {
        let label = label.into();
        (label.trim() == label && !label.is_empty() && label.len() <= 128)
            .then_some(Self(label))
    }
}

impl FromStr for CoversPeriod {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `CoversPeriod`")
    }
}

/// Reason of a [`Cheque`] bounce reported by the bank.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct BounceReason(String);

impl BounceReason {
    /// Creates a new [`BounceReason`] if the given `reason` is valid.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Option<Self> {
        let reason = reason.into();
        (!reason.trim().is_empty() && reason.len() <= 1024)
            .then_some(Self(reason))
    }
}

impl FromStr for BounceReason {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `BounceReason`")
    }
}

/// [`DateTime`] when a [`Cheque`] was created.
pub type CreationDateTime = DateTimeOf<(Cheque, unit::Creation)>;

/// [`DateTime`] when a [`Cheque`] was archived.
pub type ArchivationDateTime = DateTimeOf<(Cheque, unit::Archivation)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, Money};

    use crate::domain::{lease, property, tenant};

    use super::{
        BankName, BounceReason, Cheque, CreationDateTime, Id, Number, Status,
        Transition, TransitionError,
    };

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn cheque(status: Status) -> Cheque {
        Cheque {
            id: Id::new(),
            lease_id: lease::Id::new(),
            property_id: property::Id::new(),
            tenant_id: tenant::Id::new(),
            number: Number::new("000123").unwrap(),
            bank_name: BankName::new("Emirates NBD").unwrap(),
            date: date("2026-03-01"),
            amount: Money {
                amount: "25000".parse().unwrap(),
                currency: Currency::Aed,
            },
            covers_period: None,
            status,
            deposited_on: None,
            settled_on: None,
            bounce_reason: None,
            replaced_by: None,
            created_at: CreationDateTime::now(),
            archived_at: None,
        }
    }

    fn allowed(from: Status, to: Status) -> bool {
        matches!(
            (from, to),
            (Status::Received, Status::Deposited)
                | (Status::Deposited, Status::Cleared | Status::Bounced)
                | (Status::Bounced, Status::Replaced),
        )
    }

    #[test]
    fn transition_closure() {
        for &from in Status::ALL {
            for &to in Status::ALL {
                let mut c = cheque(from);
                let t = Transition {
                    replaced_by: Some(Id::new()),
                    ..Transition::to(to)
                };
                let res = c.transition(t, date("2026-03-05"));

                if allowed(from, to) {
                    assert_eq!(res, Ok(()), "{from} -> {to}");
                    assert_eq!(c.status, to);
                } else {
                    assert_eq!(
                        res,
                        Err(TransitionError::NotAllowed { from, to }),
                        "{from} -> {to}",
                    );
                    assert_eq!(c.status, from);
                }
            }
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(Status::Cleared.is_terminal());
        assert!(Status::Replaced.is_terminal());
        assert!(!Status::Bounced.is_terminal());
    }

    #[test]
    fn replacement_is_required() {
        let mut c = cheque(Status::Bounced);

        assert_eq!(
            c.transition(Transition::to(Status::Replaced), date("2026-03-10")),
            Err(TransitionError::MissingReplacement),
        );
        assert_eq!(c.status, Status::Bounced);

        let replacement = Id::new();
        let t = Transition {
            replaced_by: Some(replacement),
            ..Transition::to(Status::Replaced)
        };
        assert_eq!(c.transition(t, date("2026-03-10")), Ok(()));
        assert_eq!(c.replaced_by, Some(replacement));
    }

    #[test]
    fn records_dates() {
        let mut c = cheque(Status::Received);

        c.transition(Transition::to(Status::Deposited), date("2026-03-02"))
            .unwrap();
        assert_eq!(c.deposited_on, Some(date("2026-03-02")));
        assert_eq!(c.payment_date(), date("2026-03-01"));

        let t = Transition {
            date: Some(date("2026-03-04")),
            ..Transition::to(Status::Cleared)
        };
        c.transition(t, date("2026-03-06")).unwrap();
        assert_eq!(c.settled_on, Some(date("2026-03-04")));
        assert_eq!(c.payment_date(), date("2026-03-04"));
    }

    #[test]
    fn records_bounce_reason() {
        let mut c = cheque(Status::Deposited);
        let t = Transition {
            bounce_reason: BounceReason::new("Insufficient funds"),
            ..Transition::to(Status::Bounced)
        };

        c.transition(t, date("2026-03-06")).unwrap();
        assert_eq!(c.settled_on, Some(date("2026-03-06")));
        assert_eq!(
            c.bounce_reason.as_ref().map(ToString::to_string),
            Some("Insufficient funds".to_owned()),
        );
    }

    #[test]
    fn number_format() {
        assert!(Number::new("000123").is_some());
        assert!(Number::new("").is_none());
        assert!(Number::new("12 34").is_none());
    }
}
