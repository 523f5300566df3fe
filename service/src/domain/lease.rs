//! [`Lease`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Property, Tenant};
use crate::domain::{property, schedule, tenant};

/// Binding of one [`Property`] to one [`Tenant`] for a [`Period`].
#[derive(Clone, Debug)]
pub struct Lease {
    /// ID of this [`Lease`].
    pub id: Id,

    /// ID of the leased [`Property`].
    pub property_id: property::Id,

    /// ID of the [`Tenant`] renting the [`Property`].
    pub tenant_id: tenant::Id,

    /// [`Period`] this [`Lease`] spans.
    pub period: Period,

    /// [`Frequency`] the rent is due with.
    pub frequency: Frequency,

    /// Amount of a single rent installment.
    pub rent: Money,

    /// Day of month the rent is due on.
    pub due_day: DueDay,

    /// Security deposit paid at the beginning of this [`Lease`], if any.
    pub security_deposit: Option<Money>,

    /// [`Date`] this [`Lease`] was terminated early on, if it was.
    ///
    /// Once set, never changes.
    pub termination_date: Option<Date>,

    /// [`DateTime`] when this [`Lease`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Lease`] was archived, if it was.
    pub archived_at: Option<ArchivationDateTime>,
}

impl Lease {
    /// Indicates whether this [`Lease`] is archived.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Indicates whether this [`Lease`] keeps its [`Property`] occupied on the
    /// provided `today`.
    ///
    /// A [`Lease`] starting in the future is active already.
    #[must_use]
    pub fn is_active(&self, today: Date) -> bool {
        !self.is_archived()
            && self.period.end() >= today
            && self.termination_date.map_or(true, |d| d > today)
    }

    /// Indicates whether this [`Lease`] is not archived and its [`Period`]
    /// overlaps the provided one.
    #[must_use]
    pub fn conflicts_with(&self, period: &Period) -> bool {
        !self.is_archived() && self.period.overlaps(period)
    }

    /// Returns the [`schedule::Terms`] of this [`Lease`].
    #[must_use]
    pub fn terms(&self) -> schedule::Terms {
        schedule::Terms {
            period: self.period,
            due_day: self.due_day,
            frequency: self.frequency,
            amount: self.rent,
        }
    }

    /// Terminates this [`Lease`] early on the provided `date`.
    ///
    /// # Errors
    ///
    /// - If this [`Lease`] is terminated already.
    /// - If the `date` lies outside this [`Lease`]'s [`Period`].
    pub fn terminate(&mut self, date: Date) -> Result<(), TerminationError> {
        if let Some(terminated) = self.termination_date {
            return Err(TerminationError::AlreadyTerminated(terminated));
        }
        if !self.period.contains(date) {
            return Err(TerminationError::OutOfPeriod(date));
        }
        self.termination_date = Some(date);
        Ok(())
    }
}

/// Error of [`Lease::terminate()`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum TerminationError {
    /// [`Lease`] is terminated already.
    #[display("`Lease` is already terminated on {_0}")]
    AlreadyTerminated(#[error(not(source))] Date),

    /// Termination [`Date`] lies outside the [`Lease`]'s [`Period`].
    #[display("termination date {_0} lies outside the `Lease` period")]
    OutOfPeriod(#[error(not(source))] Date),
}

/// ID of a [`Lease`].
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

/// Inclusive [`Date`] range of a [`Lease`], always ending after it starts.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[display("[{start}, {end}]")]
pub struct Period {
    /// First [`Date`] of this [`Period`].
    start: Date,

    /// Last [`Date`] of this [`Period`].
    end: Date,
}

impl Period {
    /// Creates a new [`Period`] if the `end` is after the `start`.
    #[must_use]
    pub fn new(start: Date, end: Date) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Returns the first [`Date`] of this [`Period`].
    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Returns the last [`Date`] of this [`Period`].
    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Indicates whether the provided `date` lies within this [`Period`].
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Indicates whether this [`Period`] intersects with the `other` one.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

define_kind! {
    #[doc = "Frequency a [`Lease`] rent is due with."]
    enum Frequency {
        #[doc = "Every month."]
        Monthly = 1,

        #[doc = "Every three months."]
        Quarterly = 2,

        #[doc = "Every twelve months."]
        Yearly = 3,

        #[doc = "Agreed individually, scheduled monthly."]
        Custom = 4,
    }
}

impl Frequency {
    /// Returns the number of months between two consecutive installments.
    #[must_use]
    pub const fn months(self) -> i32 {
        match self {
            Self::Monthly | Self::Custom => 1,
            Self::Quarterly => 3,
            Self::Yearly => 12,
        }
    }
}

/// Day of month a [`Lease`] rent is due on, in `1..=31` range.
///
/// Months shorter than the day have the rent due on their last day.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
pub struct DueDay(u8);

impl DueDay {
    /// Creates a new [`DueDay`] if the given `day` is valid.
    #[must_use]
    pub fn new(day: u8) -> Option<Self> {
        (1..=31).contains(&day).then_some(Self(day))
    }

    /// Returns the day of month.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// [`DateTime`] when a [`Lease`] was created.
pub type CreationDateTime = DateTimeOf<(Lease, unit::Creation)>;

/// [`DateTime`] when a [`Lease`] was archived.
pub type ArchivationDateTime = DateTimeOf<(Lease, unit::Archivation)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, Money};

    use crate::domain::{property, tenant};

    use super::{
        CreationDateTime, DueDay, Frequency, Id, Lease, Period,
        TerminationError,
    };

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn period(start: &str, end: &str) -> Period {
        Period::new(date(start), date(end)).unwrap()
    }

    fn lease() -> Lease {
        Lease {
            id: Id::new(),
            property_id: property::Id::new(),
            tenant_id: tenant::Id::new(),
            period: period("2026-01-01", "2026-12-31"),
            frequency: Frequency::Monthly,
            rent: Money {
                amount: "8500".parse().unwrap(),
                currency: Currency::Aed,
            },
            due_day: DueDay::new(5).unwrap(),
            security_deposit: None,
            termination_date: None,
            created_at: CreationDateTime::now(),
            archived_at: None,
        }
    }

    #[test]
    fn period_requires_end_after_start() {
        assert!(Period::new(date("2026-01-01"), date("2026-01-02")).is_some());
        assert!(Period::new(date("2026-01-01"), date("2026-01-01")).is_none());
        assert!(Period::new(date("2026-01-02"), date("2026-01-01")).is_none());
    }

    #[test]
    fn period_overlap_is_inclusive() {
        let p = period("2026-01-01", "2026-12-31");

        assert!(p.overlaps(&period("2026-12-31", "2027-12-31")));
        assert!(p.overlaps(&period("2025-01-01", "2026-01-01")));
        assert!(p.overlaps(&period("2026-03-01", "2026-04-01")));
        assert!(!p.overlaps(&period("2027-01-01", "2027-12-31")));
        assert!(!p.overlaps(&period("2025-01-01", "2025-12-31")));
    }

    #[test]
    fn due_day_range() {
        assert!(DueDay::new(0).is_none());
        assert!(DueDay::new(1).is_some());
        assert!(DueDay::new(31).is_some());
        assert!(DueDay::new(32).is_none());
    }

    #[test]
    fn terminates_once_within_period() {
        let mut l = lease();

        assert_eq!(
            l.terminate(date("2025-12-31")),
            Err(TerminationError::OutOfPeriod(date("2025-12-31"))),
        );
        assert_eq!(
            l.terminate(date("2027-01-01")),
            Err(TerminationError::OutOfPeriod(date("2027-01-01"))),
        );
        assert_eq!(l.terminate(date("2026-06-30")), Ok(()));
        assert_eq!(l.termination_date, Some(date("2026-06-30")));
        assert_eq!(
            l.terminate(date("2026-07-31")),
            Err(TerminationError::AlreadyTerminated(date("2026-06-30"))),
        );
        assert_eq!(l.termination_date, Some(date("2026-06-30")));
    }

    #[test]
    fn terminates_on_bounds() {
        let mut l = lease();
        assert_eq!(l.terminate(date("2026-01-01")), Ok(()));

        let mut l = lease();
        assert_eq!(l.terminate(date("2026-12-31")), Ok(()));
    }

    #[test]
    fn activity() {
        let mut l = lease();
        assert!(l.is_active(date("2025-06-01")));
        assert!(l.is_active(date("2026-12-31")));
        assert!(!l.is_active(date("2027-01-01")));

        l.termination_date = Some(date("2026-06-30"));
        assert!(l.is_active(date("2026-06-29")));
        assert!(!l.is_active(date("2026-06-30")));
    }
}
