//! Rent schedule definitions.

use common::{define_kind, Date, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::lease::{self, DueDay, Frequency, Period};
#[cfg(doc)]
use crate::domain::{payment, Lease};

/// Single expected rent installment of a [`Lease`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    /// ID of this [`Entry`].
    pub id: Id,

    /// ID of the [`Lease`] this [`Entry`] belongs to.
    pub lease_id: lease::Id,

    /// [`Date`] the rent is due on.
    pub due_date: Date,

    /// Expected amount of this installment.
    pub expected: Money,

    /// Total amount of [`payment::Match`]es against this [`Entry`], if any.
    pub paid: Option<Decimal>,

    /// Derived [`Status`] of this [`Entry`].
    pub status: Status,
}

impl Entry {
    /// Creates a new unpaid [`Entry`] of the provided [`Lease`] from the
    /// generated [`Installment`].
    #[must_use]
    pub fn new(
        lease_id: lease::Id,
        installment: Installment,
        today: Date,
    ) -> Self {
        let Installment { due_date, expected } = installment;
        Self {
            id: Id::new(),
            lease_id,
            due_date,
            expected,
            paid: None,
            status: Status::derive(
                expected.amount,
                Decimal::ZERO,
                due_date,
                today,
            ),
        }
    }

    /// Returns the amount still owed on this [`Entry`] if the provided
    /// `matched` amount was already paid.
    ///
    /// Non-positive when this [`Entry`] is fully covered.
    #[must_use]
    pub fn owed(&self, matched: Decimal) -> Decimal {
        self.expected.amount - matched
    }

    /// Re-derives the `paid` amount and the [`Status`] of this [`Entry`] from
    /// the `total_paid` amount of all its [`payment::Match`]es.
    ///
    /// Returns whether anything has changed.
    pub fn refresh(&mut self, total_paid: Decimal, today: Date) -> bool {
        let paid = (total_paid > Decimal::ZERO).then_some(total_paid);
        let status = Status::derive(
            self.expected.amount,
            total_paid,
            self.due_date,
            today,
        );

        let changed = self.paid != paid || self.status != status;
        self.paid = paid;
        self.status = status;
        changed
    }
}

/// ID of an [`Entry`].
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
    Ord,
    PartialEq,
    PartialOrd,
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
    #[doc = "Status of an [`Entry`]."]
    enum Status {
        #[doc = "Nothing paid yet, due date not passed."]
        Due = 1,

        #[doc = "Paid partially."]
        Partial = 2,

        #[doc = "Paid in full."]
        Paid = 3,

        #[doc = "Nothing paid, due date passed."]
        Overdue = 4,
    }
}

impl Status {
    /// Derives the [`Status`] of an [`Entry`] with the `expected` amount due
    /// on the `due` date, against which `paid` amount was matched in total.
    #[must_use]
    pub fn derive(
        expected: Decimal,
        paid: Decimal,
        due: Date,
        today: Date,
    ) -> Self {
        if paid >= expected {
            Self::Paid
        } else if paid > Decimal::ZERO {
            Self::Partial
        } else if due < today {
            Self::Overdue
        } else {
            Self::Due
        }
    }
}

/// [`Lease`] terms a rent schedule is derived from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Terms {
    /// [`Period`] of the [`Lease`].
    pub period: Period,

    /// [`DueDay`] of the [`Lease`].
    pub due_day: DueDay,

    /// [`Frequency`] of the [`Lease`].
    pub frequency: Frequency,

    /// Amount of a single installment.
    pub amount: Money,
}

/// Installment generated from the [`Terms`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Installment {
    /// [`Date`] the installment is due on.
    pub due_date: Date,

    /// Expected amount of the installment.
    pub expected: Money,
}

/// Generates the rent schedule of the provided [`Terms`], ordered by due date.
///
/// Walks calendar months starting from the one before the start month with
/// the [`Frequency`] step. Each visited month has its installment due on the
/// [`DueDay`] clamped to the month length, kept only if it lies within the
/// [`Period`].
#[must_use]
pub fn generate(terms: &Terms) -> Vec<Installment> {
    let Terms {
        period,
        due_day,
        frequency,
        amount,
    } = *terms;
    let (start, end) = (period.start(), period.end());

    let mut installments = Vec::new();
    let mut cursor = start.first_of_month().add_months(-1);
    while let Some(month) = cursor.filter(|m| *m <= end) {
        if let Some(due_date) =
            Date::clamped(month.year(), month.month(), due_day.get())
        {
            if period.contains(due_date) {
                installments.push(Installment {
                    due_date,
                    expected: amount,
                });
            }
        }
        cursor = month.add_months(frequency.months());
    }
    installments
}
