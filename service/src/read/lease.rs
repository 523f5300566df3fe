//! [`Lease`]-related read definitions.

use common::{money::Currency, Date, Money};
use rust_decimal::Decimal;

use crate::domain::schedule;
#[cfg(doc)]
use crate::domain::Lease;

/// Balance of a [`Lease`] rent schedule.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Balance {
    /// Total amount expected by all the schedule entries.
    pub expected: Money,

    /// Total amount paid against the schedule entries.
    pub paid: Money,

    /// Amount still owed by all the schedule entries.
    pub outstanding: Money,

    /// Amount still owed by the schedule entries whose due date has passed.
    pub overdue: Money,
}

impl Balance {
    /// Sums up the [`Balance`] of the provided schedule `entries` tracked in
    /// the [`Currency`] as of `today`.
    #[must_use]
    pub fn of<'e>(
        entries: impl IntoIterator<Item = &'e schedule::Entry>,
        currency: Currency,
        today: Date,
    ) -> Self {
        let mut expected = Decimal::ZERO;
        let mut paid = Decimal::ZERO;
        let mut outstanding = Decimal::ZERO;
        let mut overdue = Decimal::ZERO;
        for e in entries {
            let matched = e.paid.unwrap_or_default();
            let owed = e.owed(matched).max(Decimal::ZERO);

            expected += e.expected.amount;
            paid += matched;
            outstanding += owed;
            if e.due_date < today {
                overdue += owed;
            }
        }

        let money = |amount| Money { amount, currency };
        Self {
            expected: money(expected),
            paid: money(paid),
            outstanding: money(outstanding),
            overdue: money(overdue),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, Money};
    use rust_decimal::Decimal;

    use crate::domain::{lease, schedule};

    use super::Balance;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn entry(due: &str, expected: &str, paid: Option<&str>) -> schedule::Entry {
        let today = date("2026-03-15");
        let mut e = schedule::Entry::new(
            lease::Id::new(),
            schedule::Installment {
                due_date: date(due),
                expected: Money {
                    amount: expected.parse().unwrap(),
                    currency: Currency::Aed,
                },
            },
            today,
        );
        _ = e.refresh(
            paid.map_or(Decimal::ZERO, |p| p.parse().unwrap()),
            today,
        );
        e
    }

    #[test]
    fn sums_schedule() {
        let entries = [
            entry("2026-01-31", "20000", Some("20000")),
            entry("2026-02-28", "20000", Some("5000")),
            entry("2026-03-31", "20000", None),
        ];

        let balance =
            Balance::of(&entries, Currency::Aed, date("2026-03-15"));

        let aed = |s: &str| Money {
            amount: s.parse().unwrap(),
            currency: Currency::Aed,
        };
        assert_eq!(balance.expected, aed("60000"));
        assert_eq!(balance.paid, aed("25000"));
        assert_eq!(balance.outstanding, aed("35000"));
        assert_eq!(balance.overdue, aed("15000"));
    }

    #[test]
    fn empty_schedule_is_zero() {
        let balance = Balance::of([], Currency::Inr, date("2026-03-15"));

        assert_eq!(balance.expected, Money::zero(Currency::Inr));
        assert_eq!(balance.outstanding, Money::zero(Currency::Inr));
        assert_eq!(balance.overdue, Money::zero(Currency::Inr));
    }
}
