//! Allocation of a [`Payment`] across schedule [`Entry`]s.

use std::collections::HashMap;

use derive_more::{Display, Error as StdError};
use rust_decimal::Decimal;

use crate::domain::{schedule, schedule::Entry};
#[cfg(doc)]
use crate::domain::Lease;

use super::{Match, Payment};

/// Allocates the `amount` of the [`Payment`] across the provided `entries`,
/// oldest due first.
///
/// Each [`Entry`] receives at most what is still owed on it, considering the
/// amounts `matched` against it already. Earlier [`Match`]es are never
/// rebalanced.
#[must_use]
pub fn auto<'e>(
    payment: &Payment,
    entries: impl IntoIterator<Item = &'e Entry>,
    matched: &HashMap<schedule::Id, Decimal>,
) -> Vec<Match> {
    let mut entries = entries.into_iter().collect::<Vec<_>>();
    entries.sort_by_key(|e| (e.due_date, e.id));

    let mut remaining = payment.amount.amount;
    let mut matches = Vec::new();
    for entry in entries {
        if remaining <= Decimal::ZERO {
            break;
        }

        let owed = entry.owed(
            matched.get(&entry.id).copied().unwrap_or(Decimal::ZERO),
        );
        if owed <= Decimal::ZERO {
            continue;
        }

        let amount = remaining.min(owed);
        remaining -= amount;
        matches.push(Match {
            payment_id: payment.id,
            schedule_id: entry.id,
            amount,
        });
    }
    matches
}

/// Amount of a [`Payment`] requested to be applied to a schedule [`Entry`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Requested {
    /// ID of the schedule [`Entry`].
    pub schedule_id: schedule::Id,

    /// Amount to apply.
    ///
    /// Zero means removing the existing [`Match`], if any.
    pub amount: Decimal,
}

/// Validates the `requested` allocation of the [`Payment`] and converts it
/// into the full set of its [`Match`]es.
///
/// Repeated [`Entry`]s have their amounts summed up. Zero amounts are
/// dropped.
///
/// # Errors
///
/// - If any requested amount is negative.
/// - If any requested [`Entry`] is missing in the `entries`.
/// - If any requested [`Entry`] belongs to another [`Lease`].
/// - If the requested amounts exceed the [`Payment`] amount in total.
pub fn manual(
    payment: &Payment,
    requested: impl IntoIterator<Item = Requested>,
    entries: &HashMap<schedule::Id, Entry>,
) -> Result<Vec<Match>, Error> {
    let mut total = Decimal::ZERO;
    let mut matches = Vec::<Match>::new();
    for Requested {
        schedule_id,
        amount,
    } in requested
    {
        if amount < Decimal::ZERO {
            return Err(Error::InvalidAmount(schedule_id));
        }
        let entry = entries
            .get(&schedule_id)
            .ok_or(Error::EntryNotExists(schedule_id))?;
        if entry.lease_id != payment.lease_id {
            return Err(Error::MismatchedLease(schedule_id));
        }

        total += amount;
        if let Some(m) = matches.iter_mut().find(|m| m.schedule_id == entry.id)
        {
            m.amount += amount;
        } else {
            matches.push(Match {
                payment_id: payment.id,
                schedule_id,
                amount,
            });
        }
    }

    if total > payment.amount.amount {
        return Err(Error::OverAllocation {
            requested: total,
            available: payment.amount.amount,
        });
    }

    matches.retain(|m| m.amount > Decimal::ZERO);
    Ok(matches)
}

/// Error of a [`manual()`] allocation.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// Schedule [`Entry`] doesn't exist.
    #[display("`schedule::Entry(id: {_0})` does not exist")]
    EntryNotExists(#[error(not(source))] schedule::Id),

    /// Requested amount is negative.
    #[display("amount requested for `schedule::Entry(id: {_0})` is negative")]
    InvalidAmount(#[error(not(source))] schedule::Id),

    /// Schedule [`Entry`] belongs to another [`Lease`] than the [`Payment`].
    #[display(
        "`schedule::Entry(id: {_0})` belongs to another `Lease` than the \
         `Payment`"
    )]
    MismatchedLease(#[error(not(source))] schedule::Id),

    /// Requested amounts exceed the [`Payment`] amount.
    #[display(
        "requested {requested} in total exceeds the `Payment` amount of \
         {available}"
    )]
    OverAllocation {
        /// Total requested amount.
        requested: Decimal,

        /// Amount of the [`Payment`].
        available: Decimal,
    },
}

#[cfg(test)]
mod spec {
    use std::collections::HashMap;

    use common::{money::Currency, Date, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        lease, payment, property,
        schedule::{self, Entry, Installment},
        tenant, Payment,
    };

    use super::{auto, manual, Error, Requested};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn inr(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Inr,
        }
    }

    fn entry(lease_id: lease::Id, due: &str, expected: &str) -> Entry {
        Entry::new(
            lease_id,
            Installment {
                due_date: date(due),
                expected: inr(expected),
            },
            date("2026-01-01"),
        )
    }

    fn payment(lease_id: lease::Id, amount: &str) -> Payment {
        Payment {
            id: payment::Id::new(),
            lease_id,
            property_id: property::Id::new(),
            tenant_id: tenant::Id::new(),
            cheque_id: None,
            date: date("2026-03-01"),
            amount: inr(amount),
            method: payment::Method::BankTransfer,
            reference: None,
            created_at: payment::CreationDateTime::now(),
            archived_at: None,
        }
    }

    fn by_id(entries: &[Entry]) -> HashMap<schedule::Id, Entry> {
        entries.iter().map(|e| (e.id, e.clone())).collect()
    }

    #[test]
    fn auto_fills_oldest_first() {
        let lease_id = lease::Id::new();
        let older = entry(lease_id, "2026-02-01", "20000");
        let newer = entry(lease_id, "2026-03-01", "20000");
        let p = payment(lease_id, "30000");

        // Input order doesn't matter.
        let matches = auto(&p, [&newer, &older], &HashMap::new());

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].schedule_id, older.id);
        assert_eq!(matches[0].amount, decimal("20000"));
        assert_eq!(matches[1].schedule_id, newer.id);
        assert_eq!(matches[1].amount, decimal("10000"));
        assert!(matches.iter().all(|m| m.payment_id == p.id));
    }

    #[test]
    fn auto_skips_covered_entries() {
        let lease_id = lease::Id::new();
        let paid = entry(lease_id, "2026-01-01", "20000");
        let partial = entry(lease_id, "2026-02-01", "20000");
        let due = entry(lease_id, "2026-03-01", "20000");
        let matched = HashMap::from([
            (paid.id, decimal("20000")),
            (partial.id, decimal("15000")),
        ]);
        let p = payment(lease_id, "10000");

        let matches = auto(&p, [&paid, &partial, &due], &matched);

        assert_eq!(
            matches
                .iter()
                .map(|m| (m.schedule_id, m.amount))
                .collect::<Vec<_>>(),
            [(partial.id, decimal("5000")), (due.id, decimal("5000"))],
        );
    }

    #[test]
    fn auto_never_exceeds_payment() {
        let lease_id = lease::Id::new();
        let entries = [
            entry(lease_id, "2026-01-05", "12500.50"),
            entry(lease_id, "2026-02-05", "12500.50"),
            entry(lease_id, "2026-03-05", "12500.50"),
        ];
        for amount in ["0.01", "12500.50", "20000", "37501.50", "100000"] {
            let p = payment(lease_id, amount);
            let matches = auto(&p, &entries, &HashMap::new());

            let total: Decimal = matches.iter().map(|m| m.amount).sum();
            assert!(total <= p.amount.amount, "{amount}");
            assert!(matches.iter().all(|m| m.amount > Decimal::ZERO));
        }

        let leftover = auto(&payment(lease_id, "100000"), &entries, &HashMap::new());
        let total: Decimal = leftover.iter().map(|m| m.amount).sum();
        assert_eq!(total, decimal("37501.50"));
    }

    #[test]
    fn manual_drops_zero_amounts() {
        let lease_id = lease::Id::new();
        let older = entry(lease_id, "2026-02-01", "20000");
        let newer = entry(lease_id, "2026-03-01", "20000");
        let entries = by_id(&[older.clone(), newer.clone()]);
        let p = payment(lease_id, "30000");

        let matches = manual(
            &p,
            [
                Requested {
                    schedule_id: older.id,
                    amount: decimal("20000"),
                },
                Requested {
                    schedule_id: newer.id,
                    amount: Decimal::ZERO,
                },
            ],
            &entries,
        )
        .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].schedule_id, older.id);
        assert_eq!(matches[0].amount, decimal("20000"));
    }

    #[test]
    fn manual_sums_repeated_entries() {
        let lease_id = lease::Id::new();
        let e = entry(lease_id, "2026-02-01", "20000");
        let p = payment(lease_id, "30000");

        let matches = manual(
            &p,
            [
                Requested {
                    schedule_id: e.id,
                    amount: decimal("5000"),
                },
                Requested {
                    schedule_id: e.id,
                    amount: decimal("7000"),
                },
            ],
            &by_id(&[e.clone()]),
        )
        .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].amount, decimal("12000"));
    }

    #[test]
    fn manual_rejects_over_allocation() {
        let lease_id = lease::Id::new();
        let older = entry(lease_id, "2026-02-01", "20000");
        let newer = entry(lease_id, "2026-03-01", "20000");
        let p = payment(lease_id, "30000");

        assert_eq!(
            manual(
                &p,
                [
                    Requested {
                        schedule_id: older.id,
                        amount: decimal("20000"),
                    },
                    Requested {
                        schedule_id: newer.id,
                        amount: decimal("10000.01"),
                    },
                ],
                &by_id(&[older, newer]),
            ),
            Err(Error::OverAllocation {
                requested: decimal("30000.01"),
                available: decimal("30000"),
            }),
        );
    }

    #[test]
    fn manual_rejects_foreign_and_unknown_entries() {
        let lease_id = lease::Id::new();
        let foreign = entry(lease::Id::new(), "2026-02-01", "20000");
        let p = payment(lease_id, "30000");
        let entries = by_id(&[foreign.clone()]);

        assert_eq!(
            manual(
                &p,
                [Requested {
                    schedule_id: foreign.id,
                    amount: decimal("100"),
                }],
                &entries,
            ),
            Err(Error::MismatchedLease(foreign.id)),
        );

        let unknown = schedule::Id::new();
        assert_eq!(
            manual(
                &p,
                [Requested {
                    schedule_id: unknown,
                    amount: decimal("100"),
                }],
                &entries,
            ),
            Err(Error::EntryNotExists(unknown)),
        );
    }

    #[test]
    fn manual_rejects_negative_amounts() {
        let lease_id = lease::Id::new();
        let e = entry(lease_id, "2026-02-01", "20000");
        let p = payment(lease_id, "30000");

        assert_eq!(
            manual(
                &p,
                [Requested {
                    schedule_id: e.id,
                    amount: decimal("-1"),
                }],
                &by_id(&[e.clone()]),
            ),
            Err(Error::InvalidAmount(e.id)),
        );
    }
}
