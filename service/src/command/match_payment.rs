//! [`Command`] for matching a [`Payment`] against the rent schedule
//! manually.

use std::collections::{HashMap, HashSet};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::reconcile::{self, ScheduleDatabase},
    domain::{
        payment::{self, allocation},
        property, schedule, Caller, Lease, Payment, Property,
    },
    infra::{database, Database},
    query, Query, Service,
};

use super::Command;

/// [`Command`] for replacing all the [`payment::Match`]es of a [`Payment`]
/// with the explicitly requested ones.
///
/// Omitted or zero-amount schedule entries lose their [`payment::Match`]
/// with the [`Payment`].
#[derive(Clone, Debug)]
pub struct MatchPayment {
    /// [`Caller`] matching the [`Payment`].
    pub caller: Caller,

    /// ID of the [`Payment`] to match.
    pub payment_id: payment::Id,

    /// Requested amounts per schedule entry.
    pub allocations: Vec<allocation::Requested>,
}

impl<Db> Command<MatchPayment> for Service<Db>
where
    Self: Query<
        query::lease::ById,
        Ok = Option<Lease>,
        Err = Traced<database::Error>,
    >,
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: ScheduleDatabase
        + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<payment::Match>, payment::Id>>,
            Ok = Vec<payment::Match>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Vec<payment::Match>, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vec<payment::Match>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: MatchPayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MatchPayment {
            caller,
            payment_id,
            allocations,
        } = cmd;

        let payment = self
            .database()
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|p| p.archived_at.is_none())
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;
        _ = self
            .execute(query::lease::ById {
                caller,
                lease_id: payment.lease_id,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent reconciliation of the same `Lease`.
        tx.execute(Lock(By::new(payment.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let entries = tx
            .execute(Select(
                By::<HashMap<schedule::Id, schedule::Entry>, _>::new(
                    allocations
                        .iter()
                        .map(|a| a.schedule_id)
                        .collect::<Vec<_>>(),
                ),
            ))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let matches = allocation::manual(&payment, allocations, &entries)
            .map_err(E::Allocation)
            .map_err(tracerr::wrap!())?;

        let previous = tx
            .execute(Select(By::<Vec<payment::Match>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Delete(By::<Vec<payment::Match>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(matches.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let touched = previous
            .iter()
            .chain(&matches)
            .map(|m| m.schedule_id)
            .collect::<HashSet<_>>();
        reconcile::refresh_schedule(
            &tx,
            payment.lease_id,
            touched,
            self.today(),
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(matches)
    }
}

/// Error of [`MatchPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Requested allocation is invalid.
    #[display("Invalid allocation: {_0}")]
    Allocation(allocation::Error),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            fixture::{self, aed, date, decimal},
            CreatePayment,
        },
        domain::{
            payment::{
                allocation::{self, Requested},
                Method,
            },
            schedule::{self, Status},
            Lease, Payment,
        },
        query, Command as _,
    };

    use super::{ExecutionError, MatchPayment};

    async fn paid_lease(
        setup: &fixture::Setup,
        amount: &str,
    ) -> (Lease, Payment, Vec<schedule::Entry>) {
        let lease = setup.lease("2026-01-01", "2026-04-30", "5000").await;
        let payment = setup
            .svc
            .execute(CreatePayment {
                caller: setup.owner,
                lease_id: lease.id,
                date: date("2026-01-05"),
                amount: aed(amount),
                method: Method::Cash,
                reference: None,
            })
            .await
            .unwrap()
            .payment;
        let entries = entries(setup, &lease).await;
        (lease, payment, entries)
    }

    async fn entries(
        setup: &fixture::Setup,
        lease: &Lease,
    ) -> Vec<schedule::Entry> {
        setup
            .svc
            .execute(query::schedule::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn replaces_previous_matches() {
        let setup = fixture::setup("2026-03-10").await;
        let (lease, payment, before) = paid_lease(&setup, "5000").await;
        assert_eq!(before[0].status, Status::Paid);

        let matches = setup
            .svc
            .execute(MatchPayment {
                caller: setup.owner,
                payment_id: payment.id,
                allocations: vec![
                    Requested {
                        schedule_id: before[0].id,
                        amount: decimal("0"),
                    },
                    Requested {
                        schedule_id: before[2].id,
                        amount: decimal("1500"),
                    },
                    Requested {
                        schedule_id: before[2].id,
                        amount: decimal("1500"),
                    },
                ],
            })
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].amount, decimal("3000"));
        let after = entries(&setup, &lease).await;
        assert_eq!(after[0].status, Status::Overdue);
        assert_eq!(after[0].paid, None);
        assert_eq!(after[1].status, Status::Overdue);
        assert_eq!(after[2].status, Status::Partial);
        assert_eq!(after[2].paid, Some(decimal("3000")));
        assert_eq!(after[3].status, Status::Due);
    }

    #[tokio::test]
    async fn rejects_over_allocation() {
        let setup = fixture::setup("2026-03-10").await;
        let (_, payment, entries) = paid_lease(&setup, "5000").await;

        let err = setup
            .svc
            .execute(MatchPayment {
                caller: setup.owner,
                payment_id: payment.id,
                allocations: entries
                    .iter()
                    .map(|e| Requested {
                        schedule_id: e.id,
                        amount: decimal("2000"),
                    })
                    .collect(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Allocation(allocation::Error::OverAllocation {
                ..
            }),
        ));
    }

    #[tokio::test]
    async fn rejects_entries_of_another_lease() {
        let setup = fixture::setup("2026-03-10").await;
        let (_, payment, _) = paid_lease(&setup, "5000").await;
        let other = setup.lease("2026-05-01", "2026-08-31", "5000").await;
        let foreign = entries(&setup, &other).await;

        let err = setup
            .svc
            .execute(MatchPayment {
                caller: setup.owner,
                payment_id: payment.id,
                allocations: vec![Requested {
                    schedule_id: foreign[0].id,
                    amount: decimal("100"),
                }],
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Allocation(allocation::Error::MismatchedLease(id))
                if *id == foreign[0].id,
        ));
    }
}
