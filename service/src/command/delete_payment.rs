//! [`Command`] for deleting a [`Payment`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::Config;
use crate::{
    command::reconcile::{self, ScheduleDatabase},
    domain::{payment, property, Caller, Lease, Payment, Property},
    infra::{database, Database},
    query, Query, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Payment`] along with its
/// [`payment::Match`]es.
///
/// Schedule entries the [`Payment`] was matched against are re-derived only
/// if [`Config::refresh_schedule_on_payment_deletion`] is enabled.
#[derive(Clone, Copy, Debug)]
pub struct DeletePayment {
    /// [`Caller`] deleting the [`Payment`].
    pub caller: Caller,

    /// ID of the [`Payment`] to delete.
    pub payment_id: payment::Id,
}

impl<Db> Command<DeletePayment> for Service<Db>
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
            Delete<By<Payment, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeletePayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeletePayment { caller, payment_id } = cmd;

        let payment = self
            .database()
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
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

        let matches = tx
            .execute(Select(By::<Vec<payment::Match>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Delete(By::<Payment, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if self.config().refresh_schedule_on_payment_deletion {
            reconcile::refresh_schedule(
                &tx,
                payment.lease_id,
                matches.iter().map(|m| m.schedule_id),
                self.today(),
            )
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        } else if !matches.is_empty() {
            log::debug!(
                "`Payment(id: {payment_id})` deleted leaving {} schedule \
                 entries of `Lease(id: {})` not re-derived",
                matches.len(),
                payment.lease_id,
            );
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`DeletePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
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
            fixture::{self, aed, date},
            CreatePayment,
        },
        domain::{payment::Method, schedule::Status, Lease, Payment},
        query, Command as _, FixedClock, Service,
    };

    use super::{DeletePayment, ExecutionError};

    async fn paid(setup: &fixture::Setup) -> (Lease, Payment) {
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;
        let payment = setup
            .svc
            .execute(CreatePayment {
                caller: setup.owner,
                lease_id: lease.id,
                date: date("2026-01-03"),
                amount: aed("5000"),
                method: Method::Cash,
                reference: None,
            })
            .await
            .unwrap()
            .payment;
        (lease, payment)
    }

    async fn first_status(setup: &fixture::Setup, lease: &Lease) -> Status {
        setup
            .svc
            .execute(query::schedule::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap()[0]
            .status
    }

    #[tokio::test]
    async fn leaves_schedule_stale_by_default() {
        let setup = fixture::setup("2026-02-10").await;
        let (lease, payment) = paid(&setup).await;

        _ = setup
            .svc
            .execute(DeletePayment {
                caller: setup.owner,
                payment_id: payment.id,
            })
            .await
            .unwrap();

        assert_eq!(first_status(&setup, &lease).await, Status::Paid);
        let payments = setup
            .svc
            .execute(query::payment::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        assert!(payments.is_empty());
    }

    #[tokio::test]
    async fn refreshes_schedule_if_configured() {
        let mut setup = fixture::setup("2026-02-10").await;
        let mut config = setup.svc.config().clone();
        config.refresh_schedule_on_payment_deletion = true;
        setup.svc = Service::with_clock(
            config,
            setup.svc.database().clone(),
            FixedClock(date("2026-02-10")),
        );
        let (lease, payment) = paid(&setup).await;

        _ = setup
            .svc
            .execute(DeletePayment {
                caller: setup.owner,
                payment_id: payment.id,
            })
            .await
            .unwrap();

        assert_eq!(first_status(&setup, &lease).await, Status::Overdue);
    }

    #[tokio::test]
    async fn fails_on_missing_payment() {
        let setup = fixture::setup("2026-02-10").await;
        let (_, payment) = paid(&setup).await;
        let cmd = DeletePayment {
            caller: setup.owner,
            payment_id: payment.id,
        };
        _ = setup.svc.execute(cmd).await.unwrap();

        let err = setup.svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PaymentNotExists(id) if *id == payment.id,
        ));
    }
}
