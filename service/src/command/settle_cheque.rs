//! [`Command`] for producing the [`Payment`] of a cleared [`Cheque`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    command::reconcile::{self, ScheduleDatabase},
    domain::{
        cheque::{self, Status},
        payment::{self, Method, Reference},
        property, Caller, Cheque, Lease, Payment, Property,
    },
    infra::{database, database::constraint, Database},
    query, Query, Service,
};

use super::Command;

/// [`Command`] for producing the [`Payment`] of a cleared [`Cheque`] and
/// auto-matching it against the rent schedule.
///
/// Returns the existing [`Payment`] if the [`Cheque`] has produced one
/// already, so it's safe to retry.
#[derive(Clone, Copy, Debug)]
pub struct SettleCheque {
    /// [`Caller`] settling the [`Cheque`].
    pub caller: Caller,

    /// ID of the cleared [`Cheque`].
    pub cheque_id: cheque::Id,
}

impl<Db> Command<SettleCheque> for Service<Db>
where
    Self: Query<
        query::lease::ById,
        Ok = Option<Lease>,
        Err = Traced<database::Error>,
    >,
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Cheque>, cheque::Id>>,
            Ok = Option<Cheque>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, cheque::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: ScheduleDatabase
        + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, cheque::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SettleCheque) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SettleCheque { caller, cheque_id } = cmd;

        let cheque = self
            .database()
            .execute(Select(By::<Option<Cheque>, _>::new(cheque_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|c| c.archived_at.is_none())
            .ok_or(E::ChequeNotExists(cheque_id))
            .map_err(tracerr::wrap!())?;
        _ = self
            .execute(query::lease::ById {
                caller,
                lease_id: cheque.lease_id,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ChequeNotExists(cheque_id))
            .map_err(tracerr::wrap!())?;
        if cheque.status != Status::Cleared {
            return Err(tracerr::new!(E::NotCleared(cheque.status)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent reconciliation of the same `Lease`.
        tx.execute(Lock(By::new(cheque.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Some(existing) = tx
            .execute(Select(By::<Option<Payment>, _>::new(cheque_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Ok(existing);
        }

        let payment = Payment {
            id: payment::Id::new(),
            lease_id: cheque.lease_id,
            property_id: cheque.property_id,
            tenant_id: cheque.tenant_id,
            cheque_id: Some(cheque_id),
            date: cheque.payment_date(),
            amount: cheque.amount,
            method: Method::Cheque,
            reference: Reference::new(cheque.payment_reference()),
            created_at: DateTime::now().coerce(),
            archived_at: None,
        };
        match tx.execute(Insert(payment.clone())).await {
            Ok(_) => {}
            Err(e)
                if e.as_ref().is_unique_violation(Some(
                    constraint::PAYMENTS_CHEQUE_ID,
                )) =>
            {
                drop(tx);
                log::debug!(
                    "`Cheque(id: {cheque_id})` is settled concurrently",
                );
                return self
                    .database()
                    .execute(Select(By::<Option<Payment>, _>::new(cheque_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::ChequeNotExists(cheque_id))
                    .map_err(tracerr::wrap!());
            }
            Err(e) => {
                return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
            }
        }

        _ = reconcile::auto_match(&tx, &payment, self.today())
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`SettleCheque`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Cheque`] with the provided ID does not exist.
    #[display("`Cheque(id: {_0})` does not exist")]
    ChequeNotExists(#[error(not(source))] cheque::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Cheque`] is not cleared, so produces no [`Payment`].
    #[display("`Cheque` is not cleared, but `{_0}`")]
    NotCleared(#[error(not(source))] Status),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select, Update};

    use crate::{
        command::{
            fixture::{self, aed, date},
            CreateCheque,
        },
        domain::{
            cheque::{BankName, Number, Status},
            payment::Method,
            Cheque,
        },
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError, SettleCheque};

    #[tokio::test]
    async fn returns_existing_payment_on_retry() {
        let setup = fixture::setup("2026-03-05").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;
        let mut cheque = setup
            .svc
            .execute(CreateCheque {
                caller: setup.owner,
                lease_id: lease.id,
                number: Number::new("777001").unwrap(),
                bank_name: BankName::new("ADCB").unwrap(),
                date: date("2026-03-01"),
                amount: aed("12000"),
                covers_period: None,
            })
            .await
            .unwrap();
        cheque.status = Status::Cleared;
        cheque.settled_on = Some(date("2026-03-04"));
        setup
            .svc
            .database()
            .execute(Update(cheque.clone()))
            .await
            .unwrap();

        let cmd = SettleCheque {
            caller: setup.owner,
            cheque_id: cheque.id,
        };
        let first = setup.svc.execute(cmd).await.unwrap();
        let second = setup.svc.execute(cmd).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.cheque_id, Some(cheque.id));
        assert_eq!(first.method, Method::Cheque);
        assert_eq!(first.date, date("2026-03-04"));
        assert_eq!(first.amount, aed("12000"));

        let stored = setup
            .svc
            .database()
            .execute(Select(By::<Option<Cheque>, _>::new(cheque.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, Status::Cleared);
    }

    #[tokio::test]
    async fn rejects_uncleared_cheque() {
        let setup = fixture::setup("2026-03-05").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;
        let cheque = setup
            .svc
            .execute(CreateCheque {
                caller: setup.owner,
                lease_id: lease.id,
                number: Number::new("777002").unwrap(),
                bank_name: BankName::new("ADCB").unwrap(),
                date: date("2026-03-01"),
                amount: aed("5000"),
                covers_period: None,
            })
            .await
            .unwrap();

        let err = setup
            .svc
            .execute(SettleCheque {
                caller: setup.owner,
                cheque_id: cheque.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotCleared(Status::Received),
        ));
    }
}
