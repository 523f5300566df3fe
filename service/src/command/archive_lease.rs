//! [`Command`] for archiving a [`Lease`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::reconcile::{self, OccupancyDatabase},
    domain::{lease, property, Caller, Cheque, Lease, Payment, Property},
    infra::{database, Database},
    query, Query, Service,
};

use super::Command;

/// [`Command`] for archiving a [`Lease`] along with its [`Cheque`]s and
/// [`Payment`]s.
///
/// Archiving an already archived [`Lease`] changes nothing.
#[derive(Clone, Copy, Debug)]
pub struct ArchiveLease {
    /// [`Caller`] archiving the [`Lease`].
    pub caller: Caller,

    /// ID of the [`Lease`] to archive.
    pub lease_id: lease::Id,
}

impl<Db> Command<ArchiveLease> for Service<Db>
where
    Self: Query<
        query::lease::ById,
        Ok = Option<Lease>,
        Err = Traced<database::Error>,
    >,
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: OccupancyDatabase
        + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Cheque>, lease::Id>>,
            Ok = Vec<Cheque>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, lease::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<Update<Cheque>, Err = Traced<database::Error>>
        + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ArchiveLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ArchiveLease { caller, lease_id } = cmd;

        let property_id = self
            .execute(query::lease::ById { caller, lease_id })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?
            .property_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut lease = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        if lease.is_archived() {
            return Ok(lease);
        }

        let now = DateTime::now();
        lease.archived_at = Some(now.coerce());
        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let cheques = tx
            .execute(Select(By::<Vec<Cheque>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        for mut cheque in
            cheques.into_iter().filter(|c| c.archived_at.is_none())
        {
            cheque.archived_at = Some(now.coerce());
            tx.execute(Update(cheque))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        let payments = tx
            .execute(Select(By::<Vec<Payment>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        for mut payment in
            payments.into_iter().filter(|p| p.archived_at.is_none())
        {
            payment.archived_at = Some(now.coerce());
            tx.execute(Update(payment))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        _ = reconcile::refresh_occupancy(&tx, property_id, self.today(), None)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(lease)
    }
}

/// Error of [`ArchiveLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            fixture::{self, aed, date},
            CreateCheque, CreatePayment,
        },
        domain::{
            cheque::{BankName, Number},
            payment::Method,
            property::Occupancy,
        },
        query, Command as _,
    };

    use super::ArchiveLease;

    #[tokio::test]
    async fn cascades_to_cheques_and_payments() {
        let setup = fixture::setup("2026-02-01").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;
        _ = setup
            .svc
            .execute(CreateCheque {
                caller: setup.owner,
                lease_id: lease.id,
                number: Number::new("100201").unwrap(),
                bank_name: BankName::new("Emirates NBD").unwrap(),
                date: date("2026-03-01"),
                amount: aed("5000"),
                covers_period: None,
            })
            .await
            .unwrap();
        _ = setup
            .svc
            .execute(CreatePayment {
                caller: setup.owner,
                lease_id: lease.id,
                date: date("2026-01-01"),
                amount: aed("5000"),
                method: Method::Cash,
                reference: None,
            })
            .await
            .unwrap();

        let archived = setup
            .svc
            .execute(ArchiveLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap();

        let archived_at = archived.archived_at.unwrap();
        let cheques = setup
            .svc
            .execute(query::cheque::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cheques.len(), 1);
        assert!(cheques
            .iter()
            .all(|c| c.archived_at.map(|at| at.coerce()) == Some(archived_at)));
        let payments = setup
            .svc
            .execute(query::payment::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payments.len(), 1);
        assert!(payments
            .iter()
            .all(|p| p.archived_at.map(|at| at.coerce()) == Some(archived_at)));

        let property = setup
            .svc
            .execute(query::property::ById::by((
                setup.property.id,
                setup.owner,
            )))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(property.occupancy, Occupancy::Vacant);
    }

    #[tokio::test]
    async fn is_idempotent() {
        let setup = fixture::setup("2026-02-01").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;
        let cmd = ArchiveLease {
            caller: setup.owner,
            lease_id: lease.id,
        };

        let first = setup.svc.execute(cmd).await.unwrap();
        let second = setup.svc.execute(cmd).await.unwrap();

        assert_eq!(first.archived_at, second.archived_at);
    }
}
