//! [`Command`] for restoring an archived [`Lease`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
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

/// [`Command`] for restoring an archived [`Lease`] along with its
/// [`Cheque`]s and [`Payment`]s.
///
/// Restoring a non-archived [`Lease`] changes nothing.
#[derive(Clone, Copy, Debug)]
pub struct RestoreLease {
    /// [`Caller`] restoring the [`Lease`].
    pub caller: Caller,

    /// ID of the [`Lease`] to restore.
    pub lease_id: lease::Id,
}

impl<Db> Command<RestoreLease> for Service<Db>
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

    async fn execute(&self, cmd: RestoreLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RestoreLease { caller, lease_id } = cmd;

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

        // Avoid concurrent overlapping `Lease`s of the same `Property`.
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
        if !lease.is_archived() {
            return Ok(lease);
        }

        if let Some(existing) = tx
            .execute(Select(By::<Vec<Lease>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .find(|l| l.id != lease_id && l.conflicts_with(&lease.period))
        {
            return Err(tracerr::new!(E::Overlap(existing.id)));
        }

        lease.archived_at = None;
        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let cheques = tx
            .execute(Select(By::<Vec<Cheque>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        for mut cheque in
            cheques.into_iter().filter(|c| c.archived_at.is_some())
        {
            cheque.archived_at = None;
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
            payments.into_iter().filter(|p| p.archived_at.is_some())
        {
            payment.archived_at = None;
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

/// Error of [`RestoreLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// Restored [`Lease`] overlaps another non-archived one of the same
    /// [`Property`].
    #[display("`Lease` overlaps the existing `Lease(id: {_0})`")]
    Overlap(#[error(not(source))] lease::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            fixture::{self, aed, date},
            ArchiveLease, CreatePayment,
        },
        domain::{payment::Method, property::Occupancy},
        query, Command as _,
    };

    use super::{ExecutionError, RestoreLease};

    #[tokio::test]
    async fn restores_lease_with_payments_and_occupancy() {
        let setup = fixture::setup("2026-02-01").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;
        _ = setup
            .svc
            .execute(CreatePayment {
                caller: setup.owner,
                lease_id: lease.id,
                date: date("2026-01-01"),
                amount: aed("5000"),
                method: Method::Upi,
                reference: None,
            })
            .await
            .unwrap();
        _ = setup
            .svc
            .execute(ArchiveLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap();

        let restored = setup
            .svc
            .execute(RestoreLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap();

        assert!(restored.archived_at.is_none());
        let payments = setup
            .svc
            .execute(query::payment::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        assert!(payments.iter().all(|p| p.archived_at.is_none()));
        let property = setup
            .svc
            .execute(query::property::ById::by((
                setup.property.id,
                setup.owner,
            )))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(property.occupancy, Occupancy::Occupied);
    }

    #[tokio::test]
    async fn rejects_overlap_with_newer_lease() {
        let setup = fixture::setup("2026-02-01").await;
        let old = setup.lease("2026-01-01", "2026-12-31", "5000").await;
        _ = setup
            .svc
            .execute(ArchiveLease {
                caller: setup.owner,
                lease_id: old.id,
            })
            .await
            .unwrap();
        let new = setup.lease("2026-02-01", "2026-12-31", "6000").await;

        let err = setup
            .svc
            .execute(RestoreLease {
                caller: setup.owner,
                lease_id: old.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Overlap(id) if *id == new.id,
        ));
    }

    #[tokio::test]
    async fn ignores_non_archived_lease() {
        let setup = fixture::setup("2026-02-01").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;

        let restored = setup
            .svc
            .execute(RestoreLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap();

        assert_eq!(restored.id, lease.id);
        assert!(restored.archived_at.is_none());
    }
}
