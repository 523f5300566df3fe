//! [`Command`] for deleting a [`Lease`].

use common::operations::{By, Commit, Delete, Lock, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::reconcile::{self, OccupancyDatabase},
    domain::{lease, property, Caller, Lease, Property},
    infra::{database, Database},
    query, Query, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Lease`] permanently, along with its rent
/// schedule, [`Cheque`]s and [`Payment`]s.
///
/// [`Cheque`]: crate::domain::Cheque
/// [`Payment`]: crate::domain::Payment
#[derive(Clone, Copy, Debug)]
pub struct DeleteLease {
    /// [`Caller`] deleting the [`Lease`].
    pub caller: Caller,

    /// ID of the [`Lease`] to delete.
    pub lease_id: lease::Id,
}

impl<Db> Command<DeleteLease> for Service<Db>
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
            Delete<By<Lease, lease::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteLease { caller, lease_id } = cmd;

        let lease = self
            .execute(query::lease::ById { caller, lease_id })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(lease.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Lease, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        _ = reconcile::refresh_occupancy(
            &tx,
            lease.property_id,
            self.today(),
            Some(lease_id),
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(lease)
    }
}

/// Error of [`DeleteLease`] [`Command`] execution.
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
