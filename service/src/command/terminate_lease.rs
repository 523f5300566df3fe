//! [`Command`] for terminating a [`Lease`] early.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::reconcile::{self, OccupancyDatabase},
    domain::{lease, property, Caller, Lease, Property},
    infra::{database, Database},
    query, Query, Service,
};

use super::Command;

/// [`Command`] for terminating a [`Lease`] early.
///
/// The rent schedule of the [`Lease`] stays untouched.
#[derive(Clone, Copy, Debug)]
pub struct TerminateLease {
    /// [`Caller`] terminating the [`Lease`].
    pub caller: Caller,

    /// ID of the [`Lease`] to terminate.
    pub lease_id: lease::Id,

    /// [`Date`] of the termination.
    pub date: Date,
}

impl<Db> Command<TerminateLease> for Service<Db>
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
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: TerminateLease,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TerminateLease {
            caller,
            lease_id,
            date,
        } = cmd;

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
            .filter(|l| !l.is_archived())
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        lease
            .terminate(date)
            .map_err(E::Termination)
            .map_err(tracerr::wrap!())?;

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
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

/// Error of [`TerminateLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// [`Lease`] cannot be terminated on the provided [`Date`].
    #[display("Cannot terminate `Lease`: {_0}")]
    Termination(lease::TerminationError),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::{self, date},
        domain::{lease::TerminationError, property::Occupancy},
        query, Command as _,
    };

    use super::{ExecutionError, TerminateLease};

    #[tokio::test]
    async fn vacates_property_once_termination_date_passes() {
        let setup = fixture::setup("2026-03-10").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;

        let terminated = setup
            .svc
            .execute(TerminateLease {
                caller: setup.owner,
                lease_id: lease.id,
                date: date("2026-03-10"),
            })
            .await
            .unwrap();

        assert_eq!(terminated.termination_date, Some(date("2026-03-10")));
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

        let schedule = setup
            .svc
            .execute(query::schedule::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(schedule.len(), 12);
    }

    #[tokio::test]
    async fn keeps_property_occupied_until_termination_date() {
        let setup = fixture::setup("2026-03-10").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;

        _ = setup
            .svc
            .execute(TerminateLease {
                caller: setup.owner,
                lease_id: lease.id,
                date: date("2026-06-30"),
            })
            .await
            .unwrap();

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
    async fn terminates_only_once_within_period() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;
        let terminate = |d| TerminateLease {
            caller: setup.owner,
            lease_id: lease.id,
            date: date(d),
        };

        let err = setup
            .svc
            .execute(terminate("2027-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Termination(TerminationError::OutOfPeriod(_)),
        ));

        _ = setup.svc.execute(terminate("2026-06-30")).await.unwrap();

        let err = setup
            .svc
            .execute(terminate("2026-07-31"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Termination(
                TerminationError::AlreadyTerminated(d),
            ) if *d == date("2026-06-30"),
        ));
    }
}
