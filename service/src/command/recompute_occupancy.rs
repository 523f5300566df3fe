//! [`Command`] for re-deriving the [`Occupancy`] of a [`Property`].

use common::operations::{By, Commit, Lock, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::property::Occupancy;
use crate::{
    command::reconcile::{self, OccupancyDatabase},
    domain::{lease, property, Caller, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for re-deriving the [`Occupancy`] of a [`Property`] from its
/// [`Lease`]s.
///
/// [`Lease`]: crate::domain::Lease
#[derive(Clone, Copy, Debug)]
pub struct RecomputeOccupancy {
    /// [`Caller`] requesting the recomputation.
    pub caller: Caller,

    /// ID of the [`Property`] to recompute the [`Occupancy`] of.
    pub property_id: property::Id,

    /// ID of the [`Lease`] to not take into account, if any.
    ///
    /// [`Lease`]: crate::domain::Lease
    pub excluded_lease: Option<lease::Id>,
}

impl<Db> Command<RecomputeOccupancy> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Property>, (property::Id, Caller)>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: OccupancyDatabase
        + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecomputeOccupancy,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecomputeOccupancy {
            caller,
            property_id,
            excluded_lease,
        } = cmd;

        _ = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new((
                property_id,
                caller,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let property = reconcile::refresh_occupancy(
            &tx,
            property_id,
            self.today(),
            excluded_lease,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?
        .ok_or(E::PropertyNotExists(property_id))
        .map_err(tracerr::wrap!())?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(property)
    }
}

/// Error of [`RecomputeOccupancy`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture,
        domain::{account, property::Occupancy, Caller},
        Command as _,
    };

    use super::{ExecutionError, RecomputeOccupancy};

    #[tokio::test]
    async fn follows_the_calendar() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;
        let cmd = RecomputeOccupancy {
            caller: setup.owner,
            property_id: setup.property.id,
            excluded_lease: None,
        };

        let property = setup.svc.execute(cmd).await.unwrap();
        assert_eq!(property.occupancy, Occupancy::Occupied);

        let later = fixture::at(&setup.svc, "2026-07-01");
        let property = later.execute(cmd).await.unwrap();
        assert_eq!(property.occupancy, Occupancy::Vacant);

        let property = setup
            .svc
            .execute(RecomputeOccupancy {
                excluded_lease: Some(lease.id),
                ..cmd
            })
            .await
            .unwrap();
        assert_eq!(property.occupancy, Occupancy::Vacant);
    }

    #[tokio::test]
    async fn hides_inaccessible_property() {
        let setup = fixture::setup("2026-01-01").await;

        let err = setup
            .svc
            .execute(RecomputeOccupancy {
                caller: Caller::manager(account::Id::new()),
                property_id: setup.property.id,
                excluded_lease: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PropertyNotExists(_),
        ));
    }
}
