//! [`Query`] collection related to rent schedules.

use common::operations::{By, Select};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Property;
use crate::{
    domain::{lease, schedule, Caller, Lease},
    infra::{database, Database},
    query, Query, Service,
};

/// Queries the rent schedule of a [`Lease`] ordered by due date, if its
/// [`Property`] is accessible by the [`Caller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ByLease {
    /// [`Caller`] performing the [`Query`].
    pub caller: Caller,

    /// ID of the [`Lease`] to query the schedule of.
    pub lease_id: lease::Id,
}

impl<Db> Query<ByLease> for Service<Db>
where
    Self: Query<
        query::lease::ById,
        Ok = Option<Lease>,
        Err = Traced<database::Error>,
    >,
    Db: Database<
        Select<By<Vec<schedule::Entry>, lease::Id>>,
        Ok = Vec<schedule::Entry>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Vec<schedule::Entry>>;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: ByLease) -> Result<Self::Ok, Self::Err> {
        let ByLease { caller, lease_id } = query;

        if self
            .execute(query::lease::ById { caller, lease_id })
            .await
            .map_err(tracerr::wrap!())?
            .is_none()
        {
            return Ok(None);
        }

        self.database()
            .execute(Select(By::<Vec<schedule::Entry>, _>::new(lease_id)))
            .await
            .map_err(tracerr::wrap!())
            .map(Some)
    }
}
