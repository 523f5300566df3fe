//! [`Query`] collection related to [`Cheque`]s.

use common::operations::{By, Select};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Property;
use crate::{
    domain::{lease, Caller, Cheque, Lease},
    infra::{database, Database},
    query, read, Query, Service,
};

/// Queries all the [`Cheque`]s of a [`Lease`], if its [`Property`] is
/// accessible by the [`Caller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ByLease {
    /// [`Caller`] performing the [`Query`].
    pub caller: Caller,

    /// ID of the [`Lease`] to query the [`Cheque`]s of.
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
        Select<By<Vec<Cheque>, lease::Id>>,
        Ok = Vec<Cheque>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Vec<Cheque>>;
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
            .execute(Select(By::<Vec<Cheque>, _>::new(lease_id)))
            .await
            .map_err(tracerr::wrap!())
            .map(Some)
    }
}

/// Queries the non-archived [`Cheque`]s awaiting clearance, dated within the
/// provided number of days from today, of the [`Property`]s accessible by
/// the [`Caller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Upcoming {
    /// [`Caller`] performing the [`Query`].
    pub caller: Caller,

    /// Number of days from today the [`Cheque`]s should be dated within.
    pub within_days: u16,
}

impl<Db> Query<Upcoming> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Cheque>, read::cheque::Upcoming>>,
        Ok = Vec<Cheque>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Cheque>;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: Upcoming) -> Result<Self::Ok, Self::Err> {
        let Upcoming {
            caller,
            within_days,
        } = query;

        let from = self.today();
        // `u16` days never overflow the supported date range from today.
        let to = from.add_days(i64::from(within_days)).unwrap_or(from);

        self.database()
            .execute(Select(By::new(read::cheque::Upcoming {
                caller,
                from,
                to,
            })))
            .await
            .map_err(tracerr::wrap!())
    }
}
