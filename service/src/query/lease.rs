//! [`Query`] collection related to [`Lease`]s.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{lease, property, schedule, Caller, Lease, Property},
    infra::{database, Database},
    read, Query, Service,
};

/// Queries a [`Lease`] by its [`lease::Id`], if its [`Property`] is
/// accessible by the [`Caller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ById {
    /// [`Caller`] performing the [`Query`].
    pub caller: Caller,

    /// ID of the [`Lease`] to query.
    pub lease_id: lease::Id,
}

impl<Db> Query<ById> for Service<Db>
where
    Db: Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, (property::Id, Caller)>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: ById) -> Result<Self::Ok, Self::Err> {
        let ById { caller, lease_id } = query;

        let Some(lease) = self
            .database()
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        Ok(self
            .database()
            .execute(Select(By::<Option<Property>, _>::new((
                lease.property_id,
                caller,
            ))))
            .await
            .map_err(tracerr::wrap!())?
            .map(|_| lease))
    }
}

/// Queries all the [`Lease`]s of a [`Property`], if it's accessible by the
/// [`Caller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ByProperty {
    /// [`Caller`] performing the [`Query`].
    pub caller: Caller,

    /// ID of the [`Property`] to query the [`Lease`]s of.
    pub property_id: property::Id,
}

impl<Db> Query<ByProperty> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Lease>, property::Id>>,
            Ok = Vec<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, (property::Id, Caller)>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<Vec<Lease>>;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: ByProperty) -> Result<Self::Ok, Self::Err> {
        let ByProperty {
            caller,
            property_id,
        } = query;

        if self
            .database()
            .execute(Select(By::<Option<Property>, _>::new((
                property_id,
                caller,
            ))))
            .await
            .map_err(tracerr::wrap!())?
            .is_none()
        {
            return Ok(None);
        }

        self.database()
            .execute(Select(By::<Vec<Lease>, _>::new(property_id)))
            .await
            .map_err(tracerr::wrap!())
            .map(Some)
    }
}

/// Queries the [`read::lease::Balance`] of a [`Lease`], if its [`Property`]
/// is accessible by the [`Caller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Balance {
    /// [`Caller`] performing the [`Query`].
    pub caller: Caller,

    /// ID of the [`Lease`] to query the balance of.
    pub lease_id: lease::Id,
}

impl<Db> Query<Balance> for Service<Db>
where
    Self: Query<ById, Ok = Option<Lease>, Err = Traced<database::Error>>,
    Db: Database<
        Select<By<Vec<schedule::Entry>, lease::Id>>,
        Ok = Vec<schedule::Entry>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<read::lease::Balance>;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: Balance) -> Result<Self::Ok, Self::Err> {
        let Balance { caller, lease_id } = query;

        let Some(lease) = self
            .execute(ById { caller, lease_id })
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let entries = self
            .database()
            .execute(Select(By::<Vec<schedule::Entry>, _>::new(lease.id)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Some(read::lease::Balance::of(
            &entries,
            lease.rent.currency,
            self.today(),
        )))
    }
}
