//! [`Query`] collection related to [`Payment`]s.

use common::operations::{By, Select};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Property;
use crate::{
    domain::{lease, payment, Caller, Lease, Payment},
    infra::{database, Database},
    query, Query, Service,
};

/// Queries all the [`Payment`]s of a [`Lease`], if its [`Property`] is
/// accessible by the [`Caller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ByLease {
    /// [`Caller`] performing the [`Query`].
    pub caller: Caller,

    /// ID of the [`Lease`] to query the [`Payment`]s of.
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
        Select<By<Vec<Payment>, lease::Id>>,
        Ok = Vec<Payment>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Vec<Payment>>;
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
            .execute(Select(By::<Vec<Payment>, _>::new(lease_id)))
            .await
            .map_err(tracerr::wrap!())
            .map(Some)
    }
}

/// Queries the [`payment::Match`]es of a [`Payment`], if the [`Property`] of
/// its [`Lease`] is accessible by the [`Caller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Matches {
    /// [`Caller`] performing the [`Query`].
    pub caller: Caller,

    /// ID of the [`Payment`] to query the [`payment::Match`]es of.
    pub payment_id: payment::Id,
}

impl<Db> Query<Matches> for Service<Db>
where
    Self: Query<
        query::lease::ById,
        Ok = Option<Lease>,
        Err = Traced<database::Error>,
    >,
    Db: Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<payment::Match>, payment::Id>>,
            Ok = Vec<payment::Match>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<Vec<payment::Match>>;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: Matches) -> Result<Self::Ok, Self::Err> {
        let Matches { caller, payment_id } = query;

        let Some(payment) = self
            .database()
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };
        if self
            .execute(query::lease::ById {
                caller,
                lease_id: payment.lease_id,
            })
            .await
            .map_err(tracerr::wrap!())?
            .is_none()
        {
            return Ok(None);
        }

        self.database()
            .execute(Select(By::<Vec<payment::Match>, _>::new(payment.id)))
            .await
            .map_err(tracerr::wrap!())
            .map(Some)
    }
}
