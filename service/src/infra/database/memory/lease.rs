//! [`Lease`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{lease, property, Lease},
    infra::{
        database::{self, Memory},
        Database,
    },
};

impl Database<Select<By<Option<Lease>, lease::Id>>> for Memory {
    type Ok = Option<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lease>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().await.leases.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Vec<Lease>, property::Id>>> for Memory {
    type Ok = Vec<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Lease>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property_id = by.into_inner();
        let mut leases = self
            .state()
            .await
            .leases
            .values()
            .filter(|l| l.property_id == property_id)
            .cloned()
            .collect::<Vec<_>>();
        leases.sort_by_key(|l| (l.period.start(), l.created_at));
        Ok(leases)
    }
}

impl Database<Insert<Lease>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(lease): Insert<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(lease)).await
    }
}

impl Database<Update<Lease>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(lease): Update<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().await.leases.insert(lease.id, lease);
        Ok(())
    }
}

impl Database<Delete<By<Lease, lease::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Lease, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut state = self.state().await;

        if state.leases.remove(&id).is_none() {
            return Ok(());
        }
        state.schedule.retain(|_, e| e.lease_id != id);
        state.cheques.retain(|_, c| c.lease_id != id);
        state.payments.retain(|_, p| p.lease_id != id);

        state.remove_orphaned_matches();
        Ok(())
    }
}
