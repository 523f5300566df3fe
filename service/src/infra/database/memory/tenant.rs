//! [`Tenant`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{tenant, Tenant},
    infra::{
        database::{self, Memory},
        Database,
    },
};

impl Database<Select<By<Option<Tenant>, tenant::Id>>> for Memory {
    type Ok = Option<Tenant>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Tenant>, tenant::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().await.tenants.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<Tenant>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(tenant): Insert<Tenant>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().await.tenants.insert(tenant.id, tenant);
        Ok(())
    }
}
