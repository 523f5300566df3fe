//! [`Property`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{property, Caller, Property},
    infra::{
        database::{self, Memory},
        Database,
    },
};

impl Database<Select<By<Option<Property>, property::Id>>> for Memory {
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().await.properties.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Property>, (property::Id, Caller)>>>
    for Memory
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, (property::Id, Caller)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, caller) = by.into_inner();
        let state = self.state().await;
        Ok(state
            .properties
            .get(&id)
            .filter(|p| state.can_access(p, &caller))
            .cloned())
    }
}

impl Database<Select<By<Vec<Property>, Caller>>> for Memory {
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, Caller>>,
    ) -> Result<Self::Ok, Self::Err> {
        let caller = by.into_inner();
        let state = self.state().await;
        let mut properties = state
            .properties
            .values()
            .filter(|p| p.archived_at.is_none())
            .filter(|p| state.can_access(p, &caller))
            .cloned()
            .collect::<Vec<_>>();
        properties.sort_by_key(|p| p.created_at);
        Ok(properties)
    }
}

impl Database<Insert<Property>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(property)).await
    }
}

impl Database<Update<Property>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().await.properties.insert(property.id, property);
        Ok(())
    }
}

impl Database<Lock<By<Property, property::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}
