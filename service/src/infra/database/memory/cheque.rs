//! [`Cheque`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{cheque, lease, Cheque},
    infra::{
        database::{self, Memory},
        Database,
    },
    read,
};

impl Database<Select<By<Option<Cheque>, cheque::Id>>> for Memory {
    type Ok = Option<Cheque>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Cheque>, cheque::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().await.cheques.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Vec<Cheque>, lease::Id>>> for Memory {
    type Ok = Vec<Cheque>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Cheque>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();
        let mut cheques = self
            .state()
            .await
            .cheques
            .values()
            .filter(|c| c.lease_id == lease_id)
            .cloned()
            .collect::<Vec<_>>();
        cheques.sort_by_key(|c| (c.date, c.created_at));
        Ok(cheques)
    }
}

impl Database<Select<By<Vec<Cheque>, read::cheque::Upcoming>>> for Memory {
    type Ok = Vec<Cheque>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Cheque>, read::cheque::Upcoming>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::cheque::Upcoming { caller, from, to } = by.into_inner();
        let state = self.state().await;
        let mut cheques = state
            .cheques
            .values()
            .filter(|c| c.archived_at.is_none())
            .filter(|c| {
                matches!(
                    c.status,
                    cheque::Status::Received | cheque::Status::Deposited,
                )
            })
            .filter(|c| (from..=to).contains(&c.date))
            .filter(|c| {
                state
                    .properties
                    .get(&c.property_id)
                    .is_some_and(|p| state.can_access(p, &caller))
            })
            .cloned()
            .collect::<Vec<_>>();
        cheques.sort_by_key(|c| (c.date, c.created_at));
        Ok(cheques)
    }
}

impl Database<Insert<Cheque>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(cheque): Insert<Cheque>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(cheque)).await
    }
}

impl Database<Update<Cheque>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(cheque): Update<Cheque>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().await.cheques.insert(cheque.id, cheque);
        Ok(())
    }
}

impl Database<Lock<By<Cheque, cheque::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Cheque, cheque::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}
