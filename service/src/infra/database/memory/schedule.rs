//! Rent schedule [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Delete, Insert, Select, Update},
    Date,
};
use tracerr::Traced;

use crate::{
    domain::{lease, schedule},
    infra::{
        database::{self, Memory},
        Database,
    },
    read,
};

impl Database<Select<By<Vec<schedule::Entry>, lease::Id>>> for Memory {
    type Ok = Vec<schedule::Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<schedule::Entry>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();
        let mut entries = self
            .state()
            .await
            .schedule
            .values()
            .filter(|e| e.lease_id == lease_id)
            .cloned()
            .collect::<Vec<_>>();
        entries.sort_by_key(|e| (e.due_date, e.id));
        Ok(entries)
    }
}

impl<IDs> Database<Select<By<HashMap<schedule::Id, schedule::Entry>, IDs>>>
    for Memory
where
    IDs: AsRef<[schedule::Id]>,
{
    type Ok = HashMap<schedule::Id, schedule::Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<schedule::Id, schedule::Entry>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let state = self.state().await;
        Ok(ids
            .as_ref()
            .iter()
            .filter_map(|id| state.schedule.get(id))
            .map(|e| (e.id, e.clone()))
            .collect())
    }
}

impl Database<Insert<Vec<schedule::Entry>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entries): Insert<Vec<schedule::Entry>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state()
            .await
            .schedule
            .extend(entries.into_iter().map(|e| (e.id, e)));
        Ok(())
    }
}

impl Database<Update<schedule::Entry>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(entry): Update<schedule::Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().await.schedule.insert(entry.id, entry);
        Ok(())
    }
}

impl Database<Delete<By<Vec<schedule::Entry>, lease::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<schedule::Entry>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();
        let mut state = self.state().await;
        state.schedule.retain(|_, e| e.lease_id != lease_id);
        state.remove_orphaned_matches();
        Ok(())
    }
}

impl Database<Update<By<read::schedule::Overdue, Date>>> for Memory {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<read::schedule::Overdue, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();
        let mut count = 0;
        for e in self.state().await.schedule.values_mut() {
            if e.status == schedule::Status::Due
                && e.paid.is_none()
                && e.due_date < today
            {
                e.status = schedule::Status::Overdue;
                count += 1;
            }
        }
        Ok(count)
    }
}
