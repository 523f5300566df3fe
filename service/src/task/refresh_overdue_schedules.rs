//! [`RefreshOverdueSchedules`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Perform, Start, Update},
    Date,
};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::schedule;
use crate::{
    infra::{database, Database},
    read, Service,
};

use super::Task;

/// Configuration for [`RefreshOverdueSchedules`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between refreshes.
    pub interval: time::Duration,
}

/// [`Task`] for moving [`schedule::Entry`]s, whose due date has passed
/// without any payment, to [`schedule::Status::Overdue`].
#[derive(Clone, Copy, Debug)]
pub struct RefreshOverdueSchedules<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<RefreshOverdueSchedules<Self>, Config>>> for Service<Db>
where
    RefreshOverdueSchedules<Service<Db>>:
        Task<Perform<()>, Ok = u64, Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<RefreshOverdueSchedules<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = RefreshOverdueSchedules {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::info!("{n} schedule entries became overdue"),
                Err(e) => {
                    log::error!("`task::RefreshOverdueSchedules` failed: {e}");
                }
            }
        }
    }
}

impl<Db> Task<Perform<()>> for RefreshOverdueSchedules<Service<Db>>
where
    Db: Database<
        Update<By<read::schedule::Overdue, Date>>,
        Ok = u64,
        Err = Traced<database::Error>,
    >,
{
    type Ok = u64;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        self.service
            .database()
            .execute(Update(By::new(self.service.today())))
            .await
            .map_err(tracerr::map_from_and_wrap!())
    }
}

/// Error of [`RefreshOverdueSchedules`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::Perform;

    use crate::{
        command::fixture, domain::schedule::Status, query, Command as _,
        Task as _,
    };

    use super::{Config, RefreshOverdueSchedules};

    #[tokio::test]
    async fn marks_passed_unpaid_entries_overdue() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;

        let task = RefreshOverdueSchedules {
            config: Config {
                interval: Duration::from_secs(60),
            },
            service: fixture::at(&setup.svc, "2026-03-02"),
        };
        assert_eq!(task.execute(Perform(())).await.unwrap(), 3);
        assert_eq!(task.execute(Perform(())).await.unwrap(), 0);

        let statuses = setup
            .svc
            .execute(query::schedule::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|e| e.status)
            .collect::<Vec<_>>();
        assert_eq!(
            statuses,
            [
                Status::Overdue,
                Status::Overdue,
                Status::Overdue,
                Status::Due,
                Status::Due,
                Status::Due,
            ],
        );
    }
}
