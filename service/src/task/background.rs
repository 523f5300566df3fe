//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;

#[cfg(doc)]
use crate::Task;

/// Error of a [`Task`] stopped in the [`Background`].
type TaskError = Box<dyn Error + 'static>;

/// Background environment for running long-living [`Task`]s on the current
/// thread.
///
/// Resolves once all the spawned [`Task`]s are done, or with the error of
/// the first failed one.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of tasks.
    set: task::LocalSet,

    /// Names and handles of the spawned tasks.
    handles: Vec<(&'static str, task::JoinHandle<Result<(), TaskError>>)>,
}

impl Background {
    /// Spawns a new named [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self.set.spawn_local(future.map_err(move |e| {
            TaskError::from(format!("`{name}` task failed: {e}"))
        }));
        self.handles.push((name, handle));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), TaskError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let tasks = handles.into_iter().map(|(name, h)| {
            h.map(move |r| {
                r.unwrap_or_else(|e| {
                    let e = format!("`{name}` task panicked: {e}");
                    Err(TaskError::from(e))
                })
            })
            .boxed_local()
        });
        let set = iter::once(set.map(Ok).boxed_local());
        future::try_join_all(set.chain(tasks))
            .map_ok(drop)
            .boxed_local()
    }
}

#[cfg(test)]
mod spec {
    use std::{fmt, future::IntoFuture as _};

    use super::Background;

    #[derive(Debug)]
    struct Stopped;

    impl fmt::Display for Stopped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("stopped")
        }
    }

    impl std::error::Error for Stopped {}

    #[tokio::test]
    async fn resolves_once_tasks_are_done() {
        let mut bg = Background::default();
        bg.spawn("first", async { Ok::<_, Stopped>(()) });
        bg.spawn("second", async { Ok::<_, Stopped>(()) });

        assert!(bg.into_future().await.is_ok());
    }

    #[tokio::test]
    async fn reports_failed_task_by_name() {
        let mut bg = Background::default();
        bg.spawn("refresh", async { Err::<(), _>(Stopped) });

        let err = bg.into_future().await.unwrap_err();
        assert_eq!(err.to_string(), "`refresh` task failed: stopped");
    }
}
