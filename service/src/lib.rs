//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod clock;
pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::sync::Arc;

use common::{
    operations::{By, Start},
    Date,
};
use derive_more::{Debug, Error};

#[cfg(doc)]
use infra::Database;

pub use self::{
    clock::{Clock, FixedClock, SystemClock},
    command::Command,
    query::Query,
    task::Task,
};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] decoding key verifying access tokens of callers.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Indicator whether deleting a [`domain::Payment`] re-derives the
    /// schedule entries it was matched against.
    ///
    /// When disabled, such entries keep their status until another
    /// reconciliation touches them.
    pub refresh_schedule_on_payment_deletion: bool,

    /// [`task::RefreshOverdueSchedules`] configuration.
    pub refresh_overdue_schedules: task::refresh_overdue_schedules::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Clock`] of this [`Service`].
    clock: Arc<dyn Clock>,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, running on the
    /// [`SystemClock`].
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::RefreshOverdueSchedules<Self>,
                        task::refresh_overdue_schedules::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Self::with_clock(config, database, SystemClock);

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("refresh_overdue_schedules", async move {
            svc.execute(Start(By::new(svc.config().refresh_overdue_schedules)))
                .await
        });

        (this, bg)
    }

    /// Creates a new [`Service`] with the provided [`Clock`], without
    /// spawning any background [`Task`]s.
    pub fn with_clock(
        config: Config,
        database: Db,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            config,
            database,
            clock: Arc::new(clock),
        }
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns the current [`Date`] according to the [`Clock`] of this
    /// [`Service`].
    #[must_use]
    pub fn today(&self) -> Date {
        self.clock.today()
    }
}
