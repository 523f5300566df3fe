//! [`NonTx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, connection::impl_connection},
};
#[cfg(doc)]
use crate::infra::database::postgres::Connection;

/// Non-transactional Postgres database client.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to initialize the client.
    pub(crate) pool: connection::Pool,

    /// Client to be used for non-transactional operations, if any.
    connection: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client from the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the underlying [`Connection`] of this [`NonTx`] client.
    pub(crate) async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        let connection = self.connection.read().await;
        let guard = if connection.is_none() {
            drop(connection);

            let mut connection = self.connection.write().await;
            if connection.is_none() {
                *connection = Some(
                    self.pool
                        .get()
                        .await
                        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                        .map_err(tracerr::map_from)?,
                );
            }

            connection.downgrade()
        } else {
            connection
        };

        Ok(RwLockReadGuard::map(guard, |conn| {
            conn.as_ref()
                .expect("connection cannot be dropped while guard is alive")
        }))
    }

    /// Takes the underlying [`Connection`] from this [`NonTx`] client.
    ///
    /// Next time this [`NonTx`] client is used, it will initialize a new
    /// [`Connection`].
    #[must_use]
    pub(crate) async fn take_connection(&self) -> Option<connection::NonTx> {
        self.connection.write().await.take()
    }
}

impl_connection!(lazy NonTx);
