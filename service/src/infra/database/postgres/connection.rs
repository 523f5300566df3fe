//! [`Connection`] definitions.

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as NonTx, CreatePoolError as PoolCreationError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// Generic database connection the SQL of [`Database`] operations runs in.
///
/// [`Database`]: crate::infra::Database
pub trait Connection {
    /// Queries the provided statement with the given parameters and returns
    /// all the resulting rows.
    ///
    /// # Errors
    ///
    /// If failed to query the statement.
    fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Queries the provided statement with the given parameters and returns
    /// at most one resulting row.
    ///
    /// # Errors
    ///
    /// If failed to query the statement, or it returns more than one row.
    fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Executes the provided statement with the given parameters and returns
    /// the number of affected rows.
    ///
    /// # Errors
    ///
    /// If failed to execute the statement.
    fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;
}

/// Implements [`Connection`] for a type by delegating to another one.
///
/// - `raw` form delegates to a [`tokio_postgres`] client returned by the
///   provided expression, converting its errors.
/// - `lazy` form delegates to the [`Connection`] returned by the fallible
///   `connection()` method of the type.
macro_rules! impl_connection {
    (raw $ty:ty, |$c:ident| $inner:expr) => {
        impl $crate::infra::database::postgres::Connection for $ty {
            $crate::infra::database::postgres::connection::impl_connection!(
                @raw query => query -> Vec<::tokio_postgres::Row>,
                |$c| $inner
            );
            $crate::infra::database::postgres::connection::impl_connection!(
                @raw query_opt => query_opt -> Option<::tokio_postgres::Row>,
                |$c| $inner
            );
            $crate::infra::database::postgres::connection::impl_connection!(
                @raw exec => execute -> u64,
                |$c| $inner
            );
        }
    };

    (lazy $ty:ty) => {
        impl $crate::infra::database::postgres::Connection for $ty {
            $crate::infra::database::postgres::connection::impl_connection!(
                @lazy query -> Vec<::tokio_postgres::Row>
            );
            $crate::infra::database::postgres::connection::impl_connection!(
                @lazy query_opt -> Option<::tokio_postgres::Row>
            );
            $crate::infra::database::postgres::connection::impl_connection!(
                @lazy exec -> u64
            );
        }
    };

    (@raw $name:ident => $method:ident -> $ok:ty, |$c:ident| $inner:expr) => {
        $crate::infra::database::postgres::connection::impl_connection!(
            @fn $name -> $ok, |$c, stmt, params| {
                $inner
                    .$method(stmt, params)
                    .await
                    .map_err(::tracerr::from_and_wrap!(
                        => $crate::infra::database::postgres::Error
                    ))
                    .map_err(::tracerr::map_from)
            }
        );
    };

    (@lazy $name:ident -> $ok:ty) => {
        $crate::infra::database::postgres::connection::impl_connection!(
            @fn $name -> $ok, |c, stmt, params| {
                let conn = c.connection().await.map_err(::tracerr::wrap!())?;
                $crate::infra::database::postgres::Connection::$name(
                    &*conn, stmt, params,
                )
                .await
                .map_err(::tracerr::wrap!())
            }
        );
    };

    (@fn $name:ident -> $ok:ty,
     |$c:ident, $stmt:ident, $params:ident| $body:block) => {
        async fn $name<T>(
            &self,
            $stmt: &T,
            $params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
        ) -> Result<$ok, ::tracerr::Traced<$crate::infra::database::Error>>
        where
            T: ::tokio_postgres::ToStatement + ?Sized,
        {
            let $c = self;
            $body
        }
    };
}

pub(crate) use impl_connection;

impl_connection!(raw NonTx, |c| **c);
impl_connection!(raw Tx, |c| c.tx());

/// Transactional Postgres database [`Connection`].
#[self_referencing]
pub struct Tx {
    /// [`NonTx`] [`Connection`] the transaction was started from.
    non_tx: NonTx,

    /// Transaction started in the [`Connection`], until it's committed.
    #[borrows(mut non_tx)]
    #[not_covariant]
    tx: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("tx", self.tx())
            .finish_non_exhaustive()
    }
}

impl Tx {
    /// Returns the underlying [`Transaction`] of this [`Tx`] connection.
    ///
    /// [`Transaction`]: deadpool_postgres::Transaction
    fn tx(&self) -> &deadpool_postgres::Transaction<'_> {
        self.with_tx(|tx| tx.as_ref().expect("committed `Tx` is consumed"))
    }

    /// Starts a new [`Tx`] in the provided [`NonTx`] [`Connection`].
    ///
    /// # Errors
    ///
    /// If failed to start a transaction.
    pub async fn from_non_tx(
        client: NonTx,
    ) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(client, |c| {
            c.transaction().map_ok(Some).boxed()
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
    }

    /// Commits this [`Tx`].
    ///
    /// # Errors
    ///
    /// If failed to commit this [`Tx`].
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "different variance, see \
                      https://doc.rust-lang.org/nomicon/subtyping.html#variance"
        )]
        self.with_tx_mut(|tx| tx.take())
            .expect("committed `Tx` is consumed")
            .commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}
