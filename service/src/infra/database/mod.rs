//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),

    #[cfg(any(test, feature = "memory"))]
    /// [`Memory`] error.
    Memory(memory::Error),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match *self {
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => e.is_unique_violation(constraint),

            #[cfg(any(test, feature = "memory"))]
            Self::Memory(ref e) => e.is_unique_violation(constraint),
        }
    }
}

/// Names of the uniqueness constraints the domain relies on.
pub mod constraint {
    #[cfg(doc)]
    use crate::domain::{Cheque, Payment};

    /// At most one [`Payment`] is produced by a single [`Cheque`].
    pub const PAYMENTS_CHEQUE_ID: &str = "payments_cheque_id_key";
}
