//! In-memory [`Database`] implementation.

mod cheque;
mod lease;
mod payment;
mod property;
mod schedule;
mod tenant;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use common::operations::{Commit, Transact};
use derive_more::{Display, Error as StdError};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{
        self, access::Role, account, Caller, Cheque, Lease, Payment, Property,
        Tenant,
    },
    infra::database,
};
#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`] client.
///
/// Transactions work on a snapshot of the whole state, replacing it on
/// [`Commit`]. Only one transaction runs at a time, so the `Lock`
/// operations are no-op.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// [`State`] this client operates on.
    state: Arc<Mutex<State>>,

    /// Lock serializing transactions.
    serial: Arc<Mutex<()>>,

    /// Transaction this client runs in, if any.
    tx: Option<Arc<Tx>>,
}

/// Transaction of a [`Memory`] client.
#[derive(Debug)]
struct Tx {
    /// [`State`] the transaction is committed into.
    parent: Arc<Mutex<State>>,

    /// Guard holding the transactions serialized while this one is alive.
    _serial: OwnedMutexGuard<()>,
}

/// Whole state of a [`Memory`] database.
#[derive(Clone, Debug, Default)]
struct State {
    /// Stored [`Property`]s.
    properties: HashMap<domain::property::Id, Property>,

    /// Delegated access grants of managers to [`Property`]s.
    managers: HashSet<(domain::property::Id, account::Id)>,

    /// Stored [`Tenant`]s.
    tenants: HashMap<domain::tenant::Id, Tenant>,

    /// Stored [`Lease`]s.
    leases: HashMap<domain::lease::Id, Lease>,

    /// Stored [`domain::schedule::Entry`]s.
    schedule: HashMap<domain::schedule::Id, domain::schedule::Entry>,

    /// Stored [`Cheque`]s.
    cheques: HashMap<domain::cheque::Id, Cheque>,

    /// Stored [`Payment`]s.
    payments: HashMap<domain::payment::Id, Payment>,

    /// Stored [`domain::payment::Match`] amounts.
    matches: HashMap<(domain::payment::Id, domain::schedule::Id), Decimal>,

    /// Indicates whether inserting a [`Payment`] fails.
    #[cfg(test)]
    payments_unavailable: bool,
}

impl State {
    /// Indicates whether the provided [`Caller`] may access the
    /// [`Property`].
    fn can_access(&self, property: &Property, caller: &Caller) -> bool {
        match caller.role {
            Role::Owner => property.owner_id == caller.account_id,
            Role::Manager => self
                .managers
                .contains(&(property.id, caller.account_id)),
        }
    }

    /// Removes the [`domain::payment::Match`]es referring to a [`Payment`]
    /// or a [`domain::schedule::Entry`] which doesn't exist anymore.
    fn remove_orphaned_matches(&mut self) {
        let (payments, schedule) = (&self.payments, &self.schedule);
        self.matches.retain(|(p, s), _| {
            payments.contains_key(p) && schedule.contains_key(s)
        });
    }
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants the manager account access to the [`Property`].
    ///
    /// Grants are managed by the external access-control system, so this
    /// is the only way to set them up here.
    pub async fn grant(
        &self,
        property_id: domain::property::Id,
        manager: account::Id,
    ) {
        _ = self.state().await.managers.insert((property_id, manager));
    }

    /// Makes every following [`Payment`] insertion fail with
    /// [`Error::Unavailable`].
    #[cfg(test)]
    pub(crate) async fn fail_payment_inserts(&self) {
        self.state().await.payments_unavailable = true;
    }

    /// Locks the [`State`] of this client.
    async fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().await
    }
}

impl database::Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.tx.is_some() {
            return Ok(self.clone());
        }

        let serial = Arc::clone(&self.serial).lock_owned().await;
        let snapshot = self.state().await.clone();
        Ok(Self {
            state: Arc::new(Mutex::new(snapshot)),
            serial: Arc::clone(&self.serial),
            tx: Some(Arc::new(Tx {
                parent: Arc::clone(&self.state),
                _serial: serial,
            })),
        })
    }
}

impl database::Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        if let Some(tx) = &self.tx {
            let state = self.state().await.clone();
            *tx.parent.lock().await = state;
        }
        Ok(())
    }
}

/// [`Memory`] database [`Error`].
///
/// [`Error`]: StdError
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),

    /// Storage refuses to perform the operation.
    #[cfg(test)]
    #[display("storage is unavailable")]
    Unavailable,
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |n| n == *c),
            #[cfg(test)]
            Self::Unavailable => false,
        }
    }
}
