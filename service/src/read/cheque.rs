//! [`Cheque`]-related read definitions.

use common::Date;

use crate::domain::Caller;
#[cfg(doc)]
use crate::domain::{cheque::Status, Cheque, Property};

/// Selector of upcoming [`Cheque`]s.
///
/// Selects non-archived [`Cheque`]s in [`Status::Received`] or
/// [`Status::Deposited`] of [`Property`]s accessible by the [`Caller`],
/// dated within the inclusive `[from, to]` range, ordered by date.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Upcoming {
    /// [`Caller`] the [`Cheque`]s must be accessible by.
    pub caller: Caller,

    /// Earliest [`Date`] of the [`Cheque`]s.
    pub from: Date,

    /// Latest [`Date`] of the [`Cheque`]s.
    pub to: Date,
}
