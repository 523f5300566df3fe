//! Rent schedule read definitions.

#[cfg(doc)]
use crate::domain::schedule::{Entry, Status};

/// Selector of unpaid [`Entry`]s whose due date has passed while they are
/// still in [`Status::Due`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Overdue;
