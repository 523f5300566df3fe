//! [`Query`] collection related to [`Property`]s.

use common::operations::By;

use crate::domain::{property, Caller, Property};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Property`] by its [`property::Id`], if it's accessible by the
/// [`Caller`].
pub type ById = DatabaseQuery<By<Option<Property>, (property::Id, Caller)>>;

/// Queries all the non-archived [`Property`]s accessible by the [`Caller`].
pub type List = DatabaseQuery<By<Vec<Property>, Caller>>;
