//! GraphQL API definitions.

pub mod cheque;
pub mod lease;
mod mutation;
pub mod payment;
pub mod property;
mod query;
pub mod scalar;
pub mod schedule;
pub mod tenant;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    cheque::Cheque, lease::Lease, mutation::Mutation, payment::Payment,
    property::Property, query::Query, tenant::Tenant,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

define_error! {
    enum ReconciliationError {
        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Requested entity does not exist"]
        NotFound,

        #[code = "INVALID_TRANSITION"]
        #[status = CONFLICT]
        #[message = "Requested status transition is not allowed"]
        InvalidTransition,

        #[code = "INVALID_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "Provided dates or numbers are out of range"]
        InvalidRange,

        #[code = "OVERLAP"]
        #[status = CONFLICT]
        #[message = "`Lease` overlaps another `Lease` of the same `Property`"]
        Overlap,

        #[code = "OVER_ALLOCATION"]
        #[status = BAD_REQUEST]
        #[message = "Requested amounts exceed the `Payment` amount"]
        OverAllocation,

        #[code = "MISMATCHED_LEASE"]
        #[status = BAD_REQUEST]
        #[message = "Schedule entry belongs to another `Lease`"]
        MismatchedLease,

        #[code = "CURRENCY_MISMATCH"]
        #[status = BAD_REQUEST]
        #[message = "Amount is not in the `Property` currency"]
        CurrencyMismatch,

        #[code = "INVALID_AMOUNT"]
        #[status = BAD_REQUEST]
        #[message = "Amount must be positive"]
        InvalidAmount,
    }
}
