//! Domain definitions.

pub mod access;
pub mod account;
pub mod cheque;
pub mod lease;
pub mod payment;
pub mod property;
pub mod schedule;
pub mod tenant;

pub use self::{
    access::Caller, cheque::Cheque, lease::Lease, payment::Payment,
    property::Property, tenant::Tenant,
};
