//! Read entities definitions.

pub mod cheque;
pub mod lease;
pub mod schedule;
