//! [`Command`] definition.

pub mod archive_lease;
pub mod authorize_caller;
pub mod create_cheque;
pub mod create_lease;
pub mod create_payment;
pub mod create_property;
pub mod create_tenant;
pub mod delete_lease;
pub mod delete_payment;
#[cfg(test)]
pub(crate) mod fixture;
pub mod match_payment;
pub mod recompute_occupancy;
pub mod reconcile;
pub mod restore_lease;
pub mod settle_cheque;
pub mod terminate_lease;
pub mod update_cheque_status;
pub mod update_lease;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    archive_lease::ArchiveLease, authorize_caller::AuthorizeCaller,
    create_cheque::CreateCheque, create_lease::CreateLease,
    create_payment::CreatePayment, create_property::CreateProperty,
    create_tenant::CreateTenant, delete_lease::DeleteLease,
    delete_payment::DeletePayment, match_payment::MatchPayment,
    recompute_occupancy::RecomputeOccupancy, restore_lease::RestoreLease,
    settle_cheque::SettleCheque, terminate_lease::TerminateLease,
    update_cheque_status::UpdateChequeStatus, update_lease::UpdateLease,
};
