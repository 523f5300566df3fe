//! Background [`Task`]s definitions.

mod background;
pub mod refresh_overdue_schedules;

pub use common::Handler as Task;

pub use self::{
    background::Background,
    refresh_overdue_schedules::RefreshOverdueSchedules,
};
