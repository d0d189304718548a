//! Weekly scheduling: which playlist plays today, and the per-user
//! configuration that answers it.

pub mod lifecycle;
mod resolver;

pub use crate::content_store::ScheduleUpdate;
pub use lifecycle::{get_or_create, update};
pub use resolver::{resolve_today, weekday_name, ScheduleClock};
