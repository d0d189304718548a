use crate::content_store::{ScheduleStore, ScheduleUpdate, UserId, WeeklyScheduleConfig};
use crate::error::{PlayError, PlayResult};
use tracing::debug;

/// Returns the user's schedule, creating the default one on first access.
///
/// A concurrent creator winning the insert surfaces as a uniqueness
/// conflict, in which case the row it created is returned.
pub fn get_or_create<S>(store: &S, user_id: UserId) -> PlayResult<WeeklyScheduleConfig>
where
    S: ScheduleStore + ?Sized,
{
    if let Some(config) = store.get_schedule(user_id)? {
        return Ok(config);
    }
    match store.insert_default_schedule(user_id) {
        Ok(config) => Ok(config),
        Err(PlayError::Conflict(msg)) => {
            debug!("Schedule of user {} created concurrently: {}", user_id, msg);
            store.get_schedule(user_id)?.ok_or_else(|| {
                PlayError::Unavailable(format!(
                    "schedule of user {} conflicted on create but cannot be read",
                    user_id
                ))
            })
        }
        Err(e) => Err(e),
    }
}

/// Applies the fields present in `update`, leaving the others untouched.
/// An empty update is the same as [`get_or_create`].
pub fn update<S>(
    store: &S,
    user_id: UserId,
    update: &ScheduleUpdate,
) -> PlayResult<WeeklyScheduleConfig>
where
    S: ScheduleStore + ?Sized,
{
    let current = get_or_create(store, user_id)?;
    if update.is_empty() {
        return Ok(current);
    }
    store.apply_schedule_update(user_id, update)?.ok_or_else(|| {
        PlayError::Unavailable(format!("schedule of user {} disappeared", user_id))
    })
}
