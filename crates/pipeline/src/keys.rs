//! Queue list names and key builders.

use pulsewatch_core::types::UserId;
use pulsewatch_core::LimitKind;

/// Observations waiting to be classified.
pub const OBS_PENDING: &str = "obs-add";
/// Observations currently leased by the processor.
pub const OBS_IN_PROGRESS: &str = "obs-inprogress";
/// Notification tasks waiting for dispatch.
pub const NOTE_PENDING: &str = "note-add";
/// Notification tasks currently leased by the dispatcher.
pub const NOTE_IN_PROGRESS: &str = "note-inprogress";

const NOTE_PREFIX: &str = "note";
const IGNORE_PREFIX: &str = "ignore";

/// Fresh backing key for a notification task.
pub fn note_key() -> String {
    format!("{NOTE_PREFIX}:{}", uuid::Uuid::new_v4())
}

/// Dedup marker key for one (user, device, alert kind) triple.
pub fn cooldown_key(user_id: UserId, device_id: &str, kind: LimitKind) -> String {
    format!(
        "{NOTE_PREFIX}:{IGNORE_PREFIX}:{user_id}:{device_id}:{}",
        kind.code()
    )
}
