use crate::error::{PlayError, PlayResult};
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Unattended display, always loops.
    Kiosk,
    /// Someone is watching, loops only when asked to.
    Attended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceReason {
    Ended,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextPlayback {
    Play(usize),
    /// End of the list reached without looping, stay on the last item.
    Stop,
    /// Nothing to play at all.
    Empty,
}

/// Decides what plays after `current_index` finishes or fails.
///
/// Errors advance exactly like a natural end, so a broken item is skipped
/// rather than retried in place.
pub fn next_playback_index<T>(
    items: &[T],
    current_index: usize,
    mode: PlaybackMode,
    loop_playlist: bool,
    reason: AdvanceReason,
) -> PlayResult<NextPlayback> {
    trace!("Advancing from {} after {:?}", current_index, reason);
    let len = items.len();
    if len == 0 {
        return Ok(NextPlayback::Empty);
    }
    if current_index >= len {
        return Err(PlayError::InvalidInput(format!(
            "index {} out of range for {} items",
            current_index, len
        )));
    }
    if current_index + 1 < len {
        return Ok(NextPlayback::Play(current_index + 1));
    }
    Ok(match mode {
        PlaybackMode::Kiosk => NextPlayback::Play(0),
        PlaybackMode::Attended if loop_playlist => NextPlayback::Play(0),
        PlaybackMode::Attended => NextPlayback::Stop,
    })
}

/// Result of one advance, as reported back to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackStep {
    pub next: NextPlayback,
    pub consecutive_errors: usize,
    pub all_failing: bool,
}

/// Playing position within a list plus how many items failed in a row.
///
/// Players are stateless between requests, so the cursor is rebuilt from
/// what the client last reported.
#[derive(Debug, Clone)]
pub struct PlaybackCursor<'a, T> {
    items: &'a [T],
    current_index: usize,
    consecutive_errors: usize,
    mode: PlaybackMode,
    loop_playlist: bool,
}

impl<'a, T> PlaybackCursor<'a, T> {
    pub fn resume(
        items: &'a [T],
        current_index: usize,
        consecutive_errors: usize,
        mode: PlaybackMode,
        loop_playlist: bool,
    ) -> Self {
        PlaybackCursor {
            items,
            current_index,
            consecutive_errors,
            mode,
            loop_playlist,
        }
    }

    pub fn advance(&mut self, reason: AdvanceReason) -> PlayResult<PlaybackStep> {
        let next = next_playback_index(
            self.items,
            self.current_index,
            self.mode,
            self.loop_playlist,
            reason,
        )?;
        match reason {
            AdvanceReason::Ended => self.consecutive_errors = 0,
            AdvanceReason::Error => self.consecutive_errors += 1,
        }
        if let NextPlayback::Play(index) = next {
            self.current_index = index;
        }
        Ok(PlaybackStep {
            next,
            consecutive_errors: self.consecutive_errors,
            all_failing: self.all_items_failing(),
        })
    }

    /// True once every item in the list has failed back to back.
    pub fn all_items_failing(&self) -> bool {
        !self.items.is_empty() && self.consecutive_errors >= self.items.len()
    }
}
