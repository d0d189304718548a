mod continuation;

pub use continuation::{
    next_playback_index, AdvanceReason, NextPlayback, PlaybackCursor, PlaybackMode, PlaybackStep,
};
