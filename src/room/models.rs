use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Placeholder estimate meaning "has not submitted yet". A participant whose
/// own stored value equals the sentinel sees everyone else masked.
pub const SENTINEL_ESTIMATE: &str = "?";

/// Topic every room starts with until someone sets a real one.
pub const DEFAULT_DESCRIPTION: &str = "Change room description to what you are estimating";

/// A single estimation session: a topic description plus per-participant
/// estimate state, safe for concurrent access.
///
/// Rooms are handed out as `Arc<Room>`, so an operation already running
/// against a room that the registry has since removed completes against its
/// own handle.
pub struct Room {
    state: Mutex<RoomState>,
}

struct RoomState {
    description: String,
    estimates: HashMap<String, String>,
    last_activity: DateTime<Utc>,
}

/// What a participant sees when opening a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantView {
    /// The participant's own current estimate (the sentinel if they have
    /// not submitted this round).
    pub estimate: String,
    /// Whether everyone's estimates should be masked for this participant.
    pub hidden: bool,
}

/// A consistent point-in-time copy of a room's state for rendering.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub description: String,
    pub estimates: HashMap<String, String>,
    pub last_activity: DateTime<Utc>,
}

impl Room {
    /// Creates an empty room with the given topic and creation timestamp.
    pub fn new(description: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(RoomState {
                description: description.to_string(),
                estimates: HashMap::new(),
                last_activity: created_at,
            }),
        }
    }

    /// Registers the participant (inserting the sentinel if they have no
    /// entry yet) and reports whether estimates are hidden for them.
    ///
    /// Viewing does not count as activity; only submissions and topic
    /// changes advance `last_activity`.
    pub fn view(&self, participant: &str) -> ParticipantView {
        let mut state = self.state.lock().unwrap();
        let estimate = state
            .estimates
            .entry(participant.to_string())
            .or_insert_with(|| SENTINEL_ESTIMATE.to_string())
            .clone();
        ParticipantView {
            hidden: estimate == SENTINEL_ESTIMATE,
            estimate,
        }
    }

    /// Records the participant's estimate, overwriting any previous one.
    pub fn set_estimate(&self, participant: &str, value: &str, now: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        state
            .estimates
            .insert(participant.to_string(), value.to_string());
        state.last_activity = now;
    }

    /// Replaces the topic and clears every estimate. Any description write
    /// starts a fresh round, including resubmission of the same text.
    pub fn set_description(&self, text: &str, now: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        state.description = text.to_string();
        state.estimates.clear();
        state.last_activity = now;
    }

    /// Copy-on-read view of the room; never exposes the live map.
    pub fn snapshot(&self) -> RoomSnapshot {
        let state = self.state.lock().unwrap();
        RoomSnapshot {
            description: state.description.clone(),
            estimates: state.estimates.clone(),
            last_activity: state.last_activity,
        }
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.state.lock().unwrap().last_activity
    }

    /// A room is idle once it has been quiet for strictly longer than
    /// `max_age`.
    pub fn is_idle(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.signed_duration_since(self.last_activity()) > max_age
    }
}
