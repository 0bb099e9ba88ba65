use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Difficulty;

/// Externally visible summary of a finished winning episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameScore {
    pub score: i64,
    pub moves: u32,
    pub time_elapsed_ms: i64,
    pub difficulty: Difficulty,
    pub timestamp: DateTime<Utc>,
}

/// One lifecycle transition or counter change, broadcast to observers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Started,
    Paused,
    Resumed,
    Quit,
    Won(GameScore),
    Lost,
    Draw,
    MoveMade { move_count: u32 },
    ScoreUpdated { score: i64, points: i64 },
    ConfigUpdated,
}

/// Handle returned by [`Observers::add`], used for removal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type ObserverFn = Box<dyn FnMut(&GameEvent)>;

/// Registry of observer callbacks.
///
/// Fan-out is synchronous and single-threaded: every callback runs in
/// registration order, in-line with the call that emitted the event.
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    entries: Vec<(ObserverId, ObserverFn)>,
}

impl Observers {
    pub fn add(&mut self, observer: impl FnMut(&GameEvent) + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(observer)));
        id
    }

    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn notify(&mut self, event: &GameEvent) {
        for (_, observer) in &mut self.entries {
            observer(event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}
