use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{
    Difficulty, EventKind, GameEvent, GameScore, GameStats, ObserverId, Observers, Result,
};

/// Lifecycle state shared by every game built on [`GameCore`].
///
/// Valid transitions:
/// - `Idle -> Playing` via `start`
/// - `Playing -> Paused` via `pause`, `Paused -> Playing` via `resume`
/// - `Playing | Paused -> Idle` via `quit`
/// - `Playing -> Won | Lost | Draw` via the terminal calls; terminal states
///   are absorbing until the next episode
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Idle,
    Playing,
    Paused,
    Won,
    Lost,
    Draw,
}

impl GameState {
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost | Self::Draw)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Capability surface implemented by concrete games.
pub trait Game {
    type Config;
    type Move;
    type Data;

    fn start(&mut self);
    fn reset(&mut self, config: Option<Self::Config>) -> Result<()>;
    fn make_move(&mut self, game_move: Self::Move) -> bool;
    fn is_valid_move(&self, game_move: &Self::Move) -> bool;
    fn game_data(&self) -> Self::Data;
    fn clone_game(&self) -> Self
    where
        Self: Sized;
}

/// Serializable snapshot of the lifecycle-visible state.
///
/// Deserializing yields the parsed structure only; reconstructing a live
/// engine from it is the caller's concern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot<C> {
    pub state: GameState,
    pub config: C,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub move_count: u32,
    pub score: i64,
    pub stats: GameStats,
}

impl<C: Serialize> GameSnapshot<C> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<C: DeserializeOwned> GameSnapshot<C> {
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

/// Shared lifecycle, clock, counter, stats, and event state.
///
/// Concrete games embed a `GameCore` value and delegate to it; the terminal
/// transitions (`game_won`/`game_lost`/`game_draw`) and the counter updates
/// are meant to be called from the game's own move logic.
#[derive(Debug)]
pub struct GameCore {
    state: GameState,
    difficulty: Difficulty,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    move_count: u32,
    score: i64,
    stats: GameStats,
    observers: Observers,
}

impl GameCore {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            state: GameState::Idle,
            difficulty,
            started_at: None,
            ended_at: None,
            move_count: 0,
            score: 0,
            stats: GameStats::default(),
            observers: Observers::default(),
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Milliseconds since the episode started, frozen once it ended.
    pub fn elapsed_ms(&self) -> i64 {
        match self.started_at {
            Some(started_at) => {
                let end = self.ended_at.unwrap_or_else(Utc::now);
                (end - started_at).num_milliseconds().max(0)
            }
            None => 0,
        }
    }

    /// Elapsed time as `MM:SS`, or `HH:MM:SS` once an hour has passed.
    pub fn elapsed_formatted(&self) -> String {
        format_elapsed(self.elapsed_ms())
    }

    pub fn start(&mut self) {
        if self.state == GameState::Idle {
            self.state = GameState::Playing;
            self.started_at = Some(Utc::now());
            self.emit(EventKind::Started);
        }
    }

    pub fn pause(&mut self) {
        if self.state == GameState::Playing {
            self.state = GameState::Paused;
            self.emit(EventKind::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.state == GameState::Paused {
            self.state = GameState::Playing;
            self.emit(EventKind::Resumed);
        }
    }

    pub fn quit(&mut self) {
        if self.state.is_active() {
            self.state = GameState::Idle;
            self.ended_at = Some(Utc::now());
            self.emit(EventKind::Quit);
        }
    }

    pub fn game_won(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        let ended_at = Utc::now();
        self.state = GameState::Won;
        self.ended_at = Some(ended_at);
        let elapsed_ms = self.elapsed_ms();
        self.stats.record_win(elapsed_ms);

        let score = GameScore {
            score: self.score,
            moves: self.move_count,
            time_elapsed_ms: elapsed_ms,
            difficulty: self.difficulty,
            timestamp: ended_at,
        };
        self.emit(EventKind::Won(score));
    }

    pub fn game_lost(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        self.state = GameState::Lost;
        self.ended_at = Some(Utc::now());
        self.stats.record_loss();
        self.emit(EventKind::Lost);
    }

    pub fn game_draw(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        self.state = GameState::Draw;
        self.ended_at = Some(Utc::now());
        self.stats.record_draw();
        self.emit(EventKind::Draw);
    }

    pub fn increment_move(&mut self) {
        self.move_count += 1;
        self.emit(EventKind::MoveMade {
            move_count: self.move_count,
        });
    }

    pub fn update_score(&mut self, points: i64) {
        self.score += points;
        self.emit(EventKind::ScoreUpdated {
            score: self.score,
            points,
        });
    }

    pub fn update_config(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.emit(EventKind::ConfigUpdated);
    }

    /// Returns the per-episode state to idle, keeping stats and observers.
    pub fn reset_episode(&mut self) {
        self.state = GameState::Idle;
        self.started_at = None;
        self.ended_at = None;
        self.move_count = 0;
        self.score = 0;
    }

    /// Copy of the per-episode state with fresh stats and a fresh observer
    /// registry, for [`Game::clone_game`] implementations.
    pub fn clone_detached(&self) -> Self {
        Self {
            state: self.state,
            difficulty: self.difficulty,
            started_at: self.started_at,
            ended_at: self.ended_at,
            move_count: self.move_count,
            score: self.score,
            stats: GameStats::default(),
            observers: Observers::default(),
        }
    }

    pub fn add_observer(&mut self, observer: impl FnMut(&GameEvent) + 'static) -> ObserverId {
        self.observers.add(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    pub fn snapshot<C>(&self, config: C) -> GameSnapshot<C> {
        GameSnapshot {
            state: self.state,
            config,
            started_at: self.started_at,
            ended_at: self.ended_at,
            move_count: self.move_count,
            score: self.score,
            stats: self.stats.clone(),
        }
    }

    fn emit(&mut self, kind: EventKind) {
        let event = GameEvent {
            timestamp: Utc::now(),
            kind,
        };
        self.observers.notify(&event);
    }
}

fn format_elapsed(elapsed_ms: i64) -> String {
    let total_secs = elapsed_ms / 1000;
    let seconds = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn start_only_leaves_idle() {
        let mut core = GameCore::new(Difficulty::Custom);
        assert_eq!(core.state(), GameState::Idle);

        core.start();
        assert_eq!(core.state(), GameState::Playing);
        assert!(core.started_at().is_some());

        core.game_lost();
        core.start();
        assert_eq!(core.state(), GameState::Lost);
    }

    #[test]
    fn pause_and_resume_are_state_guarded() {
        let mut core = GameCore::new(Difficulty::Custom);

        core.pause();
        assert_eq!(core.state(), GameState::Idle);

        core.start();
        core.resume();
        assert_eq!(core.state(), GameState::Playing);

        core.pause();
        assert_eq!(core.state(), GameState::Paused);
        core.pause();
        assert_eq!(core.state(), GameState::Paused);

        core.resume();
        assert_eq!(core.state(), GameState::Playing);
    }

    #[test]
    fn quit_returns_active_game_to_idle() {
        let mut core = GameCore::new(Difficulty::Custom);
        core.quit();
        assert!(core.ended_at().is_none());

        core.start();
        core.pause();
        core.quit();
        assert_eq!(core.state(), GameState::Idle);
        assert!(core.ended_at().is_some());
    }

    #[test]
    fn terminal_transitions_require_playing() {
        let mut core = GameCore::new(Difficulty::Custom);
        core.game_won();
        assert_eq!(core.state(), GameState::Idle);
        assert_eq!(core.stats().games_played, 0);

        core.start();
        core.game_won();
        assert_eq!(core.state(), GameState::Won);
        assert_eq!(core.stats().games_won, 1);

        // absorbing: a second terminal call changes nothing
        core.game_lost();
        assert_eq!(core.state(), GameState::Won);
        assert_eq!(core.stats().games_played, 1);
    }

    #[test]
    fn draw_records_draw_stats() {
        let mut core = GameCore::new(Difficulty::Custom);
        core.start();
        core.game_draw();

        assert_eq!(core.state(), GameState::Draw);
        assert_eq!(core.stats().games_drawn, 1);
    }

    #[test]
    fn elapsed_is_zero_before_start() {
        let core = GameCore::new(Difficulty::Custom);
        assert_eq!(core.elapsed_ms(), 0);
        assert_eq!(core.elapsed_formatted(), "00:00");
    }

    #[test]
    fn elapsed_freezes_at_game_end() {
        let mut core = GameCore::new(Difficulty::Custom);
        core.start();
        core.game_lost();

        let frozen = core.elapsed_ms();
        assert_eq!(core.elapsed_ms(), frozen);
    }

    #[test]
    fn formats_elapsed_with_optional_hours() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(999), "00:00");
        assert_eq!(format_elapsed(65_000), "01:05");
        assert_eq!(format_elapsed(3_599_000), "59:59");
        assert_eq!(format_elapsed(3_661_000), "01:01:01");
    }

    #[test]
    fn events_fire_in_order_on_the_emitting_call() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut core = GameCore::new(Difficulty::Custom);
        {
            let seen = Rc::clone(&seen);
            core.add_observer(move |event: &GameEvent| {
                seen.borrow_mut().push(event.kind.clone());
            });
        }

        core.start();
        core.increment_move();
        core.update_score(50);
        core.pause();
        core.resume();
        core.game_won();

        let kinds = seen.borrow();
        assert_eq!(kinds[0], EventKind::Started);
        assert_eq!(kinds[1], EventKind::MoveMade { move_count: 1 });
        assert_eq!(
            kinds[2],
            EventKind::ScoreUpdated {
                score: 50,
                points: 50
            }
        );
        assert_eq!(kinds[3], EventKind::Paused);
        assert_eq!(kinds[4], EventKind::Resumed);
        match &kinds[5] {
            EventKind::Won(score) => {
                assert_eq!(score.score, 50);
                assert_eq!(score.moves, 1);
                assert_eq!(score.difficulty, Difficulty::Custom);
            }
            other => panic!("expected Won, got {other:?}"),
        }
    }

    #[test]
    fn removed_observer_stops_receiving() {
        let count = Rc::new(RefCell::new(0u32));
        let mut core = GameCore::new(Difficulty::Custom);
        let id = {
            let count = Rc::clone(&count);
            core.add_observer(move |_| *count.borrow_mut() += 1)
        };

        core.start();
        assert!(core.remove_observer(id));
        core.pause();

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn reset_episode_keeps_stats_and_observers() {
        let count = Rc::new(RefCell::new(0u32));
        let mut core = GameCore::new(Difficulty::Custom);
        {
            let count = Rc::clone(&count);
            core.add_observer(move |_| *count.borrow_mut() += 1);
        }

        core.start();
        core.increment_move();
        core.game_won();
        core.reset_episode();

        assert_eq!(core.state(), GameState::Idle);
        assert_eq!(core.move_count(), 0);
        assert!(core.started_at().is_none());
        assert_eq!(core.stats().games_won, 1);

        core.start();
        assert!(*count.borrow() > 3);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut core = GameCore::new(Difficulty::Beginner);
        core.start();
        core.increment_move();
        core.game_won();

        let snapshot = core.snapshot(GameConfig::beginner());
        let json = snapshot.to_json().unwrap();
        let parsed: GameSnapshot<GameConfig> = GameSnapshot::from_json(&json).unwrap();

        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.state, GameState::Won);
        assert_eq!(parsed.move_count, 1);
        assert_eq!(parsed.stats.games_won, 1);
    }

    #[test]
    fn clone_detached_copies_episode_but_not_stats() {
        let mut core = GameCore::new(Difficulty::Expert);
        core.start();
        core.increment_move();
        core.update_score(10);
        core.game_won();

        let copy = core.clone_detached();
        assert_eq!(copy.state(), GameState::Won);
        assert_eq!(copy.move_count(), 1);
        assert_eq!(copy.score(), 10);
        assert_eq!(copy.stats().games_played, 0);
    }
}
