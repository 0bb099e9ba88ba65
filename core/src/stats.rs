use serde::{Deserialize, Serialize};

/// Cumulative aggregate across episodes of one game value.
///
/// Updated only on terminal transitions; reset explicitly by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub games_drawn: u32,
    /// Percentage in `[0, 100]`.
    pub win_rate: f64,
    pub best_time_ms: Option<i64>,
    pub average_time_ms: Option<i64>,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl GameStats {
    pub(crate) fn record_win(&mut self, elapsed_ms: i64) {
        self.games_played += 1;
        self.games_won += 1;
        self.current_streak += 1;
        self.best_streak = self.best_streak.max(self.current_streak);

        self.best_time_ms = Some(match self.best_time_ms {
            Some(best) => best.min(elapsed_ms),
            None => elapsed_ms,
        });

        // Two-point decaying average, kept for compatibility with previously
        // recorded stats; not an arithmetic mean across all games.
        self.average_time_ms = Some(match self.average_time_ms {
            Some(average) => (average + elapsed_ms) / 2,
            None => elapsed_ms,
        });

        self.refresh_win_rate();
    }

    pub(crate) fn record_loss(&mut self) {
        self.games_played += 1;
        self.games_lost += 1;
        self.current_streak = 0;
        self.refresh_win_rate();
    }

    pub(crate) fn record_draw(&mut self) {
        self.games_played += 1;
        self.games_drawn += 1;
        self.refresh_win_rate();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn refresh_win_rate(&mut self) {
        self.win_rate = if self.games_played > 0 {
            f64::from(self.games_won) * 100.0 / f64::from(self.games_played)
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_updates_counters_and_times() {
        let mut stats = GameStats::default();
        stats.record_win(10_000);

        assert_eq!(stats.games_played, 1);
        assert_eq!(stats.games_won, 1);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.best_streak, 1);
        assert_eq!(stats.best_time_ms, Some(10_000));
        assert_eq!(stats.average_time_ms, Some(10_000));
        assert_eq!(stats.win_rate, 100.0);
    }

    #[test]
    fn best_time_keeps_minimum() {
        let mut stats = GameStats::default();
        stats.record_win(10_000);
        stats.record_win(4_000);
        stats.record_win(8_000);

        assert_eq!(stats.best_time_ms, Some(4_000));
    }

    #[test]
    fn average_time_uses_two_point_recurrence() {
        let mut stats = GameStats::default();
        stats.record_win(10_000);
        stats.record_win(2_000);
        // (10000 + 2000) / 2, not a mean over all three games
        assert_eq!(stats.average_time_ms, Some(6_000));

        stats.record_win(4_000);
        assert_eq!(stats.average_time_ms, Some(5_000));
    }

    #[test]
    fn loss_resets_current_streak_only() {
        let mut stats = GameStats::default();
        stats.record_win(1_000);
        stats.record_win(1_000);
        stats.record_loss();

        assert_eq!(stats.games_played, 3);
        assert_eq!(stats.games_lost, 1);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.best_streak, 2);
    }

    #[test]
    fn draw_increments_played_and_drawn_only() {
        let mut stats = GameStats::default();
        stats.record_win(1_000);
        stats.record_draw();

        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.games_drawn, 1);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.win_rate, 50.0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut stats = GameStats::default();
        stats.record_win(1_000);
        stats.record_loss();
        stats.reset();

        assert_eq!(stats, GameStats::default());
        assert_eq!(stats.win_rate, 0.0);
    }
}
