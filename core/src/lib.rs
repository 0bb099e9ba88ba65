use serde::{Deserialize, Serialize};

pub use board::*;
pub use cell::*;
pub use error::*;
pub use event::*;
pub use history::*;
pub use lifecycle::*;
pub use minesweeper::*;
pub use stats::*;
pub use types::*;

mod board;
mod cell;
mod error;
mod event;
mod history;
mod lifecycle;
mod minesweeper;
mod stats;
mod types;

/// Named difficulty tier carried by a [`GameConfig`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
    Custom,
}

/// Immutable-per-episode board parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub difficulty: Difficulty,
    pub width: usize,
    pub height: usize,
    pub mines: usize,
}

impl GameConfig {
    pub fn new(difficulty: Difficulty, width: usize, height: usize, mines: usize) -> Result<Self> {
        let config = Self {
            difficulty,
            width,
            height,
            mines,
        };
        config.validate()?;
        Ok(config)
    }

    pub const fn beginner() -> Self {
        Self {
            difficulty: Difficulty::Beginner,
            width: 9,
            height: 9,
            mines: 10,
        }
    }

    pub const fn intermediate() -> Self {
        Self {
            difficulty: Difficulty::Intermediate,
            width: 16,
            height: 16,
            mines: 40,
        }
    }

    pub const fn expert() -> Self {
        Self {
            difficulty: Difficulty::Expert,
            width: 30,
            height: 16,
            mines: 99,
        }
    }

    pub fn custom(width: usize, height: usize, mines: usize) -> Result<Self> {
        Self::new(Difficulty::Custom, width, height, mines)
    }

    /// Checks the invariant `0 <= mines < width * height` on a non-empty board.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GameError::EmptyBoard);
        }
        if self.mines >= self.total_cells() {
            return Err(GameError::TooManyMines);
        }
        Ok(())
    }

    pub const fn total_cells(&self) -> usize {
        self.width * self.height
    }

    pub const fn safe_cells(&self) -> usize {
        self.total_cells() - self.mines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_classic_tiers() {
        let beginner = GameConfig::beginner();
        assert_eq!((beginner.width, beginner.height, beginner.mines), (9, 9, 10));
        assert_eq!(beginner.difficulty, Difficulty::Beginner);

        let intermediate = GameConfig::intermediate();
        assert_eq!(
            (intermediate.width, intermediate.height, intermediate.mines),
            (16, 16, 40)
        );
        assert_eq!(intermediate.difficulty, Difficulty::Intermediate);

        let expert = GameConfig::expert();
        assert_eq!((expert.width, expert.height, expert.mines), (30, 16, 99));
        assert_eq!(expert.difficulty, Difficulty::Expert);
    }

    #[test]
    fn rejects_mine_count_at_or_above_cell_count() {
        assert_eq!(
            GameConfig::custom(3, 3, 9).unwrap_err(),
            GameError::TooManyMines
        );
        assert_eq!(
            GameConfig::custom(3, 3, 10).unwrap_err(),
            GameError::TooManyMines
        );
        assert!(GameConfig::custom(3, 3, 8).is_ok());
        assert!(GameConfig::custom(3, 3, 0).is_ok());
    }

    #[test]
    fn rejects_zero_area_boards() {
        assert_eq!(GameConfig::custom(0, 5, 0).unwrap_err(), GameError::EmptyBoard);
        assert_eq!(GameConfig::custom(5, 0, 0).unwrap_err(), GameError::EmptyBoard);
    }
}
