use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    Board, Cell, Coords, Difficulty, Game, GameConfig, GameCore, GameEvent, GameSnapshot,
    GameState, GameStats, ObserverId, Result,
};

/// Move dispatched through [`Game::make_move`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    Reveal { row: usize, col: usize },
    Flag { row: usize, col: usize },
}

/// Snapshot bundle of the externally visible engine state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    pub board: Board,
    pub state: GameState,
    pub remaining_mines: isize,
    pub revealed_cells: usize,
    pub width: usize,
    pub height: usize,
    pub total_mines: usize,
}

/// Minesweeper engine: a board of [`Cell`]s on top of an embedded
/// [`GameCore`] that owns the lifecycle, stats, and event state.
#[derive(Debug)]
pub struct Minesweeper {
    core: GameCore,
    config: GameConfig,
    board: Board,
    revealed_cells: usize,
    flagged_cells: usize,
    first_click: bool,
    rng: SmallRng,
}

impl Minesweeper {
    /// Engine with a random mine layout. The board is generated immediately
    /// but the game stays idle until [`Minesweeper::start`].
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_seed(config, rand::rng().random())
    }

    /// Engine with a reproducible mine layout.
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let board = Board::generate(config.height, config.width, config.mines, &mut rng);
        Ok(Self {
            core: GameCore::new(config.difficulty),
            config,
            board,
            revealed_cells: 0,
            flagged_cells: 0,
            first_click: true,
            rng,
        })
    }

    /// Engine with an explicit mine layout, for tests and puzzle setups.
    pub fn with_mine_coords(
        difficulty: Difficulty,
        width: usize,
        height: usize,
        mines: &[Coords],
    ) -> Result<Self> {
        let config = GameConfig::new(difficulty, width, height, mines.len())?;
        let board = Board::from_mine_coords(height, width, mines)?;
        Ok(Self {
            core: GameCore::new(difficulty),
            config,
            board,
            revealed_cells: 0,
            flagged_cells: 0,
            first_click: true,
            rng: SmallRng::seed_from_u64(rand::rng().random()),
        })
    }

    pub fn start(&mut self) {
        self.core.start();
    }

    pub fn pause(&mut self) {
        self.core.pause();
    }

    pub fn resume(&mut self) {
        self.core.resume();
    }

    pub fn quit(&mut self) {
        self.core.quit();
    }

    /// Reveals a cell as a user-initiated move.
    ///
    /// With `first_click_protection`, a mine under the very first reveal of
    /// the episode is relocated outside the clicked neighborhood before the
    /// reveal proceeds (best effort; the relocation can fail on tiny boards).
    pub fn reveal_cell(&mut self, row: usize, col: usize, first_click_protection: bool) -> bool {
        self.reveal_internal((row, col), true, first_click_protection)
    }

    fn reveal_internal(&mut self, coords: Coords, counted: bool, protect: bool) -> bool {
        if self.core.state() != GameState::Playing {
            return false;
        }
        let Some(&cell) = self.board.get(coords) else {
            return false;
        };
        if !cell.can_reveal() {
            return false;
        }

        if protect && counted && self.first_click && cell.is_mine {
            self.board.relocate_mine(coords, &mut self.rng);
        }
        if counted && self.first_click {
            self.first_click = false;
        }

        // reread: the mine may have been relocated
        let cell = self.board[coords];
        self.board[coords].is_revealed = true;
        self.revealed_cells += 1;
        if counted {
            log::debug!("Reveal cell at {coords:?}, neighbor mines: {}", cell.neighbor_mines);
            self.core.increment_move();
        } else {
            log::trace!("Flood revealed cell at {coords:?}");
        }

        if cell.is_mine {
            self.board.reveal_mines();
            self.core.game_lost();
            return true;
        }

        if cell.neighbor_mines == 0 {
            let neighbors: Vec<Coords> = self.board.iter_neighbors(coords).collect();
            for neighbor in neighbors {
                self.reveal_internal(neighbor, false, false);
            }
        }

        if self.revealed_cells == self.board.safe_cells() {
            self.finish_won();
        }

        true
    }

    /// Inverts the flag on an unrevealed cell. Not a counted move.
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> bool {
        if self.core.state() != GameState::Playing {
            return false;
        }
        let Some(cell) = self.board.get_mut((row, col)) else {
            return false;
        };
        if !cell.can_flag() {
            return false;
        }

        cell.is_flagged = !cell.is_flagged;
        if cell.is_flagged {
            self.flagged_cells += 1;
        } else {
            self.flagged_cells -= 1;
        }
        true
    }

    /// Auto-flags the remaining mines before the terminal transition, so a
    /// finished winning board always shows every mine flagged.
    fn finish_won(&mut self) {
        self.flagged_cells += self.board.flag_remaining_mines();
        self.core.game_won();
    }

    pub fn state(&self) -> GameState {
        self.core.state()
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn difficulty(&self) -> Difficulty {
        self.core.difficulty()
    }

    /// Owned snapshot copy of the board; mutating it never touches the
    /// engine's own grid.
    pub fn board(&self) -> Board {
        self.board.clone()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.board.get((row, col)).copied()
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.config.width, self.config.height)
    }

    /// Mines minus placed flags; negative when over-flagged.
    pub fn remaining_mines(&self) -> isize {
        self.board.mine_count() as isize - self.flagged_cells as isize
    }

    pub fn revealed_cells(&self) -> usize {
        self.revealed_cells
    }

    pub fn total_mines(&self) -> usize {
        self.board.mine_count()
    }

    pub fn move_count(&self) -> u32 {
        self.core.move_count()
    }

    pub fn score(&self) -> i64 {
        self.core.score()
    }

    pub fn stats(&self) -> &GameStats {
        self.core.stats()
    }

    pub fn reset_stats(&mut self) {
        self.core.reset_stats();
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.core.elapsed_ms()
    }

    pub fn elapsed_formatted(&self) -> String {
        self.core.elapsed_formatted()
    }

    pub fn add_observer(&mut self, observer: impl FnMut(&GameEvent) + 'static) -> ObserverId {
        self.core.add_observer(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.core.remove_observer(id)
    }

    /// Lifecycle snapshot for persistence collaborators.
    pub fn snapshot(&self) -> GameSnapshot<GameConfig> {
        self.core.snapshot(self.config)
    }

    fn reset_with(&mut self, config: Option<GameConfig>) -> Result<()> {
        if let Some(config) = config {
            config.validate()?;
            self.config = config;
            self.core.update_config(config.difficulty);
        }

        self.core.reset_episode();
        self.revealed_cells = 0;
        self.flagged_cells = 0;
        self.first_click = true;
        self.board = Board::generate(
            self.config.height,
            self.config.width,
            self.config.mines,
            &mut self.rng,
        );
        Ok(())
    }
}

impl Game for Minesweeper {
    type Config = GameConfig;
    type Move = Move;
    type Data = GameData;

    fn start(&mut self) {
        Minesweeper::start(self);
    }

    /// Regenerates the board and returns to idle; a new config replaces the
    /// dimensions and mine count for the next episode.
    fn reset(&mut self, config: Option<GameConfig>) -> Result<()> {
        self.reset_with(config)
    }

    fn make_move(&mut self, game_move: Move) -> bool {
        match game_move {
            Move::Reveal { row, col } => self.reveal_internal((row, col), true, false),
            Move::Flag { row, col } => self.toggle_flag(row, col),
        }
    }

    fn is_valid_move(&self, game_move: &Move) -> bool {
        if self.core.state() != GameState::Playing {
            return false;
        }
        match *game_move {
            Move::Reveal { row, col } => self
                .board
                .get((row, col))
                .is_some_and(|cell| cell.can_reveal()),
            Move::Flag { row, col } => self
                .board
                .get((row, col))
                .is_some_and(|cell| cell.can_flag()),
        }
    }

    fn game_data(&self) -> GameData {
        GameData {
            board: self.board.clone(),
            state: self.core.state(),
            remaining_mines: self.remaining_mines(),
            revealed_cells: self.revealed_cells,
            width: self.config.width,
            height: self.config.height,
            total_mines: self.board.mine_count(),
        }
    }

    /// Fully independent copy of the current episode: board, counters, and
    /// state, with fresh stats and no observers.
    fn clone_game(&self) -> Self {
        Self {
            core: self.core.clone_detached(),
            config: self.config,
            board: self.board.clone(),
            revealed_cells: self.revealed_cells,
            flagged_cells: self.flagged_cells,
            first_click: self.first_click,
            rng: self.rng.clone(),
        }
    }
}

impl fmt::Display for Minesweeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (height, width) = self.board.size();
        for row in 0..height {
            for col in 0..width {
                let cell = self.board[(row, col)];
                if cell.is_flagged {
                    write!(f, "F ")?;
                } else if !cell.is_revealed {
                    write!(f, "? ")?;
                } else if cell.is_mine {
                    write!(f, "* ")?;
                } else {
                    write!(f, "{} ", cell.neighbor_mines)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
