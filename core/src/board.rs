use ndarray::Array2;
use rand::Rng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::{Cell, Coords, GameError, NeighborIter, Result};

/// Grid of cells plus the mine-count bookkeeping, shape `(height, width)`.
///
/// After construction exactly `mine_count` cells are mines and every
/// non-mine cell's `neighbor_mines` matches its in-bounds neighborhood.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    mine_count: usize,
}

impl Board {
    /// Random layout; callers validate `mines < height * width` beforehand,
    /// which bounds the rejection-sampling loop below.
    pub fn generate(height: usize, width: usize, mines: usize, rng: &mut SmallRng) -> Self {
        let mut board = Self {
            cells: Array2::default((height, width)),
            mine_count: mines,
        };

        let mut placed = 0;
        while placed < mines {
            let coords = (rng.random_range(0..height), rng.random_range(0..width));
            let cell = &mut board.cells[[coords.0, coords.1]];
            if !cell.is_mine {
                cell.is_mine = true;
                placed += 1;
            }
        }

        board.compute_neighbor_counts();
        board
    }

    /// Deterministic layout from explicit mine positions.
    pub fn from_mine_coords(height: usize, width: usize, mines: &[Coords]) -> Result<Self> {
        let mut cells: Array2<Cell> = Array2::default((height, width));

        for &(row, col) in mines {
            if row >= height || col >= width {
                return Err(GameError::InvalidCoords);
            }
            let cell = &mut cells[[row, col]];
            if cell.is_mine {
                return Err(GameError::DuplicateMine);
            }
            cell.is_mine = true;
        }

        let mut board = Self {
            cells,
            mine_count: mines.len(),
        };
        board.compute_neighbor_counts();
        Ok(board)
    }

    /// Shape as `(height, width)`.
    pub fn size(&self) -> Coords {
        self.cells.dim()
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn safe_cells(&self) -> usize {
        self.total_cells() - self.mine_count
    }

    pub fn in_bounds(&self, (row, col): Coords) -> bool {
        let (height, width) = self.size();
        row < height && col < width
    }

    pub fn get(&self, (row, col): Coords) -> Option<&Cell> {
        self.cells.get([row, col])
    }

    pub(crate) fn get_mut(&mut self, (row, col): Coords) -> Option<&mut Cell> {
        self.cells.get_mut([row, col])
    }

    pub fn iter_neighbors(&self, coords: Coords) -> NeighborIter {
        NeighborIter::new(coords, self.size())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Recounts `neighbor_mines` for every non-mine cell.
    pub(crate) fn compute_neighbor_counts(&mut self) {
        let (height, width) = self.size();
        for row in 0..height {
            for col in 0..width {
                if self[(row, col)].is_mine {
                    continue;
                }
                let count = self
                    .iter_neighbors((row, col))
                    .filter(|&pos| self[pos].is_mine)
                    .count() as u8;
                self[(row, col)].neighbor_mines = count;
            }
        }
    }

    /// Moves the mine at `from` to a random cell outside `from` and its
    /// neighborhood, with at most `total_cells` sampling attempts. Leaves the
    /// board untouched when no replacement is found within the budget.
    pub(crate) fn relocate_mine(&mut self, from: Coords, rng: &mut SmallRng) -> bool {
        let (height, width) = self.size();
        let excluded: Vec<Coords> = std::iter::once(from)
            .chain(self.iter_neighbors(from))
            .collect();

        let max_attempts = self.total_cells();
        for _ in 0..max_attempts {
            let coords = (rng.random_range(0..height), rng.random_range(0..width));
            if self[coords].is_mine || excluded.contains(&coords) {
                continue;
            }
            self[from].is_mine = false;
            self[coords].is_mine = true;
            self.compute_neighbor_counts();
            return true;
        }

        log::warn!("Could not relocate mine away from {from:?}, leaving it in place");
        false
    }

    /// Uncovers every mine; counters are the caller's concern.
    pub(crate) fn reveal_mines(&mut self) {
        for cell in self.cells.iter_mut() {
            if cell.is_mine {
                cell.is_revealed = true;
            }
        }
    }

    /// Flags every unflagged mine, returning how many flags were added.
    pub(crate) fn flag_remaining_mines(&mut self) -> usize {
        let mut added = 0;
        for cell in self.cells.iter_mut() {
            if cell.is_mine && !cell.is_flagged {
                cell.is_flagged = true;
                added += 1;
            }
        }
        added
    }
}

impl Index<Coords> for Board {
    type Output = Cell;

    fn index(&self, (row, col): Coords) -> &Self::Output {
        &self.cells[[row, col]]
    }
}

impl IndexMut<Coords> for Board {
    fn index_mut(&mut self, (row, col): Coords) -> &mut Self::Output {
        &mut self.cells[[row, col]]
    }
}
