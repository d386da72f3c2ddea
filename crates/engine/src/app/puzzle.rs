use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::primitives::Direction;

const SLIDING_TILES_SIZE: usize = 3;
const SCRAMBLE_MOVES: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleKind {
    SlidingTiles,
}

/// Board snapshot for drawing. `None` is the empty slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleView {
    pub size: usize,
    pub cells: Vec<Option<u8>>,
    pub moves: u32,
}

pub trait Puzzle {
    /// Returns true when the input changed the board.
    fn handle_input(&mut self, direction: Direction) -> bool;
    fn is_solved(&self) -> bool;
    fn view(&self) -> PuzzleView;
}

pub fn create_puzzle(kind: PuzzleKind, rng: &mut ChaCha8Rng) -> Box<dyn Puzzle> {
    match kind {
        PuzzleKind::SlidingTiles => Box::new(SlidingTiles::scrambled(
            SLIDING_TILES_SIZE,
            SCRAMBLE_MOVES,
            rng,
        )),
    }
}

/// `size`x`size` sliding-tiles board. Cells hold `1..size*size` in solved
/// order with `0` as the empty slot in the last position. A direction moves
/// the neighbouring tile into the empty slot in that direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingTiles {
    size: usize,
    cells: Vec<u8>,
    moves: u32,
}

impl SlidingTiles {
    pub fn solved(size: usize) -> Self {
        let size = size.clamp(2, 15);
        let count = size * size;
        let mut cells: Vec<u8> = (1..count).map(|value| value as u8).collect();
        cells.push(0);
        Self {
            size,
            cells,
            moves: 0,
        }
    }

    /// Scrambled by legal moves only, so the board is always solvable.
    pub fn scrambled(size: usize, moves: usize, rng: &mut ChaCha8Rng) -> Self {
        let mut board = Self::solved(size);
        let mut last: Option<Direction> = None;
        let mut applied = 0;
        while applied < moves || board.is_solved() {
            let mut options: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|direction| Some(direction.opposite()) != last)
                .filter(|direction| board.source_of(*direction).is_some())
                .collect();
            options.shuffle(rng);
            let Some(direction) = options.first().copied() else {
                break;
            };
            board.slide(direction);
            last = Some(direction);
            applied += 1;
        }
        board.moves = 0;
        board
    }

    fn blank_index(&self) -> usize {
        self.cells.iter().position(|cell| *cell == 0).unwrap_or(0)
    }

    /// Index of the tile that would slide into the blank for `direction`.
    fn source_of(&self, direction: Direction) -> Option<usize> {
        let blank = self.blank_index();
        let (x, y) = (blank % self.size, blank / self.size);
        match direction {
            Direction::Right if x > 0 => Some(blank - 1),
            Direction::Left if x + 1 < self.size => Some(blank + 1),
            Direction::Down if y > 0 => Some(blank - self.size),
            Direction::Up if y + 1 < self.size => Some(blank + self.size),
            _ => None,
        }
    }

    fn slide(&mut self, direction: Direction) -> bool {
        let Some(source) = self.source_of(direction) else {
            return false;
        };
        let blank = self.blank_index();
        self.cells.swap(source, blank);
        self.moves = self.moves.saturating_add(1);
        true
    }
}

impl Puzzle for SlidingTiles {
    fn handle_input(&mut self, direction: Direction) -> bool {
        self.slide(direction)
    }

    fn is_solved(&self) -> bool {
        let last = self.cells.len() - 1;
        self.cells[last] == 0
            && self.cells[..last]
                .iter()
                .enumerate()
                .all(|(index, cell)| usize::from(*cell) == index + 1)
    }

    fn view(&self) -> PuzzleView {
        PuzzleView {
            size: self.size,
            cells: self
                .cells
                .iter()
                .map(|cell| (*cell != 0).then_some(*cell))
                .collect(),
            moves: self.moves,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn solved_board_reports_solved() {
        let board = SlidingTiles::solved(3);
        assert!(board.is_solved());
        assert_eq!(board.view().cells[8], None);
        assert_eq!(board.view().cells[0], Some(1));
    }

    #[test]
    fn right_slides_left_neighbour_into_blank() {
        let mut board = SlidingTiles::solved(3);
        assert!(board.handle_input(Direction::Right));

        let view = board.view();
        assert_eq!(view.cells[7], None);
        assert_eq!(view.cells[8], Some(8));
        assert!(!board.is_solved());

        assert!(board.handle_input(Direction::Left));
        assert!(board.is_solved());
        assert_eq!(board.view().moves, 2);
    }

    #[test]
    fn moves_off_the_edge_are_rejected() {
        let mut board = SlidingTiles::solved(3);
        assert!(!board.handle_input(Direction::Left));
        assert!(!board.handle_input(Direction::Up));
        assert!(board.is_solved());
    }

    #[test]
    fn scramble_is_deterministic_and_unsolved() {
        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);

        let a = SlidingTiles::scrambled(3, 30, &mut rng_a);
        let b = SlidingTiles::scrambled(3, 30, &mut rng_b);

        assert_eq!(a, b);
        assert!(!a.is_solved());
        assert_eq!(a.view().moves, 0);
    }

    #[test]
    fn create_puzzle_builds_a_three_by_three_board() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let puzzle = create_puzzle(PuzzleKind::SlidingTiles, &mut rng);
        let view = puzzle.view();

        assert_eq!(view.size, 3);
        assert_eq!(view.cells.iter().filter(|cell| cell.is_none()).count(), 1);
    }
}
