//! Board: cell occupancy, collision, wall kicks, locking and line clears.

use crate::piece::{Piece, Randomizer};
use std::collections::VecDeque;

pub const ROWS: usize = 20;
pub const COLS: usize = 10;

/// Result of one gravity step on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropOutcome {
    /// False when the replacement piece cannot be placed at its spawn position.
    pub still_playing: bool,
    pub lines_cleared: u32,
    pub piece_locked: bool,
}

impl DropOutcome {
    const FALLING: Self = Self {
        still_playing: true,
        lines_cleared: 0,
        piece_locked: false,
    };
}

/// 20x10 board. `rows[0]` is the top row; 0 = empty, nonzero = occupied.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: VecDeque<Vec<u8>>,
    pub active: Piece,
}

impl Grid {
    pub fn new(active: Piece) -> Self {
        Self {
            rows: empty_rows(),
            active,
        }
    }

    /// Zero every cell and install a fresh active piece.
    pub fn reset(&mut self, active: Piece) {
        self.rows = empty_rows();
        self.active = active;
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.iter().all(|&v| v == 0))
    }

    /// Columns must lie in `[0, COLS)` and rows below `ROWS`; rows above the
    /// board (negative) never collide, so pieces may overhang the top.
    pub fn is_valid(&self, candidate: &Piece) -> bool {
        candidate.cells().all(|(row, col)| {
            if col < 0 || col >= COLS as i32 || row >= ROWS as i32 {
                return false;
            }
            row < 0 || self.get(row as usize, col as usize) == Some(0)
        })
    }

    /// Translate the active piece if the target placement is valid.
    pub fn move_piece(&mut self, dx: i32, dy: i32) -> bool {
        let candidate = self.active.shifted(dx, dy);
        if self.is_valid(&candidate) {
            self.active = candidate;
            true
        } else {
            false
        }
    }

    /// Rotate clockwise, probing in place, then one column left, then one right.
    pub fn rotate(&mut self) -> bool {
        let rotated = self.active.rotate();
        for dx in [0, -1, 1] {
            let candidate = Piece {
                shape: rotated.clone(),
                ..self.active.shifted(dx, 0)
            };
            if self.is_valid(&candidate) {
                self.active = candidate;
                return true;
            }
        }
        false
    }

    /// One gravity step. When the piece cannot fall it is locked, full rows are
    /// cleared and `next` (or a fresh random piece) becomes active.
    pub fn lock_and_advance(
        &mut self,
        next: Option<Piece>,
        randomizer: &mut Randomizer,
    ) -> DropOutcome {
        if self.move_piece(0, 1) {
            return DropOutcome::FALLING;
        }
        self.lock();
        let lines_cleared = self.clear_lines();
        self.active = next.unwrap_or_else(|| randomizer.spawn(COLS));
        DropOutcome {
            still_playing: self.is_valid(&self.active),
            lines_cleared,
            piece_locked: true,
        }
    }

    /// Write the active piece into the board. Cells above the top are dropped.
    fn lock(&mut self) {
        let cells: Vec<_> = self.active.cells().collect();
        for (row, col) in cells {
            if row < 0 || col < 0 {
                continue;
            }
            if let Some(cell) = self
                .rows
                .get_mut(row as usize)
                .and_then(|r| r.get_mut(col as usize))
            {
                *cell = 1;
            }
        }
    }

    /// Remove full rows, keep the rest in order and pad with empty rows on top.
    pub fn clear_lines(&mut self) -> u32 {
        let before = self.rows.len();
        self.rows.retain(|row| row.iter().any(|&v| v == 0));
        let cleared = before - self.rows.len();
        for _ in 0..cleared {
            self.rows.push_front(vec![0; COLS]);
        }
        cleared as u32
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, row: usize, col: usize, value: u8) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    #[cfg(test)]
    pub(crate) fn fill_row_except(&mut self, row: usize, gaps: &[usize]) {
        for col in 0..COLS {
            self.set(row, col, u8::from(!gaps.contains(&col)));
        }
    }
}

fn empty_rows() -> VecDeque<Vec<u8>> {
    (0..ROWS).map(|_| vec![0; COLS]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{PieceKind, Shape};
    use proptest::prelude::*;

    fn grid_with(kind: PieceKind) -> Grid {
        Grid::new(Piece::spawn(kind, COLS))
    }

    fn snapshot(grid: &Grid) -> (Vec<Vec<u8>>, Piece) {
        (grid.rows().map(<[u8]>::to_vec).collect(), grid.active.clone())
    }

    #[test]
    fn test_is_valid_bounds() {
        let grid = grid_with(PieceKind::O);
        let o = Piece::spawn(PieceKind::O, COLS);
        assert!(grid.is_valid(&Piece { x: 0, ..o.clone() }));
        assert!(grid.is_valid(&Piece { x: 8, ..o.clone() }));
        assert!(!grid.is_valid(&Piece { x: -1, ..o.clone() }));
        assert!(!grid.is_valid(&Piece { x: 9, ..o.clone() }));
        assert!(grid.is_valid(&Piece { y: 18, ..o.clone() }));
        assert!(!grid.is_valid(&Piece { y: 19, ..o }));
    }

    #[test]
    fn test_negative_rows_ignore_occupancy() {
        let mut grid = grid_with(PieceKind::O);
        for col in 0..COLS {
            grid.set(0, col, 1);
        }
        let o = Piece::spawn(PieceKind::O, COLS);
        assert!(grid.is_valid(&Piece { y: -2, ..o.clone() }));
        assert!(!grid.is_valid(&Piece { y: -1, ..o }));
    }

    #[test]
    fn test_move_commits_only_when_valid() {
        let mut grid = grid_with(PieceKind::O);
        assert!(grid.move_piece(-4, 0));
        assert_eq!(grid.active.x, 0);
        assert!(!grid.move_piece(-1, 0));
        assert_eq!(grid.active.x, 0);
        assert!(grid.move_piece(0, 1));
        assert_eq!(grid.active.y, 1);
    }

    #[test]
    fn test_rotate_in_place() {
        let mut grid = grid_with(PieceKind::T);
        assert!(grid.rotate());
        assert_eq!(grid.active.x, 3);
        assert_eq!(grid.active.shape, PieceKind::T.shape().rotated());
    }

    #[test]
    fn test_rotate_kicks_left_off_right_wall() {
        // Vertical I in column 9 (origin x = 7); the horizontal form overhangs the wall.
        let mut grid = grid_with(PieceKind::I);
        grid.active = Piece {
            shape: PieceKind::I.shape().rotated(),
            x: 7,
            y: 5,
            kind: PieceKind::I,
        };
        // Horizontal at x=7 covers cols 7..=10: invalid. x=6 covers 6..=9: valid.
        assert!(grid.rotate());
        assert_eq!(grid.active.x, 6);
        assert_eq!(grid.active.shape, PieceKind::I.shape().rotated().rotated());
    }

    #[test]
    fn test_rotate_kicks_right_off_left_wall() {
        // Vertical I (filled column 2) pushed to the left wall: x = -2.
        let mut grid = grid_with(PieceKind::I);
        grid.active = Piece {
            shape: PieceKind::I.shape().rotated(),
            x: -2,
            y: 5,
            kind: PieceKind::I,
        };
        // Horizontal row 2 spans x..x+3; x=-2 and x=-3 fail, x=-1 fails too.
        assert!(!grid.rotate());
        grid.active.x = -1;
        assert!(grid.rotate());
        assert_eq!(grid.active.x, 0);
    }

    #[test]
    fn test_rotate_failure_leaves_state_unchanged() {
        let mut grid = grid_with(PieceKind::T);
        grid.active = Piece {
            shape: Shape::from_rows(&[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]]),
            x: 3,
            y: 10,
            kind: PieceKind::T,
        };
        // Rotated T occupies rows 10..=12 of column x+1 and (11, x+2).
        // Block column x+1 at row 12 for every kick.
        for col in 3..=5 {
            grid.set(12, col, 1);
        }
        let before = snapshot(&grid);
        assert!(!grid.rotate());
        assert_eq!(snapshot(&grid), before);
    }

    #[test]
    fn test_lock_and_advance_falls_first() {
        let mut grid = grid_with(PieceKind::O);
        let mut rng = Randomizer::new(1);
        let out = grid.lock_and_advance(None, &mut rng);
        assert_eq!(out, DropOutcome::FALLING);
        assert_eq!(grid.active.y, 1);
    }

    #[test]
    fn test_lock_uses_buffered_piece() {
        let mut grid = grid_with(PieceKind::O);
        let mut rng = Randomizer::new(1);
        grid.active.y = 18;
        let next = Piece::spawn(PieceKind::T, COLS);
        let out = grid.lock_and_advance(Some(next.clone()), &mut rng);
        assert!(out.piece_locked && out.still_playing);
        assert_eq!(out.lines_cleared, 0);
        assert_eq!(grid.active, next);
        assert_eq!(grid.get(18, 4), Some(1));
        assert_eq!(grid.get(19, 5), Some(1));
    }

    #[test]
    fn test_lock_clears_completed_rows() {
        let mut grid = grid_with(PieceKind::O);
        let mut rng = Randomizer::new(1);
        grid.fill_row_except(18, &[4, 5]);
        grid.fill_row_except(19, &[4, 5]);
        grid.set(17, 0, 1);
        grid.active.y = 18;
        let out = grid.lock_and_advance(None, &mut rng);
        assert_eq!(out.lines_cleared, 2);
        // Row 17's lone cell slides to the bottom.
        assert_eq!(grid.get(19, 0), Some(1));
        assert_eq!(grid.rows().filter(|r| r.iter().any(|&v| v != 0)).count(), 1);
    }

    #[test]
    fn test_lock_drops_cells_above_board() {
        let mut grid = grid_with(PieceKind::O);
        let mut rng = Randomizer::new(1);
        for row in 0..ROWS {
            grid.set(row, 4, 1);
        }
        grid.active.y = -1;
        grid.active.x = 4;
        let out = grid.lock_and_advance(Some(Piece::spawn(PieceKind::O, COLS)), &mut rng);
        assert!(out.piece_locked);
        assert!(!out.still_playing);
        assert_eq!(grid.get(0, 5), Some(1));
    }

    #[test]
    fn test_game_over_when_spawn_blocked() {
        let mut grid = grid_with(PieceKind::O);
        let mut rng = Randomizer::new(1);
        grid.set(0, 4, 1);
        grid.active = Piece {
            x: 0,
            y: 18,
            ..Piece::spawn(PieceKind::O, COLS)
        };
        let out = grid.lock_and_advance(Some(Piece::spawn(PieceKind::O, COLS)), &mut rng);
        assert_eq!(
            out,
            DropOutcome {
                still_playing: false,
                lines_cleared: 0,
                piece_locked: true
            }
        );
    }

    #[test]
    fn test_reset_zeroes_board() {
        let mut grid = grid_with(PieceKind::O);
        grid.fill_row_except(19, &[0]);
        assert!(!grid.is_empty());
        grid.reset(Piece::spawn(PieceKind::S, COLS));
        assert!(grid.is_empty());
        assert_eq!(grid.active.kind, PieceKind::S);
    }

    proptest! {
        #[test]
        fn out_of_range_columns_rejected(x in -20i32..20, y in -5i32..25) {
            let grid = grid_with(PieceKind::O);
            let p = Piece { x, y, ..Piece::spawn(PieceKind::O, COLS) };
            let in_cols = x >= 0 && x + 1 < COLS as i32;
            let in_rows = y + 1 < ROWS as i32;
            prop_assert_eq!(grid.is_valid(&p), in_cols && in_rows);
        }

        #[test]
        fn clearing_preserves_other_rows(
            pattern in proptest::collection::vec(
                proptest::collection::vec(0u8..=1, COLS), ROWS)
        ) {
            let mut grid = grid_with(PieceKind::O);
            for (r, row) in pattern.iter().enumerate() {
                for (c, &v) in row.iter().enumerate() {
                    grid.set(r, c, v);
                }
            }
            let survivors: Vec<Vec<u8>> = pattern
                .iter()
                .filter(|row| row.iter().any(|&v| v == 0))
                .cloned()
                .collect();
            let full = ROWS - survivors.len();
            prop_assert_eq!(grid.clear_lines() as usize, full);
            let after: Vec<Vec<u8>> = grid.rows().map(<[u8]>::to_vec).collect();
            prop_assert!(after[..full].iter().all(|r| r.iter().all(|&v| v == 0)));
            prop_assert_eq!(&after[full..], &survivors[..]);
        }
    }
}
