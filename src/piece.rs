//! Tetrominoes: kinds, canonical matrices, spawning and the clockwise rotation transform.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Tetromino kinds (I, J, L, O, S, T, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::I, Self::J, Self::L, Self::O, Self::S, Self::T, Self::Z];

    /// Canonical spawn matrix. I is 4x4, O is 2x2, the rest 3x3.
    pub fn shape(&self) -> Shape {
        let rows: &[&[u8]] = match self {
            Self::I => &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
            Self::J => &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]],
            Self::L => &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]],
            Self::T => &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]],
        };
        Shape::from_rows(rows)
    }

    pub fn letter(&self) -> char {
        match self {
            Self::I => 'I',
            Self::J => 'J',
            Self::L => 'L',
            Self::O => 'O',
            Self::S => 'S',
            Self::T => 'T',
            Self::Z => 'Z',
        }
    }
}

/// Occupancy matrix of a piece. `rows[r][c]` is 0 (empty) or 1 (filled).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: Vec<Vec<u8>>,
}

impl Shape {
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        Self {
            rows: rows.iter().map(|r| r.to_vec()).collect(),
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(0)
    }

    /// Occupied cells as (row, col) offsets from the piece origin.
    pub fn filled(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| **v != 0)
                .map(move |(c, _)| (r as i32, c as i32))
        })
    }

    /// Clockwise quarter turn: `out[r][c] = in[H-1-c][r]`; output is W rows by H columns.
    pub fn rotated(&self) -> Self {
        let (h, w) = (self.height(), self.width());
        let rows = (0..w)
            .map(|r| (0..h).map(|c| self.get(h - 1 - c, r)).collect())
            .collect();
        Self { rows }
    }
}

/// A falling piece: kind, current matrix and grid origin (`y` may be negative).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// Canonical matrix, horizontally centred on a board `cols` wide, `y = 0`.
    pub fn spawn(kind: PieceKind, cols: usize) -> Self {
        let shape = kind.shape();
        let x = (cols.saturating_sub(shape.width()) / 2) as i32;
        Self { kind, shape, x, y: 0 }
    }

    /// Absolute (row, col) positions of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .filled()
            .map(move |(r, c)| (self.y + r, self.x + c))
    }

    /// Same piece translated by (dx, dy).
    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self.clone()
        }
    }

    /// Rotated matrix; does not touch `self`.
    pub fn rotate(&self) -> Shape {
        self.shape.rotated()
    }
}

/// Uniform piece picker. Every draw is independent: no bag, no repeat avoidance.
#[derive(Debug, Clone)]
pub struct Randomizer {
    rng: Pcg32,
}

impl Randomizer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn next_kind(&mut self) -> PieceKind {
        PieceKind::ALL[self.rng.random_range(0..PieceKind::ALL.len())]
    }

    pub fn spawn(&mut self, cols: usize) -> Piece {
        Piece::spawn(self.next_kind(), cols)
    }
}
