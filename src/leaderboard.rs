//! Ranking store and the post-game high-score flow (qualification, name entry).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rankings shown after a game.
pub const TOP_N: usize = 5;
/// Characters selectable in name entry, in cycling order.
pub const NAME_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ123456789-.";
pub const NAME_LEN: usize = 3;

const FILENAME: &str = "leaderboard.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid leaderboard data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("leaderboard unavailable")]
    Unavailable,
}

/// Remote-or-local ranking store. Both calls may fail; callers go through
/// [`fetch_or_empty`] and [`submit_best_effort`].
pub trait Leaderboard {
    fn fetch_rankings(&self) -> Result<Vec<Ranking>, LeaderboardError>;

    fn submit_score(&mut self, entry: &Ranking) -> Result<(), LeaderboardError>;
}

/// Any failure becomes an empty list.
pub fn fetch_or_empty(board: &dyn Leaderboard) -> Vec<Ranking> {
    match board.fetch_rankings() {
        Ok(list) => list,
        Err(e) => {
            log::warn!("failed to fetch leaderboard: {e}");
            Vec::new()
        }
    }
}

/// Returns whether the submission went through.
pub fn submit_best_effort(board: &mut dyn Leaderboard, entry: &Ranking) -> bool {
    match board.submit_score(entry) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to submit score: {e}");
            false
        }
    }
}

/// Highest score first; ties keep their stored order.
pub fn sort_rankings(rankings: &mut [Ranking]) {
    rankings.sort_by(|a, b| b.score.cmp(&a.score));
}

/// A positive score qualifies when the table has room or it beats the fifth best.
pub fn is_high_score(score: u32, rankings: &[Ranking]) -> bool {
    if score == 0 {
        return false;
    }
    let mut sorted = rankings.to_vec();
    sort_rankings(&mut sorted);
    sorted
        .get(TOP_N - 1)
        .map_or(true, |lowest| score > lowest.score)
}

/// Top entries for display, plus the index of the first row matching the
/// just-submitted entry.
pub fn top_rankings(mut rankings: Vec<Ranking>, highlight: Option<&Ranking>) -> (Vec<Ranking>, Option<usize>) {
    sort_rankings(&mut rankings);
    rankings.truncate(TOP_N);
    let index = highlight.and_then(|h| rankings.iter().position(|r| r == h));
    (rankings, index)
}

/// Returns the path to the leaderboard file (config dir / rocketris / leaderboard.json).
pub fn default_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join("rocketris").join(FILENAME)
}

/// JSON array of rankings on disk. A missing file is an empty table.
#[derive(Debug, Clone)]
pub struct FileLeaderboard {
    path: PathBuf,
}

impl FileLeaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Leaderboard for FileLeaderboard {
    fn fetch_rankings(&self) -> Result<Vec<Ranking>, LeaderboardError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let rankings: Vec<Ranking> = serde_json::from_str(&content)?;
        log::debug!("loaded {} rankings from {}", rankings.len(), self.path.display());
        Ok(rankings)
    }

    fn submit_score(&mut self, entry: &Ranking) -> Result<(), LeaderboardError> {
        let mut rankings = self.fetch_rankings()?;
        rankings.push(entry.clone());
        sort_rankings(&mut rankings);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&rankings)?)?;
        log::info!("saved score {} for {}", entry.score, entry.name);
        Ok(())
    }
}

/// Store that is never reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLeaderboard;

impl Leaderboard for UnavailableLeaderboard {
    fn fetch_rankings(&self) -> Result<Vec<Ranking>, LeaderboardError> {
        Err(LeaderboardError::Unavailable)
    }

    fn submit_score(&mut self, _entry: &Ranking) -> Result<(), LeaderboardError> {
        Err(LeaderboardError::Unavailable)
    }
}

/// Three-letter arcade name picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    /// Indices into [`NAME_CHARSET`].
    slots: [usize; NAME_LEN],
    pub cursor: usize,
}

impl Default for NameEntry {
    fn default() -> Self {
        Self {
            slots: [0; NAME_LEN],
            cursor: 0,
        }
    }
}

impl NameEntry {
    pub fn cursor_left(&mut self) {
        self.cursor = (self.cursor + NAME_LEN - 1) % NAME_LEN;
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1) % NAME_LEN;
    }

    pub fn next_char(&mut self) {
        let n = NAME_CHARSET.len();
        self.slots[self.cursor] = (self.slots[self.cursor] + 1) % n;
    }

    pub fn prev_char(&mut self) {
        let n = NAME_CHARSET.len();
        self.slots[self.cursor] = (self.slots[self.cursor] + n - 1) % n;
    }

    pub fn chars(&self) -> [char; NAME_LEN] {
        let charset = NAME_CHARSET.as_bytes();
        self.slots.map(|i| char::from(charset[i]))
    }

    pub fn name(&self) -> String {
        self.chars().iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(name: &str, score: u32) -> Ranking {
        Ranking {
            name: name.to_string(),
            score,
        }
    }

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("rocketris-test-{}-{tag}", std::process::id()))
            .join(FILENAME)
    }

    #[test]
    fn test_zero_never_qualifies() {
        assert!(!is_high_score(0, &[]));
    }

    #[test]
    fn test_qualifies_with_room() {
        let list = vec![r("AAA", 900), r("BBB", 800)];
        assert!(is_high_score(1, &list));
    }

    #[test]
    fn test_must_beat_fifth_best() {
        let list = vec![
            r("A", 10),
            r("B", 500),
            r("C", 40),
            r("D", 300),
            r("E", 200),
            r("F", 100),
        ];
        // Fifth best is 40.
        assert!(!is_high_score(40, &list));
        assert!(is_high_score(41, &list));
    }

    #[test]
    fn test_top_rankings_highlight() {
        let list = vec![r("AAA", 10), r("ZZZ", 99), r("AAA", 50), r("Q", 1), r("W", 2), r("E", 3)];
        let (top, idx) = top_rankings(list, Some(&r("AAA", 50)));
        assert_eq!(top.len(), TOP_N);
        assert_eq!(top[0], r("ZZZ", 99));
        assert_eq!(idx, Some(1));
        let (_, none) = top_rankings(vec![r("Q", 1)], Some(&r("X", 1)));
        assert_eq!(none, None);
    }

    #[test]
    fn test_unavailable_store_degrades() {
        let mut store = UnavailableLeaderboard;
        assert!(fetch_or_empty(&store).is_empty());
        assert!(!submit_best_effort(&mut store, &r("AAA", 1)));
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = temp_path("roundtrip");
        let _ = fs::remove_file(&path);
        let mut store = FileLeaderboard::new(&path);
        assert!(fetch_or_empty(&store).is_empty());
        assert!(submit_best_effort(&mut store, &r("LOW", 10)));
        assert!(submit_best_effort(&mut store, &r("TOP", 20)));
        let list = fetch_or_empty(&store);
        assert_eq!(list, vec![r("TOP", 20), r("LOW", 10)]);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        let store = FileLeaderboard::new(&path);
        assert!(matches!(store.fetch_rankings(), Err(LeaderboardError::Json(_))));
        assert!(fetch_or_empty(&store).is_empty());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_name_entry_cycles() {
        let mut entry = NameEntry::default();
        assert_eq!(entry.name(), "AAA");
        entry.prev_char();
        assert_eq!(entry.name(), ".AA");
        entry.cursor_left();
        assert_eq!(entry.cursor, 2);
        entry.next_char();
        entry.next_char();
        assert_eq!(entry.name(), ".AC");
        entry.cursor_right();
        assert_eq!(entry.cursor, 0);
        entry.next_char();
        assert_eq!(entry.name(), "AAC");
    }
}
