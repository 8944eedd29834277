//! Combined rankings across a chosen set of games.
//!
//! The backend serves one rating table per game; the combined leaderboard is
//! the per-entity mean of those ratings, computed only over the games the
//! viewer has chosen and only over the games an entity actually played.

use crate::{AggregatedEntry, GameRatingTable, GameStanding, RatingEntry};
use std::collections::{BTreeMap, HashSet};

/// Average each entity's rating over the chosen games it appears in.
///
/// Chosen names missing from `table` are ignored. The result is ranked by
/// rating descending, ties broken by entity id ascending.
pub fn aggregate<S: AsRef<str>>(chosen_games: &[S], table: &GameRatingTable) -> Vec<AggregatedEntry> {
    // entity → (sum, count); sums are i128 and cannot overflow
    let mut totals: BTreeMap<String, (i128, i128)> = BTreeMap::new();
    let mut visited = HashSet::new();

    for game in chosen_games {
        let game = game.as_ref();
        // A game named twice must not be counted twice.
        if !visited.insert(game) {
            continue;
        }
        let Some(standings) = table.get(game) else {
            continue;
        };
        for RatingEntry { entity_id, rating } in standings.iter().map(GameStanding::rating_entry) {
            let entry = totals.entry(entity_id).or_insert((0, 0));
            entry.0 += i128::from(rating);
            entry.1 += 1;
        }
    }

    let mut entries: Vec<AggregatedEntry> = totals
        .into_iter()
        .map(|(entity_id, (sum, count))| AggregatedEntry { entity_id, rating: round_mean(sum, count) })
        .collect();
    rank(&mut entries);
    entries
}

/// Rounded mean with halves going toward +infinity, in exact integer arithmetic.
///
/// floor(sum / count + 1/2) == floor((2 * sum + count) / (2 * count)).
fn round_mean(sum: i128, count: i128) -> i64 {
    debug_assert!(count > 0);
    // A mean of i64 values lies within their range.
    (2 * sum + count).div_euclid(2 * count) as i64
}

fn rank(entries: &mut [AggregatedEntry]) {
    entries.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.entity_id.cmp(&b.entity_id)));
}

/// All game names in the table, in key order.
pub fn game_names(table: &GameRatingTable) -> Vec<String> {
    table.keys().cloned().collect()
}

/// One game's standings sorted for display, or empty for an unknown game.
pub fn ranked_standings<'a>(table: &'a GameRatingTable, game: &str) -> Vec<&'a GameStanding> {
    let mut standings: Vec<&GameStanding> = table.get(game).map(|s| s.iter().collect()).unwrap_or_default();
    standings.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.entity_id.cmp(&b.entity_id)));
    standings
}

/// Case-insensitive substring search over game names. An empty term matches everything.
pub fn search_games<'a>(names: &'a [String], term: &str) -> Vec<&'a String> {
    let needle = term.trim().to_lowercase();
    names
        .iter()
        .filter(|name| needle.is_empty() || name.to_lowercase().contains(&needle))
        .collect()
}
