//! Predicate filtering over already-fetched match records.

use crate::{MatchRecord, Outcome};
use std::collections::BTreeSet;

/// Inclusive date bounds. Either side may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self { start: Some(start.into()), end: Some(end.into()) }
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Lexicographic comparison; valid because timestamps are zero-padded ISO.
    ///
    /// A bound shorter than the timestamp compares against the timestamp's
    /// prefix of the same length, so an end date of `2024-08-04` still admits
    /// `2024-08-04 18:30:00`.
    pub fn contains(&self, timestamp: &str) -> bool {
        if let Some(start) = self.start.as_deref()
            && timestamp < start
        {
            return false;
        }
        if let Some(end) = self.end.as_deref()
            && prefix(timestamp, end.len()) > end
        {
            return false;
        }
        true
    }
}

fn prefix(s: &str, len: usize) -> &str {
    if len >= s.len() {
        return s;
    }
    // ISO timestamps are ASCII; fall back to the whole string on anything else.
    s.get(..len).unwrap_or(s)
}

/// Every field is optional; an absent field places no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub game: Option<String>,
    pub outcome: Option<Outcome>,
    pub participant: Option<String>,
    pub opponent: Option<String>,
    pub date_range: Option<DateRange>,
}

impl FilterCriteria {
    pub fn is_wildcard(&self) -> bool {
        self.game.is_none()
            && self.outcome.is_none()
            && self.participant.is_none()
            && self.opponent.is_none()
            && self.date_range.as_ref().is_none_or(DateRange::is_open)
    }

    /// `subject` names whose outcome the `outcome` criterion is checked against;
    /// returning `None` skips the outcome check for that record.
    pub fn matches<F>(&self, record: &MatchRecord, subject: &F) -> bool
    where
        F: Fn(&MatchRecord) -> Option<String>,
    {
        if let Some(game) = &self.game
            && record.game != *game
        {
            return false;
        }
        if let Some(participant) = &self.participant
            && !record.involves(participant)
        {
            return false;
        }
        if let Some(opponent) = &self.opponent
            && !record.involves(opponent)
        {
            return false;
        }
        if let Some(range) = &self.date_range
            && !range.contains(&record.timestamp)
        {
            return false;
        }
        if let Some(outcome) = self.outcome
            && let Some(entity) = subject(record)
        {
            return record.result_for(&entity).is_some_and(|r| r.outcome == outcome);
        }
        true
    }
}

/// Order-preserving single pass over `matches`.
pub fn filter_matches<'a, F>(
    matches: &'a [MatchRecord],
    criteria: &FilterCriteria,
    subject: F,
) -> Vec<&'a MatchRecord>
where
    F: Fn(&MatchRecord) -> Option<String>,
{
    matches.iter().filter(|m| criteria.matches(m, &subject)).collect()
}

/// Subject resolver for a single entity's page.
pub fn fixed_subject(entity_id: &str) -> impl Fn(&MatchRecord) -> Option<String> + '_ {
    move |_: &MatchRecord| Some(entity_id.to_owned())
}

/// Subject resolver for the all-matches view: the filtered participant when one
/// is set and present, otherwise the first listed participant.
pub fn listed_subject(participant: Option<&str>) -> impl Fn(&MatchRecord) -> Option<String> + '_ {
    move |record: &MatchRecord| match participant {
        Some(p) if record.involves(p) => Some(p.to_owned()),
        _ => Some(record.participants[0].clone()),
    }
}

// ---------------------------------------------------------------------------
// Filter options, derived from already-fetched records
// ---------------------------------------------------------------------------

pub fn unique_games(matches: &[MatchRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = matches.iter().map(|m| m.game.as_str()).collect();
    set.into_iter().map(str::to_owned).collect()
}

pub fn unique_participants(matches: &[MatchRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = matches
        .iter()
        .flat_map(|m| m.participants.iter().map(String::as_str))
        .collect();
    set.into_iter().map(str::to_owned).collect()
}

/// Everyone `entity_id` has played against.
pub fn unique_opponents(matches: &[MatchRecord], entity_id: &str) -> Vec<String> {
    let set: BTreeSet<&str> = matches.iter().filter_map(|m| m.opponent_of(entity_id)).collect();
    set.into_iter().map(str::to_owned).collect()
}
