pub mod client;
pub mod filter;
pub mod leaderboard;
pub mod wire;

use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Domain types: validated model, independent of the JSON wire format
// ---------------------------------------------------------------------------

/// One entity's rating in one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingEntry {
    pub entity_id: String,
    pub rating: i64,
}

/// A full leaderboard row for one (game, entity) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameStanding {
    pub entity_id: String,
    pub rating: i64,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl GameStanding {
    pub fn rating_entry(&self) -> RatingEntry {
        RatingEntry { entity_id: self.entity_id.clone(), rating: self.rating }
    }
}

/// Game name → standings for that game. Row order within a game carries no meaning.
pub type GameRatingTable = BTreeMap<String, Vec<GameStanding>>;

/// Combined rating of an entity across the chosen games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedEntry {
    pub entity_id: String,
    pub rating: i64,
}

/// Result of a match from one participant's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Outcome {
    Loss,
    Draw,
    Win,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Win, Outcome::Loss, Outcome::Draw];

    /// Map the wire score (0, 0.5, 1) to an outcome.
    pub fn from_score(score: f64) -> Option<Self> {
        if score == 0.0 {
            Some(Outcome::Loss)
        } else if score == 0.5 {
            Some(Outcome::Draw)
        } else if score == 1.0 {
            Some(Outcome::Win)
        } else {
            None
        }
    }

    pub fn score(self) -> f64 {
        match self {
            Outcome::Loss => 0.0,
            Outcome::Draw => 0.5,
            Outcome::Win => 1.0,
        }
    }

    /// The outcome the other participant sees.
    pub fn complement(self) -> Self {
        match self {
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
            Outcome::Win => Outcome::Loss,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Loss => "LOSS",
            Outcome::Draw => "DRAW",
            Outcome::Win => "WIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantResult {
    pub rating_before: i64,
    pub rating_after: i64,
    pub outcome: Outcome,
}

impl ParticipantResult {
    pub fn rating_delta(&self) -> i64 {
        self.rating_after - self.rating_before
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub id: String,
    pub game: String,
    pub participants: [String; 2],
    /// Zero-padded ISO date or date-time; string order equals chronological order.
    pub timestamp: String,
    pub results: HashMap<String, ParticipantResult>,
}

impl MatchRecord {
    pub fn involves(&self, entity_id: &str) -> bool {
        self.participants.iter().any(|p| p == entity_id)
    }

    pub fn result_for(&self, entity_id: &str) -> Option<&ParticipantResult> {
        self.results.get(entity_id)
    }

    pub fn opponent_of(&self, entity_id: &str) -> Option<&str> {
        match &self.participants {
            [a, b] if a == entity_id => Some(b.as_str()),
            [a, b] if b == entity_id => Some(a.as_str()),
            _ => None,
        }
    }
}

/// One state snapshot of a match. Index 0 of a match's turns is the initial position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchTurn {
    /// Serialized position (FEN for chess), passed through unchanged.
    pub board_state: String,
    pub move_label: String,
    pub structured_context: BTreeMap<String, String>,
    pub transcript_message: Option<String>,
}

/// A match with its full turn sequence. `turns` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDetail {
    pub id: String,
    pub game: String,
    pub participants: Vec<String>,
    pub turns: Vec<MatchTurn>,
}

/// A match as seen from one model's page.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMatch {
    pub id: String,
    pub game: String,
    pub opponent: String,
    pub timestamp: String,
    pub results: HashMap<String, ParticipantResult>,
}

impl ModelMatch {
    pub fn into_record(self, model_id: &str) -> MatchRecord {
        MatchRecord {
            id: self.id,
            game: self.game,
            participants: [model_id.to_owned(), self.opponent],
            timestamp: self.timestamp,
            results: self.results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_maps_wire_scores() {
        assert_eq!(Outcome::from_score(1.0), Some(Outcome::Win));
        assert_eq!(Outcome::from_score(0.5), Some(Outcome::Draw));
        assert_eq!(Outcome::from_score(0.0), Some(Outcome::Loss));
        assert_eq!(Outcome::from_score(0.25), None);
        assert_eq!(Outcome::from_score(-1.0), None);
    }

    #[test]
    fn outcome_complements_sum_to_one() {
        for outcome in Outcome::ALL {
            assert_eq!(outcome.score() + outcome.complement().score(), 1.0);
        }
        assert_eq!(Outcome::Draw.complement(), Outcome::Draw);
    }

    #[test]
    fn opponent_of_works_in_either_position() {
        let record = MatchRecord {
            id: "m".into(),
            game: "chess".into(),
            participants: ["gpt-4o".into(), "claude".into()],
            timestamp: "2024-08-01".into(),
            results: HashMap::new(),
        };
        assert_eq!(record.opponent_of("gpt-4o"), Some("claude"));
        assert_eq!(record.opponent_of("claude"), Some("gpt-4o"));
        assert_eq!(record.opponent_of("llama"), None);
        assert!(record.involves("claude"));
        assert!(!record.involves("llama"));
    }
}
