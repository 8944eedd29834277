/// Raw wire types for the leaderboard backend; serde shapes only.
/// These map to the validated domain types in client.rs.
use serde::Deserialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// GET /api/leaderboard
// ---------------------------------------------------------------------------

pub type LeaderboardResponse = HashMap<String, Vec<LeaderboardRow>>;

#[derive(Debug, Deserialize, Clone)]
pub struct LeaderboardRow {
    pub model: String,
    /// Pandas may hand back a float here.
    pub elo: f64,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub draws: u32,
    #[serde(default)]
    pub losses: u32,
}

// ---------------------------------------------------------------------------
// Match results (shared by /api/matches and /api/models/:id)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct WireResult {
    /// `[old_rating, new_rating]`
    pub elos_delta: Vec<f64>,
    pub result: f64,
}

// ---------------------------------------------------------------------------
// GET /api/matches
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct WireMatch {
    pub id: WireId,
    pub game: String,
    pub models: Vec<String>,
    pub timestamp: String,
    pub results: Option<HashMap<String, WireResult>>,
    /// Outcome of `models[0]`; only consulted when `results` is absent.
    pub result: Option<f64>,
}

/// Match ids arrive as strings from the file-backed API and as numbers from older fixtures.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl std::fmt::Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireId::Text(s) => f.write_str(s),
            WireId::Number(n) => write!(f, "{n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// GET /api/matches/:id
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct WireMatchDetail {
    pub id: Option<WireId>,
    pub game: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub turns: Vec<WireTurn>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WireTurn {
    pub environment: Option<WireEnvironment>,
    #[serde(default)]
    pub context: WireContext,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WireEnvironment {
    pub fen: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WireContext {
    /// Free-form trace of the player's reasoning; values are usually strings.
    pub last_trace: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub history: Vec<String>,
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /api/models/:id
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct WireModelMatch {
    pub id: WireId,
    pub game: String,
    pub opponent: String,
    pub timestamp: String,
    pub results: HashMap<String, WireResult>,
}
