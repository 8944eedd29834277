use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use zse_api::{GameRatingTable, MatchDetail, MatchRecord};

/// Monotonic token stamped on every request; see `Generations`.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Leaderboard,
    Matches,
    ModelMatches,
    MatchDetail,
}

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadLeaderboard { generation: Generation },
    LoadMatches { generation: Generation },
    LoadModelMatches { model_id: String, generation: Generation },
    LoadMatchDetail { match_id: String, generation: Generation },
}

impl NetworkRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            NetworkRequest::LoadLeaderboard { .. } => RequestKind::Leaderboard,
            NetworkRequest::LoadMatches { .. } => RequestKind::Matches,
            NetworkRequest::LoadModelMatches { .. } => RequestKind::ModelMatches,
            NetworkRequest::LoadMatchDetail { .. } => RequestKind::MatchDetail,
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            NetworkRequest::LoadLeaderboard { generation }
            | NetworkRequest::LoadMatches { generation }
            | NetworkRequest::LoadModelMatches { generation, .. }
            | NetworkRequest::LoadMatchDetail { generation, .. } => *generation,
        }
    }
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    LeaderboardLoaded { generation: Generation, table: GameRatingTable },
    MatchesLoaded { generation: Generation, matches: Vec<MatchRecord> },
    /// Records are already rewritten with the model as first participant.
    ModelMatchesLoaded { generation: Generation, model_id: String, matches: Vec<MatchRecord> },
    MatchDetailLoaded { generation: Generation, detail: MatchDetail },
    Error { kind: RequestKind, generation: Generation, message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
