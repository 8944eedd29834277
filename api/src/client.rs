use crate::wire::{
    LeaderboardResponse, WireMatch, WireMatchDetail, WireModelMatch, WireResult, WireTurn,
};
use crate::{
    GameRatingTable, GameStanding, MatchDetail, MatchRecord, MatchTurn, ModelMatch, Outcome,
    ParticipantResult,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::{Client, StatusCode, Url};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Client for the zero-sum-eval leaderboard backend.
#[derive(Debug, Clone)]
pub struct ZseApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for ZseApi {
    fn default() -> Self {
        Self {
            client: build_client(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(10),
        }
    }
}

fn build_client() -> Client {
    Client::builder()
        .user_agent("zseboard/0.1 (terminal leaderboard viewer)")
        .build()
        .unwrap_or_default()
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    /// The body had the right shape but broke an invariant (bad outcome, no turns...).
    Validation(String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Validation(msg) => write!(f, "Invalid response: {msg}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ZseApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(base_url: &str) -> ApiResult<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::Other(format!("invalid base url {base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::Other(format!("{base_url} cannot be used as a base url")));
        }
        Ok(Self { base_url: parsed.into(), ..Self::default() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-game standings. Every game key of the response is kept, even with no rows.
    pub async fn fetch_leaderboard(&self) -> ApiResult<GameRatingTable> {
        let url = self.endpoint(&["api", "leaderboard"])?;
        let raw: LeaderboardResponse = self.get(&url).await?;
        map_leaderboard(raw).map_err(|e| validation(&url, e))
    }

    /// Every recorded match, in server order.
    pub async fn fetch_matches(&self) -> ApiResult<Vec<MatchRecord>> {
        let url = self.endpoint(&["api", "matches"])?;
        let raw: Vec<WireMatch> = self.get(&url).await?;
        raw.into_iter()
            .map(map_match)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| validation(&url, e))
    }

    /// A single match with its full turn sequence.
    pub async fn fetch_match(&self, match_id: &str) -> ApiResult<MatchDetail> {
        let url = self.endpoint(&["api", "matches", match_id])?;
        let raw: WireMatchDetail = self.get(&url).await?;
        map_match_detail(match_id, raw).map_err(|e| validation(&url, e))
    }

    /// Matches the given model took part in, as seen from that model.
    pub async fn fetch_model_matches(&self, model_id: &str) -> ApiResult<Vec<ModelMatch>> {
        let url = self.endpoint(&["api", "models", model_id])?;
        let raw: Vec<WireModelMatch> = self.get(&url).await?;
        raw.into_iter()
            .map(|m| map_model_match(model_id, m))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| validation(&url, e))
    }

    /// Append percent-encoded path segments to the base url.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Other(format!("invalid base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Other(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &Url) -> ApiResult<T> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.to_string()));
        }

        match response.error_for_status() {
            Ok(res) => res
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parsing(e, url.to_string())),
            Err(e) => Err(ApiError::Api(e, url.to_string())),
        }
    }
}

fn validation(url: &Url, message: String) -> ApiError {
    ApiError::Validation(format!("{url}: {message}"))
}

// ---------------------------------------------------------------------------
// Mapping: wire types → validated domain types
// ---------------------------------------------------------------------------

fn map_leaderboard(raw: LeaderboardResponse) -> Result<GameRatingTable, String> {
    let mut table = BTreeMap::new();
    for (game, rows) in raw {
        let mut seen = HashSet::new();
        let mut standings = Vec::with_capacity(rows.len());
        for row in rows {
            if row.model.trim().is_empty() {
                return Err(format!("game {game}: empty model id"));
            }
            if !seen.insert(row.model.clone()) {
                return Err(format!("game {game}: model {} listed twice", row.model));
            }
            standings.push(GameStanding {
                rating: rating_from_wire(row.elo)
                    .ok_or_else(|| format!("game {game}: model {} has rating {}", row.model, row.elo))?,
                entity_id: row.model,
                wins: row.wins,
                draws: row.draws,
                losses: row.losses,
            });
        }
        table.insert(game, standings);
    }
    Ok(table)
}

/// Ratings beyond this magnitude are treated as corrupt rather than clamped.
const MAX_ABS_RATING: f64 = 1e9;

fn rating_from_wire(value: f64) -> Option<i64> {
    (value.is_finite() && value.abs() <= MAX_ABS_RATING).then(|| value.round() as i64)
}

fn map_match(raw: WireMatch) -> Result<MatchRecord, String> {
    let id = raw.id.to_string();
    let participants = participant_pair(&id, raw.models)?;
    validate_timestamp(&raw.timestamp).map_err(|e| format!("match {id}: {e}"))?;

    let results = match (raw.results, raw.result) {
        (Some(results), _) => map_results(&id, results, &participants)?,
        (None, Some(score)) => results_from_score(&id, score, &participants)?,
        (None, None) => return Err(format!("match {id}: neither results nor result present")),
    };

    Ok(MatchRecord { id, game: raw.game, participants, timestamp: raw.timestamp, results })
}

fn map_model_match(model_id: &str, raw: WireModelMatch) -> Result<ModelMatch, String> {
    let id = raw.id.to_string();
    let participants = participant_pair(&id, vec![model_id.to_owned(), raw.opponent.clone()])?;
    validate_timestamp(&raw.timestamp).map_err(|e| format!("match {id}: {e}"))?;
    let results = map_results(&id, raw.results, &participants)?;
    Ok(ModelMatch {
        id,
        game: raw.game,
        opponent: raw.opponent,
        timestamp: raw.timestamp,
        results,
    })
}

fn participant_pair(id: &str, models: Vec<String>) -> Result<[String; 2], String> {
    let pair: [String; 2] = models
        .try_into()
        .map_err(|m: Vec<String>| format!("match {id}: expected 2 participants, got {}", m.len()))?;
    if pair.iter().any(|p| p.trim().is_empty()) {
        return Err(format!("match {id}: empty participant id"));
    }
    if pair[0] == pair[1] {
        return Err(format!("match {id}: {} cannot play itself", pair[0]));
    }
    Ok(pair)
}

fn map_results(
    id: &str,
    raw: HashMap<String, WireResult>,
    participants: &[String; 2],
) -> Result<HashMap<String, ParticipantResult>, String> {
    let mut results = HashMap::with_capacity(raw.len());
    for (entity, wire) in raw {
        let &[before, after] = wire.elos_delta.as_slice() else {
            return Err(format!(
                "match {id}: {entity} has {} rating values, expected 2",
                wire.elos_delta.len()
            ));
        };
        let (Some(rating_before), Some(rating_after)) = (rating_from_wire(before), rating_from_wire(after))
        else {
            return Err(format!("match {id}: {entity} has an out-of-range rating"));
        };
        let outcome = Outcome::from_score(wire.result)
            .ok_or_else(|| format!("match {id}: {entity} has outcome {}", wire.result))?;
        results.insert(entity, ParticipantResult { rating_before, rating_after, outcome });
    }

    let [a, b] = participants;
    let (Some(ra), Some(rb)) = (results.get(a), results.get(b)) else {
        return Err(format!("match {id}: missing result for {a} or {b}"));
    };
    if ra.outcome.complement() != rb.outcome {
        return Err(format!(
            "match {id}: outcomes {} and {} are not complementary",
            ra.outcome.score(),
            rb.outcome.score()
        ));
    }
    Ok(results)
}

/// Older payloads only carry the first participant's score.
fn results_from_score(
    id: &str,
    score: f64,
    participants: &[String; 2],
) -> Result<HashMap<String, ParticipantResult>, String> {
    let outcome = Outcome::from_score(score).ok_or_else(|| format!("match {id}: outcome {score}"))?;
    let unchanged = |outcome| ParticipantResult { rating_before: 0, rating_after: 0, outcome };
    Ok(HashMap::from([
        (participants[0].clone(), unchanged(outcome)),
        (participants[1].clone(), unchanged(outcome.complement())),
    ]))
}

fn validate_timestamp(ts: &str) -> Result<(), String> {
    let valid = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(ts, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(ts).is_ok();
    if valid { Ok(()) } else { Err(format!("unrecognised timestamp {ts:?}")) }
}

fn map_match_detail(requested_id: &str, raw: WireMatchDetail) -> Result<MatchDetail, String> {
    if raw.turns.is_empty() {
        return Err(format!("match {requested_id} has no turns"));
    }
    let turns = raw.turns.into_iter().map(map_turn).collect();
    Ok(MatchDetail {
        id: raw.id.map(|id| id.to_string()).unwrap_or_else(|| requested_id.to_owned()),
        game: raw.game.unwrap_or_else(|| "unknown".to_owned()),
        participants: raw.models,
        turns,
    })
}

fn map_turn(raw: WireTurn) -> MatchTurn {
    let board_state = raw.environment.and_then(|e| e.fen).unwrap_or_default();
    let move_label = raw
        .context
        .history
        .last()
        .cloned()
        .unwrap_or_else(|| "Starting position".to_owned());
    let structured_context = raw
        .context
        .last_trace
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (k, text)
        })
        .collect();

    MatchTurn {
        board_state,
        move_label,
        structured_context,
        transcript_message: raw.context.message.filter(|m| !m.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::WireId;

    fn wire_result(old: f64, new: f64, result: f64) -> WireResult {
        WireResult { elos_delta: vec![old, new], result }
    }

    fn wire_match(results: Option<HashMap<String, WireResult>>, result: Option<f64>) -> WireMatch {
        WireMatch {
            id: WireId::Text("a_vs_b_1723901983".into()),
            game: "chess".into(),
            models: vec!["a".into(), "b".into()],
            timestamp: "2024-08-17 13:39:43".into(),
            results,
            result,
        }
    }

    #[test]
    fn endpoint_percent_encodes_ids() {
        let api = ZseApi::new();
        let url = api.endpoint(&["api", "matches", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/matches/a%20b%2Fc");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let api = ZseApi::with_base_url("http://example.com/zse/").unwrap();
        let url = api.endpoint(&["api", "leaderboard"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/zse/api/leaderboard");
    }

    #[test]
    fn with_base_url_rejects_garbage() {
        assert!(matches!(ZseApi::with_base_url("not a url"), Err(ApiError::Other(_))));
        assert!(matches!(ZseApi::with_base_url("mailto:someone@example.com"), Err(ApiError::Other(_))));
    }

    #[test]
    fn leaderboard_rounds_float_elo_and_defaults_counts() {
        let raw: LeaderboardResponse = serde_json::from_str(
            r#"{"chess": [{"model": "gpt-4o", "elo": 1512.6}, {"model": "claude", "elo": 1490, "wins": 3, "draws": 1, "losses": 2}]}"#,
        )
        .unwrap();
        let table = map_leaderboard(raw).unwrap();
        let chess = &table["chess"];
        let gpt = chess.iter().find(|s| s.entity_id == "gpt-4o").unwrap();
        assert_eq!(gpt.rating, 1513);
        let claude = chess.iter().find(|s| s.entity_id == "claude").unwrap();
        assert_eq!((claude.wins, claude.draws, claude.losses), (3, 1, 2));
    }

    #[test]
    fn leaderboard_rejects_absurd_ratings() {
        for elo in ["9223372036854775807", "9e18", "-2e9"] {
            let body = format!(r#"{{"chess": [{{"model": "a", "elo": {elo}}}]}}"#);
            let raw: LeaderboardResponse = serde_json::from_str(&body).unwrap();
            let err = map_leaderboard(raw).unwrap_err();
            assert!(err.contains("has rating"), "{err}");
        }
    }

    #[test]
    fn match_rejects_absurd_rating_pair() {
        let results = HashMap::from([
            ("a".to_string(), wire_result(1500.0, 9e18, 1.0)),
            ("b".to_string(), wire_result(1520.0, 1505.0, 0.0)),
        ]);
        let err = map_match(wire_match(Some(results), None)).unwrap_err();
        assert!(err.contains("out-of-range rating"), "{err}");
    }

    #[test]
    fn leaderboard_rejects_duplicate_models() {
        let raw: LeaderboardResponse = serde_json::from_str(
            r#"{"chess": [{"model": "a", "elo": 1500}, {"model": "a", "elo": 1400}]}"#,
        )
        .unwrap();
        assert!(map_leaderboard(raw).unwrap_err().contains("listed twice"));
    }

    #[test]
    fn match_maps_results() {
        let results = HashMap::from([
            ("a".to_string(), wire_result(1500.0, 1515.0, 1.0)),
            ("b".to_string(), wire_result(1520.0, 1505.0, 0.0)),
        ]);
        let record = map_match(wire_match(Some(results), None)).unwrap();
        assert_eq!(record.participants, ["a".to_string(), "b".to_string()]);
        let a = record.result_for("a").unwrap();
        assert_eq!(a.outcome, Outcome::Win);
        assert_eq!(a.rating_delta(), 15);
        assert_eq!(record.result_for("b").unwrap().outcome, Outcome::Loss);
    }

    #[test]
    fn match_falls_back_to_first_participant_score() {
        let record = map_match(wire_match(None, Some(0.5))).unwrap();
        assert_eq!(record.result_for("a").unwrap().outcome, Outcome::Draw);
        assert_eq!(record.result_for("b").unwrap().outcome, Outcome::Draw);

        let record = map_match(wire_match(None, Some(0.0))).unwrap();
        assert_eq!(record.result_for("b").unwrap().outcome, Outcome::Win);
    }

    #[test]
    fn match_rejects_non_complementary_outcomes() {
        let results = HashMap::from([
            ("a".to_string(), wire_result(1500.0, 1515.0, 1.0)),
            ("b".to_string(), wire_result(1520.0, 1535.0, 1.0)),
        ]);
        let err = map_match(wire_match(Some(results), None)).unwrap_err();
        assert!(err.contains("not complementary"), "{err}");
    }

    #[test]
    fn match_rejects_unknown_outcome_and_bad_rating_pair() {
        let results = HashMap::from([
            ("a".to_string(), wire_result(1500.0, 1515.0, 0.7)),
            ("b".to_string(), wire_result(1520.0, 1505.0, 0.3)),
        ]);
        assert!(map_match(wire_match(Some(results), None)).is_err());

        let results = HashMap::from([
            ("a".to_string(), WireResult { elos_delta: vec![1500.0], result: 1.0 }),
            ("b".to_string(), wire_result(1520.0, 1505.0, 0.0)),
        ]);
        let err = map_match(wire_match(Some(results), None)).unwrap_err();
        assert!(err.contains("rating values"), "{err}");
    }

    #[test]
    fn match_rejects_bad_participants_and_timestamps() {
        let mut raw = wire_match(None, Some(1.0));
        raw.models = vec!["a".into()];
        assert!(map_match(raw).unwrap_err().contains("expected 2 participants"));

        let mut raw = wire_match(None, Some(1.0));
        raw.models = vec!["a".into(), "a".into()];
        assert!(map_match(raw).unwrap_err().contains("cannot play itself"));

        let mut raw = wire_match(None, Some(1.0));
        raw.timestamp = "yesterday".into();
        assert!(map_match(raw).unwrap_err().contains("timestamp"));
    }

    #[test]
    fn timestamps_accept_date_datetime_and_rfc3339() {
        assert!(validate_timestamp("2024-08-01").is_ok());
        assert!(validate_timestamp("2024-08-01 09:15:00").is_ok());
        assert!(validate_timestamp("2024-08-01T09:15:00Z").is_ok());
        assert!(validate_timestamp("08/01/2024").is_err());
    }

    #[test]
    fn model_match_requires_both_results() {
        let raw = WireModelMatch {
            id: WireId::Number(7),
            game: "chess".into(),
            opponent: "b".into(),
            timestamp: "2024-08-01 10:00:00".into(),
            results: HashMap::from([("a".to_string(), wire_result(1500.0, 1510.0, 1.0))]),
        };
        let err = map_model_match("a", raw).unwrap_err();
        assert!(err.contains("missing result"), "{err}");
    }

    #[test]
    fn match_detail_maps_turns() {
        let raw: WireMatchDetail = serde_json::from_str(
            r#"{
                "game": "chess",
                "models": ["a", "b"],
                "turns": [
                    {"environment": {"fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"},
                     "context": {"history": [], "message": "You will move as White"}},
                    {"environment": {"fen": "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"},
                     "context": {"history": ["e4"], "message": null,
                                 "last_trace": {"rationale": "control the centre", "tries": 2}}}
                ]
            }"#,
        )
        .unwrap();
        let detail = map_match_detail("a_vs_b_1", raw).unwrap();
        assert_eq!(detail.id, "a_vs_b_1");
        assert_eq!(detail.turns.len(), 2);
        assert_eq!(detail.turns[0].move_label, "Starting position");
        assert_eq!(detail.turns[0].transcript_message.as_deref(), Some("You will move as White"));
        assert_eq!(detail.turns[1].move_label, "e4");
        assert_eq!(detail.turns[1].transcript_message, None);
        assert_eq!(detail.turns[1].structured_context["rationale"], "control the centre");
        assert_eq!(detail.turns[1].structured_context["tries"], "2");
    }

    #[test]
    fn match_detail_without_turns_is_invalid() {
        let raw: WireMatchDetail = serde_json::from_str(r#"{"game": "chess", "turns": []}"#).unwrap();
        assert!(map_match_detail("x", raw).unwrap_err().contains("no turns"));
    }

    // -----------------------------------------------------------------------
    // HTTP round trips against a mock server
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fetch_leaderboard_reads_tables() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/leaderboard")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"chess": [{"model": "a", "elo": 1500, "wins": 1, "draws": 0, "losses": 0}], "debate": []}"#)
            .create_async()
            .await;

        let api = ZseApi::with_base_url(&server.url()).unwrap();
        let table = api.fetch_leaderboard().await.unwrap();
        mock.assert_async().await;
        assert_eq!(table.len(), 2);
        assert_eq!(table["chess"][0].rating, 1500);
        assert!(table["debate"].is_empty());
    }

    #[tokio::test]
    async fn fetch_matches_surfaces_validation_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/matches")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "game": "chess", "models": ["a", "b"], "timestamp": "2024-08-01", "result": 2}]"#)
            .create_async()
            .await;

        let api = ZseApi::with_base_url(&server.url()).unwrap();
        let err = api.fetch_matches().await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)), "{err}");
    }

    #[tokio::test]
    async fn fetch_match_maps_404_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/matches/missing")
            .with_status(404)
            .create_async()
            .await;

        let api = ZseApi::with_base_url(&server.url()).unwrap();
        let err = api.fetch_match("missing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)), "{err}");
    }

    #[tokio::test]
    async fn fetch_model_matches_reports_server_errors_and_bad_json() {
        let mut server = mockito::Server::new_async().await;
        let _broken = server
            .mock("GET", "/api/models/broken")
            .with_status(500)
            .create_async()
            .await;
        let _garbled = server
            .mock("GET", "/api/models/garbled")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{not json")
            .create_async()
            .await;

        let api = ZseApi::with_base_url(&server.url()).unwrap();
        assert!(matches!(api.fetch_model_matches("broken").await, Err(ApiError::Api(..))));
        assert!(matches!(api.fetch_model_matches("garbled").await, Err(ApiError::Parsing(..))));
    }

    #[tokio::test]
    async fn fetch_model_matches_builds_records() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/models/a")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id": "a_vs_b_1723901983", "game": "chess", "opponent": "b",
                     "timestamp": "2024-08-17 13:39:43",
                     "results": {"a": {"elos_delta": [0, 1], "result": 1},
                                 "b": {"elos_delta": [0, -1], "result": 0}}}]"#,
            )
            .create_async()
            .await;

        let api = ZseApi::with_base_url(&server.url()).unwrap();
        let matches = api.fetch_model_matches("a").await.unwrap();
        assert_eq!(matches.len(), 1);
        let record = matches.into_iter().next().unwrap().into_record("a");
        assert_eq!(record.participants, ["a".to_string(), "b".to_string()]);
        assert_eq!(record.result_for("a").unwrap().outcome, Outcome::Win);
    }
}
