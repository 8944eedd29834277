use crate::state::messages::{Generation, NetworkRequest, NetworkResponse};
use log::{debug, error, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use zse_api::client::{ApiResult, ZseApi};

static SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Serves requests one at a time against the backend. Responses are tagged with
/// the generation of the request that produced them; staleness is judged by the UI.
pub struct NetworkWorker {
    client: ZseApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
}

impl NetworkWorker {
    pub fn new(
        client: ZseApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self { client, requests, responses }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let spinner = Spinner::start(self.responses.clone()).await;

            let (kind, generation) = (request.kind(), request.generation());
            let result = match request {
                NetworkRequest::LoadLeaderboard { generation } => {
                    self.handle_load_leaderboard(generation).await
                }
                NetworkRequest::LoadMatches { generation } => {
                    self.handle_load_matches(generation).await
                }
                NetworkRequest::LoadModelMatches { model_id, generation } => {
                    self.handle_load_model_matches(model_id, generation).await
                }
                NetworkRequest::LoadMatchDetail { match_id, generation } => {
                    self.handle_load_match_detail(match_id, generation).await
                }
            };

            debug!("{kind:?} request #{generation} complete");
            spinner.finish(result.is_ok()).await;

            let response = result.unwrap_or_else(|err| {
                warn!("{kind:?} request #{generation} failed: {err}");
                NetworkResponse::Error { kind, generation, message: err.to_string() }
            });

            if self.responses.send(response).await.is_err() {
                error!("UI loop is gone; stopping network worker");
                break;
            }
        }
    }

    async fn handle_load_leaderboard(&self, generation: Generation) -> ApiResult<NetworkResponse> {
        debug!("loading leaderboard from {}", self.client.base_url());
        let table = self.client.fetch_leaderboard().await?;
        debug!("leaderboard has {} games", table.len());
        Ok(NetworkResponse::LeaderboardLoaded { generation, table })
    }

    async fn handle_load_matches(&self, generation: Generation) -> ApiResult<NetworkResponse> {
        debug!("loading all matches");
        let matches = self.client.fetch_matches().await?;
        debug!("loaded {} matches", matches.len());
        Ok(NetworkResponse::MatchesLoaded { generation, matches })
    }

    async fn handle_load_model_matches(
        &self,
        model_id: String,
        generation: Generation,
    ) -> ApiResult<NetworkResponse> {
        debug!("loading matches for model {model_id}");
        let matches = self
            .client
            .fetch_model_matches(&model_id)
            .await?
            .into_iter()
            .map(|m| m.into_record(&model_id))
            .collect();
        Ok(NetworkResponse::ModelMatchesLoaded { generation, model_id, matches })
    }

    async fn handle_load_match_detail(
        &self,
        match_id: String,
        generation: Generation,
    ) -> ApiResult<NetworkResponse> {
        debug!("loading match {match_id}");
        let detail = self.client.fetch_match(&match_id).await?;
        debug!("match {match_id} has {} turns", detail.turns.len());
        Ok(NetworkResponse::MatchDetailLoaded { generation, detail })
    }
}

/// Background spinner for one in-flight request. Frames are delivered as
/// `LoadingStateChanged` responses on the same channel as the data.
struct Spinner {
    running: Arc<AtomicBool>,
    responses: mpsc::Sender<NetworkResponse>,
}

impl Spinner {
    const FRAME: Duration = Duration::from_millis(33);

    async fn start(responses: mpsc::Sender<NetworkResponse>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        Self::publish(&responses, true, SPINNER_CHARS[0]).await;

        let (frames, still_running) = (responses.clone(), running.clone());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Self::FRAME);
            for frame in SPINNER_CHARS.iter().cycle().skip(1) {
                ticker.tick().await;
                if !still_running.load(Ordering::Relaxed) {
                    break;
                }
                Self::publish(&frames, true, *frame).await;
            }
        });

        Self { running, responses }
    }

    /// Stops the frames and leaves either a blank or the error marker behind.
    async fn finish(self, succeeded: bool) {
        self.running.store(false, Ordering::Relaxed);
        // Let a frame already in the channel land before the final state.
        tokio::time::sleep(Self::FRAME / 2).await;
        let last = if succeeded { ' ' } else { ERROR_CHAR };
        Self::publish(&self.responses, false, last).await;
    }

    async fn publish(responses: &mpsc::Sender<NetworkResponse>, is_loading: bool, spinner_char: char) {
        let loading_state = LoadingState { is_loading, spinner_char };
        let _ = responses.send(NetworkResponse::LoadingStateChanged { loading_state }).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn last_state(succeeded: bool) -> LoadingState {
        let (tx, mut rx) = mpsc::channel(64);
        let spinner = Spinner::start(tx).await;
        spinner.finish(succeeded).await;

        let mut last = None;
        while let Ok(NetworkResponse::LoadingStateChanged { loading_state }) = rx.try_recv() {
            last = Some(loading_state);
        }
        last.expect("spinner published nothing")
    }

    #[tokio::test]
    async fn spinner_ends_blank_on_success() {
        let state = last_state(true).await;
        assert!(!state.is_loading);
        assert_eq!(state.spinner_char, ' ');
    }

    #[tokio::test]
    async fn spinner_ends_on_error_marker() {
        let state = last_state(false).await;
        assert!(!state.is_loading);
        assert_eq!(state.spinner_char, ERROR_CHAR);
    }
}
