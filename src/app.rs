use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, LeaderboardFocus, LoadState, MatchListState};
use crate::state::messages::{Generation, NetworkRequest, RequestKind};
use crate::state::replay::Replay;
use log::{debug, error, info};
use zse_api::{GameRatingTable, MatchDetail, MatchRecord};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Leaderboard,
    Matches,
    Model,
    Replay,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let app = Self { state: AppState::new(), settings };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Requests: each one bumps the generation for its kind
    // -----------------------------------------------------------------------

    pub fn startup_requests(&mut self) -> Vec<NetworkRequest> {
        vec![self.request_leaderboard(), self.request_matches()]
    }

    pub fn request_leaderboard(&mut self) -> NetworkRequest {
        let generation = self.state.generations.issue(RequestKind::Leaderboard);
        self.state.leaderboard.table = LoadState::Loading;
        NetworkRequest::LoadLeaderboard { generation }
    }

    pub fn request_matches(&mut self) -> NetworkRequest {
        let generation = self.state.generations.issue(RequestKind::Matches);
        self.state.matches.matches = LoadState::Loading;
        NetworkRequest::LoadMatches { generation }
    }

    /// Switch to the Model tab for `model_id` and fetch its matches.
    pub fn open_model(&mut self, model_id: String) -> NetworkRequest {
        info!("opening model {model_id}");
        let generation = self.state.generations.issue(RequestKind::ModelMatches);
        self.state.model.set_owner(model_id.clone());
        self.state.model.matches = LoadState::Loading;
        self.set_tab(MenuItem::Model);
        NetworkRequest::LoadModelMatches { model_id, generation }
    }

    /// Switch to the Replay tab for `match_id` and fetch its turns.
    pub fn open_replay(&mut self, match_id: String) -> NetworkRequest {
        info!("opening replay of match {match_id}");
        let generation = self.state.generations.issue(RequestKind::MatchDetail);
        // Refetching the match on screen keeps it visible until the new turns land.
        let showing = self.state.replay.replay.loaded().is_some_and(|r| r.id == match_id);
        if !showing {
            self.state.replay.replay = LoadState::Loading;
        }
        self.state.replay.match_id = Some(match_id.clone());
        self.state.replay.context_scroll = 0;
        self.set_tab(MenuItem::Replay);
        NetworkRequest::LoadMatchDetail { match_id, generation }
    }

    /// Refetch whatever the active tab shows.
    pub fn reload(&mut self) -> Option<NetworkRequest> {
        match self.state.active_tab {
            MenuItem::Leaderboard => Some(self.request_leaderboard()),
            MenuItem::Matches => Some(self.request_matches()),
            MenuItem::Model => {
                let model_id = self.state.model.owner.clone()?;
                Some(self.open_model(model_id))
            }
            MenuItem::Replay => {
                let match_id = self.state.replay.match_id.clone()?;
                Some(self.open_replay(match_id))
            }
            MenuItem::Help => None,
        }
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop.
    // Each returns false when the response was stale and dropped.
    // -----------------------------------------------------------------------

    fn accept(&self, kind: RequestKind, generation: Generation) -> bool {
        let current = self.state.generations.is_current(kind, generation);
        if !current {
            debug!("discarding stale {kind:?} response #{generation}");
        }
        current
    }

    pub fn on_leaderboard_loaded(&mut self, generation: Generation, table: GameRatingTable) -> bool {
        if !self.accept(RequestKind::Leaderboard, generation) {
            return false;
        }
        self.state.leaderboard.load(table);
        true
    }

    pub fn on_matches_loaded(&mut self, generation: Generation, matches: Vec<MatchRecord>) -> bool {
        if !self.accept(RequestKind::Matches, generation) {
            return false;
        }
        self.state.matches.load(matches);
        true
    }

    pub fn on_model_matches_loaded(
        &mut self,
        generation: Generation,
        model_id: String,
        matches: Vec<MatchRecord>,
    ) -> bool {
        if !self.accept(RequestKind::ModelMatches, generation) {
            return false;
        }
        debug!("{} matches for model {model_id}", matches.len());
        self.state.model.load(matches);
        true
    }

    pub fn on_match_detail_loaded(&mut self, generation: Generation, detail: MatchDetail) -> bool {
        if !self.accept(RequestKind::MatchDetail, generation) {
            return false;
        }
        let id = detail.id.clone();
        let replay = &mut self.state.replay.replay;
        let refreshed = match replay.loaded_mut().filter(|r| r.id == id) {
            Some(open) => open.refresh(detail),
            None => match Replay::from_detail(detail) {
                Some(fresh) => {
                    *replay = LoadState::Loaded(fresh);
                    true
                }
                None => false,
            },
        };
        if !refreshed {
            self.state.replay.replay = LoadState::Failed(format!("match {id} has no turns"));
        }
        self.state.replay.context_scroll = 0;
        true
    }

    pub fn on_error(&mut self, kind: RequestKind, generation: Generation, message: String) -> bool {
        if !self.accept(kind, generation) {
            return false;
        }
        error!("{kind:?} fetch failed: {message}");
        match kind {
            RequestKind::Leaderboard => self.state.leaderboard.table = LoadState::Failed(message),
            RequestKind::Matches => self.state.matches.matches = LoadState::Failed(message),
            RequestKind::ModelMatches => self.state.model.matches = LoadState::Failed(message),
            RequestKind::MatchDetail => self.state.replay.replay = LoadState::Failed(message),
        }
        true
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    /// Switch tabs, fetching the tab's data if it was never requested.
    pub fn update_tab(&mut self, next: MenuItem) -> Option<NetworkRequest> {
        self.set_tab(next);
        match next {
            MenuItem::Leaderboard if self.state.leaderboard.table.is_idle() => {
                Some(self.request_leaderboard())
            }
            MenuItem::Matches if self.state.matches.matches.is_idle() => Some(self.request_matches()),
            _ => None,
        }
    }

    fn set_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn go_back(&mut self) {
        let previous = self.state.previous_tab;
        self.set_tab(previous);
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.go_back();
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Enter on the leaderboard: toggle a game, or open the highlighted model.
    pub fn leaderboard_select(&mut self) -> Option<NetworkRequest> {
        match self.state.leaderboard.focus {
            LeaderboardFocus::Games => {
                self.state.leaderboard.toggle_highlighted();
                None
            }
            LeaderboardFocus::Ranking => {
                let model_id = self.state.leaderboard.selected_entity()?.to_string();
                Some(self.open_model(model_id))
            }
        }
    }

    /// Enter on a match list: replay the highlighted match.
    pub fn match_list_select(&mut self) -> Option<NetworkRequest> {
        let match_id = self.active_match_list()?.selected_match_id()?;
        Some(self.open_replay(match_id))
    }

    pub fn active_match_list(&self) -> Option<&MatchListState> {
        match self.state.active_tab {
            MenuItem::Matches => Some(&self.state.matches),
            MenuItem::Model => Some(&self.state.model),
            _ => None,
        }
    }

    pub fn active_match_list_mut(&mut self) -> Option<&mut MatchListState> {
        match self.state.active_tab {
            MenuItem::Matches => Some(&mut self.state.matches),
            MenuItem::Model => Some(&mut self.state.model),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Replay navigation
    // -----------------------------------------------------------------------

    pub fn replay_advance(&mut self) {
        if let Some(replay) = self.state.replay.replay.loaded_mut() {
            replay.turns.advance();
            self.state.replay.context_scroll = 0;
        }
    }

    pub fn replay_retreat(&mut self) {
        if let Some(replay) = self.state.replay.replay.loaded_mut() {
            replay.turns.retreat();
            self.state.replay.context_scroll = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zse_api::{GameStanding, MatchTurn};

    fn app() -> App {
        App::new(AppSettings::default())
    }

    fn table(rating: i64) -> GameRatingTable {
        GameRatingTable::from([(
            "chess".to_string(),
            vec![GameStanding { entity_id: "gpt-4o".into(), rating, ..Default::default() }],
        )])
    }

    fn detail(id: &str, turns: usize) -> MatchDetail {
        MatchDetail {
            id: id.into(),
            game: "chess".into(),
            participants: vec!["a".into(), "b".into()],
            turns: vec![MatchTurn::default(); turns],
        }
    }

    fn generation_of(request: &NetworkRequest) -> Generation {
        request.generation()
    }

    #[test]
    fn stale_leaderboard_response_is_discarded() {
        let mut app = app();
        let first = generation_of(&app.request_leaderboard());
        let second = generation_of(&app.request_leaderboard());

        assert!(app.on_leaderboard_loaded(second, table(1600)));
        assert!(!app.on_leaderboard_loaded(first, table(1200)));
        assert_eq!(app.state.leaderboard.ranking[0].rating, 1600);
    }

    #[test]
    fn stale_error_does_not_clobber_fresh_data() {
        let mut app = app();
        let first = generation_of(&app.request_matches());
        let second = generation_of(&app.request_matches());
        assert!(app.on_matches_loaded(second, Vec::new()));
        assert!(!app.on_error(RequestKind::Matches, first, "timeout".into()));
        assert!(matches!(app.state.matches.matches, LoadState::Loaded(_)));
    }

    #[test]
    fn current_error_marks_view_failed() {
        let mut app = app();
        let generation = generation_of(&app.request_leaderboard());
        assert!(app.on_error(RequestKind::Leaderboard, generation, "boom".into()));
        assert_eq!(app.state.leaderboard.table, LoadState::Failed("boom".into()));
    }

    #[test]
    fn current_error_marks_each_kind_failed() {
        let mut app = app();
        let matches = generation_of(&app.request_matches());
        assert!(app.on_error(RequestKind::Matches, matches, "refused".into()));
        assert!(matches!(&app.state.matches.matches, LoadState::Failed(m) if m == "refused"));

        let model = generation_of(&app.open_model("claude".into()));
        assert!(app.on_error(RequestKind::ModelMatches, model, "404".into()));
        assert!(matches!(&app.state.model.matches, LoadState::Failed(m) if m == "404"));

        let replay = generation_of(&app.open_replay("m1".into()));
        assert!(app.on_error(RequestKind::MatchDetail, replay, "bad json".into()));
        assert!(matches!(&app.state.replay.replay, LoadState::Failed(m) if m == "bad json"));
    }

    #[test]
    fn generations_are_independent_per_kind() {
        let mut app = app();
        let requests = app.startup_requests();
        let leaderboard = generation_of(&requests[0]);
        let matches = generation_of(&requests[1]);
        assert!(app.on_matches_loaded(matches, Vec::new()));
        assert!(app.on_leaderboard_loaded(leaderboard, table(1500)));
    }

    #[test]
    fn opening_replays_switches_tab_and_drops_older_detail() {
        let mut app = app();
        let first = generation_of(&app.open_replay("m1".into()));
        let second = generation_of(&app.open_replay("m2".into()));
        assert_eq!(app.state.active_tab, MenuItem::Replay);

        assert!(app.on_match_detail_loaded(second, detail("m2", 3)));
        assert!(!app.on_match_detail_loaded(first, detail("m1", 5)));
        let replay = app.state.replay.replay.loaded().unwrap();
        assert_eq!(replay.id, "m2");
        assert_eq!(replay.turns.len(), 3);

        app.replay_advance();
        app.replay_advance();
        app.replay_advance();
        let replay = app.state.replay.replay.loaded().unwrap();
        assert_eq!(replay.turns.position(), 2);
    }

    #[test]
    fn reloading_the_open_replay_rewinds_in_place() {
        let mut app = app();
        let generation = generation_of(&app.open_replay("m1".into()));
        assert!(app.on_match_detail_loaded(generation, detail("m1", 3)));
        app.replay_advance();
        app.replay_advance();

        let generation = match app.reload() {
            Some(request) => generation_of(&request),
            None => panic!("replay tab should reload"),
        };
        assert_eq!(app.state.replay.replay.loaded().map(|r| r.turns.position()), Some(2));

        assert!(app.on_match_detail_loaded(generation, detail("m1", 5)));
        let replay = app.state.replay.replay.loaded().unwrap();
        assert_eq!(replay.turns.len(), 5);
        assert_eq!(replay.turns.position(), 0);
    }

    #[test]
    fn reload_targets_the_active_tab() {
        let mut app = app();
        assert!(matches!(app.reload(), Some(NetworkRequest::LoadLeaderboard { .. })));

        app.update_tab(MenuItem::Model);
        assert!(app.reload().is_none());

        app.open_model("claude".into());
        match app.reload() {
            Some(NetworkRequest::LoadModelMatches { model_id, .. }) => assert_eq!(model_id, "claude"),
            other => panic!("unexpected request {other:?}"),
        }

        app.update_tab(MenuItem::Help);
        assert!(app.reload().is_none());
        app.exit_help();
        assert_eq!(app.state.active_tab, MenuItem::Model);
    }

    #[test]
    fn matches_tab_loads_lazily_once() {
        let mut app = app();
        assert!(matches!(app.update_tab(MenuItem::Matches), Some(NetworkRequest::LoadMatches { .. })));
        assert!(app.update_tab(MenuItem::Leaderboard).is_some());
        assert!(app.update_tab(MenuItem::Matches).is_none());
    }

    #[test]
    fn ranking_enter_opens_model() {
        let mut app = app();
        let generation = generation_of(&app.request_leaderboard());
        app.on_leaderboard_loaded(generation, table(1500));
        app.state.leaderboard.focus = LeaderboardFocus::Ranking;
        match app.leaderboard_select() {
            Some(NetworkRequest::LoadModelMatches { model_id, .. }) => assert_eq!(model_id, "gpt-4o"),
            other => panic!("unexpected request {other:?}"),
        }
        assert_eq!(app.state.active_tab, MenuItem::Model);
    }
}
