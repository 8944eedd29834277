use crate::app::MenuItem;
use crate::state::messages::{Generation, RequestKind};
use crate::state::replay::Replay;
use chrono::{Local, NaiveDate};
use std::collections::{BTreeSet, HashMap};
use zse_api::filter::{self, FilterCriteria};
use zse_api::leaderboard;
use zse_api::{AggregatedEntry, GameRatingTable, GameStanding, MatchRecord, Outcome};

// ---------------------------------------------------------------------------
// Fetch lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl<T> LoadState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, LoadState::Idle)
    }
}

/// Latest generation issued per request kind. A response is applied only if
/// its generation is still the latest for its kind.
#[derive(Debug, Default)]
pub struct Generations {
    counter: Generation,
    latest: HashMap<RequestKind, Generation>,
}

impl Generations {
    pub fn issue(&mut self, kind: RequestKind) -> Generation {
        self.counter += 1;
        self.latest.insert(kind, self.counter);
        self.counter
    }

    pub fn is_current(&self, kind: RequestKind, generation: Generation) -> bool {
        self.latest.get(&kind) == Some(&generation)
    }
}

/// Step through `None -> options[0] -> ... -> options[n-1] -> None`.
/// A value no longer among the options resets to `None`.
pub fn cycle_option<T: Clone + PartialEq>(current: &Option<T>, options: &[T]) -> Option<T> {
    match current {
        None => options.first().cloned(),
        Some(value) => options
            .iter()
            .position(|o| o == value)
            .and_then(|i| options.get(i + 1))
            .cloned(),
    }
}

// ---------------------------------------------------------------------------
// Leaderboard: game picker + aggregated ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LeaderboardFocus {
    #[default]
    Games,
    Ranking,
}

#[derive(Debug, Default)]
pub struct LeaderboardState {
    pub table: LoadState<GameRatingTable>,
    pub games: Vec<String>,
    pub chosen: BTreeSet<String>,
    pub ranking: Vec<AggregatedEntry>,
    pub focus: LeaderboardFocus,
    /// Index into `visible_games()`.
    pub game_cursor: usize,
    pub ranking_cursor: usize,
    pub search: String,
    pub searching: bool,
    initialized: bool,
}

impl LeaderboardState {
    /// Every game starts chosen; on reload the existing choice is kept.
    pub fn load(&mut self, table: GameRatingTable) {
        self.games = leaderboard::game_names(&table);
        if self.initialized {
            self.chosen.retain(|g| table.contains_key(g));
        } else {
            self.chosen = self.games.iter().cloned().collect();
            self.initialized = true;
        }
        self.table = LoadState::Loaded(table);
        self.game_cursor = self.game_cursor.min(self.visible_games().len().saturating_sub(1));
        self.recompute();
    }

    pub fn recompute(&mut self) {
        self.ranking = match self.table.loaded() {
            Some(table) => {
                let chosen: Vec<&String> = self.chosen.iter().collect();
                leaderboard::aggregate(&chosen, table)
            }
            None => Vec::new(),
        };
        self.ranking_cursor = self.ranking_cursor.min(self.ranking.len().saturating_sub(1));
    }

    pub fn visible_games(&self) -> Vec<&String> {
        leaderboard::search_games(&self.games, &self.search)
    }

    pub fn highlighted_game(&self) -> Option<&String> {
        self.visible_games().get(self.game_cursor).copied()
    }

    pub fn highlighted_standings(&self) -> Vec<&GameStanding> {
        match (self.table.loaded(), self.highlighted_game()) {
            (Some(table), Some(game)) => leaderboard::ranked_standings(table, game),
            _ => Vec::new(),
        }
    }

    pub fn selected_entity(&self) -> Option<&str> {
        self.ranking.get(self.ranking_cursor).map(|e| e.entity_id.as_str())
    }

    pub fn toggle_highlighted(&mut self) {
        let Some(game) = self.highlighted_game().cloned() else {
            return;
        };
        if !self.chosen.remove(&game) {
            self.chosen.insert(game);
        }
        self.recompute();
    }

    pub fn choose_all(&mut self) {
        self.chosen = self.games.iter().cloned().collect();
        self.recompute();
    }

    pub fn choose_none(&mut self) {
        self.chosen.clear();
        self.recompute();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LeaderboardFocus::Games => LeaderboardFocus::Ranking,
            LeaderboardFocus::Ranking => LeaderboardFocus::Games,
        };
    }

    pub fn move_down(&mut self) {
        match self.focus {
            LeaderboardFocus::Games => {
                let max = self.visible_games().len().saturating_sub(1);
                self.game_cursor = (self.game_cursor + 1).min(max);
            }
            LeaderboardFocus::Ranking => {
                let max = self.ranking.len().saturating_sub(1);
                self.ranking_cursor = (self.ranking_cursor + 1).min(max);
            }
        }
    }

    pub fn move_up(&mut self) {
        match self.focus {
            LeaderboardFocus::Games => self.game_cursor = self.game_cursor.saturating_sub(1),
            LeaderboardFocus::Ranking => self.ranking_cursor = self.ranking_cursor.saturating_sub(1),
        }
    }

    pub fn begin_search(&mut self) {
        self.searching = true;
        self.focus = LeaderboardFocus::Games;
    }

    pub fn push_search(&mut self, c: char) {
        self.search.push(c);
        self.game_cursor = 0;
    }

    pub fn pop_search(&mut self) {
        self.search.pop();
        self.game_cursor = 0;
    }

    pub fn finish_search(&mut self) {
        self.searching = false;
    }

    pub fn cancel_search(&mut self) {
        self.searching = false;
        self.search.clear();
        self.game_cursor = 0;
    }
}

// ---------------------------------------------------------------------------
// Match filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
}

impl DateField {
    pub fn label(self) -> &'static str {
        match self {
            DateField::Start => "start date",
            DateField::End => "end date",
        }
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_INPUT_LEN: usize = "YYYY-MM-DD".len();

#[derive(Debug, Default)]
pub struct FilterForm {
    pub criteria: FilterCriteria,
    /// Set while a date bound is being typed.
    pub editing: Option<DateField>,
    pub input: String,
    pub input_error: Option<String>,
}

impl FilterForm {
    pub fn cycle_game(&mut self, options: &[String]) {
        self.criteria.game = cycle_option(&self.criteria.game, options);
    }

    pub fn cycle_outcome(&mut self) {
        self.criteria.outcome = cycle_option(&self.criteria.outcome, &Outcome::ALL);
    }

    pub fn cycle_participant(&mut self, options: &[String]) {
        self.criteria.participant = cycle_option(&self.criteria.participant, options);
    }

    pub fn cycle_opponent(&mut self, options: &[String]) {
        self.criteria.opponent = cycle_option(&self.criteria.opponent, options);
    }

    pub fn date(&self, field: DateField) -> Option<&str> {
        let range = self.criteria.date_range.as_ref()?;
        match field {
            DateField::Start => range.start.as_deref(),
            DateField::End => range.end.as_deref(),
        }
    }

    pub fn begin_date(&mut self, field: DateField) {
        self.input = self.date(field).unwrap_or_default().to_string();
        self.editing = Some(field);
        self.input_error = None;
    }

    pub fn push_char(&mut self, c: char) {
        if (c.is_ascii_digit() || c == '-') && self.input.len() < DATE_INPUT_LEN {
            self.input.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    pub fn cancel_date(&mut self) {
        self.editing = None;
        self.input.clear();
        self.input_error = None;
    }

    /// Store the typed date. An empty input clears the bound; an unparseable
    /// one keeps the editor open and records why.
    pub fn commit_date(&mut self) -> bool {
        let Some(field) = self.editing else {
            return false;
        };
        let value = match self.input.trim() {
            "" => None,
            text => match NaiveDate::parse_from_str(text, DATE_FORMAT) {
                Ok(date) => Some(date.format(DATE_FORMAT).to_string()),
                Err(e) => {
                    self.input_error = Some(format!("{text}: {e} (expected YYYY-MM-DD)"));
                    return false;
                }
            },
        };
        self.set_date(field, value);
        self.cancel_date();
        true
    }

    fn set_date(&mut self, field: DateField, value: Option<String>) {
        let range = self.criteria.date_range.get_or_insert_with(Default::default);
        match field {
            DateField::Start => range.start = value,
            DateField::End => range.end = value,
        }
        if range.is_open() {
            self.criteria.date_range = None;
        }
    }

    pub fn clear(&mut self) {
        self.criteria = FilterCriteria::default();
        self.cancel_date();
    }
}

// ---------------------------------------------------------------------------
// Match lists: every match, or one model's matches
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MatchListState {
    /// `Some(model)` for a model's page; outcomes are then read from that model.
    pub owner: Option<String>,
    pub matches: LoadState<Vec<MatchRecord>>,
    pub filter: FilterForm,
    pub selected: usize,
    pub loaded_at: Option<String>,
}

impl MatchListState {
    pub fn load(&mut self, matches: Vec<MatchRecord>) {
        self.matches = LoadState::Loaded(matches);
        self.loaded_at = Some(Local::now().format("%H:%M:%S").to_string());
        self.clamp_selection();
    }

    /// Point the list at another model, forgetting filters that only made sense for the old one.
    pub fn set_owner(&mut self, model_id: String) {
        if self.owner.as_deref() != Some(model_id.as_str()) {
            self.filter.clear();
            self.selected = 0;
        }
        self.owner = Some(model_id);
    }

    pub fn records(&self) -> &[MatchRecord] {
        self.matches.loaded().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn visible(&self) -> Vec<&MatchRecord> {
        let criteria = &self.filter.criteria;
        match self.owner.as_deref() {
            Some(model) => filter::filter_matches(self.records(), criteria, filter::fixed_subject(model)),
            None => filter::filter_matches(
                self.records(),
                criteria,
                filter::listed_subject(criteria.participant.as_deref()),
            ),
        }
    }

    /// The entity whose outcome and rating change a row shows.
    pub fn subject_of<'a>(&'a self, record: &'a MatchRecord) -> &'a str {
        match (self.owner.as_deref(), self.filter.criteria.participant.as_deref()) {
            (Some(model), _) => model,
            (None, Some(p)) if record.involves(p) => p,
            _ => record.participants[0].as_str(),
        }
    }

    pub fn selected_match_id(&self) -> Option<String> {
        self.visible().get(self.selected).map(|m| m.id.clone())
    }

    pub fn game_options(&self) -> Vec<String> {
        filter::unique_games(self.records())
    }

    pub fn participant_options(&self) -> Vec<String> {
        match self.owner.as_deref() {
            Some(model) => filter::unique_opponents(self.records(), model),
            None => filter::unique_participants(self.records()),
        }
    }

    pub fn select_next(&mut self) {
        let max = self.visible().len().saturating_sub(1);
        self.selected = (self.selected + 1).min(max);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Call after any filter change.
    pub fn filters_changed(&mut self) {
        self.selected = 0;
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.visible().len().saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ReplayState {
    pub match_id: Option<String>,
    pub replay: LoadState<Replay>,
    pub context_scroll: u16,
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub generations: Generations,
    pub leaderboard: LeaderboardState,
    pub matches: MatchListState,
    pub model: MatchListState,
    pub replay: ReplayState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
