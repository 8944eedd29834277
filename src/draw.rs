use log::error;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::chessboard::{BoardStatus, ChessBoard, parse_placement};
use crate::state::app_state::{DateField, FilterForm, LeaderboardFocus, LoadState, MatchListState};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::replay::Replay;
use crate::ui::layout::LayoutAreas;
use zse_api::{MatchRecord, Outcome};

static TABS: &[&str; 4] = &["Leaderboard", "Matches", "Model", "Replay"];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Leaderboard => draw_leaderboard(f, layout.main, app),
            MenuItem::Matches => draw_match_list(f, layout.main, &app.state.matches, " Matches ", false),
            MenuItem::Model => {
                let title = match app.state.model.owner.as_deref() {
                    Some(model) => format!(" Model: {model} "),
                    None => " Model ".to_string(),
                };
                draw_match_list(f, layout.main, &app.state.model, &title, true)
            }
            MenuItem::Replay => draw_replay(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        error!("failed to draw frame: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn focus_color(focused: bool) -> Color {
    if focused { Color::White } else { Color::DarkGray }
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_of = |item: MenuItem| match item {
        MenuItem::Leaderboard => Some(0),
        MenuItem::Matches => Some(1),
        MenuItem::Model => Some(2),
        MenuItem::Replay => Some(3),
        MenuItem::Help => None,
    };
    let tab_index = tab_of(app.state.active_tab).or_else(|| tab_of(app.state.previous_tab));

    let titles: Vec<Line> = TABS
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!("{} {t}", i + 1)))
        .collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

/// Draws a status message for anything but loaded data and reports whether it did.
fn draw_load_status<T>(f: &mut Frame, area: Rect, state: &LoadState<T>, what: &str) -> bool {
    let (msg, color) = match state {
        LoadState::Loaded(_) => return false,
        LoadState::Idle => (format!("No {what} loaded yet. Press R to fetch."), Color::DarkGray),
        LoadState::Loading => (format!("Loading {what}..."), Color::DarkGray),
        LoadState::Failed(err) => (format!("Fetch failed:\n{err}"), Color::Red),
    };
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
    true
}

fn draw_empty(f: &mut Frame, area: Rect, msg: &str) {
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

/// First row to show so that `selected` stays within `rows` visible rows.
fn scroll_start(selected: usize, rows: usize) -> usize {
    selected.saturating_sub(rows.saturating_sub(1))
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

fn draw_leaderboard(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Leaderboard ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let board = &app.state.leaderboard;
    let [key_legend, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    f.render_widget(
        Paragraph::new("Keys: Tab=focus  j/k=move  space=toggle  /=search  a=all  n=none  Enter=open model  R=reload")
            .style(Style::default().fg(Color::DarkGray)),
        key_legend,
    );

    if draw_load_status(f, content, &board.table, "leaderboard") {
        return;
    }

    let [picker_area, rest] =
        Layout::horizontal([Constraint::Length(30), Constraint::Fill(1)]).areas(content);
    draw_game_picker(f, picker_area, app);

    if rest.width >= 80 {
        let [ranking_area, standings_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(44)]).areas(rest);
        draw_ranking(f, ranking_area, app);
        draw_game_standings(f, standings_area, app);
    } else {
        draw_ranking(f, rest, app);
    }
}

fn draw_game_picker(f: &mut Frame, area: Rect, app: &App) {
    let board = &app.state.leaderboard;
    let focused = board.focus == LeaderboardFocus::Games;
    let title = format!(" Games {}/{} ", board.chosen.len(), board.games.len());
    let block = default_border(focus_color(focused)).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    if board.searching || !board.search.is_empty() {
        let cursor = if board.searching { "_" } else { "" };
        lines.push(Line::from(Span::styled(
            format!("/{}{cursor}", board.search),
            Style::default().fg(Color::Yellow),
        )));
    }

    let visible = board.visible_games();
    if visible.is_empty() {
        lines.push(Line::from(Span::styled("No matching games", Style::default().fg(Color::DarkGray))));
    }

    let rows = (inner.height as usize).saturating_sub(lines.len()).max(1);
    let start = scroll_start(board.game_cursor, rows);
    for (idx, game) in visible.iter().enumerate().skip(start).take(rows) {
        let marker = if idx == board.game_cursor { ">" } else { " " };
        let check = if board.chosen.contains(*game) { "[x]" } else { "[ ]" };
        let style = if idx == board.game_cursor && focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(format!("{marker} {check} {game}"), style)));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_ranking(f: &mut Frame, area: Rect, app: &App) {
    let board = &app.state.leaderboard;
    let focused = board.focus == LeaderboardFocus::Ranking;
    let block = default_border(focus_color(focused)).title(" Combined ranking ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if board.chosen.is_empty() {
        draw_empty(f, inner, "No games selected");
        return;
    }
    if board.ranking.is_empty() {
        draw_empty(f, inner, "No data available");
        return;
    }

    let rows_visible = (inner.height as usize).saturating_sub(1).max(1);
    let start = scroll_start(board.ranking_cursor, rows_visible);
    let rows = board
        .ranking
        .iter()
        .enumerate()
        .skip(start)
        .take(rows_visible)
        .map(|(idx, entry)| {
            let style = if idx == board.ranking_cursor && focused {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(format!("{}", idx + 1)),
                Cell::from(entry.entity_id.clone()),
                Cell::from(entry.rating.to_string()),
            ])
            .style(style)
        });

    let table = Table::new(rows, [Constraint::Length(5), Constraint::Fill(1), Constraint::Length(10)])
        .header(
            Row::new(vec!["Rank", "Model", "Agg. ELO"])
                .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
        );
    f.render_widget(table, inner);
}

fn draw_game_standings(f: &mut Frame, area: Rect, app: &App) {
    let board = &app.state.leaderboard;
    let title = match board.highlighted_game() {
        Some(game) => format!(" {game} "),
        None => " Standings ".to_string(),
    };
    let block = default_border(Color::DarkGray).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let standings = board.highlighted_standings();
    if standings.is_empty() {
        draw_empty(f, inner, "No data available");
        return;
    }

    let rows = standings.iter().take(inner.height.saturating_sub(1) as usize).map(|s| {
        Row::new(vec![
            Cell::from(s.entity_id.clone()),
            Cell::from(s.rating.to_string()),
            Cell::from(format!("{}/{}/{}", s.wins, s.draws, s.losses)),
        ])
    });
    let table = Table::new(rows, [Constraint::Fill(1), Constraint::Length(6), Constraint::Length(11)])
        .header(
            Row::new(vec!["Model", "ELO", "W/D/L"])
                .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
        );
    f.render_widget(table, inner);
}

// ---------------------------------------------------------------------------
// Match lists
// ---------------------------------------------------------------------------

fn outcome_style(outcome: Outcome) -> Style {
    match outcome {
        Outcome::Win => Style::default().fg(Color::Green),
        Outcome::Loss => Style::default().fg(Color::Red),
        Outcome::Draw => Style::default().fg(Color::Yellow),
    }
}

fn filter_summary(form: &FilterForm, is_model_page: bool) -> Line<'static> {
    let criteria = &form.criteria;
    let any = |v: Option<&str>| v.unwrap_or("any").to_string();
    let range = |v: Option<&str>| v.unwrap_or("-").to_string();

    let mut spans = vec![
        Span::styled("g ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("game: {}  ", any(criteria.game.as_deref()))),
        Span::styled("o ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("outcome: {}  ", any(criteria.outcome.map(Outcome::label)))),
    ];
    if is_model_page {
        spans.push(Span::styled("m ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(format!("opponent: {}  ", any(criteria.opponent.as_deref()))));
    } else {
        spans.push(Span::styled("m ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(format!("model 1: {}  ", any(criteria.participant.as_deref()))));
        spans.push(Span::styled("M ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(format!("model 2: {}  ", any(criteria.opponent.as_deref()))));
    }
    spans.push(Span::styled("s/e ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::raw(format!(
        "dates: {} .. {}",
        range(form.date(DateField::Start)),
        range(form.date(DateField::End)),
    )));
    Line::from(spans)
}

/// Placeholder for a model page that has nothing to show yet.
fn unopened_model_hint(list: &MatchListState, is_model_page: bool) -> Option<&'static str> {
    (is_model_page && (list.owner.is_none() || list.matches.is_idle()))
        .then_some("Pick a model on the Leaderboard tab and press Enter")
}

fn draw_match_list(f: &mut Frame, area: Rect, list: &MatchListState, title: &str, is_model_page: bool) {
    let block = default_border(Color::White).title(title.to_string());
    let inner = block.inner(area);
    f.render_widget(block, area);

    if let Some(hint) = unopened_model_hint(list, is_model_page) {
        draw_empty(f, inner, hint);
        return;
    }

    let [filters, editor, content, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    f.render_widget(Paragraph::new(filter_summary(&list.filter, is_model_page)), filters);

    let editor_line = match (list.filter.editing, list.filter.input_error.as_deref()) {
        (Some(field), Some(err)) => Line::from(Span::styled(
            format!("{}: {}_   {err}", field.label(), list.filter.input),
            Style::default().fg(Color::Red),
        )),
        (Some(field), None) => Line::from(Span::styled(
            format!("{}: {}_   (YYYY-MM-DD, empty clears, Enter apply, Esc cancel)", field.label(), list.filter.input),
            Style::default().fg(Color::Yellow),
        )),
        (None, _) => Line::from(Span::styled(
            "Keys: j/k=move  Enter=replay  c=clear filters  R=reload",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(editor_line), editor);

    if draw_load_status(f, content, &list.matches, "matches") {
        return;
    }

    let visible = list.visible();
    let total = list.records().len();
    let loaded_at = list.loaded_at.as_deref().unwrap_or("-");
    f.render_widget(
        Paragraph::new(format!(
            "{} of {total} matches{}  |  loaded at {loaded_at}",
            visible.len(),
            if list.filter.criteria.is_wildcard() { "" } else { " (filtered)" },
        ))
            .style(Style::default().fg(Color::DarkGray)),
        footer,
    );

    if visible.is_empty() {
        let msg = if total == 0 { "No data available" } else { "No matches for these filters" };
        draw_empty(f, content, msg);
        return;
    }

    let rows_visible = (content.height as usize).saturating_sub(1).max(1);
    let start = scroll_start(list.selected, rows_visible);
    let rows = visible
        .iter()
        .enumerate()
        .skip(start)
        .take(rows_visible)
        .map(|(idx, record)| match_row(list, record, idx == list.selected));

    let (header, widths) = if is_model_page {
        (
            vec!["Time", "Game", "Opponent", "Result", "ELO"],
            vec![
                Constraint::Length(19),
                Constraint::Length(14),
                Constraint::Fill(1),
                Constraint::Length(6),
                Constraint::Length(20),
            ],
        )
    } else {
        (
            vec!["Time", "Game", "Model 1", "Model 2", "Result", "ELO"],
            vec![
                Constraint::Length(19),
                Constraint::Length(14),
                Constraint::Fill(1),
                Constraint::Fill(1),
                Constraint::Length(6),
                Constraint::Length(20),
            ],
        )
    };
    let table = Table::new(rows, widths).header(
        Row::new(header).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
    );
    f.render_widget(table, content);
}

fn match_row<'a>(list: &'a MatchListState, record: &'a MatchRecord, selected: bool) -> Row<'a> {
    let subject = list.subject_of(record);
    let result = record.result_for(subject);

    let outcome = match result {
        Some(r) => Cell::from(r.outcome.label()).style(outcome_style(r.outcome)),
        None => Cell::from("-"),
    };
    let elo = match result {
        Some(r) => Cell::from(format!("{} → {} ({:+})", r.rating_before, r.rating_after, r.rating_delta())),
        None => Cell::from(""),
    };

    let mut cells = vec![Cell::from(record.timestamp.as_str()), Cell::from(record.game.as_str())];
    if list.owner.is_some() {
        cells.push(Cell::from(record.opponent_of(subject).unwrap_or("?")));
    } else {
        let [first, second] = &record.participants;
        let name = |p: &'a String| {
            let style = if p.as_str() == subject {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Cell::from(p.as_str()).style(style)
        };
        cells.push(name(first));
        cells.push(name(second));
    }
    cells.push(outcome);
    cells.push(elo);

    let style = if selected {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    Row::new(cells).style(style)
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

fn draw_replay(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Replay ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let replay_state = &app.state.replay;
    if replay_state.match_id.is_none() {
        draw_empty(f, inner, "Select a match on the Matches or Model tab and press Enter");
        return;
    }
    if draw_load_status(f, inner, &replay_state.replay, "match") {
        return;
    }
    let Some(replay) = replay_state.replay.loaded() else {
        return;
    };

    let [header, nav, body] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(inner);

    f.render_widget(
        Paragraph::new(format!(
            "{}  |  {}  |  match {}",
            replay.participants.join(" vs "),
            replay.game,
            replay.id
        ))
        .style(Style::default().add_modifier(Modifier::BOLD)),
        header,
    );
    f.render_widget(Paragraph::new(turn_navigation(replay)), nav);

    let turn = replay.turns.current();
    let show_board = replay.is_chess() && parse_placement(&turn.board_state).is_some();
    let info_area = if show_board {
        let [board_area, info_area] = Layout::horizontal([
            Constraint::Length(ChessBoard::WIDTH + 4),
            Constraint::Fill(1),
        ])
        .areas(body);
        let board_block = default_border(Color::DarkGray);
        let board_inner = board_block.inner(board_area);
        f.render_widget(board_block, board_area);
        let [_, board_rect, _] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(ChessBoard::HEIGHT),
            Constraint::Fill(1),
        ])
        .areas(board_inner);
        let [_, board_rect] =
            Layout::horizontal([Constraint::Length(1), Constraint::Fill(1)]).areas(board_rect);
        f.render_widget(ChessBoard { fen: &turn.board_state }, board_rect);
        info_area
    } else {
        body
    };

    draw_turn_info(f, info_area, replay, replay_state.context_scroll);
}

fn turn_navigation(replay: &Replay) -> Line<'static> {
    let arrow = |enabled: bool, glyph: &'static str| {
        let color = if enabled { Color::White } else { Color::DarkGray };
        Span::styled(glyph, Style::default().fg(color))
    };
    Line::from(vec![
        arrow(!replay.turns.is_first(), "◀ h "),
        Span::raw(replay.turn_label()),
        arrow(!replay.turns.is_last(), " l ▶"),
        Span::styled("   j/k=scroll context  Esc=back", Style::default().fg(Color::DarkGray)),
    ])
}

fn draw_turn_info(f: &mut Frame, area: Rect, replay: &Replay, scroll: u16) {
    let block = default_border(Color::DarkGray).title(" Turn ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let turn = replay.turns.current();
    let label = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);

    let mut lines = vec![Line::from(vec![
        Span::styled("Move: ", label),
        Span::raw(turn.move_label.clone()),
    ])];

    if replay.is_chess() {
        let status = BoardStatus::from_fen(&turn.board_state);
        if let Some(text) = status.label() {
            lines.push(Line::from(vec![
                Span::styled("Status: ", label),
                Span::styled(text, Style::default().fg(status.color()).add_modifier(Modifier::BOLD)),
            ]));
        }
    }
    if !replay.is_chess() || parse_placement(&turn.board_state).is_none() {
        lines.push(Line::from(Span::styled("State:", label)));
        let state = if turn.board_state.is_empty() { "(none)" } else { turn.board_state.as_str() };
        lines.extend(state.lines().map(|l| Line::from(l.to_string())));
    }

    if let Some(message) = &turn.transcript_message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Message:", label)));
        lines.extend(message.lines().map(|l| Line::from(l.to_string())));
    }

    if !turn.structured_context.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Context:", label)));
        for (key, value) in &turn.structured_context {
            lines.push(Line::from(Span::styled(format!("{key}:"), Style::default().fg(Color::Cyan))));
            lines.extend(value.lines().map(|l| Line::from(format!("  {l}"))));
        }
    }

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((scroll, 0)),
        inner,
    );
}

// ---------------------------------------------------------------------------
// Help, logs, spinner
// ---------------------------------------------------------------------------

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let section = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let entries: &[(&str, &[(&str, &str)])] = &[
        (
            "Global",
            &[
                ("1-4", "switch tab"),
                ("R", "reload the current view"),
                ("f", "toggle full screen"),
                ("\"", "toggle log pane"),
                ("?", "help (Esc to leave)"),
                ("q", "quit"),
            ],
        ),
        (
            "Leaderboard",
            &[
                ("Tab", "switch between games and ranking"),
                ("space", "toggle the highlighted game"),
                ("/", "search games"),
                ("a / n", "choose all / no games"),
                ("Enter", "open the highlighted model"),
            ],
        ),
        (
            "Matches / Model",
            &[
                ("g / o", "cycle game / outcome filter"),
                ("m / M", "cycle model 1 / model 2 (opponent on a model page)"),
                ("s / e", "type start / end date"),
                ("c", "clear filters"),
                ("Enter", "replay the highlighted match"),
            ],
        ),
        (
            "Replay",
            &[("h / l", "previous / next turn"), ("j / k", "scroll context"), ("Esc", "back")],
        ),
    ];

    let mut lines = Vec::new();
    for (title, keys) in entries {
        lines.push(Line::from(Span::styled(*title, section)));
        for (key, what) in *keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<8}"), Style::default().fg(Color::White)),
                Span::styled(*what, Style::default().fg(Color::Gray)),
            ]));
        }
        lines.push(Line::from(""));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(logs, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
