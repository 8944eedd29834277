use crate::app::{App, MenuItem};
use crate::state::app_state::{DateField, LeaderboardFocus, MatchListState};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;

    if let (Char('c'), KeyModifiers::CONTROL) = (key_event.code, key_event.modifiers) {
        quit();
    }

    // Text entry swallows every other key until it is closed.
    if guard.state.leaderboard.searching {
        let leaderboard = &mut guard.state.leaderboard;
        match key_event.code {
            KeyCode::Esc => leaderboard.cancel_search(),
            KeyCode::Enter => leaderboard.finish_search(),
            KeyCode::Backspace => leaderboard.pop_search(),
            Char(c) => leaderboard.push_search(c),
            _ => {}
        }
        return;
    }
    if let Some(list) = guard.active_match_list_mut()
        && list.filter.editing.is_some()
    {
        match key_event.code {
            KeyCode::Esc => list.filter.cancel_date(),
            KeyCode::Enter => {
                if list.filter.commit_date() {
                    list.filters_changed();
                }
            }
            KeyCode::Backspace => list.filter.pop_char(),
            Char(c) => list.filter.push_char(c),
            _ => {}
        }
        return;
    }

    let request = match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        (_, Char('q'), _) => quit(),

        // Tab switching
        (_, Char('1'), _) => guard.update_tab(MenuItem::Leaderboard),
        (_, Char('2'), _) => guard.update_tab(MenuItem::Matches),
        (_, Char('3'), _) => guard.update_tab(MenuItem::Model),
        (_, Char('4'), _) => guard.update_tab(MenuItem::Replay),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => {
            guard.exit_help();
            None
        }

        // Leaderboard
        (MenuItem::Leaderboard, KeyCode::Tab, _) => {
            guard.state.leaderboard.toggle_focus();
            None
        }
        (MenuItem::Leaderboard, Char('j') | KeyCode::Down, _) => {
            guard.state.leaderboard.move_down();
            None
        }
        (MenuItem::Leaderboard, Char('k') | KeyCode::Up, _) => {
            guard.state.leaderboard.move_up();
            None
        }
        (MenuItem::Leaderboard, Char(' '), _)
            if guard.state.leaderboard.focus == LeaderboardFocus::Games =>
        {
            guard.state.leaderboard.toggle_highlighted();
            None
        }
        (MenuItem::Leaderboard, Char('/'), _) => {
            guard.state.leaderboard.begin_search();
            None
        }
        (MenuItem::Leaderboard, Char('a'), _) => {
            guard.state.leaderboard.choose_all();
            None
        }
        (MenuItem::Leaderboard, Char('n'), _) => {
            guard.state.leaderboard.choose_none();
            None
        }
        (MenuItem::Leaderboard, KeyCode::Enter, _) => guard.leaderboard_select(),

        // Match lists (all matches, or one model's)
        (MenuItem::Matches | MenuItem::Model, Char('j') | KeyCode::Down, _) => {
            with_match_list(&mut guard, |list| list.select_next());
            None
        }
        (MenuItem::Matches | MenuItem::Model, Char('k') | KeyCode::Up, _) => {
            with_match_list(&mut guard, |list| list.select_prev());
            None
        }
        (MenuItem::Matches | MenuItem::Model, Char('g'), _) => {
            with_match_list(&mut guard, |list| {
                let options = list.game_options();
                list.filter.cycle_game(&options);
                list.filters_changed();
            });
            None
        }
        (MenuItem::Matches | MenuItem::Model, Char('o'), _) => {
            with_match_list(&mut guard, |list| {
                list.filter.cycle_outcome();
                list.filters_changed();
            });
            None
        }
        (MenuItem::Matches, Char('m'), _) => {
            with_match_list(&mut guard, |list| {
                let options = list.participant_options();
                list.filter.cycle_participant(&options);
                list.filters_changed();
            });
            None
        }
        (MenuItem::Matches, Char('M'), _) | (MenuItem::Model, Char('m'), _) => {
            with_match_list(&mut guard, |list| {
                let options = list.participant_options();
                list.filter.cycle_opponent(&options);
                list.filters_changed();
            });
            None
        }
        (MenuItem::Matches | MenuItem::Model, Char('s'), _) => {
            with_match_list(&mut guard, |list| list.filter.begin_date(DateField::Start));
            None
        }
        (MenuItem::Matches | MenuItem::Model, Char('e'), _) => {
            with_match_list(&mut guard, |list| list.filter.begin_date(DateField::End));
            None
        }
        (MenuItem::Matches | MenuItem::Model, Char('c'), _) => {
            with_match_list(&mut guard, |list| {
                list.filter.clear();
                list.filters_changed();
            });
            None
        }
        (MenuItem::Matches | MenuItem::Model, KeyCode::Enter, _) => guard.match_list_select(),
        (MenuItem::Model, KeyCode::Esc, _) => {
            guard.go_back();
            None
        }

        // Replay
        (MenuItem::Replay, Char('l') | KeyCode::Right, _) => {
            guard.replay_advance();
            None
        }
        (MenuItem::Replay, Char('h') | KeyCode::Left, _) => {
            guard.replay_retreat();
            None
        }
        (MenuItem::Replay, Char('j') | KeyCode::Down, _) => {
            guard.state.replay.context_scroll = guard.state.replay.context_scroll.saturating_add(1);
            None
        }
        (MenuItem::Replay, Char('k') | KeyCode::Up, _) => {
            guard.state.replay.context_scroll = guard.state.replay.context_scroll.saturating_sub(1);
            None
        }
        (MenuItem::Replay, KeyCode::Esc, _) => {
            guard.go_back();
            None
        }

        // Global
        (_, Char('R'), _) => guard.reload(),
        (_, Char('f'), _) => {
            guard.toggle_full_screen();
            None
        }
        (_, Char('"'), _) => {
            guard.toggle_show_logs();
            None
        }

        _ => None,
    };

    drop(guard);
    if let Some(request) = request {
        let _ = network_requests.send(request).await;
    }
}

fn with_match_list(app: &mut App, f: impl FnOnce(&mut MatchListState)) {
    if let Some(list) = app.active_match_list_mut() {
        f(list);
    }
}

fn quit() -> ! {
    crate::cleanup_terminal();
    std::process::exit(0);
}
