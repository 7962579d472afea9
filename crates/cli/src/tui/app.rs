use crossterm::event::{KeyCode, KeyModifiers};

use super::state::{App, TAB_DETAIL, TAB_PROTOCOLS};

/// Actions the TUI can perform in response to input.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh,
    Tab(usize),
    NextTab,
    PrevTab,
    ScrollUp,
    ScrollDown,
    TogglePick,
    ClearPicks,
    ToggleHistory,
    NextDetail,
    PrevDetail,
    ToggleHelp,
}

/// Map a key press to an Action.
pub fn handle_key(app: &App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    // Help overlay captures all keys except close
    if app.show_help {
        return match code {
            KeyCode::Char('?') | KeyCode::Esc => Action::ToggleHelp,
            _ => Action::None,
        };
    }

    match code {
        // ── Quit ────────────────────────────────────────────
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,

        // ── Refresh ─────────────────────────────────────────
        KeyCode::Char('r') => Action::Refresh,

        // ── Tab switching (number keys) ─────────────────────
        KeyCode::Char('1') => Action::Tab(0),
        KeyCode::Char('2') => Action::Tab(1),
        KeyCode::Char('3') => Action::Tab(2),

        // ── Tab cycling ─────────────────────────────────────
        KeyCode::Tab | KeyCode::Right => Action::NextTab,
        KeyCode::BackTab | KeyCode::Left => Action::PrevTab, // Shift+Tab

        // ── Picker ──────────────────────────────────────────
        KeyCode::Char(' ') | KeyCode::Enter if app.tab == TAB_PROTOCOLS => Action::TogglePick,
        KeyCode::Char('x') if app.tab == TAB_PROTOCOLS => Action::ClearPicks,

        // ── Detail ──────────────────────────────────────────
        KeyCode::Char('h') if app.tab == TAB_DETAIL => Action::ToggleHistory,
        KeyCode::Char('n') if app.tab == TAB_DETAIL => Action::NextDetail,
        KeyCode::Char('p') if app.tab == TAB_DETAIL => Action::PrevDetail,

        // ── Scroll ──────────────────────────────────────────
        KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
        KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,

        // ── Help ────────────────────────────────────────────
        KeyCode::Char('?') => Action::ToggleHelp,

        _ => Action::None,
    }
}
