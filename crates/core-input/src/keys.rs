use core_events::{ControlEvent, QuitSource};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Translate a terminal key press into a control event.
///
/// `s` cycles the display style, `d` toggles diff mode, `h` cycles the
/// separator heuristic, `q` and `Ctrl-C` quit. Releases and every other key
/// are ignored.
pub fn map_key(key: &KeyEvent) -> Option<ControlEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(ControlEvent::Quit(QuitSource::Key)),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char('s') => Some(ControlEvent::CycleStyle),
        KeyCode::Char('d') => Some(ControlEvent::ToggleDiff),
        KeyCode::Char('h') => Some(ControlEvent::CycleHeuristic),
        KeyCode::Char('q') => Some(ControlEvent::Quit(QuitSource::Key)),
        _ => None,
    }
}
