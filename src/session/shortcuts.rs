use crate::session::messages::{Key, Modifiers, Msg};
use crate::session::state::Session;

/// Translate a key press into a session message
pub fn handle_key_event(session: &Session, key: &Key, modifiers: Modifiers) -> Option<Msg> {
    let drawing = session.is_drawing();

    match key {
        // Undo/redo shortcuts (shared by both canvases)
        Key::Character(c) if c.eq_ignore_ascii_case("z") && modifiers.ctrl && !modifiers.shift => {
            Some(Msg::undo())
        }
        Key::Character(c)
            if (c.eq_ignore_ascii_case("y") && modifiers.ctrl)
                || (c.eq_ignore_ascii_case("z") && modifiers.ctrl && modifiers.shift) =>
        {
            Some(Msg::redo())
        }
        // Ctrl+Enter submits, but only when the generate affordance is enabled
        Key::Enter if modifiers.ctrl && session.can_generate() => Some(Msg::generate()),
        Key::Escape if drawing => Some(Msg::cancel_stroke()),
        Key::Character(c) if c.as_str() == "0" && !modifiers.ctrl && !drawing => {
            Some(Msg::reset_view())
        }
        _ => None,
    }
}
