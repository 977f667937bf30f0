//! Message types for a masking session
//!
//! This module contains:
//! - Msg enum with nested sub-enums for organized message handling
//! - Constructor helpers used by the shortcut handler and the driver

use serde::{Deserialize, Serialize};

use crate::canvas::PointerButton;
use crate::config::{ColorToken, MethodChoice};
use crate::domain::Point;
use crate::error::Side;

// ============================================================================
// Drawing Types
// ============================================================================

/// Pointer and history messages for one canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawMsg {
    /// Pointer pressed at a screen position
    PointerDown(Side, Point, PointerButton),
    /// Pointer moved to a screen position
    PointerMove(Side, Point),
    /// Pointer released at a screen position
    PointerUp(Side, Point, PointerButton),
    /// Drop the stroke being painted
    CancelStroke,
    /// Undo on the last painted canvas, else the other one
    Undo,
    /// Redo on the last painted canvas, else the other one
    Redo,
    /// Clear all strokes of one canvas
    Clear(Side),
}

// ============================================================================
// View Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewMsg {
    /// Wheel scrolled over a canvas (positive delta zooms in)
    Wheel(Side, Point, f32),
    /// Canvas container resized
    Resize(Side, f32, f32),
    /// Back to fit-to-container; `None` targets the last painted canvas
    ResetView(Option<Side>),
}

// ============================================================================
// Palette/Tool Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolMsg {
    /// Select the color used for new strokes
    SelectColor(ColorToken),
    /// Add a color to the palette
    AddColor(ColorToken),
    /// Remove a color from the palette and delete its strokes on both canvases
    RemoveColor(ColorToken),
    /// Delete all strokes of a color on both canvases, keeping it in the palette
    DeleteColor(ColorToken),
    /// Brush width in on-screen placement pixels
    SetBrushWidth(f32),
    /// Correction method for a color pair
    SetMethod(ColorToken, MethodChoice),
}

// ============================================================================
// Keyboard Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Character(String),
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Modifiers {
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
    };
    pub const CTRL_SHIFT: Modifiers = Modifiers {
        ctrl: true,
        shift: true,
    };
}

// ============================================================================
// Main Message Enum
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Msg {
    Draw(DrawMsg),
    View(ViewMsg),
    Tool(ToolMsg),
    /// Raw key press, translated by the shortcut handler
    KeyPress {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Request a submission of all paired colors
    Generate,
}

impl Msg {
    // Draw shortcuts
    pub fn pointer_down(side: Side, x: f32, y: f32, button: PointerButton) -> Self {
        Self::Draw(DrawMsg::PointerDown(side, Point::new(x, y), button))
    }
    pub fn pointer_move(side: Side, x: f32, y: f32) -> Self {
        Self::Draw(DrawMsg::PointerMove(side, Point::new(x, y)))
    }
    pub fn pointer_up(side: Side, x: f32, y: f32, button: PointerButton) -> Self {
        Self::Draw(DrawMsg::PointerUp(side, Point::new(x, y), button))
    }
    pub fn cancel_stroke() -> Self {
        Self::Draw(DrawMsg::CancelStroke)
    }
    pub fn undo() -> Self {
        Self::Draw(DrawMsg::Undo)
    }
    pub fn redo() -> Self {
        Self::Draw(DrawMsg::Redo)
    }
    pub fn clear(side: Side) -> Self {
        Self::Draw(DrawMsg::Clear(side))
    }

    // View shortcuts
    pub fn wheel(side: Side, x: f32, y: f32, delta: f32) -> Self {
        Self::View(ViewMsg::Wheel(side, Point::new(x, y), delta))
    }
    pub fn resize(side: Side, width: f32, height: f32) -> Self {
        Self::View(ViewMsg::Resize(side, width, height))
    }
    pub fn reset_view() -> Self {
        Self::View(ViewMsg::ResetView(None))
    }

    // Tool shortcuts
    pub fn select_color(color: ColorToken) -> Self {
        Self::Tool(ToolMsg::SelectColor(color))
    }
    pub fn add_color(color: ColorToken) -> Self {
        Self::Tool(ToolMsg::AddColor(color))
    }
    pub fn remove_color(color: ColorToken) -> Self {
        Self::Tool(ToolMsg::RemoveColor(color))
    }
    pub fn delete_color(color: ColorToken) -> Self {
        Self::Tool(ToolMsg::DeleteColor(color))
    }
    pub fn set_brush_width(width: f32) -> Self {
        Self::Tool(ToolMsg::SetBrushWidth(width))
    }
    pub fn set_method(color: ColorToken, method: MethodChoice) -> Self {
        Self::Tool(ToolMsg::SetMethod(color, method))
    }

    pub fn key_press(key: Key, modifiers: Modifiers) -> Self {
        Self::KeyPress { key, modifiers }
    }

    pub fn generate() -> Self {
        Self::Generate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_messages_deserialize() {
        let json = r##"[
            {"Tool": {"SelectColor": "#ff0000"}},
            {"Draw": {"PointerDown": ["Source", {"x": 1.0, "y": 2.0}, "Primary"]}},
            {"KeyPress": {"key": {"Character": "z"}, "modifiers": {"ctrl": true}}},
            "Generate"
        ]"##;
        let msgs: Vec<Msg> = serde_json::from_str(json).unwrap();
        assert_eq!(msgs[0], Msg::select_color(ColorToken::RED));
        assert_eq!(
            msgs[1],
            Msg::pointer_down(Side::Source, 1.0, 2.0, PointerButton::Primary)
        );
        assert_eq!(msgs[2], Msg::key_press(Key::Character("z".into()), Modifiers::CTRL));
        assert_eq!(msgs[3], Msg::Generate);
    }
}
