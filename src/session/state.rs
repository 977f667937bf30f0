use std::collections::HashMap;

use crate::canvas::{CanvasCommands, MaskCanvas};
use crate::config::{AppConfig, ColorToken, MethodChoice, Palette};
use crate::domain::Size;
use crate::error::{IncompleteMaskError, PatchError, Result, Side, ValidationError};
use crate::imaging::{PatchClassifier, SourceImage};
use crate::session::messages::{DrawMsg, Msg, ToolMsg, ViewMsg};
use crate::session::pairing;
use crate::session::shortcuts;
use crate::submit::{InFlight, PairRequest, PendingSubmission, ProcessedImage, SubmissionRequest};

/// Follow-up the host has to perform after a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Start a submission via `Session::prepare_submission`
    Submit,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Done { width: u32, height: u32 },
    Failed(String),
}

/// Source and reference canvases plus the shared tool state
#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    palette: Palette,
    source: MaskCanvas,
    reference: MaskCanvas,
    active_color: ColorToken,
    brush_width: f32,
    /// Canvas that most recently received a committed stroke
    last_touched: Option<Side>,
    methods: HashMap<ColorToken, MethodChoice>,
    in_flight: InFlight,
    pub status: SubmissionStatus,
}

impl Session {
    pub fn new(config: AppConfig, container: Size) -> Self {
        let palette = config.palette.clone();
        let active_color = palette
            .colors()
            .first()
            .copied()
            .unwrap_or(ColorToken::RED);
        Self {
            source: MaskCanvas::new(Side::Source, container, &config),
            reference: MaskCanvas::new(Side::Reference, container, &config),
            brush_width: config.brush_width,
            palette,
            active_color,
            last_touched: None,
            methods: HashMap::new(),
            in_flight: InFlight::default(),
            status: SubmissionStatus::Idle,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn active_color(&self) -> ColorToken {
        self.active_color
    }

    pub fn brush_width(&self) -> f32 {
        self.brush_width
    }

    pub fn last_touched(&self) -> Option<Side> {
        self.last_touched
    }

    pub fn canvas(&self, side: Side) -> &MaskCanvas {
        match side {
            Side::Source => &self.source,
            Side::Reference => &self.reference,
        }
    }

    pub fn canvas_mut(&mut self, side: Side) -> &mut MaskCanvas {
        match side {
            Side::Source => &mut self.source,
            Side::Reference => &mut self.reference,
        }
    }

    /// Load a new image into one canvas, clearing its strokes
    pub fn load_image(&mut self, side: Side, image: SourceImage) {
        self.canvas_mut(side).load_image(image);
        if self.last_touched == Some(side) {
            self.last_touched = None;
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.source.history().is_drawing() || self.reference.history().is_drawing()
    }

    /// Handle a message, modifying session state
    pub fn update(&mut self, msg: Msg) -> Option<Action> {
        match msg {
            Msg::Draw(msg) => self.handle_draw(msg),
            Msg::View(msg) => self.handle_view(msg),
            Msg::Tool(msg) => self.handle_tool(msg),
            Msg::KeyPress { key, modifiers } => {
                let msg = shortcuts::handle_key_event(self, &key, modifiers)?;
                return self.update(msg);
            }
            Msg::Generate => match self.validate() {
                Ok(()) => return Some(Action::Submit),
                Err(err) => {
                    log::warn!("Generate rejected: {}", err);
                    self.record_outcome(&Err(err.into()));
                }
            },
        }
        None
    }

    fn handle_draw(&mut self, msg: DrawMsg) {
        match msg {
            DrawMsg::PointerDown(side, position, button) => {
                let (color, width) = (self.active_color, self.brush_width);
                self.canvas_mut(side.other()).cancel_stroke();
                self.canvas_mut(side)
                    .pointer_down(position, button, color, width);
            }
            DrawMsg::PointerMove(side, position) => self.canvas_mut(side).pointer_move(position),
            DrawMsg::PointerUp(side, position, button) => {
                if self.canvas_mut(side).pointer_up(position, button) {
                    self.last_touched = Some(side);
                }
            }
            DrawMsg::CancelStroke => {
                self.source.cancel_stroke();
                self.reference.cancel_stroke();
            }
            DrawMsg::Undo => {
                self.undo();
            }
            DrawMsg::Redo => {
                self.redo();
            }
            DrawMsg::Clear(side) => self.canvas_mut(side).reset(),
        }
    }

    fn handle_view(&mut self, msg: ViewMsg) {
        match msg {
            ViewMsg::Wheel(side, position, delta) => self.canvas_mut(side).wheel(position, delta),
            ViewMsg::Resize(side, width, height) => {
                self.canvas_mut(side).resize(Size::new(width, height))
            }
            ViewMsg::ResetView(side) => {
                let side = side.or(self.last_touched).unwrap_or(Side::Source);
                self.canvas_mut(side).reset_view();
            }
        }
    }

    fn handle_tool(&mut self, msg: ToolMsg) {
        match msg {
            ToolMsg::SelectColor(color) => {
                if !self.palette.contains(color) {
                    self.palette = self.palette.with_color(color);
                }
                self.active_color = color;
            }
            ToolMsg::AddColor(color) => self.palette = self.palette.with_color(color),
            ToolMsg::RemoveColor(color) => self.remove_color(color),
            ToolMsg::DeleteColor(color) => self.delete_color(color),
            ToolMsg::SetBrushWidth(width) => {
                if width > 0.0 {
                    self.brush_width = width;
                }
            }
            ToolMsg::SetMethod(color, method) => {
                self.methods.insert(color, method);
            }
        }
    }

    /// Undo on the last painted canvas, or the other one if it has nothing to undo
    pub fn undo(&mut self) -> Option<Side> {
        let side = self.dispatch_target(|c| c.can_undo())?;
        self.canvas_mut(side).undo();
        Some(side)
    }

    /// Redo on the last painted canvas, or the other one if it has nothing to redo
    pub fn redo(&mut self) -> Option<Side> {
        let side = self.dispatch_target(|c| c.can_redo())?;
        self.canvas_mut(side).redo();
        Some(side)
    }

    fn dispatch_target(&self, available: impl Fn(&MaskCanvas) -> bool) -> Option<Side> {
        let preferred = self.last_touched.unwrap_or(Side::Source);
        [preferred, preferred.other()]
            .into_iter()
            .find(|side| available(self.canvas(*side)))
    }

    pub fn can_undo(&self) -> bool {
        self.source.can_undo() || self.reference.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.source.can_redo() || self.reference.can_redo()
    }

    /// Delete every stroke of `color` on both canvases
    pub fn delete_color(&mut self, color: ColorToken) {
        self.source.delete_color(color);
        self.reference.delete_color(color);
        self.methods.remove(&color);
    }

    /// Drop `color` from the palette and delete its strokes
    pub fn remove_color(&mut self, color: ColorToken) {
        self.delete_color(color);
        self.palette = self.palette.without_color(color);
        if self.active_color == color
            && let Some(first) = self.palette.colors().first()
        {
            self.active_color = *first;
        }
    }

    pub fn method_for(&self, color: ColorToken) -> MethodChoice {
        self.methods
            .get(&color)
            .copied()
            .unwrap_or(self.config.default_method)
    }

    pub fn paired_colors(&self) -> Vec<ColorToken> {
        pairing::reconcile(&self.source.active_colors(), &self.reference.active_colors())
    }

    pub fn awaiting_pairing(&self) -> Vec<(ColorToken, Side)> {
        pairing::awaiting_pairing(&self.source.active_colors(), &self.reference.active_colors())
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_set()
    }

    /// Whether the generate affordance should be enabled
    pub fn can_generate(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks run before any submission, in reporting order
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        for side in [Side::Source, Side::Reference] {
            if self.canvas(side).image().is_none() {
                return Err(ValidationError::MissingImage(side));
            }
        }
        if self.paired_colors().is_empty() {
            return Err(ValidationError::NoPairedColors);
        }
        if self.is_submitting() {
            return Err(ValidationError::SubmissionInFlight);
        }
        Ok(())
    }

    /// Validate and snapshot the current pairs for submission.
    ///
    /// Fails without side effects when an image is missing, nothing is
    /// paired or a submission is already in flight.
    pub fn prepare_submission(&self) -> Result<PendingSubmission> {
        let source = self
            .source
            .image()
            .cloned()
            .ok_or(ValidationError::MissingImage(Side::Source))?;
        let reference = self
            .reference
            .image()
            .cloned()
            .ok_or(ValidationError::MissingImage(Side::Reference))?;

        for (color, side) in self.awaiting_pairing() {
            log::info!("Skipping {}", IncompleteMaskError::Unpaired { color, side });
        }
        let paired = self.paired_colors();
        if paired.is_empty() {
            return Err(ValidationError::NoPairedColors.into());
        }

        let mut pairs = Vec::with_capacity(paired.len());
        for color in paired {
            let (Some(source_mask), Some(reference_mask)) =
                (self.source.snapshot(color), self.reference.snapshot(color))
            else {
                continue;
            };
            pairs.push(PairRequest {
                color,
                method: self.method_for(color),
                source: source_mask,
                reference: reference_mask,
            });
        }

        let guard = self.in_flight.try_acquire()?;
        Ok(PendingSubmission {
            request: SubmissionRequest {
                source,
                reference,
                pairs,
                enforce_fixed_canvas: self.config.enforce_fixed_canvas,
                sequential: self.config.sequential,
                classifier: PatchClassifier::new(self.config.ocr_enabled),
            },
            guard,
        })
    }

    /// Remember how the last submission ended, for display
    pub fn record_outcome(&mut self, result: &Result<ProcessedImage>) {
        self.status = match result {
            Ok(image) => SubmissionStatus::Done {
                width: image.width(),
                height: image.height(),
            },
            Err(err) => SubmissionStatus::Failed(user_message(err)),
        };
    }
}

/// Single user-facing line for a submission failure
pub fn user_message(err: &PatchError) -> String {
    match err {
        PatchError::Validation(ValidationError::NoPairedColors) => {
            "Paint at least one color on both images".to_string()
        }
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PointerButton;
    use crate::session::messages::{Key, Modifiers};
    use image::RgbaImage;

    fn session() -> Session {
        let config = AppConfig {
            ocr_enabled: false,
            ..AppConfig::default()
        };
        let mut session = Session::new(config, Size::new(500.0, 500.0));
        for side in [Side::Source, Side::Reference] {
            session.load_image(side, SourceImage::from_rgba(RgbaImage::new(500, 500)).unwrap());
        }
        session
    }

    fn paint(session: &mut Session, side: Side, color: ColorToken, y: f32) {
        session.update(Msg::select_color(color));
        session.update(Msg::pointer_down(side, 50.0, y, PointerButton::Primary));
        session.update(Msg::pointer_move(side, 120.0, y));
        session.update(Msg::pointer_up(side, 200.0, y, PointerButton::Primary));
    }

    #[test]
    fn test_red_on_both_canvases_pairs() {
        let mut s = session();
        paint(&mut s, Side::Source, ColorToken::RED, 100.0);
        paint(&mut s, Side::Reference, ColorToken::RED, 300.0);
        assert_eq!(s.paired_colors(), vec![ColorToken::RED]);
        for side in [Side::Source, Side::Reference] {
            assert!(s.canvas(side).rasterize(ColorToken::RED).unwrap().bbox.is_some());
        }
        let pending = s.prepare_submission().unwrap();
        assert_eq!(pending.request.pairs.len(), 1);
        assert_eq!(pending.request.pairs[0].method, MethodChoice::Auto);
    }

    #[test]
    fn test_unpaired_color_is_awaiting() {
        let mut s = session();
        paint(&mut s, Side::Source, ColorToken::RED, 100.0);
        paint(&mut s, Side::Reference, ColorToken::BLUE, 100.0);
        assert!(s.paired_colors().is_empty());
        assert!(!s.can_generate());
        assert_eq!(s.update(Msg::generate()), None);
        assert_eq!(
            s.awaiting_pairing(),
            vec![(ColorToken::RED, Side::Source), (ColorToken::BLUE, Side::Reference)]
        );
    }

    #[test]
    fn test_generate_with_unpaired_color_reports_failure() {
        let mut s = session();
        paint(&mut s, Side::Source, ColorToken::RED, 100.0);
        assert_eq!(s.update(Msg::generate()), None);
        assert_eq!(
            s.status,
            SubmissionStatus::Failed("Paint at least one color on both images".to_string())
        );
        // history is untouched by the rejection
        assert!(s.canvas(Side::Source).can_undo());
    }

    #[test]
    fn test_generate_without_reference_image_reports_failure() {
        let mut s = Session::new(AppConfig::default(), Size::new(100.0, 100.0));
        s.load_image(Side::Source, SourceImage::from_rgba(RgbaImage::new(10, 10)).unwrap());
        assert_eq!(s.update(Msg::generate()), None);
        assert_eq!(
            s.status,
            SubmissionStatus::Failed("missing reference image".to_string())
        );
    }

    #[test]
    fn test_undo_routes_to_last_touched_then_other() {
        let mut s = session();
        paint(&mut s, Side::Source, ColorToken::RED, 100.0);
        paint(&mut s, Side::Reference, ColorToken::RED, 100.0);
        assert_eq!(s.last_touched(), Some(Side::Reference));

        assert_eq!(s.undo(), Some(Side::Reference));
        // reference has nothing left: falls back to source
        assert_eq!(s.undo(), Some(Side::Source));
        assert_eq!(s.undo(), None);

        // redo prefers the last touched canvas again
        assert_eq!(s.redo(), Some(Side::Reference));
        assert_eq!(s.redo(), Some(Side::Source));
        assert_eq!(s.redo(), None);
    }

    #[test]
    fn test_undo_shortcut_goes_through_dispatch() {
        let mut s = session();
        paint(&mut s, Side::Source, ColorToken::RED, 100.0);
        s.update(Msg::key_press(Key::Character("z".into()), Modifiers::CTRL));
        assert!(!s.canvas(Side::Source).can_undo());
        s.update(Msg::key_press(Key::Character("y".into()), Modifiers::CTRL));
        assert!(s.canvas(Side::Source).can_undo());
    }

    #[test]
    fn test_delete_color_excludes_it_everywhere() {
        let mut s = session();
        paint(&mut s, Side::Source, ColorToken::RED, 100.0);
        paint(&mut s, Side::Source, ColorToken::BLUE, 200.0);
        paint(&mut s, Side::Source, ColorToken::RED, 300.0);
        paint(&mut s, Side::Reference, ColorToken::RED, 100.0);
        paint(&mut s, Side::Reference, ColorToken::BLUE, 200.0);

        s.update(Msg::delete_color(ColorToken::RED));
        let history = s.canvas(Side::Source).history();
        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), 0);
        s.update(Msg::redo());
        assert_eq!(s.paired_colors(), vec![ColorToken::BLUE]);
        assert!(s.canvas(Side::Source).rasterize(ColorToken::RED).unwrap().is_empty());
    }

    #[test]
    fn test_remove_color_updates_palette_snapshot() {
        let mut s = session();
        let before = s.palette().clone();
        paint(&mut s, Side::Source, ColorToken::RED, 100.0);
        s.update(Msg::remove_color(ColorToken::RED));
        assert!(!s.palette().contains(ColorToken::RED));
        assert!(before.contains(ColorToken::RED));
        assert_ne!(s.active_color(), ColorToken::RED);
        assert!(s.canvas(Side::Source).history().is_empty());
    }

    #[test]
    fn test_second_submission_is_rejected_while_in_flight() {
        let mut s = session();
        paint(&mut s, Side::Source, ColorToken::RED, 100.0);
        paint(&mut s, Side::Reference, ColorToken::RED, 100.0);
        assert_eq!(s.update(Msg::generate()), Some(Action::Submit));

        let first = s.prepare_submission().unwrap();
        assert!(!s.can_generate());
        assert_eq!(s.update(Msg::generate()), None);
        assert_eq!(
            s.status,
            SubmissionStatus::Failed("a submission is already in flight".to_string())
        );
        assert!(matches!(
            s.prepare_submission().unwrap_err(),
            PatchError::Validation(ValidationError::SubmissionInFlight)
        ));
        drop(first);
        assert!(s.prepare_submission().is_ok());
    }

    #[test]
    fn test_missing_reference_image() {
        let mut s = Session::new(AppConfig::default(), Size::new(100.0, 100.0));
        s.load_image(Side::Source, SourceImage::from_rgba(RgbaImage::new(10, 10)).unwrap());
        assert!(matches!(
            s.prepare_submission().unwrap_err(),
            PatchError::Validation(ValidationError::MissingImage(Side::Reference))
        ));
    }

    #[test]
    fn test_method_choice_per_color() {
        let mut s = session();
        assert_eq!(s.method_for(ColorToken::RED), MethodChoice::Auto);
        s.update(Msg::set_method(ColorToken::RED, MethodChoice::Generate));
        assert_eq!(s.method_for(ColorToken::RED), MethodChoice::Generate);
        assert_eq!(s.method_for(ColorToken::BLUE), MethodChoice::Auto);
    }

    #[test]
    fn test_failure_is_recorded_for_display() {
        let mut s = session();
        s.record_outcome(&Err(ValidationError::NoPairedColors.into()));
        assert_eq!(
            s.status,
            SubmissionStatus::Failed("Paint at least one color on both images".to_string())
        );
    }
}
