//! Edit state behind the input and output panes.
//!
//! The session owns full resolution images. The UI only ever receives
//! thumbnails, so everything here is plain data and unit-testable without
//! a window.

use image::{Rgba, RgbaImage};
use image_effect::{
    ImageEffect, ImageEffectError, applied,
    composite::{fill_background, replace_background},
};
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Upload an image first!")]
    NoInput,

    #[error("Process an image first!")]
    NoOutput,

    #[error("Remove the background first!")]
    NoCutout,

    #[error("Please wait for current operation to complete")]
    Busy,

    #[error(transparent)]
    Effect(#[from] ImageEffectError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Bounded undo stack. `None` entries stand for "there was no output yet".
#[derive(Debug)]
pub struct History {
    entries: VecDeque<Option<RgbaImage>>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: Option<RgbaImage>) {
        self.entries.push_back(entry);

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn pop(&mut self) -> Option<Option<RgbaImage>> {
        self.entries.pop_back()
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// An earlier output is current again
    Restored,
    /// The undone edit was the first one, so there is no output anymore
    Cleared,
    NothingToUndo,
}

/// A change to the output. Effects stack on the current output, background
/// replacement always starts again from the cutout.
#[derive(Debug, Clone)]
pub enum Edit {
    Effect(ImageEffect),
    FillBackground(Rgba<u8>),
    ReplaceBackground(RgbaImage),
}

/// An [`Edit`] paired with a copy of the image it starts from, so it can run
/// without holding the session.
#[derive(Debug)]
pub struct PendingEdit {
    base: RgbaImage,
    edit: Edit,
}

impl PendingEdit {
    pub fn run(self) -> SessionResult<RgbaImage> {
        let output = match self.edit {
            Edit::Effect(effect) => applied(&effect, &self.base)?,
            Edit::FillBackground(color) => fill_background(&self.base, color)?,
            Edit::ReplaceBackground(background) => replace_background(&self.base, &background)?,
        };

        Ok(output)
    }
}

#[derive(Debug, Default)]
pub struct EditSession {
    input_path: Option<PathBuf>,
    cutout: Option<RgbaImage>,
    current: Option<RgbaImage>,
    history: History,
    busy: bool,
}

impl EditSession {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history: History::new(history_limit),
            ..Default::default()
        }
    }

    /// Switches to a new input. Results derived from the previous input are dropped.
    pub fn load_input(&mut self, path: impl AsRef<Path>) {
        self.input_path = Some(path.as_ref().to_path_buf());
        self.cutout = None;
        self.current = None;
        self.history.clear();
    }

    pub fn input_path(&self) -> Option<&Path> {
        self.input_path.as_deref()
    }

    pub fn require_input(&self) -> SessionResult<PathBuf> {
        self.input_path.clone().ok_or(SessionError::NoInput)
    }

    pub fn begin_task(&mut self) -> SessionResult<()> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        self.busy = true;
        Ok(())
    }

    pub fn end_task(&mut self) {
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Stores a fresh background removal result, it also becomes the output.
    pub fn set_cutout(&mut self, cutout: RgbaImage) {
        self.history.push(self.current.take());
        self.current = Some(cutout.clone());
        self.cutout = Some(cutout);
    }

    /// Like [`Self::set_cutout`] but shows `output` instead of the raw cutout.
    pub fn set_cutout_with_output(&mut self, cutout: RgbaImage, output: RgbaImage) {
        self.history.push(self.current.take());
        self.cutout = Some(cutout);
        self.current = Some(output);
    }

    pub fn commit(&mut self, output: RgbaImage) {
        self.history.push(self.current.take());
        self.current = Some(output);
    }

    pub fn undo(&mut self) -> UndoOutcome {
        match self.history.pop() {
            None => UndoOutcome::NothingToUndo,
            Some(Some(previous)) => {
                self.current = Some(previous);
                UndoOutcome::Restored
            }
            Some(None) => {
                self.current = None;
                UndoOutcome::Cleared
            }
        }
    }

    /// Picks the image `edit` starts from. Commit the result of
    /// [`PendingEdit::run`] with [`Self::commit`].
    pub fn prepare(&self, edit: Edit) -> SessionResult<PendingEdit> {
        let base = match edit {
            Edit::Effect(_) => self.current.as_ref().ok_or(SessionError::NoOutput)?,
            Edit::FillBackground(_) | Edit::ReplaceBackground(_) => {
                self.cutout.as_ref().ok_or(SessionError::NoCutout)?
            }
        };

        Ok(PendingEdit {
            base: base.clone(),
            edit,
        })
    }

    pub fn require_cutout(&self) -> SessionResult<()> {
        if self.cutout.is_none() {
            return Err(SessionError::NoCutout);
        }
        Ok(())
    }

    pub fn current(&self) -> Option<&RgbaImage> {
        self.current.as_ref()
    }

    pub fn has_input(&self) -> bool {
        self.input_path.is_some()
    }

    pub fn has_output(&self) -> bool {
        self.current.is_some()
    }

    pub fn has_cutout(&self) -> bool {
        self.cutout.is_some()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn set_history_limit(&mut self, limit: usize) {
        self.history.set_capacity(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_effect::{base_effect::GrayscaleConfig, blur_effect::GaussianBlurConfig};

    fn solid(v: u8) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, Rgba([v, v, v, 255]))
    }

    fn cutout() -> RgbaImage {
        RgbaImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                Rgba([200, 40, 40, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    fn apply(session: &mut EditSession, edit: Edit) -> SessionResult<()> {
        let output = session.prepare(edit)?.run()?;
        session.commit(output);
        Ok(())
    }

    #[test]
    fn test_history_drops_oldest() {
        let mut history = History::new(3);
        for v in 0..5 {
            history.push(Some(solid(v)));
        }

        assert_eq!(history.pop(), Some(Some(solid(4))));
        assert_eq!(history.pop(), Some(Some(solid(3))));
        assert_eq!(history.pop(), Some(Some(solid(2))));
        assert_eq!(history.pop(), None);
    }

    #[test]
    fn test_history_shrink() {
        let mut history = History::new(5);
        for v in 0..5 {
            history.push(Some(solid(v)));
        }

        history.set_capacity(2);
        assert_eq!(history.pop(), Some(Some(solid(4))));
        assert_eq!(history.pop(), Some(Some(solid(3))));
        assert!(history.is_empty());

        history.set_capacity(0);
        history.push(Some(solid(7)));
        history.push(Some(solid(8)));
        assert_eq!(history.pop(), Some(Some(solid(8))));
        assert!(history.is_empty());
    }

    #[test]
    fn test_first_edit_undoes_to_empty_output() {
        let mut session = EditSession::new(DEFAULT_HISTORY_LIMIT);
        session.load_input("a.png");
        assert!(!session.can_undo());

        session.set_cutout(solid(10));
        assert!(session.has_output());
        assert!(session.has_cutout());
        assert!(session.can_undo());

        assert_eq!(session.undo(), UndoOutcome::Cleared);
        assert!(!session.has_output());
        assert!(session.has_cutout());
        assert_eq!(session.undo(), UndoOutcome::NothingToUndo);
    }

    #[test]
    fn test_effects_stack_and_undo_in_order() {
        let mut session = EditSession::default();
        session.load_input("a.png");
        session.set_cutout(solid(10));
        session.commit(solid(20));
        session.commit(solid(30));

        assert_eq!(session.current(), Some(&solid(30)));
        assert_eq!(session.undo(), UndoOutcome::Restored);
        assert_eq!(session.current(), Some(&solid(20)));
        assert_eq!(session.undo(), UndoOutcome::Restored);
        assert_eq!(session.current(), Some(&solid(10)));
        assert!(session.has_cutout());
    }

    #[test]
    fn test_undo_limit() {
        let mut session = EditSession::new(2);
        session.load_input("a.png");
        session.set_cutout(solid(1));
        for v in 2..6 {
            session.commit(solid(v));
        }

        assert_eq!(session.undo(), UndoOutcome::Restored);
        assert_eq!(session.undo(), UndoOutcome::Restored);
        assert_eq!(session.current(), Some(&solid(3)));
        assert_eq!(session.undo(), UndoOutcome::NothingToUndo);
        assert_eq!(session.current(), Some(&solid(3)));
    }

    #[test]
    fn test_busy_flag() {
        let mut session = EditSession::default();
        assert!(session.begin_task().is_ok());
        assert!(matches!(session.begin_task(), Err(SessionError::Busy)));
        session.end_task();
        assert!(!session.is_busy());
        assert!(session.begin_task().is_ok());
    }

    #[test]
    fn test_new_input_resets_results() {
        let mut session = EditSession::default();
        session.load_input("a.png");
        session.set_cutout(solid(1));

        session.load_input("b.png");
        assert_eq!(session.input_path(), Some(Path::new("b.png")));
        assert!(!session.has_output());
        assert!(!session.has_cutout());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_requirements() {
        let mut session = EditSession::default();
        assert!(matches!(session.require_input(), Err(SessionError::NoInput)));
        assert!(matches!(session.require_cutout(), Err(SessionError::NoCutout)));

        session.load_input("a.png");
        let grayscale = Edit::Effect(ImageEffect::Grayscale(GrayscaleConfig::new()));
        assert!(matches!(session.prepare(grayscale.clone()), Err(SessionError::NoOutput)));
        assert!(matches!(
            session.prepare(Edit::FillBackground(Rgba([0, 0, 0, 255]))),
            Err(SessionError::NoCutout)
        ));

        session.set_cutout_with_output(solid(1), solid(2));
        assert!(session.require_cutout().is_ok());

        let output = session.prepare(grayscale).unwrap().run().unwrap();
        assert_eq!(output, solid(2));
        assert_eq!(session.current(), Some(&solid(2)));
    }

    #[test]
    fn test_background_replacement_starts_from_cutout() {
        let mut session = EditSession::default();
        session.load_input("a.png");
        session.set_cutout(cutout());

        let blur = GaussianBlurConfig::new().with_radius(2.0);
        apply(&mut session, Edit::Effect(ImageEffect::GaussianBlur(blur))).unwrap();
        let blurred = session.current().cloned().unwrap();
        assert_ne!(blurred, cutout());

        let blue = Rgba([0, 0, 255, 255]);
        apply(&mut session, Edit::FillBackground(blue)).unwrap();
        assert_eq!(
            session.current(),
            Some(&fill_background(&cutout(), blue).unwrap())
        );

        let backdrop = RgbaImage::from_pixel(3, 3, Rgba([0, 255, 0, 255]));
        apply(&mut session, Edit::ReplaceBackground(backdrop.clone())).unwrap();
        assert_eq!(
            session.current(),
            Some(&replace_background(&cutout(), &backdrop).unwrap())
        );

        assert_eq!(session.undo(), UndoOutcome::Restored);
        assert_eq!(session.undo(), UndoOutcome::Restored);
        assert_eq!(session.current(), Some(&blurred));
    }

    #[test]
    fn test_effects_start_from_current_output() {
        let mut session = EditSession::default();
        session.load_input("a.png");
        session.set_cutout_with_output(solid(1), solid(90));

        let grayscale = Edit::Effect(ImageEffect::Grayscale(GrayscaleConfig::new()));
        apply(&mut session, grayscale).unwrap();
        assert_eq!(session.current(), Some(&solid(90)));
    }
}
