//! View module - UI collaborator and terminal rendering
//!
//! [`PlayerUi`] is everything the controller needs from a user interface.
//! [`TerminalView`] implements it for the terminal with ratatui. Its
//! submodules are organized by component:
//!
//! - `utils`: formatting helpers
//! - `playlist`: header and track list
//! - `progress`: progress bar with play state, modes and volume
//! - `overlays`: toasts, the add-track form and the help popup

mod overlays;
mod playlist;
mod progress;
mod utils;

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};
use tokio::sync::oneshot;

use crate::model::{PlaylistState, Progress, Track, TrackDraft, VolumeState};

const TOAST_TTL: Duration = Duration::from_secs(4);

/// Presentation side of the player, driven by the controller
#[async_trait]
pub trait PlayerUi: Send + Sync {
    fn render(&self, playlist: &PlaylistState, current_index: usize);
    fn update_progress(&self, progress: Progress);
    fn update_play_state(&self, is_playing: bool);
    fn notify_error(&self, message: &str);
    fn notify_success(&self, message: &str);
    /// Asks the user for a new track. `None` means cancelled.
    async fn prompt_add_track(&self) -> Option<TrackDraft>;
    fn update_volume(&self, volume: VolumeState);
    fn update_modes(&self, shuffle: bool, repeat: bool);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Error,
    Success,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    shown_at: Instant,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormField {
    #[default]
    Title,
    Artist,
    Url,
    Cover,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Title => FormField::Artist,
            FormField::Artist => FormField::Url,
            FormField::Url => FormField::Cover,
            FormField::Cover => FormField::Title,
        }
    }
}

/// Add-track modal being edited
#[derive(Clone, Debug, Default)]
pub struct AddTrackForm {
    pub draft: TrackDraft,
    pub cover: String,
    pub focus: FormField,
    pub validation: Option<String>,
}

impl AddTrackForm {
    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Title => &mut self.draft.title,
            FormField::Artist => &mut self.draft.artist,
            FormField::Url => &mut self.draft.url,
            FormField::Cover => &mut self.cover,
        }
    }
}

/// Everything the terminal draws, updated through [`PlayerUi`]
#[derive(Clone, Debug, Default)]
pub struct ViewState {
    pub tracks: Vec<Track>,
    pub current_index: usize,
    pub selected: usize,
    pub progress: Progress,
    pub is_playing: bool,
    pub volume: VolumeState,
    pub shuffle: bool,
    pub repeat: bool,
    pub toast: Option<Toast>,
    pub form: Option<AddTrackForm>,
    pub show_help: bool,
}

pub struct TerminalView {
    state: Mutex<ViewState>,
    prompt_reply: Mutex<Option<oneshot::Sender<Option<TrackDraft>>>>,
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalView {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ViewState::default()),
            prompt_reply: Mutex::new(None),
        }
    }

    // A poisoned lock only means a render panicked; the state is still usable.
    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current state with expired toasts dropped
    pub fn snapshot(&self) -> ViewState {
        let mut state = self.lock();
        if state.toast.as_ref().is_some_and(|t| t.shown_at.elapsed() >= TOAST_TTL) {
            state.toast = None;
        }
        state.clone()
    }

    pub fn draw(frame: &mut Frame, state: &ViewState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Now playing
                Constraint::Min(0),    // Track list
                Constraint::Length(3), // Progress bar
            ])
            .split(frame.area());

        playlist::render_header(frame, chunks[0], state);
        playlist::render_track_list(frame, chunks[1], state);
        progress::render_progress_bar(frame, chunks[2], state);

        if let Some(toast) = &state.toast {
            overlays::render_toast(frame, toast);
        }
        if let Some(form) = &state.form {
            overlays::render_add_track_form(frame, form);
        }
        if state.show_help {
            overlays::render_help_popup(frame);
        }
    }

    pub fn selected(&self) -> usize {
        self.lock().selected
    }

    pub fn move_selection(&self, delta: isize) {
        let mut state = self.lock();
        let len = state.tracks.len();
        if len == 0 {
            state.selected = 0;
            return;
        }
        state.selected = (state.selected as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    pub fn dismiss_toast(&self) -> bool {
        self.lock().toast.take().is_some()
    }

    pub fn toggle_help(&self) {
        let mut state = self.lock();
        state.show_help = !state.show_help;
    }

    pub fn is_help_open(&self) -> bool {
        self.lock().show_help
    }

    pub fn is_form_open(&self) -> bool {
        self.lock().form.is_some()
    }

    pub fn form_input(&self, c: char) {
        if let Some(form) = self.lock().form.as_mut() {
            form.field_mut().push(c);
            form.validation = None;
        }
    }

    pub fn form_backspace(&self) {
        if let Some(form) = self.lock().form.as_mut() {
            form.field_mut().pop();
        }
    }

    pub fn form_next_field(&self) {
        if let Some(form) = self.lock().form.as_mut() {
            form.focus = form.focus.next();
        }
    }

    /// Submits the form. Title and url are required; the form stays open otherwise.
    pub fn form_submit(&self) {
        let draft = {
            let mut state = self.lock();
            let Some(form) = state.form.as_mut() else {
                return;
            };
            if form.draft.title.trim().is_empty() || form.draft.url.trim().is_empty() {
                form.validation = Some("Title and URL are required".to_string());
                return;
            }
            let mut draft = form.draft.clone();
            draft.cover = Some(form.cover.trim().to_string()).filter(|c| !c.is_empty());
            state.form = None;
            draft
        };
        self.reply(Some(draft));
    }

    pub fn form_cancel(&self) {
        self.lock().form = None;
        self.reply(None);
    }

    fn reply(&self, draft: Option<TrackDraft>) {
        let sender = self.prompt_reply.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(sender) = sender {
            let _ = sender.send(draft);
        }
    }

    fn toast(&self, kind: ToastKind, message: &str) {
        self.lock().toast = Some(Toast {
            kind,
            message: message.to_string(),
            shown_at: Instant::now(),
        });
    }
}

#[async_trait]
impl PlayerUi for TerminalView {
    fn render(&self, playlist: &PlaylistState, current_index: usize) {
        let mut state = self.lock();
        state.tracks = playlist.tracks().to_vec();
        state.shuffle = playlist.shuffle_enabled;
        state.repeat = playlist.repeat_enabled;
        if state.current_index != current_index || state.selected >= state.tracks.len() {
            state.selected = current_index;
        }
        state.current_index = current_index;
    }

    fn update_progress(&self, progress: Progress) {
        self.lock().progress = progress;
    }

    fn update_play_state(&self, is_playing: bool) {
        self.lock().is_playing = is_playing;
    }

    fn notify_error(&self, message: &str) {
        tracing::debug!(message, "Error toast");
        self.toast(ToastKind::Error, message);
    }

    fn notify_success(&self, message: &str) {
        self.toast(ToastKind::Success, message);
    }

    async fn prompt_add_track(&self) -> Option<TrackDraft> {
        let (tx, rx) = oneshot::channel();
        {
            let mut reply = self.prompt_reply.lock().unwrap_or_else(|e| e.into_inner());
            // A second prompt replaces the first, which resolves as cancelled
            if let Some(previous) = reply.replace(tx) {
                let _ = previous.send(None);
            }
        }
        self.lock().form = Some(AddTrackForm::default());
        rx.await.ok().flatten()
    }

    fn update_volume(&self, volume: VolumeState) {
        self.lock().volume = volume;
    }

    fn update_modes(&self, shuffle: bool, repeat: bool) {
        let mut state = self.lock();
        state.shuffle = shuffle;
        state.repeat = repeat;
    }
}
