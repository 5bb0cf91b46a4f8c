//! Key event handling for the terminal front end

use std::future::Future;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::PlayerResult;
use crate::view::TerminalView;

use super::PlaybackController;

const SEEK_STEP_SECONDS: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

impl PlaybackController {
    pub async fn handle_key_event(&self, view: &TerminalView, key: KeyEvent) -> Result<KeyOutcome> {
        if key.kind != KeyEventKind::Press {
            return Ok(KeyOutcome::Continue);
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(KeyOutcome::Quit);
        }

        // The add-track form captures all input while open
        if view.is_form_open() {
            match key.code {
                KeyCode::Esc => view.form_cancel(),
                KeyCode::Enter => view.form_submit(),
                KeyCode::Tab => view.form_next_field(),
                KeyCode::Backspace => view.form_backspace(),
                KeyCode::Char(c) => view.form_input(c),
                _ => {}
            }
            return Ok(KeyOutcome::Continue);
        }

        if view.is_help_open() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')) {
                view.toggle_help();
            }
            return Ok(KeyOutcome::Continue);
        }

        if key.code == KeyCode::Esc {
            view.dismiss_toast();
            return Ok(KeyOutcome::Continue);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(KeyOutcome::Quit),
            KeyCode::Char('h') | KeyCode::Char('H') => view.toggle_help(),
            KeyCode::Up | KeyCode::Char('k') => view.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => view.move_selection(1),
            KeyCode::Enter => {
                let index = view.selected();
                self.spawn_action(move |c| async move { c.play_track(index).await });
            }
            KeyCode::Char(' ') => self.spawn_action(|c| async move { c.toggle_play().await }),
            KeyCode::Right | KeyCode::Char('n') => self.spawn_action(|c| async move { c.next().await }),
            KeyCode::Left | KeyCode::Char('p') => self.spawn_action(|c| async move { c.previous().await }),
            KeyCode::Char('x') => self.spawn_action(|c| async move {
                c.stop().await;
                Ok(())
            }),
            KeyCode::Char('.') => {
                let target = view.snapshot().progress.current_time_seconds + SEEK_STEP_SECONDS;
                self.spawn_action(move |c| async move { c.seek(target).await });
            }
            KeyCode::Char(',') => {
                let target = (view.snapshot().progress.current_time_seconds - SEEK_STEP_SECONDS).max(0.0);
                self.spawn_action(move |c| async move { c.seek(target).await });
            }
            KeyCode::Char(digit @ '0'..='9') => {
                let percentage = f64::from(digit as u8 - b'0') * 10.0;
                self.spawn_action(move |c| async move { c.seek_to_percentage(percentage).await });
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.toggle_shuffle().await;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.toggle_repeat().await;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.volume_up().await;
            }
            KeyCode::Char('-') => {
                self.volume_down().await;
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.toggle_mute().await;
            }
            // The prompt waits for this loop to feed the form, so it must not be awaited here
            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.spawn_action(|c| async move { c.add_track_from_prompt().await })
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let index = view.selected();
                self.spawn_action(move |c| async move { c.delete_track(index).await });
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.spawn_action(|c| async move { c.load_remote_playlist().await.map(|_| ()) })
            }
            _ => {}
        }

        Ok(KeyOutcome::Continue)
    }

    /// Runs a controller action in the background. Failures were already
    /// reported to the UI by the controller.
    fn spawn_action<F, Fut>(&self, action: F)
    where
        F: FnOnce(PlaybackController) -> Fut,
        Fut: Future<Output = PlayerResult<()>> + Send + 'static,
    {
        let task = action(self.clone());
        tokio::spawn(async move {
            if let Err(e) = task.await {
                tracing::debug!(error = %e, "Action failed");
            }
        });
    }
}
