//! Progress bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use super::utils::format_duration;
use super::ViewState;

pub fn render_progress_bar(frame: &mut Frame, area: Rect, state: &ViewState) {
    let status_text = match state.tracks.get(state.current_index) {
        None => " No track playing".to_string(),
        Some(track) if state.is_playing => format!(" ▶ {} | {}", track.title, track.artist),
        Some(track) => format!(" ⏸  {} | {}", track.title, track.artist),
    };

    let shuffle_text = if state.shuffle { "Shuffle: On" } else { "Shuffle: Off" };
    let repeat_text = if state.repeat { "Repeat: On" } else { "Repeat: Off" };
    let volume_text = if state.volume.is_muted() {
        "Vol: muted".to_string()
    } else {
        format!("Vol: {}%", state.volume.percent())
    };

    let time_str = format!(
        "{} / {}",
        format_duration(state.progress.current_time_seconds),
        format_duration(state.progress.duration_seconds)
    );

    let title = format!("{} ", status_text);
    let controls_info = format!(" {} | {} | {} ", shuffle_text, repeat_text, volume_text);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((state.progress.percentage / 100.0).clamp(0.0, 1.0))
        .label(time_str);

    frame.render_widget(gauge, area);
}
