//! Now-playing header and track list

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph},
    Frame,
};

use crate::model::{TrackKind, UNKNOWN_DURATION};

use super::utils::{calculate_num_width, format_total, truncate_string};
use super::ViewState;

pub fn render_header(frame: &mut Frame, area: Rect, state: &ViewState) {
    let video = state.tracks.iter().filter(|t| t.kind == TrackKind::Video).count();
    let total: u64 = state.tracks.iter().filter_map(|t| t.duration_seconds()).sum();
    let stats = format!(
        "{} tracks ({} video, {} audio) | {}",
        state.tracks.len(),
        video,
        state.tracks.len() - video,
        format_total(total)
    );

    let header = Paragraph::new(stats)
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" tunebox (h for help) ")
                .padding(Padding::horizontal(1)),
        );
    frame.render_widget(header, area);
}

pub fn render_track_list(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Playlist ")
        .border_style(Style::default().fg(Color::Green));

    if state.tracks.is_empty() {
        let empty = Paragraph::new("No tracks yet.\n\nPress a to add one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block.padding(Padding::horizontal(1)));
        frame.render_widget(empty, area);
        return;
    }

    let num_width = calculate_num_width(state.tracks.len());
    let content_width = area.width.saturating_sub(2) as usize;
    let fixed_width = 1 + num_width + 3 + 6 + 3 + 3 + 8;
    let remaining = content_width.saturating_sub(fixed_width);
    let title_width = (remaining * 55) / 100;
    let artist_width = remaining.saturating_sub(title_width);

    let items: Vec<ListItem> = state
        .tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let is_current = i == state.current_index;
            let is_selected = i == state.selected;

            let badge = match track.kind {
                TrackKind::Video if track.has_fallback() => "video+",
                TrackKind::Video => "video ",
                TrackKind::Audio => "audio ",
            };
            let marker = if is_current && state.is_playing { "▶" } else { " " };
            let duration = track.duration_hint.as_deref().unwrap_or(UNKNOWN_DURATION);

            let style = if is_selected {
                Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
            } else if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if !track.playable {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };

            let mut spans = vec![
                Span::raw(format!("{}{:>width$}   ", marker, i + 1, width = num_width)),
                Span::raw(format!("{}   ", badge)),
                Span::raw(format!("{}   ", truncate_string(&track.title, title_width))),
                Span::raw(format!("{}   ", truncate_string(&track.artist, artist_width))),
                Span::raw(format!("{:>8}", duration)),
            ];
            if let Some(warning) = &track.warning {
                spans.push(Span::styled(format!("  ! {}", warning), Style::default().fg(Color::Yellow)));
            }

            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let list = List::new(items).block(block);
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));

    frame.render_stateful_widget(list, area, &mut list_state);
}
