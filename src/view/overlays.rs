//! Overlay rendering (toast, add-track form, help popup)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{AddTrackForm, FormField, Toast, ToastKind};

fn centered(frame: &Frame, width: u16, height: u16) -> Rect {
    let area = frame.area();
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

pub fn render_toast(frame: &mut Frame, toast: &Toast) {
    let (color, title) = match toast.kind {
        ToastKind::Error => (Color::Red, " Error (Esc to dismiss) "),
        ToastKind::Success => (Color::Green, " Done "),
    };

    let popup_width = 52u16;
    let inner_width = popup_width.saturating_sub(4) as usize;
    let line_count = toast.message.chars().count().div_ceil(inner_width.max(1)) as u16;
    let popup_area = centered(frame, popup_width, 2 + line_count.max(1));

    frame.render_widget(Clear, popup_area);

    let widget = Paragraph::new(toast.message.clone())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title)
                .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(Color::Black)),
        );

    frame.render_widget(widget, popup_area);
}

pub fn render_add_track_form(frame: &mut Frame, form: &AddTrackForm) {
    let popup_area = centered(frame, 64, 9);
    frame.render_widget(Clear, popup_area);

    let fields = [
        (FormField::Title, "Title *", form.draft.title.as_str()),
        (FormField::Artist, "Artist", form.draft.artist.as_str()),
        (FormField::Url, "URL *", form.draft.url.as_str()),
        (FormField::Cover, "Cover", form.cover.as_str()),
    ];

    let mut lines: Vec<Line> = fields
        .iter()
        .map(|(field, label, value)| {
            let focused = *field == form.focus;
            let label_style = if focused {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let cursor = if focused { "_" } else { "" };
            Line::from(vec![
                Span::styled(format!("{:>8}: ", label), label_style),
                Span::raw(format!("{}{}", value, cursor)),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(match &form.validation {
        Some(message) => Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(
            "Audio file or YouTube link",
            Style::default().fg(Color::DarkGray),
        )),
    });

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Add track (Tab next field, Enter save, Esc cancel) ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(widget, popup_area);
}

pub fn render_help_popup(frame: &mut Frame) {
    let keybindings = [
        ("", "── Playback ──"),
        ("Space", "Play / Pause"),
        ("Enter", "Play selected track"),
        ("← / →", "Previous / Next track"),
        (", / .", "Seek -10s / +10s"),
        ("0-9", "Jump to 0% .. 90%"),
        ("x", "Stop"),
        ("s", "Toggle shuffle"),
        ("r", "Toggle repeat"),
        ("+ / -", "Volume up / down"),
        ("m", "Mute / Unmute"),
        ("", ""),
        ("", "── Playlist ──"),
        ("↑ / ↓", "Move selection"),
        ("a", "Add track"),
        ("d / Delete", "Delete selected track"),
        ("l", "Reload online playlist"),
        ("", ""),
        ("", "── General ──"),
        ("h", "Toggle this help"),
        ("q", "Quit"),
    ];

    let popup_area = centered(frame, 62, keybindings.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = keybindings
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                Line::from(Span::styled(
                    format!("{:^38}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>18}", key),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(desc.to_string(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    let help_text = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help (h or Esc to close) ")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(Color::Black)),
        )
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help_text, popup_area);
}
