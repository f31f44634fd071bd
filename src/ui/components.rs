//! Shared UI components: status bar, centered rectangles, modal dialogs.
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{AppState, InputMode, ModalState, StudentForm};

/// Render the bottom status bar with mode, counts and the last message.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "FILTER",
        InputMode::Modal => "MODAL",
    };
    let mut msg = format!(
        "mode: {mode}  students:{}  shown:{}  rows/page:{}",
        app.store.len(),
        app.students.len(),
        app.rows_per_page
    );
    if let Some(status) = &app.status_message {
        msg.push_str("  | ");
        msg.push_str(status);
    }
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn modal_block<'a>(app: &AppState, title: impl Into<Line<'a>>) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border))
}

/// Single-line numeric prompt: student count or id.
pub fn render_input_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let (title, label, value, error) = match state {
        ModalState::CountInput { value, error } => (
            "Add students",
            "How many students do you want to enter?",
            value,
            error,
        ),
        ModalState::IdInput {
            purpose,
            value,
            error,
        } => (purpose.title(), "Student ID:", value, error),
        _ => return,
    };
    let width = 50u16.min(area.width.saturating_sub(4)).max(30);
    let height = if error.is_some() { 7 } else { 5 };
    let rect = centered_rect(width, height, area);

    let mut lines = vec![
        Line::from(label),
        Line::from(Span::styled(
            format!("{value}_"),
            Style::default().fg(app.theme.highlight_fg),
        )),
    ];
    if let Some(err) = error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(app.theme.fail),
        )));
    }
    let p = Paragraph::new(lines).block(modal_block(app, title));
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Name, id and grade fields with the selected one highlighted.
pub fn render_form_modal(f: &mut Frame, area: Rect, app: &AppState, form: &StudentForm) {
    let title = match form.purpose {
        crate::app::FormPurpose::Add { index, total } => {
            format!("Add student {} of {}", index + 1, total)
        }
        crate::app::FormPurpose::Update { target_id } => {
            format!("Update student ID {target_id}")
        }
    };
    let extra = if form.error.is_some() { 2 } else { 0 };
    let height = (StudentForm::FIELD_COUNT as u16 + 4 + extra).min(area.height);
    let width = 60u16.min(area.width.saturating_sub(4)).max(36);
    let rect = centered_rect(width, height, area);

    let mut lines: Vec<Line> = (0..StudentForm::FIELD_COUNT)
        .map(|field| {
            let selected = field == form.selected;
            let marker = if selected { "▶ " } else { "  " };
            let cursor = if selected { "_" } else { "" };
            let style = if selected {
                Style::default()
                    .fg(app.theme.highlight_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.text)
            };
            Line::from(Span::styled(
                format!(
                    "{marker}{:<8} {}{cursor}",
                    StudentForm::label(field),
                    form.value(field)
                ),
                style,
            ))
        })
        .collect();
    if let Some(err) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(app.theme.fail),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab/Up/Down: field  Enter: next/save  Esc: cancel",
        Style::default().fg(app.theme.muted),
    )));
    let p = Paragraph::new(lines).block(modal_block(app, title));
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

pub fn render_delete_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::DeleteConfirm { id, selected } = state {
        let rect = centered_rect(44, 7, area);
        let name = app
            .store
            .find_by_id(*id)
            .map(|(_, s)| s.name().to_string())
            .unwrap_or_default();
        let options = ["Delete", "Cancel"];
        let mut text = format!("Delete student {name} (ID {id})?\n\n");
        for (idx, label) in options.iter().enumerate() {
            if idx == *selected {
                text.push_str(&format!("▶ {}   ", label));
            } else {
                text.push_str(&format!("  {}   ", label));
            }
        }
        let p = Paragraph::new(text).block(modal_block(app, "Confirm delete"));
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}

/// Render an informational message or the post-add report.
pub fn render_info_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let (title, body) = match state {
        ModalState::Info { title, message } => (title.clone(), message.clone()),
        ModalState::Report { lines } => ("Results".to_string(), lines.join("\n")),
        _ => return,
    };
    // Size to content, wrapping long lines
    let max_w = area.width.saturating_sub(6).max(30);
    let widest = body.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
    let width = (widest + 4).clamp(40u16.min(max_w), max_w);
    let max_h = area.height.saturating_sub(4).max(5);
    let height = (body.lines().count() as u16 + 4).clamp(5, max_h);
    let rect = centered_rect(width, height, area);
    let body = format!("{body}\n\nEnter/Esc: close");
    let p = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(modal_block(app, title));
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
