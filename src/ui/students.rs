use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::app::AppState;
use crate::store::{Status, format_grades};

fn status_style(app: &AppState, status: Status) -> Style {
    match status {
        Status::Pass => Style::default().fg(app.theme.pass),
        Status::Fail => Style::default().fg(app.theme.fail),
    }
}

pub fn render_students_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }
    let app: &AppState = app;

    let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(app.students.len());
    let slice = app.students.get(start..end).unwrap_or(&[]);

    let rows = slice.iter().enumerate().map(|(i, s)| {
        let style = if start + i == app.selected_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        Row::new(vec![
            Cell::from(s.id().to_string()),
            Cell::from(s.name().to_string()),
            Cell::from(format!("{:.2}", s.average())),
            Cell::from(Span::styled(s.status().as_str(), status_style(app, s.status()))),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(8),
        Constraint::Percentage(60),
        Constraint::Length(8),
        Constraint::Length(6),
    ];
    let header = Row::new(vec!["ID", "NAME", "AVG", "STATUS"])
        .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let title = if app.search_query.is_empty() {
        "Students".to_string()
    } else {
        format!("Students (filter: {})", app.search_query)
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);
}

pub fn render_student_details(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Details")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let Some(s) = app.selected_student() else {
        let empty = if app.store.is_empty() {
            "There are no students to display."
        } else {
            "No student matches the filter."
        };
        let p = Paragraph::new(empty)
            .style(Style::default().fg(app.theme.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    };

    let lines = vec![
        Line::from(format!("Student {}", app.selected_index + 1)),
        Line::from(format!("Name: {}", s.name())),
        Line::from(format!("ID: {}", s.id())),
        Line::from(format!("Grades: {}", format_grades(s.grades()))),
        Line::from(format!("Average: {:.2}", s.average())),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(s.status().as_str(), status_style(app, s.status())),
        ]),
    ];
    let p = Paragraph::new(lines)
        .style(Style::default().fg(app.theme.text))
        .block(block);
    f.render_widget(p, area);
}

pub fn render_class_summary(f: &mut Frame, area: Rect, app: &AppState) {
    let stats = app.store.stats();
    let avg = stats
        .class_average
        .map(|a| format!("{a:.2}"))
        .unwrap_or_else(|| "-".to_string());
    let lines = vec![
        Line::from(format!("Students: {}", stats.count)),
        Line::from(format!("Class average: {avg}")),
        Line::from(Span::styled(
            format!("Passing: {}", stats.passed),
            Style::default().fg(app.theme.pass),
        )),
        Line::from(Span::styled(
            format!("Failing: {}", stats.failed),
            Style::default().fg(app.theme.fail),
        )),
    ];
    let p = Paragraph::new(lines)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Summary")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}
