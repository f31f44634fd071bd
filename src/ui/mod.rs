//! Rendering of the TUI: header, student table, details, summary and modals.
//!
pub mod components;
pub mod students;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(root[1]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(5)].as_ref())
        .split(body[1]);

    let prompt = match app.input_mode {
        InputMode::Search => format!("  Filter: {}", app.search_query),
        InputMode::Normal | InputMode::Modal => String::new(),
    };
    let hint = |action: KeyAction| app.keymap.keys_for(action).join("/");
    let p = Paragraph::new(format!(
        "student-records ({who})  students:{count}{prompt}  {add}: add  {all}: all  {search}: find  {update}: update  {delete}: delete  /: filter  {quit}: quit",
        who = app.operator,
        count = app.store.len(),
        add = hint(KeyAction::AddStudents),
        all = hint(KeyAction::DisplayAll),
        search = hint(KeyAction::SearchById),
        update = hint(KeyAction::UpdateById),
        delete = hint(KeyAction::DeleteById),
        quit = hint(KeyAction::Quit),
    ))
    .block(
        Block::default()
            .title("student-records")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, root[0]);

    students::render_students_table(f, body[0], app);
    students::render_student_details(f, right[0], app);
    students::render_class_summary(f, right[1], app);
    components::render_status_bar(f, root[2], app);

    if let Some(state) = app.modal.clone() {
        let area = f.area();
        match &state {
            ModalState::CountInput { .. } | ModalState::IdInput { .. } => {
                components::render_input_modal(f, area, app, &state)
            }
            ModalState::StudentForm(form) => components::render_form_modal(f, area, app, form),
            ModalState::DeleteConfirm { .. } => {
                components::render_delete_modal(f, area, app, &state)
            }
            ModalState::Info { .. } | ModalState::Report { .. } => {
                components::render_info_modal(f, area, app, &state)
            }
        }
    }
}
