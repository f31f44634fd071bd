use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;
use tracing::{info, warn};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, FormPurpose, IdPurpose, InputMode, ModalState, StudentForm};
use crate::search::{apply_search, reset_selection, select_id};
use crate::store::{StoreError, StudentRecord, format_grades};
use crate::ui;

/// Draw and process key presses until the user quits.
///
/// Returns an error if the terminal fails or the store hits a fatal condition.
pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    info!(students = app.store.len(), "tui session started");
    while !app.should_quit {
        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key(app, key);
        }

        if let Some(msg) = &app.fatal_error {
            return Err(anyhow!("{msg}"));
        }
    }
    info!(students = app.store.len(), "tui session finished");
    Ok(())
}

/// Apply one key press to the application state.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    match app.input_mode {
        InputMode::Normal => handle_normal_key(app, key),
        InputMode::Search => match key.code {
            KeyCode::Enter => {
                reset_selection(app);
                apply_search(app);
                app.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => {
                app.search_query.clear();
                apply_search(app);
                app.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                app.search_query.pop();
            }
            KeyCode::Char(c) => app.search_query.push(c),
            _ => {}
        },
        InputMode::Modal => handle_modal_key(app, key.code),
    }
}

fn handle_normal_key(app: &mut AppState, key: KeyEvent) {
    let Some(action) = app.keymap.resolve(&key) else {
        return;
    };
    match action {
        KeyAction::Quit => app.should_quit = true,
        KeyAction::AddStudents => app.open_modal(ModalState::CountInput {
            value: String::new(),
            error: None,
        }),
        KeyAction::DisplayAll => {
            app.search_query.clear();
            apply_search(app);
            match app.store.list_all() {
                Ok(records) => {
                    app.status_message = Some(format!("Showing all {} students", records.len()))
                }
                Err(e) => app.info("Display students", format!("{e}.")),
            }
        }
        KeyAction::SearchById => open_id_prompt(app, IdPurpose::Search),
        KeyAction::UpdateById => open_id_prompt(app, IdPurpose::Update),
        KeyAction::DeleteById => open_id_prompt(app, IdPurpose::Delete),
        KeyAction::StartSearch => {
            app.search_query.clear();
            app.input_mode = InputMode::Search;
        }
        KeyAction::EnterAction => {
            if let Some(record) = app.selected_student() {
                let form = StudentForm::for_update(record);
                app.open_modal(ModalState::StudentForm(form));
            }
        }
        KeyAction::DeleteSelection => {
            if let Some(id) = app.selected_student().map(|s| s.id()) {
                app.open_modal(ModalState::DeleteConfirm { id, selected: 1 });
            }
        }
        KeyAction::MoveUp => {
            app.selected_index = app.selected_index.saturating_sub(1);
        }
        KeyAction::MoveDown => {
            if app.selected_index + 1 < app.students.len() {
                app.selected_index += 1;
            }
        }
        KeyAction::PageUp => {
            let rpp = app.rows_per_page.max(1);
            app.selected_index = app.selected_index.saturating_sub(rpp);
        }
        KeyAction::PageDown => {
            let rpp = app.rows_per_page.max(1);
            let new_idx = app.selected_index.saturating_add(rpp);
            app.selected_index = new_idx.min(app.students.len().saturating_sub(1));
        }
        KeyAction::Ignore => {}
    }
}

fn open_id_prompt(app: &mut AppState, purpose: IdPurpose) {
    app.open_modal(ModalState::IdInput {
        purpose,
        value: String::new(),
        error: None,
    });
}

fn handle_modal_key(app: &mut AppState, code: KeyCode) {
    let Some(modal) = app.modal.take() else {
        app.input_mode = InputMode::Normal;
        return;
    };
    match modal {
        ModalState::CountInput { mut value, error } => match code {
            KeyCode::Esc => app.close_modal(),
            KeyCode::Enter => submit_count(app, value),
            KeyCode::Backspace => {
                value.pop();
                app.modal = Some(ModalState::CountInput { value, error });
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                value.push(c);
                app.modal = Some(ModalState::CountInput { value, error });
            }
            _ => app.modal = Some(ModalState::CountInput { value, error }),
        },
        ModalState::StudentForm(mut form) => match code {
            KeyCode::Esc => cancel_form(app, form),
            KeyCode::Tab | KeyCode::Down => {
                form.next_field();
                app.modal = Some(ModalState::StudentForm(form));
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.prev_field();
                app.modal = Some(ModalState::StudentForm(form));
            }
            KeyCode::Enter if form.selected + 1 < StudentForm::FIELD_COUNT => {
                form.next_field();
                app.modal = Some(ModalState::StudentForm(form));
            }
            KeyCode::Enter => submit_form(app, form),
            KeyCode::Backspace => {
                form.selected_value_mut().pop();
                app.modal = Some(ModalState::StudentForm(form));
            }
            KeyCode::Char(c) => {
                form.push_char(c);
                app.modal = Some(ModalState::StudentForm(form));
            }
            _ => app.modal = Some(ModalState::StudentForm(form)),
        },
        ModalState::IdInput {
            purpose,
            mut value,
            error,
        } => match code {
            KeyCode::Esc => app.close_modal(),
            KeyCode::Enter => submit_id(app, purpose, value),
            KeyCode::Backspace => {
                value.pop();
                app.modal = Some(ModalState::IdInput {
                    purpose,
                    value,
                    error,
                });
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                value.push(c);
                app.modal = Some(ModalState::IdInput {
                    purpose,
                    value,
                    error,
                });
            }
            _ => {
                app.modal = Some(ModalState::IdInput {
                    purpose,
                    value,
                    error,
                })
            }
        },
        ModalState::DeleteConfirm { id, selected } => match code {
            KeyCode::Esc => app.close_modal(),
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Tab => {
                app.modal = Some(ModalState::DeleteConfirm {
                    id,
                    selected: 1 - selected.min(1),
                });
            }
            KeyCode::Enter if selected == 0 => delete_student(app, id),
            KeyCode::Enter => app.close_modal(),
            _ => app.modal = Some(ModalState::DeleteConfirm { id, selected }),
        },
        ModalState::Info { .. } | ModalState::Report { .. } => match code {
            KeyCode::Esc | KeyCode::Enter => app.close_modal(),
            _ => app.modal = Some(modal),
        },
    }
}

fn submit_count(app: &mut AppState, value: String) {
    match value.trim().parse::<usize>() {
        Ok(0) => {
            app.close_modal();
            app.status_message = Some("No students added".to_string());
        }
        Ok(total) => app.open_modal(ModalState::StudentForm(StudentForm::for_add(0, total))),
        Err(_) => app.open_modal(ModalState::CountInput {
            value,
            error: Some("Please enter a valid number.".to_string()),
        }),
    }
}

fn submit_form(app: &mut AppState, mut form: StudentForm) {
    let (name, id, grades) = match form.parse() {
        Ok(parsed) => parsed,
        Err((field, msg)) => {
            form.selected = field;
            form.error = Some(msg);
            app.open_modal(ModalState::StudentForm(form));
            return;
        }
    };
    match form.purpose {
        FormPurpose::Add { index, total } => {
            match app.store.insert(StudentRecord::new(name, id, grades)) {
                Ok(_) => {
                    apply_search(app);
                    if index + 1 < total {
                        app.open_modal(ModalState::StudentForm(StudentForm::for_add(
                            index + 1,
                            total,
                        )));
                    } else {
                        finish_add(app, total);
                    }
                }
                Err(StoreError::DuplicateId(taken)) => {
                    form.selected = StudentForm::ID_FIELD;
                    form.id.clear();
                    form.error = Some(format!(
                        "ID {taken} is already taken. Please enter a different ID."
                    ));
                    app.open_modal(ModalState::StudentForm(form));
                }
                Err(e) => store_failure(app, e),
            }
        }
        FormPurpose::Update { target_id } => {
            match app.store.update_by_id(target_id, name, id, grades) {
                Ok(_) => {
                    apply_search(app);
                    select_id(app, id);
                    app.close_modal();
                    app.status_message =
                        Some("Student information updated successfully.".to_string());
                }
                Err(StoreError::DuplicateId(taken)) => {
                    form.selected = StudentForm::ID_FIELD;
                    form.error = Some(format!(
                        "ID {taken} is already taken. Please enter a different ID."
                    ));
                    app.open_modal(ModalState::StudentForm(form));
                }
                Err(e) => store_failure(app, e),
            }
        }
    }
}

/// Leaving an add form early still reports the students entered so far.
fn cancel_form(app: &mut AppState, form: StudentForm) {
    match form.purpose {
        FormPurpose::Add { index, .. } if index > 0 => finish_add(app, index),
        _ => app.close_modal(),
    }
}

/// Recompute derived fields over the whole store and show the report.
fn finish_add(app: &mut AppState, added: usize) {
    let mut lines = vec![format!("Added {added} student(s)."), String::new()];
    lines.push("Averages:".to_string());
    match app.store.compute_averages() {
        Ok(summaries) => lines.extend(summaries.into_iter().map(|s| {
            format!(
                "  The average for student {} {} is: {:.1}",
                s.position + 1,
                s.name,
                s.average
            )
        })),
        Err(e) => lines.push(format!("  {e}.")),
    }
    lines.push(String::new());
    lines.push("Status:".to_string());
    match app.store.compute_statuses() {
        Ok(summaries) => lines.extend(summaries.into_iter().map(|s| {
            format!(
                "  The status of student {} ({}) is: {}",
                s.position + 1,
                s.name,
                s.status
            )
        })),
        Err(e) => lines.push(format!("  {e}.")),
    }
    apply_search(app);
    info!(added, total = app.store.len(), "added students");
    app.open_modal(ModalState::Report { lines });
}

fn submit_id(app: &mut AppState, purpose: IdPurpose, value: String) {
    let id = match value.trim().parse::<u32>() {
        Ok(id) => id,
        Err(_) => {
            app.open_modal(ModalState::IdInput {
                purpose,
                value,
                error: Some("Please enter a valid number.".to_string()),
            });
            return;
        }
    };
    let found = app
        .store
        .find_by_id(id)
        .map(|(position, record)| (position, record.clone()));
    match (purpose, found) {
        (IdPurpose::Search, Ok((position, record))) => {
            select_id(app, id);
            app.info(
                format!("Student {}", position + 1),
                describe_record(&record),
            );
        }
        (IdPurpose::Update, Ok((_, record))) => {
            select_id(app, id);
            app.open_modal(ModalState::StudentForm(StudentForm::for_update(&record)));
        }
        (IdPurpose::Delete, Ok(_)) => {
            select_id(app, id);
            app.open_modal(ModalState::DeleteConfirm { id, selected: 1 });
        }
        (_, Err(e)) => app.info(purpose.title(), format!("{e}.")),
    }
}

fn delete_student(app: &mut AppState, id: u32) {
    match app.store.delete_by_id(id) {
        Ok(_) => {
            apply_search(app);
            app.close_modal();
            app.status_message = Some(format!("Student with ID {id} deleted successfully."));
        }
        Err(e) => store_failure(app, e),
    }
}

fn store_failure(app: &mut AppState, err: StoreError) {
    if err.is_fatal() {
        warn!(error = %err, "fatal store error");
        app.fatal_error = Some(err.to_string());
        app.close_modal();
    } else {
        app.info("Error", format!("{err}."));
    }
}

/// Multi-line description used by the search result dialog.
pub fn describe_record(record: &StudentRecord) -> String {
    format!(
        "Name: {}\nID: {}\nGrades: {}\nAverage: {:.2}\nStatus: {}",
        record.name(),
        record.id(),
        format_grades(record.grades()),
        record.average(),
        record.status()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Status;
    use crossterm::event::KeyModifiers;

    fn press(app: &mut AppState, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut AppState, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    /// Fill the open student form field by field and submit it.
    fn fill_form(app: &mut AppState, name: &str, id: &str, grade: &str) {
        type_str(app, name);
        press(app, KeyCode::Enter);
        type_str(app, id);
        press(app, KeyCode::Enter);
        for _ in 0..5 {
            type_str(app, grade);
            press(app, KeyCode::Enter);
        }
    }

    fn app_with(records: &[(&str, u32, f32)]) -> AppState {
        let mut app = AppState::default();
        for (name, id, g) in records {
            app.store
                .insert(StudentRecord::new(*name, *id, [*g; 5]))
                .unwrap();
        }
        apply_search(&mut app);
        app
    }

    #[test]
    fn add_flow_inserts_and_reports() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('1'));
        type_str(&mut app, "2");
        press(&mut app, KeyCode::Enter);
        fill_form(&mut app, "amy", "1", "50");
        fill_form(&mut app, "bo", "2", "0");

        let Some(ModalState::Report { lines }) = &app.modal else {
            panic!("expected report, got {:?}", app.modal);
        };
        assert!(lines.iter().any(|l| l.contains("student 1 (amy) is: Pass")));
        assert!(lines.iter().any(|l| l.contains("student 2 (bo) is: Fail")));
        assert_eq!(app.students.len(), 2);
        assert_eq!(app.store.records()[1].status(), Status::Fail);
    }

    #[test]
    fn duplicate_id_keeps_form_open() {
        let mut app = app_with(&[("old", 1, 70.0)]);
        press(&mut app, KeyCode::Char('1'));
        type_str(&mut app, "1");
        press(&mut app, KeyCode::Enter);
        fill_form(&mut app, "new", "1", "60");

        let Some(ModalState::StudentForm(form)) = &app.modal else {
            panic!("expected form, got {:?}", app.modal);
        };
        assert_eq!(form.selected, StudentForm::ID_FIELD);
        assert!(form.id.is_empty());
        assert!(form.error.as_deref().unwrap_or("").contains("already taken"));
        assert_eq!(app.store.len(), 1);

        type_str(&mut app, "2");
        for _ in 0..StudentForm::FIELD_COUNT - StudentForm::ID_FIELD {
            press(&mut app, KeyCode::Enter);
        }
        assert!(matches!(app.modal, Some(ModalState::Report { .. })));
        assert_eq!(app.store.len(), 2);
    }

    #[test]
    fn search_by_unknown_id_reports_not_found() {
        let mut app = app_with(&[("a", 1, 50.0)]);
        press(&mut app, KeyCode::Char('3'));
        type_str(&mut app, "42");
        press(&mut app, KeyCode::Enter);
        let Some(ModalState::Info { message, .. }) = &app.modal else {
            panic!("expected info, got {:?}", app.modal);
        };
        assert_eq!(message, "Student with ID 42 not found.");
    }

    #[test]
    fn delete_by_id_needs_confirmation() {
        let mut app = app_with(&[("a", 1, 50.0), ("b", 2, 50.0), ("c", 3, 50.0)]);
        press(&mut app, KeyCode::Char('5'));
        type_str(&mut app, "2");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(
            app.modal,
            Some(ModalState::DeleteConfirm { id: 2, selected: 1 })
        ));
        // Enter on "Cancel" keeps the record.
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.len(), 3);

        press(&mut app, KeyCode::Char('5'));
        type_str(&mut app, "2");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        let ids: Vec<u32> = app.students.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn update_selected_row_recomputes_status() {
        let mut app = app_with(&[("a", 1, 90.0)]);
        press(&mut app, KeyCode::Enter);
        let Some(ModalState::StudentForm(form)) = &mut app.modal else {
            panic!("expected form");
        };
        form.grades = Default::default();
        form.grades.iter_mut().for_each(|g| g.push_str("10"));
        form.selected = StudentForm::FIELD_COUNT - 1;
        press(&mut app, KeyCode::Enter);
        assert!(app.modal.is_none());
        assert_eq!(app.store.records()[0].status(), Status::Fail);
        assert_eq!(app.students[0].average(), 10.0);
    }

    #[test]
    fn display_all_on_empty_store_is_reported() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('2'));
        let Some(ModalState::Info { message, .. }) = &app.modal else {
            panic!("expected info");
        };
        assert_eq!(message, "There are no students to display.");
    }

    #[test]
    fn quit_keys_stop_the_loop() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('6'));
        assert!(app.should_quit);
    }

    #[test]
    fn full_store_sets_fatal_error() {
        let mut app = app_with(&[]);
        for id in 0..crate::store::MAX_STUDENTS as u32 {
            app.store
                .insert(StudentRecord::new("filler", id, [50.0; 5]))
                .unwrap();
        }
        apply_search(&mut app);

        press(&mut app, KeyCode::Char('1'));
        type_str(&mut app, "1");
        press(&mut app, KeyCode::Enter);
        fill_form(&mut app, "late", "999", "50");

        let msg = app.fatal_error.as_deref().expect("fatal error recorded");
        assert!(msg.contains("out of storage"));
        assert!(app.modal.is_none());
        assert!(!app.store.id_exists(999));
    }
}
