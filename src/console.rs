//! Line-oriented menu driver.
//!
//! Reads menu selections and record fields from any [`BufRead`] and renders
//! prompts and results to any [`Write`], calling into [`StudentStore`] for
//! every operation. Used by `--plain` mode and by the tests.
//!
use std::io::{BufRead, Write};
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{Context, EndOfInput, Result, is_end_of_input, simple_error};
use crate::store::{
    Grades, RecordSource, SUBJECT_COUNT, StoreError, StudentRecord, StudentStore, format_grades,
};

const SEPARATOR: &str = "#########################################";

/// Commands of the numbered menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MenuChoice {
    Add,
    DisplayAll,
    Search,
    Update,
    Delete,
    Exit,
}

impl MenuChoice {
    /// Map a typed selection to a command; anything but `1`..=`6` is invalid.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().parse::<u8>().ok()? {
            1 => Some(MenuChoice::Add),
            2 => Some(MenuChoice::DisplayAll),
            3 => Some(MenuChoice::Search),
            4 => Some(MenuChoice::Update),
            5 => Some(MenuChoice::Delete),
            6 => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the menu loop until Exit or end of input.
    ///
    /// Returns an error only for fatal conditions: resource exhaustion in the
    /// store or a broken input/output stream.
    pub fn run(&mut self, store: &mut StudentStore) -> Result<()> {
        info!("console session started");
        loop {
            self.print_menu()?;
            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                break;
            };
            let step = match MenuChoice::parse(&line) {
                Some(MenuChoice::Add) => self.add_students(store),
                Some(MenuChoice::DisplayAll) => self.display_all(store),
                Some(MenuChoice::Search) => self.search(store),
                Some(MenuChoice::Update) => self.update(store),
                Some(MenuChoice::Delete) => self.delete(store),
                Some(MenuChoice::Exit) => break,
                None => {
                    debug!(input = %line, "invalid menu selection");
                    writeln!(self.output, "Invalid option. Please try again.")?;
                    Ok(())
                }
            };
            match step {
                Ok(()) => {}
                Err(e) if is_end_of_input(&e) => {
                    writeln!(self.output)?;
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        self.output.flush()?;
        info!(students = store.len(), "console session finished");
        Ok(())
    }

    fn print_menu(&mut self) -> Result<()> {
        writeln!(self.output, "1. Add a Student")?;
        writeln!(self.output, "2. Display All Students")?;
        writeln!(self.output, "3. Search for a Student by ID")?;
        writeln!(self.output, "4. Update a Student's Record")?;
        writeln!(self.output, "5. Delete a Student's Record")?;
        writeln!(self.output, "6. Exit")?;
        write!(self.output, "Choose your option, please: ")?;
        self.output.flush()?;
        Ok(())
    }

    /// Next input line, trimmed. Bytes that are not UTF-8 are replaced so a
    /// garbled line is rejected like any other bad answer.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = Vec::new();
        let n = self
            .input
            .read_until(b'\n', &mut buf)
            .with_ctx(|| "read from input".to_string())?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
    }

    fn prompt(&mut self, text: &str) -> Result<String> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        match self.read_line()? {
            Some(line) => Ok(line),
            None => Err(EndOfInput.into()),
        }
    }

    fn prompt_number<T: FromStr>(&mut self, text: &str) -> Result<T> {
        loop {
            let line = self.prompt(text)?;
            match parse_number(&line) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(input = %line, "rejected numeric input");
                    writeln!(self.output, "{e}")?;
                }
            }
        }
    }

    fn prompt_grades(&mut self, header: &str) -> Result<Grades> {
        writeln!(self.output, "{header}")?;
        let mut grades = [0.0; SUBJECT_COUNT];
        for (j, grade) in grades.iter_mut().enumerate() {
            *grade = self.prompt_number(&format!("Grade for subject {}: ", j + 1))?;
        }
        Ok(grades)
    }

    fn print_record(&mut self, position: usize, record: &StudentRecord) -> Result<()> {
        writeln!(self.output, "Student {}:", position + 1)?;
        writeln!(self.output, "Name: {}", record.name())?;
        writeln!(self.output, "ID: {}", record.id())?;
        writeln!(self.output, "Grades: {}", format_grades(record.grades()))?;
        writeln!(self.output, "Average: {:.2}", record.average())?;
        writeln!(self.output, "Status: {}", record.status())?;
        writeln!(self.output)?;
        Ok(())
    }

    fn add_students(&mut self, store: &mut StudentStore) -> Result<()> {
        writeln!(self.output, "Enter details of a new student")?;
        let count: usize = self.prompt_number("How many students do you want to enter? ")?;
        let inserted = {
            let mut source = PromptSource {
                console: self,
                name: String::new(),
                id: 0,
            };
            store.insert_many(count, &mut source)
        };
        match inserted {
            Ok(records) => info!(count = records.len(), "added students"),
            Err(StoreError::Input(e)) => return Err(e),
            Err(e) => return Err(e.into()),
        }

        writeln!(self.output, "{SEPARATOR}")?;
        writeln!(self.output, "Calculate the average")?;
        match store.compute_averages() {
            Ok(summaries) => {
                for s in summaries {
                    writeln!(
                        self.output,
                        "The average for student {} {} is: {:.1}",
                        s.position + 1,
                        s.name,
                        s.average
                    )?;
                }
            }
            Err(StoreError::EmptyStore) => {
                writeln!(self.output, "There are no students to display.")?
            }
            Err(e) => return Err(e.into()),
        }

        writeln!(self.output, "{SEPARATOR}")?;
        writeln!(self.output, "Determine the pass/fail status")?;
        match store.compute_statuses() {
            Ok(summaries) => {
                for s in summaries {
                    writeln!(
                        self.output,
                        "The status of student {} ({}) is: {}",
                        s.position + 1,
                        s.name,
                        s.status
                    )?;
                }
            }
            Err(StoreError::EmptyStore) => {
                writeln!(self.output, "There are no students to display.")?
            }
            Err(e) => return Err(e.into()),
        }
        writeln!(self.output, "{SEPARATOR}")?;
        Ok(())
    }

    fn display_all(&mut self, store: &StudentStore) -> Result<()> {
        writeln!(self.output, "{SEPARATOR}")?;
        writeln!(self.output, "Display Students")?;
        match store.list_all() {
            Ok(records) => {
                for (position, record) in records.iter().enumerate() {
                    self.print_record(position, record)?;
                }
            }
            Err(_) => writeln!(self.output, "There are no students to display.")?,
        }
        writeln!(self.output, "{SEPARATOR}")?;
        Ok(())
    }

    fn search(&mut self, store: &StudentStore) -> Result<()> {
        writeln!(self.output, "{SEPARATOR}")?;
        writeln!(self.output, "Search Students")?;
        writeln!(self.output, "{SEPARATOR}")?;
        let id: u32 =
            self.prompt_number("Please enter the ID of the student you want to show: ")?;
        match store.find_by_id(id) {
            Ok((position, record)) => self.print_record(position, record)?,
            Err(e) => writeln!(self.output, "{e}.")?,
        }
        writeln!(self.output, "{SEPARATOR}")?;
        Ok(())
    }

    fn update(&mut self, store: &mut StudentStore) -> Result<()> {
        writeln!(self.output, "{SEPARATOR}")?;
        writeln!(self.output, "Update Students")?;
        writeln!(self.output, "{SEPARATOR}")?;
        let id: u32 =
            self.prompt_number("Please enter the ID of the student you want to update: ")?;
        if !store.id_exists(id) {
            writeln!(self.output, "{}.", StoreError::NotFound(id))?;
            writeln!(self.output, "{SEPARATOR}")?;
            return Ok(());
        }

        writeln!(self.output, "Updating information for student ID {id}")?;
        let name = self.prompt("Enter new name for student: ")?;
        let new_id = loop {
            let candidate: u32 = self.prompt_number("Enter new ID for student: ")?;
            if candidate == id || !store.id_exists(candidate) {
                break candidate;
            }
            writeln!(
                self.output,
                "ID {candidate} is already taken. Please enter a different ID."
            )?;
        };
        let grades = self.prompt_grades("Enter new grades for 5 subjects:")?;

        match store.update_by_id(id, name, new_id, grades) {
            Ok(_) => writeln!(self.output, "Student information updated successfully.")?,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => writeln!(self.output, "{e}.")?,
        }
        writeln!(self.output, "{SEPARATOR}")?;
        Ok(())
    }

    fn delete(&mut self, store: &mut StudentStore) -> Result<()> {
        writeln!(self.output, "{SEPARATOR}")?;
        writeln!(self.output, "Delete Student Record")?;
        writeln!(self.output, "{SEPARATOR}")?;
        let id: u32 =
            self.prompt_number("Please enter the ID of the student you want to delete: ")?;
        match store.delete_by_id(id) {
            Ok(_) => writeln!(self.output, "Student with ID {id} deleted successfully.")?,
            Err(e) => writeln!(self.output, "{e}.")?,
        }
        writeln!(self.output, "{SEPARATOR}")?;
        Ok(())
    }
}

fn parse_number<T: FromStr>(line: &str) -> Result<T> {
    line.parse::<T>()
        .map_err(|_| simple_error("Please enter a valid number."))
}

/// Prompts for each field of a new record and echoes it once complete.
struct PromptSource<'a, R, W> {
    console: &'a mut Console<R, W>,
    name: String,
    id: u32,
}

impl<R: BufRead, W: Write> RecordSource for PromptSource<'_, R, W> {
    fn name(&mut self, index: usize) -> Result<String> {
        let name = self
            .console
            .prompt(&format!("Please enter the name of student {}: ", index + 1))?;
        self.name = name.clone();
        Ok(name)
    }

    fn id(&mut self, index: usize) -> Result<u32> {
        let id = self
            .console
            .prompt_number(&format!("Please enter the ID of student {}: ", index + 1))?;
        self.id = id;
        Ok(id)
    }

    fn id_rejected(&mut self, _index: usize, id: u32) -> Result<()> {
        writeln!(
            self.console.output,
            "ID {id} is already taken. Please enter a different ID."
        )?;
        Ok(())
    }

    fn grades(&mut self, index: usize) -> Result<Grades> {
        let grades = self.console.prompt_grades(&format!(
            "Please enter grades for 5 subjects for student {}:",
            index + 1
        ))?;
        let out = &mut self.console.output;
        writeln!(out, "The information of student {}:", index + 1)?;
        writeln!(out, "Name: {}", self.name)?;
        writeln!(out, "ID: {}", self.id)?;
        writeln!(out, "Grades: {}", format_grades(&grades))?;
        Ok(grades)
    }
}
