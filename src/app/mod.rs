//! Application state types and entry glue for the TUI.
//!
//! Defines the state the event loop mutates and the renderer reads: the
//! record store, the filtered table view, input mode, modal dialogs, theme
//! and key map. The event loop itself lives in `update` (re-exported as `run`).
//!
pub mod keymap;
pub mod update;

use ratatui::style::Color;
use std::path::PathBuf;

use crate::store::{Grades, SUBJECT_COUNT, StudentRecord, StudentStore};
use keymap::Keymap;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub pass: Color,
    pub fail: Color,
}

impl Theme {
    /// Dark default theme.
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            pass: Color::Green,
            fail: Color::Red,
        }
    }

    /// Catppuccin Mocha theme defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            pass: Color::Rgb(0xa6, 0xe3, 0xa1),         // green
            fail: Color::Rgb(0xf3, 0x8b, 0xa8),         // red
        }
    }

    /// Load theme from a simple key=value file. Unknown or missing keys fall back to `mocha`.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Parse key=value lines on top of the `mocha` defaults.
    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            if key.is_empty() || val.is_empty() {
                continue;
            }
            if let Some(color) = Self::parse_color(val) {
                match key {
                    "text" => theme.text = color,
                    "muted" => theme.muted = color,
                    "title" => theme.title = color,
                    "border" => theme.border = color,
                    "header_bg" => theme.header_bg = color,
                    "header_fg" => theme.header_fg = color,
                    "status_bg" => theme.status_bg = color,
                    "status_fg" => theme.status_fg = color,
                    "highlight_fg" => theme.highlight_fg = color,
                    "highlight_bg" => theme.highlight_bg = color,
                    "pass" => theme.pass = color,
                    "fail" => theme.fail = color,
                    _ => {}
                }
            }
        }
        theme
    }

    /// Parse a color from hex ("#RRGGBB" or "RRGGBB") or the special name "reset".
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
        if hex.len() == 6
            && let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            )
        {
            return Some(Color::Rgb(r, g, b));
        }
        None
    }

    /// Persist the theme to a config file in key=value format.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# student-records theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");

        fn color_to_str(c: Color) -> String {
            match c {
                Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
                Color::Reset => "reset".to_string(),
                // Named colors get a best-effort hex approximation
                Color::Black => "#000000".to_string(),
                Color::Red => "#FF0000".to_string(),
                Color::Green => "#00FF00".to_string(),
                Color::Yellow => "#FFFF00".to_string(),
                Color::Blue => "#0000FF".to_string(),
                Color::Magenta => "#FF00FF".to_string(),
                Color::Cyan => "#00FFFF".to_string(),
                Color::Gray => "#B3B3B3".to_string(),
                Color::DarkGray => "#4D4D4D".to_string(),
                Color::LightRed => "#FF6666".to_string(),
                Color::LightGreen => "#66FF66".to_string(),
                Color::LightYellow => "#FFFF66".to_string(),
                Color::LightBlue => "#6666FF".to_string(),
                Color::LightMagenta => "#FF66FF".to_string(),
                Color::LightCyan => "#66FFFF".to_string(),
                Color::White => "#FFFFFF".to_string(),
                Color::Indexed(i) => format!("index:{}", i),
            }
        }

        let entries = [
            ("text", self.text),
            ("muted", self.muted),
            ("title", self.title),
            ("border", self.border),
            ("header_bg", self.header_bg),
            ("header_fg", self.header_fg),
            ("status_bg", self.status_bg),
            ("status_fg", self.status_fg),
            ("highlight_fg", self.highlight_fg),
            ("highlight_bg", self.highlight_bg),
            ("pass", self.pass),
            ("fail", self.fail),
        ];
        for (k, v) in entries {
            let _ = writeln!(&mut buf, "{} = {}", k, color_to_str(v));
        }

        std::fs::write(path, buf)
    }

    /// Ensure a config file exists; if missing, write one with the default theme and return it.
    /// If present, load from it; on read errors, return `mocha`.
    pub fn load_or_init(path: &str) -> Self {
        let p = std::path::Path::new(path);
        if p.exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(path) {
            tracing::debug!(path, error = %e, "could not write default theme");
        }
        t
    }
}

/// Directory holding `theme.conf` and `keybinds.conf`.
///
/// `$XDG_CONFIG_HOME/student-records`, else `$HOME/.config/student-records`,
/// else the working directory. The directory is created on demand.
pub fn config_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")));
    match base {
        Some(base) => {
            let dir = base.join("student-records");
            if std::fs::create_dir_all(&dir).is_ok() {
                dir
            } else {
                PathBuf::from(".")
            }
        }
        None => PathBuf::from("."),
    }
}

/// Default path of a named config file inside [`config_dir`].
pub fn config_path(file_name: &str) -> String {
    config_dir().join(file_name).to_string_lossy().into_owned()
}

/// Name of the user running the program, for the header.
pub fn current_username() -> Option<String> {
    users::get_current_username().map(|name| name.to_string_lossy().into_owned())
}

/// What an id prompt is asked for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IdPurpose {
    Search,
    Update,
    Delete,
}

impl IdPurpose {
    pub fn title(&self) -> &'static str {
        match self {
            IdPurpose::Search => "Search student",
            IdPurpose::Update => "Update student",
            IdPurpose::Delete => "Delete student",
        }
    }
}

/// Whether a student form adds a new record or edits an existing one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormPurpose {
    /// Entry `index` (0-based) of a batch of `total`.
    Add { index: usize, total: usize },
    Update { target_id: u32 },
}

/// Editable fields of a student: name, id, then one per subject.
#[derive(Clone, Debug, PartialEq)]
pub struct StudentForm {
    pub purpose: FormPurpose,
    pub selected: usize,
    pub name: String,
    pub id: String,
    pub grades: [String; SUBJECT_COUNT],
    pub error: Option<String>,
}

impl StudentForm {
    pub const NAME_FIELD: usize = 0;
    pub const ID_FIELD: usize = 1;
    pub const FIELD_COUNT: usize = 2 + SUBJECT_COUNT;

    pub fn for_add(index: usize, total: usize) -> Self {
        Self {
            purpose: FormPurpose::Add { index, total },
            selected: Self::NAME_FIELD,
            name: String::new(),
            id: String::new(),
            grades: Default::default(),
            error: None,
        }
    }

    /// Form prefilled with the current values of `record`.
    pub fn for_update(record: &StudentRecord) -> Self {
        Self {
            purpose: FormPurpose::Update {
                target_id: record.id(),
            },
            selected: Self::NAME_FIELD,
            name: record.name().to_string(),
            id: record.id().to_string(),
            grades: (*record.grades()).map(|g| g.to_string()),
            error: None,
        }
    }

    pub fn label(field: usize) -> String {
        match field {
            Self::NAME_FIELD => "Name".to_string(),
            Self::ID_FIELD => "ID".to_string(),
            n => format!("Grade {}", n - 1),
        }
    }

    pub fn value(&self, field: usize) -> &str {
        match field {
            Self::NAME_FIELD => &self.name,
            Self::ID_FIELD => &self.id,
            n => &self.grades[n - 2],
        }
    }

    pub fn selected_value_mut(&mut self) -> &mut String {
        match self.selected {
            Self::NAME_FIELD => &mut self.name,
            Self::ID_FIELD => &mut self.id,
            n => &mut self.grades[n - 2],
        }
    }

    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % Self::FIELD_COUNT;
    }

    pub fn prev_field(&mut self) {
        self.selected = (self.selected + Self::FIELD_COUNT - 1) % Self::FIELD_COUNT;
    }

    /// Accept a typed character if it can belong to the selected field.
    pub fn push_char(&mut self, c: char) {
        let accepted = match self.selected {
            Self::NAME_FIELD => !c.is_control(),
            Self::ID_FIELD => c.is_ascii_digit(),
            _ => c.is_ascii_digit() || c == '.' || c == '-',
        };
        if accepted {
            self.selected_value_mut().push(c);
        }
    }

    /// Parse all fields; on failure returns the offending field and a message.
    pub fn parse(&self) -> Result<(String, u32, Grades), (usize, String)> {
        let name = self.name.trim();
        let id = self
            .id
            .trim()
            .parse::<u32>()
            .map_err(|_| (Self::ID_FIELD, format!("Invalid ID: '{}'", self.id)))?;
        let mut grades = [0.0; SUBJECT_COUNT];
        for (j, (slot, raw)) in grades.iter_mut().zip(self.grades.iter()).enumerate() {
            *slot = raw.trim().parse::<f32>().map_err(|_| {
                (
                    j + 2,
                    format!("Invalid grade for subject {}: '{}'", j + 1, raw),
                )
            })?;
        }
        Ok((name.to_string(), id, grades))
    }
}

/// Modal dialog states.
#[derive(Clone, Debug, PartialEq)]
pub enum ModalState {
    /// How many students to add.
    CountInput { value: String, error: Option<String> },
    StudentForm(StudentForm),
    IdInput {
        purpose: IdPurpose,
        value: String,
        error: Option<String>,
    },
    /// `selected`: 0 = delete, 1 = cancel.
    DeleteConfirm { id: u32, selected: usize },
    Info { title: String, message: String },
    /// Averages and statuses computed after adding students.
    Report { lines: Vec<String> },
}

pub struct AppState {
    pub store: StudentStore,
    /// Records currently shown in the table (store order, search filter applied).
    pub students: Vec<StudentRecord>,
    pub selected_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub search_query: String,
    pub theme: Theme,
    pub keymap: Keymap,
    pub modal: Option<ModalState>,
    pub status_message: Option<String>,
    pub operator: String,
    pub should_quit: bool,
    /// Set when the store reports an unrecoverable condition.
    pub fatal_error: Option<String>,
}

impl AppState {
    pub fn new(store: StudentStore, theme: Theme, keymap: Keymap) -> Self {
        let mut app = Self {
            store,
            students: Vec::new(),
            selected_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            search_query: String::new(),
            theme,
            keymap,
            modal: None,
            status_message: None,
            operator: current_username().unwrap_or_else(|| "unknown".to_string()),
            should_quit: false,
            fatal_error: None,
        };
        crate::search::apply_search(&mut app);
        app
    }

    pub fn selected_student(&self) -> Option<&StudentRecord> {
        self.students.get(self.selected_index)
    }

    pub fn open_modal(&mut self, modal: ModalState) {
        self.modal = Some(modal);
        self.input_mode = InputMode::Modal;
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn info(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.open_modal(ModalState::Info {
            title: title.into(),
            message: message.into(),
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(StudentStore::new(), Theme::mocha(), Keymap::default())
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
