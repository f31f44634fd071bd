// Integration tests for student-records

use std::io::Cursor;
use student_records::console::Console;
use student_records::store::{Status, StudentStore};

fn run_console(store: &mut StudentStore, script: &str) -> String {
    let mut console = Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
    console.run(store).expect("console run");
    String::from_utf8(console.into_output()).expect("utf8 output")
}

// 1) Full menu session: add, display, search, update, delete, exit
#[test]
fn console_session_covers_every_command() {
    let mut store = StudentStore::new();
    let script = "\
1
2
alice
1
50
50
50
50
50
bob
2
0
0
0
0
0
2
3
2
4
2
bobby
3
60
60
60
60
60
5
1
3
1
6
";
    let out = run_console(&mut store, script);

    assert!(out.contains("The information of student 1:\nName: alice\nID: 1\nGrades: 50.0 50.0 50.0 50.0 50.0"));
    assert!(out.contains("The average for student 1 alice is: 50.0"));
    assert!(out.contains("The average for student 2 bob is: 0.0"));
    assert!(out.contains("The status of student 1 (alice) is: Pass"));
    assert!(out.contains("The status of student 2 (bob) is: Fail"));
    assert!(out.contains("Student 2:\nName: bob\nID: 2\nGrades: 0.0 0.0 0.0 0.0 0.0\nAverage: 0.00\nStatus: Fail"));
    assert!(out.contains("Updating information for student ID 2"));
    assert!(out.contains("Student information updated successfully."));
    assert!(out.contains("Student with ID 1 deleted successfully."));
    assert!(out.contains("Student with ID 1 not found."));

    assert_eq!(store.len(), 1);
    let only = &store.records()[0];
    assert_eq!(only.id(), 3);
    assert_eq!(only.name(), "bobby");
    assert_eq!(only.average(), 60.0);
    assert_eq!(only.status(), Status::Pass);
}

// 2) Duplicate ids are re-prompted during add and update
#[test]
fn console_reprompts_taken_ids() {
    let mut store = StudentStore::new();
    let script = "\
1
2
a
5
1
1
1
1
1
b
5
6
2
2
2
2
2
4
6
x
5
7
9
9
9
9
9
6
";
    let out = run_console(&mut store, script);
    assert_eq!(
        out.matches("ID 5 is already taken. Please enter a different ID.").count(),
        2
    );
    let ids: Vec<u32> = store.records().iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![5, 7]);
    assert_eq!(store.records()[1].name(), "x");
}

// 3) Empty store and unknown ids are reported without state change
#[test]
fn console_reports_empty_store_and_unknown_ids() {
    let mut store = StudentStore::new();
    let out = run_console(&mut store, "2\n3\n4\n4\n4\n5\n4\n0\n6\n");
    assert!(out.contains("There are no students to display."));
    assert!(out.contains("Student with ID 4 not found."));
    assert!(out.contains("Invalid option. Please try again."));
    assert!(!out.contains("Updating information"));
    assert!(store.is_empty());
}

// 4) Adding students appends to the existing store
#[test]
fn console_add_appends_to_existing_records() {
    let mut store = StudentStore::new();
    run_console(&mut store, "1\n1\nfirst\n1\n10\n10\n10\n10\n10\n6\n");
    let out = run_console(&mut store, "1\n1\nsecond\n2\n90\n90\n90\n90\n90\n6\n");
    assert!(out.contains("The average for student 1 first is: 10.0"));
    assert!(out.contains("The status of student 2 (second) is: Pass"));
    assert_eq!(store.len(), 2);
}

// 5) Input that is not UTF-8 is rejected like any other bad answer
#[test]
fn console_rejects_garbled_input_and_continues() {
    let mut store = StudentStore::new();
    let script: &[u8] = b"\xff\xfe\n2\n1\n\xff\n0\n6\n";
    let mut console = Console::new(Cursor::new(script.to_vec()), Vec::new());
    console.run(&mut store).expect("garbled line is not fatal");
    let out = String::from_utf8(console.into_output()).expect("utf8 output");

    assert!(out.contains("Invalid option. Please try again."));
    assert!(out.contains("There are no students to display."));
    assert!(out.contains("Please enter a valid number."));
    assert!(store.is_empty());
}

// 6) A full store ends the session with an error
#[test]
fn console_stops_when_store_is_full() {
    use student_records::store::{MAX_STUDENTS, StudentRecord};

    let mut store = StudentStore::new();
    for id in 0..MAX_STUDENTS as u32 {
        store
            .insert(StudentRecord::new("filler", id, [50.0; 5]))
            .unwrap();
    }
    let mut console = Console::new(Cursor::new(b"1\n1\n".to_vec()), Vec::new());
    let err = console.run(&mut store).unwrap_err();
    assert!(err.to_string().contains("out of storage"));
    assert_eq!(store.len(), MAX_STUDENTS);

    let out = String::from_utf8(console.into_output()).expect("utf8 output");
    assert!(!out.contains("Please enter the name of student 1"));
}

// 7) Theme and keybinding config roundtrip and init
#[test]
fn config_roundtrip_and_init() {
    use std::{
        fs,
        time::{SystemTime, UNIX_EPOCH},
    };
    use student_records::app::Theme;
    use student_records::app::keymap::{KeyAction, Keymap};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir();
    let theme_path = dir
        .join(format!("sr_theme_{}_{}.conf", std::process::id(), nonce))
        .to_string_lossy()
        .to_string();
    let keys_path = dir
        .join(format!("sr_keys_{}_{}.conf", std::process::id(), nonce))
        .to_string_lossy()
        .to_string();

    let t = Theme::mocha();
    t.write_file(&theme_path).expect("write theme");
    let t2 = Theme::from_file(&theme_path).expect("read theme");
    assert_eq!(t.title, t2.title);
    assert_eq!(t.pass, t2.pass);
    assert_eq!(t.fail, t2.fail);

    let _ = fs::remove_file(&keys_path);
    let km = Keymap::load_or_init(&keys_path);
    assert!(std::path::Path::new(&keys_path).exists());
    let reloaded = Keymap::from_file(&keys_path).expect("read keymap");
    let one = KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE);
    assert_eq!(km.resolve(&one), Some(KeyAction::AddStudents));
    assert_eq!(reloaded.resolve(&one), Some(KeyAction::AddStudents));

    let _ = fs::remove_file(&theme_path);
    let _ = fs::remove_file(&keys_path);
}
