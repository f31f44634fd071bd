//! In-memory student record store.
//!
//! [`StudentStore`] owns the ordered list of [`StudentRecord`]s and is the
//! only place that grows or shrinks it. Ids are unique across the store at
//! all times, and a record's average and status are derived from its grades
//! whenever the record is built or its grades change.
//!
use std::fmt::{Display, Formatter};

use tracing::{debug, warn};

use crate::error::DynError;

/// Number of subject grades per student.
pub const SUBJECT_COUNT: usize = 5;
/// Longest accepted name, in characters. Longer names are truncated.
pub const NAME_MAX_LEN: usize = 49;
/// Inclusive lower bound of a passing average.
pub const PASS_THRESHOLD: f32 = 50.0;
/// Upper bound on stored records.
pub const MAX_STUDENTS: usize = 255;

pub type Grades = [f32; SUBJECT_COUNT];

/// Pass/fail outcome derived from a student's average.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn from_average(average: f32) -> Self {
        if average >= PASS_THRESHOLD {
            Status::Pass
        } else {
            Status::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "Pass",
            Status::Fail => "Fail",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student's data. Derived fields are read-only from outside the store.
#[derive(Clone, Debug, PartialEq)]
pub struct StudentRecord {
    name: String,
    id: u32,
    grades: Grades,
    average: f32,
    status: Status,
}

impl StudentRecord {
    /// Build a record with its average and status already derived.
    pub fn new(name: impl Into<String>, id: u32, grades: Grades) -> Self {
        let average = average_of(&grades);
        Self {
            name: truncate_name(name.into()),
            id,
            grades,
            average,
            status: Status::from_average(average),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn grades(&self) -> &Grades {
        &self.grades
    }

    pub fn average(&self) -> f32 {
        self.average
    }

    pub fn status(&self) -> Status {
        self.status
    }

    fn refresh(&mut self) {
        self.average = average_of(&self.grades);
        self.status = Status::from_average(self.average);
    }
}

/// Arithmetic mean of the subject grades.
pub fn average_of(grades: &Grades) -> f32 {
    grades.iter().sum::<f32>() / SUBJECT_COUNT as f32
}

/// Grades rendered with one decimal, space separated.
pub fn format_grades(grades: &Grades) -> String {
    grades
        .iter()
        .map(|g| format!("{g:.1}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_name(name: String) -> String {
    if name.chars().count() <= NAME_MAX_LEN {
        name
    } else {
        name.chars().take(NAME_MAX_LEN).collect()
    }
}

/// Per-record line of a compute pass, in store order.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// 0-based position in the store.
    pub position: usize,
    pub name: String,
    pub id: u32,
    pub average: f32,
    pub status: Status,
}

/// Aggregate figures over the whole store.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClassStats {
    pub count: usize,
    pub class_average: Option<f32>,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub enum StoreError {
    /// The id is already held by another record.
    DuplicateId(u32),
    /// No record carries the queried id.
    NotFound(u32),
    /// The operation needs at least one record.
    EmptyStore,
    /// Backing storage cannot grow any further.
    ResourceExhaustion(String),
    /// The record source failed while supplying a field.
    Input(DynError),
}

impl StoreError {
    /// Only resource exhaustion ends the program; everything else is reported and retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::ResourceExhaustion(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateId(id) => write!(f, "ID {id} is already taken"),
            StoreError::NotFound(id) => write!(f, "Student with ID {id} not found"),
            StoreError::EmptyStore => write!(f, "There are no students to display"),
            StoreError::ResourceExhaustion(reason) => write!(f, "out of storage: {reason}"),
            StoreError::Input(e) => write!(f, "input failed: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Input(e) => Some(&**e),
            _ => None,
        }
    }
}

/// Field-by-field supplier of new records for [`StudentStore::insert_many`].
///
/// `index` is the 0-based position within the batch being inserted.
pub trait RecordSource {
    fn name(&mut self, index: usize) -> crate::error::Result<String>;
    fn id(&mut self, index: usize) -> crate::error::Result<u32>;
    /// Called when the id just supplied is taken; `id` is asked for again afterwards.
    fn id_rejected(&mut self, _index: usize, _id: u32) -> crate::error::Result<()> {
        Ok(())
    }
    fn grades(&mut self, index: usize) -> crate::error::Result<Grades>;
}

/// Ordered collection of student records.
#[derive(Clone, Debug, Default)]
pub struct StudentStore {
    records: Vec<StudentRecord>,
}

impl StudentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in store order; empty slice when nothing is stored.
    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn id_exists(&self, id: u32) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    fn position(&self, id: u32) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn ensure_room(&mut self) -> Result<(), StoreError> {
        if self.records.len() >= MAX_STUDENTS {
            warn!(limit = MAX_STUDENTS, "student store is full");
            return Err(StoreError::ResourceExhaustion(format!(
                "the store holds at most {MAX_STUDENTS} students"
            )));
        }
        self.records.try_reserve(1).map_err(|e| {
            warn!(error = %e, "failed to grow student store");
            StoreError::ResourceExhaustion(e.to_string())
        })
    }

    /// Append one record after checking its id against the whole store.
    pub fn insert(&mut self, record: StudentRecord) -> Result<&StudentRecord, StoreError> {
        if self.id_exists(record.id) {
            debug!(id = record.id, "rejected duplicate student id");
            return Err(StoreError::DuplicateId(record.id));
        }
        self.ensure_room()?;
        debug!(id = record.id, name = %record.name, "inserted student");
        self.records.push(record);
        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    /// Insert `count` records pulled from `source`.
    ///
    /// A taken id is reported back through [`RecordSource::id_rejected`] and
    /// asked for again until the source offers a free one. Each record is
    /// stored before the next is requested, so ids are also unique within the
    /// batch. On error the records inserted so far stay in the store.
    pub fn insert_many<S>(
        &mut self,
        count: usize,
        source: &mut S,
    ) -> Result<Vec<StudentRecord>, StoreError>
    where
        S: RecordSource + ?Sized,
    {
        let mut inserted = Vec::new();
        for index in 0..count {
            // Fail before the user types a record that cannot be kept.
            self.ensure_room()?;
            let name = source.name(index).map_err(StoreError::Input)?;
            let id = loop {
                let candidate = source.id(index).map_err(StoreError::Input)?;
                if !self.id_exists(candidate) {
                    break candidate;
                }
                debug!(id = candidate, "rejected duplicate student id");
                source
                    .id_rejected(index, candidate)
                    .map_err(StoreError::Input)?;
            };
            let grades = source.grades(index).map_err(StoreError::Input)?;
            let record = self.insert(StudentRecord::new(name, id, grades))?.clone();
            inserted.push(record);
        }
        Ok(inserted)
    }

    fn summaries(&self) -> Vec<Summary> {
        self.records
            .iter()
            .enumerate()
            .map(|(position, r)| Summary {
                position,
                name: r.name.clone(),
                id: r.id,
                average: r.average,
                status: r.status,
            })
            .collect()
    }

    /// Recompute every average from its grades.
    pub fn compute_averages(&mut self) -> Result<Vec<Summary>, StoreError> {
        if self.records.is_empty() {
            return Err(StoreError::EmptyStore);
        }
        for record in &mut self.records {
            record.average = average_of(&record.grades);
        }
        Ok(self.summaries())
    }

    /// Recompute every status from its current average.
    pub fn compute_statuses(&mut self) -> Result<Vec<Summary>, StoreError> {
        if self.records.is_empty() {
            return Err(StoreError::EmptyStore);
        }
        for record in &mut self.records {
            record.status = Status::from_average(record.average);
        }
        Ok(self.summaries())
    }

    /// All records for display, or [`StoreError::EmptyStore`].
    pub fn list_all(&self) -> Result<&[StudentRecord], StoreError> {
        if self.records.is_empty() {
            Err(StoreError::EmptyStore)
        } else {
            Ok(&self.records)
        }
    }

    /// Position and record carrying `id`.
    pub fn find_by_id(&self, id: u32) -> Result<(usize, &StudentRecord), StoreError> {
        self.records
            .iter()
            .enumerate()
            .find(|(_, r)| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Overwrite name, id and grades of the record carrying `id`.
    ///
    /// `new_id` may equal `id`; if it belongs to any other record the update
    /// is rejected and nothing changes.
    pub fn update_by_id(
        &mut self,
        id: u32,
        new_name: impl Into<String>,
        new_id: u32,
        new_grades: Grades,
    ) -> Result<&StudentRecord, StoreError> {
        let idx = self.position(id).ok_or(StoreError::NotFound(id))?;
        if new_id != id && self.id_exists(new_id) {
            debug!(id, new_id, "rejected update to a taken student id");
            return Err(StoreError::DuplicateId(new_id));
        }
        let record = &mut self.records[idx];
        record.name = truncate_name(new_name.into());
        record.id = new_id;
        record.grades = new_grades;
        record.refresh();
        debug!(old_id = id, new_id, "updated student");
        Ok(&self.records[idx])
    }

    /// Remove the record carrying `id`; later records move one slot forward.
    pub fn delete_by_id(&mut self, id: u32) -> Result<StudentRecord, StoreError> {
        let idx = self.position(id).ok_or(StoreError::NotFound(id))?;
        let removed = self.records.remove(idx);
        self.records.shrink_to_fit();
        debug!(id, remaining = self.records.len(), "deleted student");
        Ok(removed)
    }

    pub fn stats(&self) -> ClassStats {
        let count = self.records.len();
        let passed = self
            .records
            .iter()
            .filter(|r| r.status == Status::Pass)
            .count();
        let class_average = if count == 0 {
            None
        } else {
            Some(self.records.iter().map(|r| r.average).sum::<f32>() / count as f32)
        };
        ClassStats {
            count,
            class_average,
            passed,
            failed: count - passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::simple_error;
    use std::collections::VecDeque;

    fn rec(name: &str, id: u32, g: f32) -> StudentRecord {
        StudentRecord::new(name, id, [g; SUBJECT_COUNT])
    }

    fn ids(store: &StudentStore) -> Vec<u32> {
        store.records().iter().map(|r| r.id()).collect()
    }

    /// Feeds queued answers and records which ids were rejected.
    struct Scripted {
        names: VecDeque<&'static str>,
        ids: VecDeque<u32>,
        grades: VecDeque<Grades>,
        rejected: Vec<u32>,
    }

    impl RecordSource for Scripted {
        fn name(&mut self, _index: usize) -> crate::error::Result<String> {
            self.names
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| simple_error("no name left"))
        }

        fn id(&mut self, _index: usize) -> crate::error::Result<u32> {
            self.ids.pop_front().ok_or_else(|| simple_error("no id left"))
        }

        fn id_rejected(&mut self, _index: usize, id: u32) -> crate::error::Result<()> {
            self.rejected.push(id);
            Ok(())
        }

        fn grades(&mut self, _index: usize) -> crate::error::Result<Grades> {
            self.grades
                .pop_front()
                .ok_or_else(|| simple_error("no grades left"))
        }
    }

    #[test]
    fn average_is_plain_mean_of_five() {
        let r = StudentRecord::new("amy", 1, [40.0, 60.0, 50.0, 70.0, 80.0]);
        assert_eq!(r.average(), 60.0);
        assert_eq!(r.status(), Status::Pass);
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        assert_eq!(Status::from_average(49.9), Status::Fail);
        assert_eq!(Status::from_average(50.0), Status::Pass);
    }

    #[test]
    fn long_names_are_truncated_on_char_boundary() {
        let long = "é".repeat(NAME_MAX_LEN + 10);
        let r = StudentRecord::new(long, 1, [0.0; SUBJECT_COUNT]);
        assert_eq!(r.name().chars().count(), NAME_MAX_LEN);
    }

    #[test]
    fn insert_rejects_taken_id() {
        let mut store = StudentStore::new();
        store.insert(rec("a", 1, 10.0)).unwrap();
        let err = store.insert(rec("b", 1, 90.0)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(1)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].name(), "a");
    }

    #[test]
    fn insert_many_retries_duplicates_within_batch_and_store() {
        let mut store = StudentStore::new();
        store.insert(rec("old", 7, 55.0)).unwrap();
        let mut source = Scripted {
            names: VecDeque::from(["a", "b"]),
            ids: VecDeque::from([7, 1, 1, 7, 2]),
            grades: VecDeque::from([[60.0; 5], [20.0; 5]]),
            rejected: Vec::new(),
        };
        let inserted = store.insert_many(2, &mut source).unwrap();
        assert_eq!(inserted.len(), 2);
        assert_eq!(source.rejected, vec![7, 1, 7]);
        assert_eq!(ids(&store), vec![7, 1, 2]);
    }

    #[test]
    fn insert_many_keeps_earlier_records_when_source_fails() {
        let mut store = StudentStore::new();
        let mut source = Scripted {
            names: VecDeque::from(["a", "b"]),
            ids: VecDeque::from([1]),
            grades: VecDeque::from([[60.0; 5]]),
            rejected: Vec::new(),
        };
        let err = store.insert_many(2, &mut source).unwrap_err();
        assert!(matches!(err, StoreError::Input(_)));
        assert!(!err.is_fatal());
        assert_eq!(ids(&store), vec![1]);
    }

    #[test]
    fn store_is_bounded() {
        let mut store = StudentStore::new();
        for id in 0..MAX_STUDENTS as u32 {
            store.insert(rec("s", id, 50.0)).unwrap();
        }
        let err = store.insert(rec("extra", 9999, 50.0)).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(store.len(), MAX_STUDENTS);
    }

    #[test]
    fn compute_passes_report_empty_store() {
        let mut store = StudentStore::new();
        assert!(matches!(store.compute_averages(), Err(StoreError::EmptyStore)));
        assert!(matches!(store.compute_statuses(), Err(StoreError::EmptyStore)));
        assert!(matches!(store.list_all(), Err(StoreError::EmptyStore)));
    }

    #[test]
    fn compute_averages_is_idempotent() {
        let mut store = StudentStore::new();
        store
            .insert(StudentRecord::new("a", 1, [33.0, 47.5, 12.25, 99.0, 61.0]))
            .unwrap();
        store.insert(rec("b", 2, 71.0)).unwrap();
        let first = store.compute_averages().unwrap();
        let second = store.compute_averages().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn update_recomputes_derived_fields() {
        let mut store = StudentStore::new();
        store.insert(rec("a", 1, 90.0)).unwrap();
        let updated = store.update_by_id(1, "a2", 5, [10.0; 5]).unwrap();
        assert_eq!(updated.id(), 5);
        assert_eq!(updated.average(), 10.0);
        assert_eq!(updated.status(), Status::Fail);
        assert!(matches!(store.find_by_id(1), Err(StoreError::NotFound(1))));
    }

    #[test]
    fn update_keeps_ids_unique() {
        let mut store = StudentStore::new();
        store.insert(rec("a", 1, 90.0)).unwrap();
        store.insert(rec("b", 2, 40.0)).unwrap();
        let err = store.update_by_id(1, "x", 2, [0.0; 5]).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(2)));
        assert_eq!(store.records()[0], rec("a", 1, 90.0));

        // Keeping its own id is fine.
        store.update_by_id(2, "b2", 2, [80.0; 5]).unwrap();
        assert_eq!(store.records()[1].name(), "b2");
    }

    #[test]
    fn delete_compacts_and_preserves_order() {
        let mut store = StudentStore::new();
        for (name, id) in [("A", 1), ("B", 2), ("C", 3)] {
            store.insert(rec(name, id, 50.0)).unwrap();
        }
        let removed = store.delete_by_id(2).unwrap();
        assert_eq!(removed.name(), "B");
        assert_eq!(ids(&store), vec![1, 3]);
        assert!(matches!(store.find_by_id(2), Err(StoreError::NotFound(2))));
    }

    #[test]
    fn unknown_id_leaves_store_untouched() {
        let mut store = StudentStore::new();
        store.insert(rec("a", 1, 50.0)).unwrap();
        let before = store.records().to_vec();
        assert!(matches!(store.find_by_id(9), Err(StoreError::NotFound(9))));
        assert!(matches!(
            store.update_by_id(9, "x", 9, [1.0; 5]),
            Err(StoreError::NotFound(9))
        ));
        assert!(matches!(store.delete_by_id(9), Err(StoreError::NotFound(9))));
        assert_eq!(store.records(), before.as_slice());
    }

    #[test]
    fn stats_count_pass_and_fail() {
        let mut store = StudentStore::new();
        assert_eq!(store.stats().class_average, None);
        store.insert(rec("a", 1, 80.0)).unwrap();
        store.insert(rec("b", 2, 20.0)).unwrap();
        let stats = store.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.class_average, Some(50.0));
    }

    /// Offers one taken id, then cannot report the rejection.
    struct BrokenNotice;

    impl RecordSource for BrokenNotice {
        fn name(&mut self, _index: usize) -> crate::error::Result<String> {
            Ok("b".to_string())
        }

        fn id(&mut self, _index: usize) -> crate::error::Result<u32> {
            Ok(1)
        }

        fn id_rejected(&mut self, _index: usize, _id: u32) -> crate::error::Result<()> {
            Err(simple_error("output closed"))
        }

        fn grades(&mut self, _index: usize) -> crate::error::Result<Grades> {
            Ok([1.0; SUBJECT_COUNT])
        }
    }

    #[test]
    fn failed_rejection_notice_stops_the_batch() {
        let mut store = StudentStore::new();
        store.insert(rec("a", 1, 80.0)).unwrap();
        let err = store.insert_many(1, &mut BrokenNotice).unwrap_err();
        assert!(matches!(err, StoreError::Input(_)));
        assert!(!err.is_fatal());
        assert_eq!(ids(&store), vec![1]);
    }
}
