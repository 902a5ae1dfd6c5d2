//! In-memory store backing the command and job tests. Mirrors the
//! Postgres implementation's atomicity: every mutation checks the
//! ledger version under one lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::capability::{CapabilitySet, TeacherDirectory};
use crate::error::{JournalError, Result};
use crate::models::{
    ActivityRecord, ArchivedStudent, Group, NewActivity, NewStandard, NewVisit, Semester,
    StandardRecord, StandardType, StudentLedger, VisitRecord, WorkType,
};

use super::JournalStore;

#[derive(Default)]
struct Inner {
    students: HashMap<Uuid, StudentLedger>,
    groups: HashMap<String, Group>,
    teachers: HashMap<Uuid, CapabilitySet>,
    active_semester: Option<String>,
    visits: BTreeMap<i64, VisitRecord>,
    activities: BTreeMap<i64, ActivityRecord>,
    standards: BTreeMap<i64, StandardRecord>,
    archived: Vec<ArchivedStudent>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Applies `ledger`'s accumulator values if its version still
    /// matches the stored one, bumping the stamp.
    fn store_ledger(&mut self, ledger: &StudentLedger) -> Result<()> {
        let stored = self
            .students
            .get_mut(&ledger.student_guid)
            .ok_or(JournalError::StudentNotFound(ledger.student_guid))?;

        if stored.version != ledger.version {
            return Err(JournalError::ConcurrencyConflict(ledger.student_guid));
        }

        *stored = StudentLedger {
            version: ledger.version + 1,
            ..ledger.clone()
        };
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryJournalStore {
    inner: Mutex<Inner>,
}

impl MemoryJournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_group(&self, group: Group) {
        self.lock().groups.insert(group.group_number.clone(), group);
    }

    pub fn insert_student(&self, ledger: StudentLedger) {
        self.lock().students.insert(ledger.student_guid, ledger);
    }

    pub fn insert_teacher(&self, teacher_guid: Uuid, capabilities: CapabilitySet) {
        self.lock().teachers.insert(teacher_guid, capabilities);
    }

    pub fn archived_snapshots(&self) -> Vec<ArchivedStudent> {
        self.lock().archived.clone()
    }
}

#[async_trait]
impl JournalStore for MemoryJournalStore {
    async fn student(&self, guid: Uuid) -> Result<Option<StudentLedger>> {
        Ok(self.lock().students.get(&guid).cloned())
    }

    async fn group(&self, group_number: &str) -> Result<Option<Group>> {
        Ok(self.lock().groups.get(group_number).cloned())
    }

    async fn active_semester_name(&self) -> Result<String> {
        self.lock()
            .active_semester
            .clone()
            .ok_or(JournalError::NoActiveSemester)
    }

    async fn start_new_semester(&self, name: &str) -> Result<()> {
        Semester::order_key(name)?;
        self.lock().active_semester = Some(name.to_string());
        Ok(())
    }

    async fn visit_exists(&self, student_guid: Uuid, date: NaiveDate) -> Result<bool> {
        Ok(self
            .lock()
            .visits
            .values()
            .any(|v| v.student_guid == student_guid && v.date == date))
    }

    async fn activity_exists(
        &self,
        student_guid: Uuid,
        work_type: WorkType,
        semester_name: &str,
    ) -> Result<bool> {
        Ok(self.lock().activities.values().any(|a| {
            a.student_guid == student_guid
                && a.work_type == work_type
                && a.semester_name == semester_name
        }))
    }

    async fn standard_exists(
        &self,
        student_guid: Uuid,
        standard_type: StandardType,
    ) -> Result<bool> {
        Ok(self
            .lock()
            .standards
            .values()
            .any(|s| s.student_guid == student_guid && s.standard_type == standard_type))
    }

    async fn visit(&self, id: i64) -> Result<Option<VisitRecord>> {
        Ok(self.lock().visits.get(&id).cloned())
    }

    async fn activity(&self, id: i64) -> Result<Option<ActivityRecord>> {
        Ok(self.lock().activities.get(&id).cloned())
    }

    async fn standard(&self, id: i64) -> Result<Option<StandardRecord>> {
        Ok(self.lock().standards.get(&id).cloned())
    }

    async fn list_visits(&self, student_guid: Uuid) -> Result<Vec<VisitRecord>> {
        Ok(self
            .lock()
            .visits
            .values()
            .filter(|v| v.student_guid == student_guid)
            .cloned()
            .collect())
    }

    async fn list_activities(&self, student_guid: Uuid) -> Result<Vec<ActivityRecord>> {
        Ok(self
            .lock()
            .activities
            .values()
            .filter(|a| a.student_guid == student_guid)
            .cloned()
            .collect())
    }

    async fn list_standards(&self, student_guid: Uuid) -> Result<Vec<StandardRecord>> {
        Ok(self
            .lock()
            .standards
            .values()
            .filter(|s| s.student_guid == student_guid)
            .cloned()
            .collect())
    }

    async fn commit_visit(&self, ledger: &StudentLedger, record: NewVisit) -> Result<i64> {
        let mut inner = self.lock();
        inner.store_ledger(ledger)?;
        let id = inner.next_id();
        inner.visits.insert(
            id,
            VisitRecord {
                id,
                student_guid: record.student_guid,
                teacher_guid: record.teacher_guid,
                date: record.date,
            },
        );
        Ok(id)
    }

    async fn commit_activity(&self, ledger: &StudentLedger, record: NewActivity) -> Result<i64> {
        let mut inner = self.lock();
        inner.store_ledger(ledger)?;
        let id = inner.next_id();
        inner.activities.insert(
            id,
            ActivityRecord {
                id,
                student_guid: record.student_guid,
                teacher_guid: record.teacher_guid,
                date: record.date,
                points: record.points,
                work_type: record.work_type,
                semester_name: record.semester_name,
                comment: record.comment,
            },
        );
        Ok(id)
    }

    async fn commit_standard(&self, ledger: &StudentLedger, record: NewStandard) -> Result<i64> {
        let mut inner = self.lock();
        inner.store_ledger(ledger)?;
        let id = inner.next_id();
        inner.standards.insert(
            id,
            StandardRecord {
                id,
                student_guid: record.student_guid,
                teacher_guid: record.teacher_guid,
                date: record.date,
                points: record.points,
                standard_type: record.standard_type,
                semester_name: record.semester_name,
                comment: record.comment,
            },
        );
        Ok(id)
    }

    async fn remove_visit(&self, ledger: &StudentLedger, id: i64) -> Result<()> {
        let mut inner = self.lock();
        if !inner.visits.contains_key(&id) {
            return Err(JournalError::HistoryNotFound(id));
        }
        inner.store_ledger(ledger)?;
        inner.visits.remove(&id);
        Ok(())
    }

    async fn remove_activity(&self, ledger: &StudentLedger, id: i64) -> Result<()> {
        let mut inner = self.lock();
        if !inner.activities.contains_key(&id) {
            return Err(JournalError::HistoryNotFound(id));
        }
        inner.store_ledger(ledger)?;
        inner.activities.remove(&id);
        Ok(())
    }

    async fn remove_standard(&self, ledger: &StudentLedger, id: i64) -> Result<()> {
        let mut inner = self.lock();
        if !inner.standards.contains_key(&id) {
            return Err(JournalError::HistoryNotFound(id));
        }
        inner.store_ledger(ledger)?;
        inner.standards.remove(&id);
        Ok(())
    }

    async fn mark_debt(&self, ledger: &StudentLedger, frozen_visit_value: Decimal) -> Result<()> {
        let mut inner = self.lock();
        let updated = StudentLedger {
            has_debt: true,
            had_debt_in_semester: true,
            archived_visit_value: frozen_visit_value,
            ..ledger.clone()
        };
        inner.store_ledger(&updated)
    }

    async fn commit_archive(
        &self,
        ledger: &StudentLedger,
        snapshot: &ArchivedStudent,
        active_semester_name: &str,
        keep_had_debt_flag: bool,
    ) -> Result<()> {
        let mut inner = self.lock();

        let reset = StudentLedger {
            current_semester_name: active_semester_name.to_string(),
            visits: 0,
            activity_points: 0,
            standards_points: 0,
            has_debt: false,
            had_debt_in_semester: keep_had_debt_flag,
            archived_visit_value: Decimal::ZERO,
            ..ledger.clone()
        };
        inner.store_ledger(&reset)?;

        let guid = ledger.student_guid;
        inner.visits.retain(|_, v| v.student_guid != guid);
        inner.activities.retain(|_, a| a.student_guid != guid);
        inner.standards.retain(|_, s| s.student_guid != guid);
        inner.archived.push(snapshot.clone());
        Ok(())
    }

    async fn debtors(&self) -> Result<Vec<StudentLedger>> {
        Ok(self
            .lock()
            .students
            .values()
            .filter(|s| s.has_debt)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TeacherDirectory for MemoryJournalStore {
    async fn capabilities_of(&self, teacher_guid: Uuid) -> Result<Option<CapabilitySet>> {
        Ok(self.lock().teachers.get(&teacher_guid).copied())
    }
}
