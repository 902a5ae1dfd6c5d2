use uuid::Uuid;

use crate::config::PointsConfig;
use crate::error::{JournalError, Result};
use crate::models::{ArchivedActivity, ArchivedStandard, ArchivedStudent, ArchivedVisit};
use crate::store::JournalStore;

#[derive(Debug, Clone)]
pub struct ArchiveStudentPayload {
    pub student_guid: Uuid,
    /// Absent for unattended batch runs; when present and not
    /// privileged, the caller must be the student's group curator.
    pub teacher_guid: Option<Uuid>,
    pub is_privileged: bool,
}

/// Closes a student's semester: freezes the ledger and its history into
/// a snapshot and resets the live ledger for the active semester, or
/// declares debt if the total falls short of the required amount.
pub struct ArchiveStudentCommand<'a, S> {
    store: &'a S,
    config: &'a PointsConfig,
}

impl<'a, S: JournalStore> ArchiveStudentCommand<'a, S> {
    pub fn new(store: &'a S, config: &'a PointsConfig) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, payload: ArchiveStudentPayload) -> Result<ArchivedStudent> {
        let ledger = self
            .store
            .student(payload.student_guid)
            .await?
            .ok_or(JournalError::StudentNotFound(payload.student_guid))?;

        let group = self
            .store
            .group(&ledger.group_number)
            .await?
            .ok_or_else(|| JournalError::GroupNotFound(ledger.group_number.clone()))?;

        let active_semester = self.store.active_semester_name().await?;
        if ledger.current_semester_name == active_semester {
            return Err(JournalError::SameSemester(active_semester));
        }

        if let Some(teacher_guid) = payload.teacher_guid
            && !payload.is_privileged
            && group.curator_guid != Some(teacher_guid)
        {
            return Err(JournalError::NotCurator(ledger.group_number.clone()));
        }

        let visit_value = ledger.visit_value(group.visit_value);
        let total = ledger.total_points(group.visit_value);

        if total < self.config.required_points_amount.into() {
            // first shortfall declares debt and freezes the rate; a
            // repeat shortfall is a hard stop, no re-freeze
            if !ledger.has_debt {
                self.store.mark_debt(&ledger, group.visit_value).await?;
            }
            return Err(JournalError::NotEnoughPoints {
                student_guid: ledger.student_guid,
                total,
                required: self.config.required_points_amount,
            });
        }

        let visits = self.store.list_visits(ledger.student_guid).await?;
        let activities = self.store.list_activities(ledger.student_guid).await?;
        let standards = self.store.list_standards(ledger.student_guid).await?;

        let snapshot = ArchivedStudent {
            student_guid: ledger.student_guid,
            semester_name: ledger.current_semester_name.clone(),
            full_name: ledger.full_name.clone(),
            group_number: ledger.group_number.clone(),
            visits: visits.len() as i32,
            total_points: total,
            visit_history: visits
                .iter()
                .map(|v| ArchivedVisit {
                    teacher_guid: v.teacher_guid,
                    date: v.date,
                    points: visit_value,
                })
                .collect(),
            activity_history: activities
                .into_iter()
                .map(|a| ArchivedActivity {
                    teacher_guid: a.teacher_guid,
                    date: a.date,
                    points: a.points,
                    work_type: a.work_type,
                    comment: a.comment,
                })
                .collect(),
            standards_history: standards
                .into_iter()
                .map(|s| ArchivedStandard {
                    teacher_guid: s.teacher_guid,
                    date: s.date,
                    points: s.points,
                    standard_type: s.standard_type,
                    comment: s.comment,
                })
                .collect(),
        };

        // a student who just paid off a debt keeps the soft marker for
        // one more semester
        self.store
            .commit_archive(&ledger, &snapshot, &active_semester, ledger.has_debt)
            .await?;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;
    use crate::commands::testutil::{Fixture, PREV_SEMESTER, SEMESTER, fixture, today};
    use crate::commands::{AddVisitCommand, AddVisitPayload};
    use crate::models::StudentLedger;
    use crate::store::MemoryJournalStore;

    fn payload(f: &Fixture) -> ArchiveStudentPayload {
        ArchiveStudentPayload {
            student_guid: f.student_guid,
            teacher_guid: None,
            is_privileged: true,
        }
    }

    /// Moves the fixture student into the previous semester with the
    /// given accumulators, as if a new semester just started.
    async fn set_ledger(f: &Fixture, visits: i32, activity: i32, standards: i32) {
        let mut ledger = f.store.student(f.student_guid).await.unwrap().unwrap();
        ledger.current_semester_name = PREV_SEMESTER.into();
        ledger.visits = visits;
        ledger.activity_points = activity;
        ledger.standards_points = standards;
        f.store.insert_student(ledger);
    }

    #[tokio::test]
    async fn eligible_student_is_archived_and_reset() {
        let f = fixture().await;
        set_ledger(&f, 25, 3, 2).await; // ceil(25*2.0+3+2) = 55

        let snapshot = ArchiveStudentCommand::new(&f.store, &f.config)
            .execute(payload(&f))
            .await
            .unwrap();

        assert_eq!(snapshot.semester_name, PREV_SEMESTER);
        assert_eq!(snapshot.total_points, dec!(55));

        let ledger = f.store.student(f.student_guid).await.unwrap().unwrap();
        assert_eq!(ledger.visits, 0);
        assert_eq!(ledger.activity_points, 0);
        assert_eq!(ledger.standards_points, 0);
        assert!(!ledger.has_debt);
        assert!(!ledger.had_debt_in_semester);
        assert_eq!(ledger.current_semester_name, SEMESTER);

        let archived = f.store.archived_snapshots();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].student_guid, f.student_guid);
        assert_eq!(archived[0].semester_name, PREV_SEMESTER);
    }

    #[tokio::test]
    async fn snapshot_freezes_history_at_granted_values() {
        let f = fixture().await;
        // two graded visits in the closing semester
        let add = AddVisitCommand::new(&f.store, &f.config);
        for offset in [0, 1] {
            add.execute_at(
                AddVisitPayload {
                    student_guid: f.student_guid,
                    teacher_guid: f.teacher_guid,
                    date: today() - chrono::Duration::days(offset * 7),
                    is_privileged: false,
                },
                today(),
            )
            .await
            .unwrap();
        }
        let mut ledger = f.store.student(f.student_guid).await.unwrap().unwrap();
        ledger.current_semester_name = PREV_SEMESTER.into();
        ledger.activity_points = 48;
        f.store.insert_student(ledger);

        let snapshot = ArchiveStudentCommand::new(&f.store, &f.config)
            .execute(payload(&f))
            .await
            .unwrap();

        assert_eq!(snapshot.visits, 2);
        assert_eq!(snapshot.visit_history.len(), 2);
        assert!(snapshot.visit_history.iter().all(|v| v.points == dec!(2.0)));

        // the live history is gone
        assert!(f.store.list_visits(f.student_guid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_semester_has_nothing_to_archive() {
        let f = fixture().await;
        let err = ArchiveStudentCommand::new(&f.store, &f.config)
            .execute(payload(&f))
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::SameSemester(_)));
    }

    #[tokio::test]
    async fn non_curator_teacher_is_rejected() {
        let f = fixture().await;
        set_ledger(&f, 25, 3, 2).await;

        let cmd = ArchiveStudentCommand::new(&f.store, &f.config);
        let err = cmd
            .execute(ArchiveStudentPayload {
                student_guid: f.student_guid,
                teacher_guid: Some(f.teacher_guid),
                is_privileged: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::NotCurator(_)));

        // the curator themselves may archive
        cmd.execute(ArchiveStudentPayload {
            student_guid: f.student_guid,
            teacher_guid: Some(f.curator_guid),
            is_privileged: false,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn shortfall_declares_debt_and_freezes_rate() {
        let f = fixture().await;
        set_ledger(&f, 10, 3, 2).await; // ceil(10*2.0+3+2) = 25

        let err = ArchiveStudentCommand::new(&f.store, &f.config)
            .execute(payload(&f))
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::NotEnoughPoints { .. }));

        let ledger = f.store.student(f.student_guid).await.unwrap().unwrap();
        assert!(ledger.has_debt);
        assert!(ledger.had_debt_in_semester);
        assert_eq!(ledger.archived_visit_value, dec!(2.0));
        // ledger numbers survive; the student keeps working them off
        assert_eq!(ledger.visits, 10);
    }

    #[tokio::test]
    async fn second_shortfall_does_not_refreeze() {
        let f = fixture().await;
        set_ledger(&f, 10, 3, 2).await;
        let cmd = ArchiveStudentCommand::new(&f.store, &f.config);

        cmd.execute(payload(&f)).await.unwrap_err();
        let after_first = f.store.student(f.student_guid).await.unwrap().unwrap();

        // group rate changes while the student is in debt
        f.store.insert_group(crate::models::Group {
            group_number: "201".into(),
            visit_value: dec!(3.0),
            curator_guid: Some(f.curator_guid),
        });

        let err = cmd.execute(payload(&f)).await.unwrap_err();
        assert!(matches!(err, JournalError::NotEnoughPoints { .. }));

        let after_second = f.store.student(f.student_guid).await.unwrap().unwrap();
        assert_eq!(after_second.archived_visit_value, dec!(2.0));
        assert_eq!(after_second.version, after_first.version);
    }

    #[tokio::test]
    async fn paying_off_debt_keeps_the_soft_marker() {
        let f = fixture().await;
        let mut ledger = f.store.student(f.student_guid).await.unwrap().unwrap();
        ledger.current_semester_name = PREV_SEMESTER.into();
        ledger.visits = 25;
        ledger.has_debt = true;
        ledger.had_debt_in_semester = true;
        ledger.archived_visit_value = dec!(2.0);
        f.store.insert_student(ledger);

        ArchiveStudentCommand::new(&f.store, &f.config)
            .execute(payload(&f))
            .await
            .unwrap();

        let after = f.store.student(f.student_guid).await.unwrap().unwrap();
        assert!(!after.has_debt);
        assert!(after.had_debt_in_semester);
        assert_eq!(after.archived_visit_value, dec!(0));
    }

    #[tokio::test]
    async fn debt_total_uses_frozen_rate_not_group_rate() {
        let f = fixture().await;
        let mut ledger = f.store.student(f.student_guid).await.unwrap().unwrap();
        ledger.current_semester_name = PREV_SEMESTER.into();
        ledger.visits = 20; // 20 * frozen 2.5 = 50, eligible
        ledger.has_debt = true;
        ledger.had_debt_in_semester = true;
        ledger.archived_visit_value = dec!(2.5);
        f.store.insert_student(ledger);

        let snapshot = ArchiveStudentCommand::new(&f.store, &f.config)
            .execute(payload(&f))
            .await
            .unwrap();
        assert_eq!(snapshot.total_points, dec!(50));
    }

    #[tokio::test]
    async fn missing_semester_registry_propagates() {
        let f = fixture().await;
        let store = MemoryJournalStore::new();
        store.insert_group(crate::models::Group {
            group_number: "201".into(),
            visit_value: dec!(2.0),
            curator_guid: None,
        });
        let mut ledger: StudentLedger = f.store.student(f.student_guid).await.unwrap().unwrap();
        ledger.current_semester_name = PREV_SEMESTER.into();
        store.insert_student(ledger);

        let err = ArchiveStudentCommand::new(&store, &f.config)
            .execute(payload(&f))
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::NoActiveSemester));
    }
}
