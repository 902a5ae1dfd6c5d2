use rust_decimal::Decimal;

use crate::commands::{ArchiveStudentCommand, ArchiveStudentPayload};
use crate::config::PointsConfig;
use crate::error::Result;
use crate::models::calculate_total_points;
use crate::store::JournalStore;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub archived: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Nightly pass over every student in debt: archives those whose total
/// at the frozen rate now clears the bar, skips the rest. One student's
/// failure never aborts the run.
pub struct ArchiveDebtorsJob<'a, S> {
    store: &'a S,
    config: &'a PointsConfig,
}

impl<'a, S: JournalStore> ArchiveDebtorsJob<'a, S> {
    pub fn new(store: &'a S, config: &'a PointsConfig) -> Self {
        Self { store, config }
    }

    pub async fn run(&self) -> Result<BatchSummary> {
        let debtors = self.store.debtors().await?;
        let mut summary = BatchSummary {
            total: debtors.len(),
            ..BatchSummary::default()
        };
        tracing::info!(total = summary.total, "starting debtor archiving run");

        let command = ArchiveStudentCommand::new(self.store, self.config);
        for ledger in &debtors {
            let total = calculate_total_points(
                ledger.visits,
                ledger.archived_visit_value,
                ledger.activity_points,
                ledger.standards_points,
            );
            if total < Decimal::from(self.config.required_points_amount) {
                summary.skipped += 1;
                continue;
            }

            let result = command
                .execute(ArchiveStudentPayload {
                    student_guid: ledger.student_guid,
                    teacher_guid: None,
                    is_privileged: true,
                })
                .await;

            match result {
                Ok(_) => {
                    tracing::debug!(student = %ledger.student_guid, "archived debtor");
                    summary.archived += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        student = %ledger.student_guid,
                        %error,
                        "failed to archive debtor"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            total = summary.total,
            archived = summary.archived,
            skipped = summary.skipped,
            failed = summary.failed,
            "debtor archiving run finished"
        );
        Ok(summary)
    }
}
