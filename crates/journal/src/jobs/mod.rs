mod archive_debtors;

pub use archive_debtors::{ArchiveDebtorsJob, BatchSummary};
