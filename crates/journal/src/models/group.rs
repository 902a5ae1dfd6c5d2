use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub group_number: String,
    /// Points one attended class is worth for students of this group.
    pub visit_value: Decimal,
    pub curator_guid: Option<Uuid>,
}
