use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::field::FieldType;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFieldPayload {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[validate(length(min = 1))]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub display_order: i32,
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFieldPayload {
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
    pub required: Option<bool>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldOrder {
    pub field_id: Uuid,
    pub order: i32,
}
