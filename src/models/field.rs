use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    ShortText,
    LongText,
    SingleChoice,
    MultiChoice,
    Dropdown,
    File,
    Rating,
    Date,
    Time,
}

impl FieldType {
    /// Kinds whose answers must come from a declared option list.
    pub fn is_choice_like(&self) -> bool {
        matches!(
            self,
            FieldType::SingleChoice | FieldType::MultiChoice | FieldType::Dropdown
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::ShortText => "short_text",
            FieldType::LongText => "long_text",
            FieldType::SingleChoice => "single_choice",
            FieldType::MultiChoice => "multi_choice",
            FieldType::Dropdown => "dropdown",
            FieldType::File => "file",
            FieldType::Rating => "rating",
            FieldType::Date => "date",
            FieldType::Time => "time",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_text" => Ok(FieldType::ShortText),
            "long_text" => Ok(FieldType::LongText),
            "single_choice" => Ok(FieldType::SingleChoice),
            "multi_choice" => Ok(FieldType::MultiChoice),
            "dropdown" => Ok(FieldType::Dropdown),
            "file" => Ok(FieldType::File),
            "rating" => Ok(FieldType::Rating),
            "date" => Ok(FieldType::Date),
            "time" => Ok(FieldType::Time),
            other => Err(format!("unknown field type '{}'", other)),
        }
    }
}

/// One question in a job's dynamic application form. A field belongs to
/// exactly one job; the schema as a whole is ordered by `display_order`
/// with insertion order breaking ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: Uuid,
    pub job_id: Uuid,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub question: String,
    pub options: Vec<String>,
    pub required: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}
