use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::application::{AnswerValue, ApplicantInfo};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitApplicationPayload {
    pub job_id: Uuid,
    pub applicant: ApplicantInfo,
    #[serde(default)]
    pub answers: Vec<AnswerPayload>,
    pub attachment: Option<AttachmentUpload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub field_id: Uuid,
    pub value: AnswerValue,
}

/// Raw upload handed through to the blob collaborator; the resulting URL
/// is opaque to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub application_id: Uuid,
    pub attachment_url: Option<String>,
}
