pub mod audit_service;
pub mod blob_store;
pub mod identity_service;
pub mod intake_service;
pub mod job_service;
pub mod kanban_service;
pub mod notification_service;
pub mod pipeline_service;
pub mod schema_service;
