pub mod application;
pub mod audit_log;
pub mod field;
pub mod job;
pub mod principal;
