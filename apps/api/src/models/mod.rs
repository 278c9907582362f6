pub mod contact;
pub mod job;
pub mod job_value;
pub mod reminder;
pub mod user;
