pub mod handlers;
pub mod local_estimate;
pub mod market;
pub mod remote;
pub mod repository;
pub mod salary_data;
pub mod scoring;
pub mod valuation;
