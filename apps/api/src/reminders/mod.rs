pub mod dispatcher;
pub mod email;
pub mod handlers;
pub mod notifier;
pub mod repository;
pub mod schedule;
