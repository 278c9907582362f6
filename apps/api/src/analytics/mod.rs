pub mod flow;
pub mod handlers;
pub mod stats;
pub mod timeline;
