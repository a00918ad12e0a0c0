pub mod job;
pub mod step;
pub mod user;
