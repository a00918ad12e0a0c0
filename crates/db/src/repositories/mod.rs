mod job_repo;
mod step_repo;
mod user_repo;

pub use job_repo::JobRepo;
pub use step_repo::StepRepo;
pub use user_repo::UserRepo;
