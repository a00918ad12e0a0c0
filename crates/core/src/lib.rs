//! Domain layer for the Vidova generation platform.
//!
//! Pure types and contracts shared by every other crate: the job state
//! machine, kind-specific input payloads, provider callback shapes, credit
//! accounting rules, and the collaborator/store traits the orchestration
//! engine is wired against. This crate has zero internal dependencies and
//! performs no I/O of its own.

pub mod collab;
pub mod credits;
pub mod error;
pub mod job;
pub mod store;
pub mod types;
pub mod webhook;
