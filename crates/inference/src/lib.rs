//! HTTP clients for the external model services.
//!
//! [`FalQueueClient`] talks to the asynchronous fal.ai queue (avatar
//! generation, dubbing, lip-sync); [`ModalEndpoints`] calls the
//! synchronous Modal-hosted models (text-to-speech, photo-to-video).
//! Both implement the collaborator traits from `vidova_core::collab` and
//! are constructed once at startup.

mod fal;
mod modal;

pub use fal::FalQueueClient;
pub use modal::{ModalCredentials, ModalEndpoints};
