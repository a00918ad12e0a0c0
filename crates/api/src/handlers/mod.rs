//! HTTP request handlers, grouped by resource.

pub mod billing;
pub mod credits;
pub mod generations;
pub mod uploads;
pub mod webhooks;
