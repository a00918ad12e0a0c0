//! Object-storage collaborators backed by S3.
//!
//! Implements the presigning and artifact-import seams from
//! `vidova_core::collab` over `aws-sdk-s3`. Credentials and region come
//! from the standard AWS environment/config chain.

mod s3;

pub use s3::S3Storage;
