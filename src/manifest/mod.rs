//! Manifest Intake
//!
//! The data contract between documentation publishers and the search
//! service: the manifest JSON schema, the source-string grammar, and the
//! fetchers that list and download manifests from a local directory or an
//! S3 bucket.

pub mod fetcher;
pub mod types;

#[cfg(test)]
mod tests;
