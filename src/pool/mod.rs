//! Worker Pool
//!
//! Isolates index evaluation from request intake. Each worker is a
//! dedicated OS thread owning a complete index replica; the pool routes
//! every request to the least-loaded eligible worker and reports per-worker
//! backlog for `/status`.
//!
//! ## Submodules
//! - **`worker`**: the task worker thread, its inbox, and its lifecycle
//!   (suspend/resume, restart supervision, death).
//! - **`pool`**: the scheduling table with admission and degradation rules.
//! - **`types`**: inbox messages and the serialized worker status.

pub mod pool;
pub mod types;
pub mod worker;

#[cfg(test)]
mod tests;
