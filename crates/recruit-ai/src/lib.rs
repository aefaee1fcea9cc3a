//! Recruiting pipeline core: the application status bridge between the legacy
//! single-code representation and the per-stage interview statuses, and the
//! real-time interview session coordinator.

pub mod config;
pub mod error;
pub mod interview;
pub mod pipeline;
pub mod telemetry;
