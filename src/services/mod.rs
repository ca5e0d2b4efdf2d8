//! Service layer for gamedrop business logic.
//!
//! This module contains domain logic separated from transport concerns.
//! The upload service backs the web server; the queue backs the CLI client.

pub mod queue;
pub mod upload;

pub use queue::{QueueError, QueueSummary, SubmitResponse, UploadQueue, UploadSink};
pub use upload::{extract_identifier, sanitize_name, UploadOutcome, UploadRequest, UploadService};
