//! gamedrop - upload game archives to Google Drive.
//!
//! Archives are matched to a catalog entry by the numeric identifier in their
//! file name, uploaded under the catalog's display name, and recorded in a
//! local upload history that is shown as a paginated table.

pub mod cli;
pub mod client;
pub mod config;
pub mod drive;
pub mod error;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod server;
pub mod services;
