//! Google Drive access for storing uploaded archives.

mod client;

pub use client::{DriveClient, DriveConfig, DriveError, NewFile, RemoteFile, StorageGateway};
