//! Bitbucket Server REST client.

pub mod client;
pub mod error;
pub mod http_client;

pub use client::{ClientFactory, DirectoryChild, FilePathClient, FileType, RemoteApiClient};
pub use error::ApiError;
pub use http_client::{HttpClientFactory, HttpRemoteApiClient};
