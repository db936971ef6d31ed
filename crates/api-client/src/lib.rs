//! HTTP client for the patient-records API

/// Client configuration
pub mod config;

/// Client errors
pub mod error;

/// `RecordsApi` over HTTP
pub mod http;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpRecordsApi;
