pub mod client;
pub mod error;

pub use client::{ApiClient, ApiConfig, MessagesApi};
pub use error::{ApiError, RawFailure, classify};
