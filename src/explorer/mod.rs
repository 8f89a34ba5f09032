pub mod client;
pub mod models;

// Re-exports for convenience
pub use client::{classify_response, ClientError, ExplorerClient, ResponseClass};
