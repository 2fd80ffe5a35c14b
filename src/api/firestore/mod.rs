pub mod client;
pub mod mapper;
pub mod types;

pub use client::FirestoreClient;
pub use types::{Document, FieldValue, Fields};
