pub mod analysis;
pub mod auth;
pub mod error;
pub mod firestore;
pub mod storage;
pub mod throttle;

pub use analysis::GeminiClient;
pub use auth::{AuthClient, AuthSession};
pub use error::ApiError;
pub use firestore::FirestoreClient;
pub use storage::StorageClient;
pub use throttle::RequestThrottle;
