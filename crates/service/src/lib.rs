//! Service layer for the saved-string endpoints.
//! - `store`: where the string lives (DynamoDB, memory, JSON file).
//! - `strings`: read/write semantics on top of a store.

pub mod errors;
pub mod store;
pub mod strings;

pub use errors::ServiceError;
pub use store::{build_store, StringStore};
pub use strings::StringService;
