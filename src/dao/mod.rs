/// Database model definitions.
pub mod models;
/// Round document storage backends.
pub mod round_store;
/// Storage error types shared by every backend.
pub mod storage;
