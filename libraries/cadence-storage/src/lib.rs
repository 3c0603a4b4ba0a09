//! Cadence Storage
//!
//! Implementations of [`PersistenceGateway`](cadence_core::PersistenceGateway)
//! for the playback session.
//!
//! - [`JsonFileStore`]: one JSON document on disk, replaced atomically on save
//! - [`MemoryStore`]: in-process store for tests and throwaway sessions
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_core::PersistenceGateway;
//! use cadence_storage::JsonFileStore;
//!
//! # async fn example() -> cadence_core::Result<()> {
//! let store = JsonFileStore::new("/tmp/cadence/session.json");
//! let snapshot = store.load().await?;
//! println!("restored queue: {:?}", snapshot.map(|s| s.queue.len()));
//! # Ok(())
//! # }
//! ```

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
