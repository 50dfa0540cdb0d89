//! Storage layer
//!
//! Everything below the repository contract lives here:
//! - [`pool`]: lazy exactly-once connection initialization
//! - [`codec`]: flat field-map encoding for the document backend
//! - [`search`]: half-open prefix ranges for title search
//! - [`repos`]: the two [`repos::ArchiveRepo`] implementations
//!
//! Design notes:
//! - Connections are not opened at construction time; the first operation
//!   that needs one pays the cost, and a failed attempt is retried on the
//!   next call
//! - Callers pick a backend once through configuration and then only ever
//!   see the trait object

pub mod codec;
pub mod pool;
pub mod repos;
pub mod search;

pub use pool::{ConnectionManager, Shutdown};
pub use repos::{open_archive, ArchiveRepo, DocumentStore, EntityStream, RelationalStore};
pub use search::{prefix_range, PrefixRange, RANGE_SENTINEL};
