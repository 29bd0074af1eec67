//! In-memory adapters for tests.
//!
//! Compiled for unit tests and, behind the `test-support` feature, for the
//! integration suites under `tests/`. Nothing here talks to PostgreSQL or
//! Redis; time comes from a [`MutableClock`] so TTLs and invitation expiry
//! can be driven deterministically.

mod clock;
mod memory_cache;
mod memory_store;

pub use clock::MutableClock;
pub use memory_cache::{
    FailingEntityCache, FailingWindowCounter, MemoryEntityCache, MemoryWindowCounter,
};
pub use memory_store::MemoryStore;
