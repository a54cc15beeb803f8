//! Test/seed data factories. Each call fabricates unique rows so tests can
//! build as many fixtures as they need without colliding on unique columns.

mod org_factory;
mod user_factory;

pub use org_factory::*;
pub use user_factory::*;

use std::sync::atomic::{AtomicU64, Ordering};

static SEQ: AtomicU64 = AtomicU64::new(1);

/// Monotonic per-process sequence used to keep generated codes and emails unique.
pub(crate) fn next_seq() -> u64 {
    SEQ.fetch_add(1, Ordering::Relaxed)
}
