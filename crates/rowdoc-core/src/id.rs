//! Unique id generation for document paths.
//!
//! The path builder draws one id per record. Generators are shared across
//! tasks, so they must be `Send + Sync`.

use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

/// Produces the unique suffix of each document path.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Random version 4 UUIDs in hyphenated form. The default generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV4;

impl IdGenerator for UuidV4 {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// 128-bit ids drawn from a seeded PRNG, formatted as version 4 UUIDs.
///
/// The same seed yields the same sequence.
pub struct Seeded {
    rng: Mutex<StdRng>,
}

impl Seeded {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl IdGenerator for Seeded {
    fn generate(&self) -> String {
        let mut bytes = [0u8; 16];
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }
}

impl fmt::Debug for Seeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seeded").finish_non_exhaustive()
    }
}

/// Counter-based ids: `<prefix>0`, `<prefix>1`, ...
#[derive(Debug, Default)]
pub struct Sequence {
    prefix: String,
    next: AtomicU64,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for Sequence {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{n}", self.prefix)
    }
}
