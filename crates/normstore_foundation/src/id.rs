//! Id generation for records created without a primary key.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Builder;

use crate::entity::EntityId;

/// Source of fresh entity ids.
pub trait IdGenerator {
    /// Returns a new id that has not been returned before.
    fn generate_id(&mut self) -> EntityId;
}

/// Generates random version-4 UUID strings from a seeded `ChaCha` RNG.
///
/// Two generators built from the same seed yield the same sequence, which
/// keeps tests and replays deterministic.
#[derive(Clone, Debug)]
pub struct SeededIdGenerator {
    rng: ChaCha8Rng,
}

impl SeededIdGenerator {
    /// Creates a generator with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a generator seeded from operating system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for SeededIdGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl IdGenerator for SeededIdGenerator {
    fn generate_id(&mut self) -> EntityId {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        let uuid = Builder::from_random_bytes(bytes).into_uuid();
        EntityId::new(uuid.to_string())
    }
}

/// Generates ids by counting upward from a prefix (`"tmp-1"`, `"tmp-2"`, ...).
#[derive(Clone, Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    /// Creates a generator that emits `"{prefix}{n}"` starting at 1.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate_id(&mut self) -> EntityId {
        let id = EntityId::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}
