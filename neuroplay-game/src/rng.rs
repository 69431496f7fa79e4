//! Seeded random streams for deterministic content generation.
//!
//! One user-visible seed is split into independent streams so that, for
//! example, drawing an extra distractor never shifts the next round's grid.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

/// Named random streams derived from a single session seed.
#[derive(Debug, Clone)]
pub struct RngBundle {
    content: CountingRng<ChaCha20Rng>,
    distractors: CountingRng<ChaCha20Rng>,
    shuffle: CountingRng<ChaCha20Rng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            content: CountingRng::new(derive_stream_seed(seed, b"content")),
            distractors: CountingRng::new(derive_stream_seed(seed, b"distractors")),
            shuffle: CountingRng::new(derive_stream_seed(seed, b"shuffle")),
        }
    }

    /// Stream used for the puzzle body (cells, walks, node pairs, probes).
    pub const fn content(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.content
    }

    /// Stream used to pick wrong options.
    pub const fn distractors(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.distractors
    }

    /// Stream used to order option lists.
    pub const fn shuffle(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.shuffle
    }

    /// Total draws across every stream.
    #[must_use]
    pub const fn total_draws(&self) -> u64 {
        self.content
            .draws()
            .saturating_add(self.distractors.draws())
            .saturating_add(self.shuffle.draws())
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        // HMAC accepts keys of any length.
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
