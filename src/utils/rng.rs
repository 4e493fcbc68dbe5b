use rand_chacha::ChaCha20Rng;
use rand::SeedableRng;

/// SplitMix64 finalizer over `master` and the stream index.
pub fn stream_seed(master: u64, stream: usize) -> u64 {
    let mut x = master ^ ((stream as u64).wrapping_mul(0x9E3779B97F4A7C15));
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

/// Independent deterministic engine for one model instance.
pub fn stream_rng(master: u64, stream: usize) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(stream_seed(master, stream))
}
