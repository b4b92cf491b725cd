//! Process-wide pseudo-random generator.
//!
//! Samplers and toy generators that do not thread their own generator draw
//! from this one. Its full state can be captured and reinstalled, which is
//! what [`RandomSeedScope`](crate::scope::RandomSeedScope) builds on.
//!
//! The generator sits behind a `Mutex` so the static is `Sync`; that does not
//! make interleaved seeding from several threads meaningful.

use std::sync::{LazyLock, Mutex, MutexGuard};

use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

static GLOBAL_RNG: LazyLock<Mutex<StdRng>> = LazyLock::new(|| Mutex::new(StdRng::from_os_rng()));

/// Opaque snapshot of the generator's complete internal state.
#[derive(Debug, Clone)]
pub struct RngState(StdRng);

fn lock() -> MutexGuard<'static, StdRng> {
    // The generator holds no invariants a panicking holder could break.
    GLOBAL_RNG.lock().unwrap_or_else(|e| e.into_inner())
}

/// Capture the current generator state.
pub fn get_state() -> RngState {
    RngState(lock().clone())
}

/// Reinstall a previously captured state.
pub fn set_state(state: RngState) {
    *lock() = state.0;
}

/// Reseed deterministically: the same `seed` always yields the same draws.
pub fn seed(seed: u64) {
    *lock() = StdRng::seed_from_u64(seed);
}

/// Reseed from operating-system entropy.
pub fn seed_from_entropy() {
    *lock() = StdRng::from_os_rng();
}

/// Run `f` with exclusive access to the generator.
///
/// `f` must not call back into this module; the lock is not reentrant.
pub fn with_rng<T>(f: impl FnOnce(&mut StdRng) -> T) -> T {
    f(&mut lock())
}

/// Uniform draw in `[0, 1)`.
pub fn random_f64() -> f64 {
    lock().random()
}

/// Uniform draw from `range`.
pub fn random_range<T, R>(range: R) -> T
where
    T: SampleUniform,
    R: SampleRange<T>,
{
    lock().random_range(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    static RNG_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_seed_is_deterministic() {
        let _guard = RNG_LOCK.lock().expect("RNG_LOCK poisoned");

        seed(24);
        let a: Vec<u32> = (0..4).map(|_| random_range(0..1_000_000)).collect();
        seed(24);
        let b: Vec<u32> = (0..4).map(|_| random_range(0..1_000_000)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_state_round_trip_resumes_stream() {
        let _guard = RNG_LOCK.lock().expect("RNG_LOCK poisoned");

        seed(7);
        random_f64();
        let saved = get_state();
        let expected: Vec<f64> = (0..3).map(|_| random_f64()).collect();

        seed(99);
        random_f64();
        set_state(saved);
        let resumed: Vec<f64> = (0..3).map(|_| random_f64()).collect();
        assert_eq!(expected, resumed);
    }

    #[test]
    fn test_with_rng_shares_the_stream() {
        let _guard = RNG_LOCK.lock().expect("RNG_LOCK poisoned");

        seed(3);
        let direct = random_f64();
        seed(3);
        let via_closure: f64 = with_rng(|rng| rng.random());
        assert_eq!(direct, via_closure);
    }
}
