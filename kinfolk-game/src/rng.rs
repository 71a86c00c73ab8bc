//! Deterministic random streams and the small sampling helpers every system shares.

use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Deterministic bundle of RNG streams segregated by simulation domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    activity: RefCell<CountingRng<SmallRng>>,
    daily: RefCell<CountingRng<SmallRng>>,
    genesis: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            activity: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"activity"))),
            daily: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"daily"))),
            genesis: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"genesis"))),
        }
    }

    /// Rebuild streams for a session resumed on `day`, so reloaded games do not
    /// replay the draws of day one.
    #[must_use]
    pub fn resumed(seed: u64, day: u32) -> Self {
        Self::from_user_seed(derive_stream_seed(seed, &day.to_le_bytes()))
    }

    /// Access the activity resolution stream.
    #[must_use]
    pub fn activity(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.activity.borrow_mut()
    }

    /// Access the daily tick stream.
    #[must_use]
    pub fn daily(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.daily.borrow_mut()
    }

    /// Access the character generation stream.
    #[must_use]
    pub fn genesis(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.genesis.borrow_mut()
    }

    /// Total draws across all streams.
    #[must_use]
    pub fn total_draws(&self) -> u64 {
        self.activity.borrow().draws() + self.daily.borrow().draws() + self.genesis.borrow().draws()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
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
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Bernoulli draw: true when a unit roll lands below `probability`.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.r#gen::<f64>() < probability
}

/// Inclusive integer roll, returned as f64 because every attribute is fractional.
pub fn roll<R: Rng + ?Sized>(rng: &mut R, low: i32, high: i32) -> f64 {
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    f64::from(rng.gen_range(low..=high))
}

/// Continuous roll between two bounds in either order; equal bounds return the bound.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> f64 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if high - low <= f64::EPSILON {
        return low;
    }
    rng.gen_range(low..high)
}

/// Weighted pick over `(item, weight)` pairs. Non-positive weights never win.
pub fn pick_weighted<'a, T, R>(candidates: &'a [(T, f64)], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    let total: f64 = candidates
        .iter()
        .map(|(_, weight)| weight.max(0.0))
        .sum();
    if total <= 0.0 {
        return None;
    }
    let mut remaining = rng.r#gen::<f64>() * total;
    let mut fallback = None;
    for (item, weight) in candidates {
        if *weight <= 0.0 {
            continue;
        }
        fallback = Some(item);
        if remaining < *weight {
            return Some(item);
        }
        remaining -= weight;
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use rand::rngs::mock::StepRng;

    #[test]
    fn bundle_streams_are_independent_and_deterministic() {
        let first = RngBundle::from_user_seed(42);
        let second = RngBundle::from_user_seed(42);
        assert_eq!(first.activity().next_u64(), second.activity().next_u64());
        assert_ne!(
            derive_stream_seed(42, b"activity"),
            derive_stream_seed(42, b"daily")
        );
        assert_eq!(first.total_draws(), 1);
    }

    #[test]
    fn resumed_bundle_differs_from_fresh_bundle() {
        let fresh = RngBundle::from_user_seed(7);
        let resumed = RngBundle::resumed(7, 30);
        assert_ne!(fresh.daily().next_u64(), resumed.daily().next_u64());
    }

    #[test]
    fn uniform_tolerates_reversed_and_equal_bounds() {
        let mut rng = StepRng::new(0, 0);
        assert!((uniform(&mut rng, 0.3, 0.1) - 0.1).abs() < 1e-12);
        assert!((uniform(&mut rng, 2.0, 2.0) - 2.0).abs() < 1e-12);
        assert!((roll(&mut rng, 5, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn weighted_pick_skips_empty_weights() {
        let mut rng = StepRng::new(0, 0);
        let pool = [("never", 0.0), ("always", 2.0)];
        assert_eq!(pick_weighted(&pool, &mut rng), Some(&"always"));
        let empty: [(&str, f64); 1] = [("none", 0.0)];
        assert!(pick_weighted(&empty, &mut rng).is_none());
    }
}
