//! Keyed pseudo-random noise.
//!
//! Every draw is a pure function of `(stream, seed, region, year)`: the key
//! is hashed with SHA-256 into a 64-bit seed for a fresh `ChaCha8` generator.
//! Nothing is shared between draws, so results do not depend on the order
//! (or thread) in which regions are processed.

use rand::SeedableRng as _;
use rand::distributions::Distribution as _;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest as _, Sha256};
use statrs::distribution::Normal;

/// Independent noise streams. Using a distinct stream per quantity keeps
/// the growth noise of a region uncorrelated with its price noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseStream {
    /// Multiplicative noise on historical growth rates.
    Growth,
    /// Additive noise on annual price appreciation rates.
    Price,
}

impl NoiseStream {
    const fn tag(self) -> &'static [u8] {
        match self {
            Self::Growth => b"growth",
            Self::Price => b"price",
        }
    }
}

/// Derives the generator seed for one draw.
#[must_use]
pub fn key(stream: NoiseStream, seed: u64, region: &str, year: i32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(stream.tag());
    hasher.update([0u8]);
    hasher.update(seed.to_le_bytes());
    hasher.update(region.as_bytes());
    hasher.update([0u8]);
    hasher.update(year.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// A generator dedicated to one `(stream, seed, region, year)` key.
#[must_use]
pub fn keyed_rng(stream: NoiseStream, seed: u64, region: &str, year: i32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(key(stream, seed, region, year))
}

/// Draws from `Normal(mean, std_dev)` for the given key.
///
/// A zero, negative or non-finite `std_dev` returns `mean` exactly, so a
/// profile with no volatility is noise free.
#[must_use]
pub fn normal(
    stream: NoiseStream,
    seed: u64,
    region: &str,
    year: i32,
    mean: f64,
    std_dev: f64,
) -> f64 {
    if !(std_dev.is_finite() && std_dev > 0.0) {
        return mean;
    }
    match Normal::new(mean, std_dev) {
        Ok(dist) => dist.sample(&mut keyed_rng(stream, seed, region, year)),
        Err(e) => {
            log::debug!("Normal({mean}, {std_dev}) rejected ({e}); using mean");
            mean
        }
    }
}

/// Multiplicative growth noise: `Normal(1, volatility)`.
#[must_use]
pub fn growth_factor(seed: u64, region: &str, year: i32, volatility: f64) -> f64 {
    normal(NoiseStream::Growth, seed, region, year, 1.0, volatility)
}

/// Additive price-rate noise: `Normal(0, volatility / 10)`.
#[must_use]
pub fn price_offset(seed: u64, region: &str, year: i32, volatility: f64) -> f64 {
    normal(NoiseStream::Price, seed, region, year, 0.0, volatility / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_volatility_is_exact() {
        assert!((growth_factor(1, "A", 2020, 0.0) - 1.0).abs() < f64::EPSILON);
        assert!(price_offset(1, "A", 2020, 0.0).abs() < f64::EPSILON);
        assert!((growth_factor(1, "A", 2020, f64::NAN) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn same_key_same_draw() {
        let a = growth_factor(42, "Mitte", 2018, 0.1);
        let b = growth_factor(42, "Mitte", 2018, 0.1);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn key_components_all_matter() {
        let base = key(NoiseStream::Growth, 42, "Mitte", 2018);
        assert_ne!(base, key(NoiseStream::Price, 42, "Mitte", 2018));
        assert_ne!(base, key(NoiseStream::Growth, 43, "Mitte", 2018));
        assert_ne!(base, key(NoiseStream::Growth, 42, "Wedding", 2018));
        assert_ne!(base, key(NoiseStream::Growth, 42, "Mitte", 2019));
    }

    #[test]
    fn draw_does_not_depend_on_prior_draws() {
        let fresh = growth_factor(7, "B", 2016, 0.2);
        for year in 2000..2016 {
            let _ = growth_factor(7, "A", year, 0.2);
        }
        assert_eq!(fresh.to_bits(), growth_factor(7, "B", 2016, 0.2).to_bits());
    }

    #[test]
    fn draws_are_roughly_centered() {
        let n = 2000;
        let mean = (0..n)
            .map(|year| growth_factor(3, "A", year, 0.1))
            .sum::<f64>()
            / f64::from(n);
        assert!((mean - 1.0).abs() < 0.02, "mean was {mean}");
    }
}
