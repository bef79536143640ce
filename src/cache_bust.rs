//! Random query components that defeat browser and proxy caching of debug items.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Exclusive upper bound of the random value appended to item paths.
pub const RANDOM_PARAM_BOUND: u32 = 10_000;

/// Append a random value in `[0, RANDOM_PARAM_BOUND)` as a bare query component.
///
/// Paths that already carry a query string are extended with `&`, others get `?`.
pub fn append_random_param<R: Rng + ?Sized>(path: &str, rng: &mut R) -> String {
  let value = rng.gen_range(0..RANDOM_PARAM_BOUND);
  let separator = if path.contains('?') { '&' } else { '?' };
  format!("{path}{separator}{value}")
}

/// Path decorator applied to every item of an expanded bundle.
#[derive(Debug, Clone)]
pub struct CacheBuster {
  disable_random_param: bool,
  rng: StdRng,
}

impl CacheBuster {
  /// Decorator seeded from OS entropy.
  pub fn new(disable_random_param: bool) -> Self {
    Self {
      disable_random_param,
      rng: StdRng::from_entropy(),
    }
  }

  /// Decorator with a fixed seed, producing a reproducible sequence.
  pub fn with_seed(disable_random_param: bool, seed: u64) -> Self {
    Self {
      disable_random_param,
      rng: StdRng::seed_from_u64(seed),
    }
  }

  /// Whether decoration is switched off.
  pub fn is_disabled(&self) -> bool {
    self.disable_random_param
  }

  /// Decorate `path`, or return it untouched when random params are disabled.
  pub fn decorate(&mut self, path: &str) -> String {
    if self.disable_random_param {
      return path.to_string();
    }
    append_random_param(path, &mut self.rng)
  }
}

impl Default for CacheBuster {
  fn default() -> Self {
    Self::new(false)
  }
}
