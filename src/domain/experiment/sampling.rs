//! Randomness used to sample candidates and shuffle run order

use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Source of randomness for sampling draws and run-order shuffles
///
/// Implementations must be safe to share between concurrent runs.
pub trait Randomness: Send + Sync + fmt::Debug {
    /// Uniform draw in `[0, 1)`
    fn draw(&self) -> f64;

    /// Shuffle the given slice in place
    fn shuffle(&self, order: &mut [usize]);
}

/// Thread-local generator, the default for experiments
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandomness;

impl Randomness for ThreadRandomness {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }

    fn shuffle(&self, order: &mut [usize]) {
        order.shuffle(&mut rand::thread_rng());
    }
}

/// Deterministic generator seeded up front
pub struct SeededRandomness {
    rng: Mutex<StdRng>,
}

impl SeededRandomness {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl fmt::Debug for SeededRandomness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededRandomness").finish_non_exhaustive()
    }
}

impl Randomness for SeededRandomness {
    fn draw(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0.0..1.0)
    }

    fn shuffle(&self, order: &mut [usize]) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        order.shuffle(&mut *rng);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fixed draw with a scripted run order
    #[derive(Debug)]
    pub(crate) struct ScriptedRandomness {
        draw: f64,
        order: Vec<usize>,
    }

    impl ScriptedRandomness {
        /// Always draws `draw` and applies `order` as the shuffle
        pub(crate) fn new(draw: f64, order: Vec<usize>) -> Self {
            Self { draw, order }
        }

        /// Always draws `draw` and keeps the registration order
        pub(crate) fn in_order(draw: f64) -> Self {
            Self::new(draw, Vec::new())
        }
    }

    impl Randomness for ScriptedRandomness {
        fn draw(&self) -> f64 {
            self.draw
        }

        fn shuffle(&self, order: &mut [usize]) {
            if self.order.len() == order.len() {
                order.copy_from_slice(&self.order);
            }
        }
    }

    #[test]
    fn test_thread_draw_in_unit_interval() {
        let randomness = ThreadRandomness;

        for _ in 0..1000 {
            let draw = randomness.draw();
            assert!((0.0..1.0).contains(&draw));
        }
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let randomness = ThreadRandomness;
        let mut order: Vec<usize> = (0..10).collect();

        randomness.shuffle(&mut order);
        order.sort_unstable();

        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let first = SeededRandomness::new(7);
        let second = SeededRandomness::new(7);

        let mut a: Vec<usize> = (0..8).collect();
        let mut b: Vec<usize> = (0..8).collect();
        first.shuffle(&mut a);
        second.shuffle(&mut b);

        assert_eq!(first.draw(), second.draw());
        assert_eq!(a, b);
    }

    #[test]
    fn test_scripted_order() {
        let randomness = ScriptedRandomness::new(0.5, vec![2, 0, 1]);
        let mut order = vec![0, 1, 2];

        randomness.shuffle(&mut order);

        assert_eq!(order, vec![2, 0, 1]);
        assert_eq!(randomness.draw(), 0.5);
    }
}
