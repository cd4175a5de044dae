//! Minigame reward selection.

use std::fmt;

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prize tiers awarded by the minigame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prize {
    /// 100 coins.
    Gold,
    /// 50 coins.
    Silver,
    /// 20 coins.
    Bronze,
}

/// Every prize, each drawn with equal probability.
pub const PRIZES: [Prize; 3] = [Prize::Gold, Prize::Silver, Prize::Bronze];

impl Prize {
    /// Display name of the tier.
    pub fn name(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Bronze => "bronze",
        }
    }

    /// Coins credited for the tier.
    pub fn coins(self) -> u64 {
        match self {
            Self::Gold => 100,
            Self::Silver => 50,
            Self::Bronze => 20,
        }
    }
}

impl fmt::Display for Prize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of uniformly distributed indices.
pub trait DrawSource: Send + Sync {
    /// Return an index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// Adapts any [`RngCore`] into a [`DrawSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl<R: RngCore + Send + Sync> DrawSource for RngSource<R> {
    fn pick(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

/// Prize selection over an injectable random source. Crediting is left to the caller.
pub struct RewardDraw {
    source: Box<dyn DrawSource>,
}

impl RewardDraw {
    /// Draw from `source`.
    pub fn new(source: impl DrawSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Reproducible draws from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(RngSource(StdRng::seed_from_u64(seed)))
    }

    /// Draws seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self::new(RngSource(StdRng::from_entropy()))
    }

    /// Pick one prize uniformly at random.
    pub fn draw(&mut self) -> Prize {
        let index = self.source.pick(PRIZES.len()) % PRIZES.len();
        let prize = PRIZES[index];
        debug!(prize = %prize, coins = prize.coins(), "Prize drawn");
        prize
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Fixed(usize);

    impl DrawSource for Fixed {
        fn pick(&mut self, _len: usize) -> usize {
            self.0
        }
    }

    #[test]
    fn each_index_maps_to_its_prize() {
        let cases = [(0, Prize::Gold, 100), (1, Prize::Silver, 50), (2, Prize::Bronze, 20)];
        for (index, expected, coins) in cases {
            let prize = RewardDraw::new(Fixed(index)).draw();
            assert_eq!(prize, expected);
            assert_eq!(prize.coins(), coins);
        }
    }

    #[test]
    fn seeded_draws_repeat() {
        let mut a = RewardDraw::seeded(11);
        let mut b = RewardDraw::seeded(11);
        let left: Vec<_> = (0..50).map(|_| a.draw()).collect();
        let right: Vec<_> = (0..50).map(|_| b.draw()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn distribution_is_roughly_uniform() {
        const DRAWS: usize = 30_000;
        let mut draw = RewardDraw::seeded(0x5eed);
        let mut counts: HashMap<Prize, usize> = HashMap::new();
        for _ in 0..DRAWS {
            *counts.entry(draw.draw()).or_default() += 1;
        }

        for prize in PRIZES {
            let frequency = counts.get(&prize).copied().unwrap_or_default() as f64 / DRAWS as f64;
            assert!(
                (frequency - 1.0 / 3.0).abs() < 0.02,
                "{prize} drawn with frequency {frequency}"
            );
        }
    }

    #[test]
    fn names_match_serialised_form() {
        for prize in PRIZES {
            assert_eq!(
                serde_json::to_string(&prize).unwrap(),
                format!("\"{}\"", prize.name())
            );
        }
    }
}
