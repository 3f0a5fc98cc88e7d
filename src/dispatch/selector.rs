//! Weighted analyzer selection.
//!
//! # Algorithm
//! Linear CDF walk: sum the healthy weights, draw `r` uniformly in
//! `[0, total)`, and take the first analyzer whose cumulative weight
//! exceeds `r`. Iteration runs in lexicographic id order so a seeded RNG
//! produces reproducible picks regardless of registry iteration order.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::GatewayError;
use crate::registry::AnalyzerSnapshot;

/// Picks one healthy analyzer with probability proportional to its weight.
///
/// Stateless over the registry: every call receives a fresh snapshot, so
/// concurrent admits and evicts cannot produce torn reads.
#[derive(Debug)]
pub struct WeightedSelector {
    rng: Mutex<StdRng>,
}

impl WeightedSelector {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Selector with a fixed seed, for reproducible distribution tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Select among the healthy members of `analyzers`.
    pub fn select(&self, analyzers: &[AnalyzerSnapshot]) -> Result<AnalyzerSnapshot, GatewayError> {
        self.select_excluding(analyzers, None)
    }

    /// Select among the healthy members, skipping `exclude` (used when a
    /// failed send is retried on a different analyzer).
    pub fn select_excluding(
        &self,
        analyzers: &[AnalyzerSnapshot],
        exclude: Option<&str>,
    ) -> Result<AnalyzerSnapshot, GatewayError> {
        let mut healthy: Vec<AnalyzerSnapshot> = analyzers
            .iter()
            .filter(|a| a.healthy && exclude != Some(a.id.as_str()))
            .cloned()
            .collect();

        if healthy.is_empty() {
            return Err(GatewayError::NoHealthyAnalyzer);
        }
        healthy.sort_by(|a, b| a.id.cmp(&b.id));

        if healthy.len() == 1 {
            return Ok(healthy.remove(0));
        }

        let total: f64 = healthy.iter().map(|a| a.weight).sum();
        if total <= 0.0 {
            return Err(GatewayError::InvalidWeights);
        }

        let r = self
            .rng
            .lock()
            .expect("selector rng lock poisoned")
            .gen_range(0.0..total);

        // Floating-point drift can leave r marginally above the final
        // cumulative sum; the last analyzer in id order absorbs it.
        let mut winner = healthy.len() - 1;
        let mut cumulative = 0.0;
        for (index, analyzer) in healthy.iter().enumerate() {
            cumulative += analyzer.weight;
            if r < cumulative {
                winner = index;
                break;
            }
        }

        Ok(healthy.swap_remove(winner))
    }
}

impl Default for WeightedSelector {
    fn default() -> Self {
        Self::new()
    }
}
