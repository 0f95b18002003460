//! Sampling parameters sent with each completion call.
//!
//! A provider carries a `SamplingPolicy`; the caller resolves it into concrete
//! `SamplingParams` with an injected RNG right before dispatch, so a seeded
//! generator reproduces the exact request.

use std::ops::RangeInclusive;

use rand::Rng;

use crate::llm_client::ProviderOverrides;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_MAX_TOKENS: u32 = 1200;

/// Documented ranges for randomized sampling.
pub const RANDOM_TEMPERATURE: RangeInclusive<f32> = 0.6..=0.9;
pub const RANDOM_TOP_P: RangeInclusive<f32> = 0.85..=0.95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    /// Output budget in tokens (`num_predict` for Ollama, `max_length` for Hugging Face).
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SamplingPolicy {
    Fixed(SamplingParams),
    Randomized {
        temperature: RangeInclusive<f32>,
        top_p: RangeInclusive<f32>,
        max_tokens: u32,
    },
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        SamplingPolicy::Fixed(SamplingParams::default())
    }
}

impl SamplingPolicy {
    /// Randomized temperature/top-p within the documented ranges.
    pub fn randomized(max_tokens: u32) -> Self {
        SamplingPolicy::Randomized {
            temperature: RANDOM_TEMPERATURE,
            top_p: RANDOM_TOP_P,
            max_tokens,
        }
    }

    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> SamplingParams {
        match self {
            SamplingPolicy::Fixed(params) => *params,
            SamplingPolicy::Randomized {
                temperature,
                top_p,
                max_tokens,
            } => SamplingParams {
                temperature: rng.random_range(temperature.clone()),
                top_p: rng.random_range(top_p.clone()),
                max_tokens: *max_tokens,
            },
        }
    }

    /// An overridden temperature or top-p pins that value even under a randomized policy.
    pub(crate) fn apply_overrides(&mut self, overrides: &ProviderOverrides) {
        match self {
            SamplingPolicy::Fixed(params) => {
                if let Some(t) = overrides.temperature {
                    params.temperature = t;
                }
                if let Some(p) = overrides.top_p {
                    params.top_p = p;
                }
                if let Some(m) = overrides.max_tokens {
                    params.max_tokens = m;
                }
            }
            SamplingPolicy::Randomized {
                temperature,
                top_p,
                max_tokens,
            } => {
                if let Some(t) = overrides.temperature {
                    *temperature = t..=t;
                }
                if let Some(p) = overrides.top_p {
                    *top_p = p..=p;
                }
                if let Some(m) = overrides.max_tokens {
                    *max_tokens = m;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fixed_policy_ignores_rng() {
        let policy = SamplingPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(policy.resolve(&mut rng), SamplingParams::default());
    }

    #[test]
    fn test_randomized_policy_stays_in_documented_ranges() {
        let policy = SamplingPolicy::randomized(900);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let params = policy.resolve(&mut rng);
            assert!(RANDOM_TEMPERATURE.contains(&params.temperature));
            assert!(RANDOM_TOP_P.contains(&params.top_p));
            assert_eq!(params.max_tokens, 900);
        }
    }

    #[test]
    fn test_randomized_policy_is_reproducible_with_seed() {
        let policy = SamplingPolicy::randomized(DEFAULT_MAX_TOKENS);
        let a = policy.resolve(&mut StdRng::seed_from_u64(99));
        let b = policy.resolve(&mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_overrides_pin_randomized_values() {
        let mut policy = SamplingPolicy::randomized(DEFAULT_MAX_TOKENS);
        policy.apply_overrides(&ProviderOverrides {
            temperature: Some(0.3),
            top_p: Some(0.5),
            ..Default::default()
        });
        let params = policy.resolve(&mut StdRng::seed_from_u64(1));
        assert!((params.temperature - 0.3).abs() < f32::EPSILON);
        assert!((params.top_p - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overrides_on_fixed_policy() {
        let mut policy = SamplingPolicy::default();
        policy.apply_overrides(&ProviderOverrides {
            max_tokens: Some(256),
            ..Default::default()
        });
        let params = policy.resolve(&mut StdRng::seed_from_u64(1));
        assert_eq!(params.max_tokens, 256);
        assert!((params.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }
}
