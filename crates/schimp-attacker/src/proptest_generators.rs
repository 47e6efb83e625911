//! Proptest strategies for secret declarations and terminal distributions.

use proptest::prelude::*;

use crate::guess::SecretVariable;
use crate::oracle::ProgramConfiguration;

/// 1–3 secret variables named `s0`, `s1`, ... with small non-empty domains.
///
/// Domains hold 1–4 values starting somewhere in `-5..=5`, so the guess space
/// never exceeds 64 entries.
pub fn arb_secret_variables() -> impl Strategy<Value = Vec<SecretVariable>> {
    proptest::collection::vec((-5i64..=5, 0i64..4), 1..=3).prop_map(|bounds| {
        bounds
            .into_iter()
            .enumerate()
            .map(|(i, (lo, width))| SecretVariable::new(format!("s{i}"), lo, lo + width))
            .collect()
    })
}

/// Secret declarations with a full terminal distribution over them.
///
/// Configurations carry in-domain secret values, observation ids in `0..3`,
/// no time or power, and strictly positive probabilities normalised to sum
/// to 1. Context ids are unique; the projected evidence may repeat.
pub fn arb_terminal_distribution(
) -> impl Strategy<Value = (Vec<SecretVariable>, Vec<(ProgramConfiguration, f64)>)> {
    arb_secret_variables().prop_flat_map(|secrets| {
        let domains: Vec<_> = secrets.iter().map(|s| s.domain).collect();
        let configuration = (
            0i64..3,
            domains
                .iter()
                .map(|d| d.lo..=d.hi)
                .collect::<Vec<_>>(),
            1u32..100,
        );
        let entries = proptest::collection::vec(configuration, 1..12);
        (Just(secrets), entries).prop_map(|(secrets, entries)| {
            let total: u32 = entries.iter().map(|(_, _, w)| w).sum();
            let distribution = entries
                .into_iter()
                .enumerate()
                .map(|(context_id, (observations, values, weight))| {
                    (
                        ProgramConfiguration {
                            context_id,
                            observations,
                            elapsed_time: None,
                            power: None,
                            secrets: values.into_iter().map(Some).collect(),
                        },
                        f64::from(weight) / f64::from(total),
                    )
                })
                .collect();
            (secrets, distribution)
        })
    })
}
