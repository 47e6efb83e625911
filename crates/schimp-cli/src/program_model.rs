//! Precomputed program model loaded from JSON.
//!
//! The model records, per horizon, the transient distribution over
//! terminating configurations of a SCHIMP program, together with the
//! observation sets and execution contexts needed for labelling. It stands in
//! for a model-checking engine as the attacker model's probability oracle.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use miette::IntoDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use schimp_attacker::{
    AttackerModelConfig, ExecutionContextSummary, ModelInspector, ProgramConfiguration,
    SecretVariable, TerminalDistributionOracle,
};

#[derive(Debug, Error)]
pub(crate) enum ProgramModelError {
    #[error("no terminal distribution recorded at or below horizon {horizon}")]
    NoDistribution { horizon: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SecretDecl {
    pub(crate) name: String,
    pub(crate) lo: i64,
    pub(crate) hi: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TerminalEntry {
    pub(crate) context_id: usize,
    pub(crate) observations: i64,
    #[serde(default)]
    pub(crate) time: Option<i64>,
    #[serde(default)]
    pub(crate) power: Option<i64>,
    pub(crate) secrets: Vec<Option<i64>>,
    pub(crate) probability: f64,
}

impl TerminalEntry {
    fn configuration(&self) -> ProgramConfiguration {
        ProgramConfiguration {
            context_id: self.context_id,
            observations: self.observations,
            elapsed_time: self.time,
            power: self.power,
            secrets: self.secrets.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ContextEntry {
    #[serde(default)]
    pub(crate) command: Option<String>,
    #[serde(default)]
    pub(crate) time: i64,
    #[serde(default)]
    pub(crate) power: i64,
    #[serde(default)]
    pub(crate) terminating: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProgramModel {
    pub(crate) secrets: Vec<SecretDecl>,
    #[serde(default)]
    pub(crate) track_time: bool,
    #[serde(default)]
    pub(crate) track_power: bool,
    pub(crate) distributions: BTreeMap<u32, Vec<TerminalEntry>>,
    #[serde(default)]
    pub(crate) observations: BTreeMap<i64, Vec<String>>,
    #[serde(default)]
    pub(crate) contexts: BTreeMap<usize, ContextEntry>,
}

impl ProgramModel {
    pub(crate) fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub(crate) fn load(path: &Path) -> miette::Result<Self> {
        let source = fs::read_to_string(path)
            .map_err(|e| miette::miette!("Failed to read {}: {e}", path.display()))?;
        Self::from_json(&source)
            .into_diagnostic()
            .map_err(|e| e.wrap_err(format!("Invalid program model {}", path.display())))
    }

    pub(crate) fn secret_variables(&self) -> Vec<SecretVariable> {
        self.secrets
            .iter()
            .map(|s| SecretVariable::new(s.name.clone(), s.lo, s.hi))
            .collect()
    }

    pub(crate) fn attacker_config(&self, horizon: u32) -> AttackerModelConfig {
        AttackerModelConfig::new(self.secret_variables(), horizon)
            .with_time(self.track_time)
            .with_power(self.track_power)
    }

    /// Entries recorded for the largest horizon not above `horizon`.
    pub(crate) fn entries_at(&self, horizon: u32) -> Result<&[TerminalEntry], ProgramModelError> {
        self.distributions
            .range(..=horizon)
            .next_back()
            .map(|(_, entries)| entries.as_slice())
            .ok_or(ProgramModelError::NoDistribution { horizon })
    }
}

impl TerminalDistributionOracle for ProgramModel {
    type Error = ProgramModelError;

    fn terminal_distribution(
        &mut self,
        horizon: u32,
    ) -> Result<Vec<(ProgramConfiguration, f64)>, ProgramModelError> {
        Ok(self
            .entries_at(horizon)?
            .iter()
            .map(|entry| (entry.configuration(), entry.probability))
            .collect())
    }
}

impl ModelInspector for ProgramModel {
    fn execution_context(&self, context_id: usize) -> Option<ExecutionContextSummary> {
        self.contexts
            .get(&context_id)
            .map(|c| ExecutionContextSummary {
                executing_command: if c.terminating { None } else { c.command.clone() },
                elapsed_time: c.time,
                power: c.power,
                terminating: c.terminating,
            })
    }

    fn observations(&self, observations_id: i64) -> Option<Vec<String>> {
        self.observations.get(&observations_id).cloned()
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_MODEL: &str = r#"{
    "secrets": [{"name": "x", "lo": 0, "hi": 1}, {"name": "y", "lo": 0, "hi": 1}],
    "distributions": {
        "10": [
            {"context_id": 2, "observations": 0, "secrets": [1, 0], "probability": 0.25}
        ],
        "20": [
            {"context_id": 2, "observations": 0, "secrets": [1, 0], "probability": 0.5},
            {"context_id": 5, "observations": 0, "secrets": [1, 0], "probability": 0.5}
        ]
    },
    "observations": {"0": ["out 1"]},
    "contexts": {
        "2": {"time": 4, "power": 1, "terminating": true},
        "5": {"time": 6, "power": 1, "terminating": true}
    }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_sample_model() {
        let model = ProgramModel::from_json(SAMPLE_MODEL).unwrap();
        assert_eq!(model.secrets.len(), 2);
        assert!(!model.track_time);
        let config = model.attacker_config(30);
        assert_eq!(config.horizon, 30);
        assert_eq!(config.secrets[1], SecretVariable::new("y", 0, 1));
    }

    #[test]
    fn nearest_recorded_horizon_is_used() {
        let mut model = ProgramModel::from_json(SAMPLE_MODEL).unwrap();
        assert_eq!(model.terminal_distribution(30).unwrap().len(), 2);
        assert_eq!(model.terminal_distribution(20).unwrap().len(), 2);
        let early = model.terminal_distribution(15).unwrap();
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].1, 0.25);
        assert!(matches!(
            model.terminal_distribution(9),
            Err(ProgramModelError::NoDistribution { horizon: 9 })
        ));
    }

    #[test]
    fn inspector_reports_contexts_and_observations() {
        let model = ProgramModel::from_json(SAMPLE_MODEL).unwrap();
        let context = model.execution_context(5).unwrap();
        assert!(context.terminating);
        assert_eq!(context.executing_command, None);
        assert_eq!(context.elapsed_time, 6);
        assert!(model.execution_context(3).is_none());
        assert_eq!(model.observations(0), Some(vec!["out 1".to_string()]));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(ProgramModel::from_json(r#"{"secrets": []}"#).is_err());
    }
}
