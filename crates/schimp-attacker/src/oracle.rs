use serde::{Deserialize, Serialize};

use crate::error::AttackerModelError;
use crate::schema::StateSchema;
use crate::state::{Evidence, UNSET_SECRET};

/// A state of the underlying program model as seen by the attacker model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramConfiguration {
    /// Internal execution-context id. Hidden from the attacker.
    pub context_id: usize,
    /// Observation-set id.
    pub observations: i64,
    #[serde(default)]
    pub elapsed_time: Option<i64>,
    #[serde(default)]
    pub power: Option<i64>,
    /// Secret-variable values in declaration order; `None` before the
    /// variable has been initialised.
    pub secrets: Vec<Option<i64>>,
}

impl ProgramConfiguration {
    /// Drop the hidden context id and keep what the attacker can use.
    ///
    /// The configuration must match `schema`: one value per secret variable
    /// and time/power present exactly when tracked. Secrets the run had not
    /// assigned before the horizon stay `None`.
    pub fn project(&self, schema: &StateSchema) -> Result<Evidence, AttackerModelError> {
        let malformed = |reason: String| AttackerModelError::MalformedConfiguration {
            context_id: self.context_id,
            reason,
        };
        if self.secrets.len() != schema.num_secrets() {
            return Err(malformed(format!(
                "expected {} secret values, found {}",
                schema.num_secrets(),
                self.secrets.len()
            )));
        }
        if self.elapsed_time.is_some() != schema.tracks_time() {
            return Err(malformed(
                "elapsed time presence does not match schema".into(),
            ));
        }
        if self.power.is_some() != schema.tracks_power() {
            return Err(malformed("power presence does not match schema".into()));
        }
        if let Some(name) = self
            .secrets
            .iter()
            .zip(schema.secret_names())
            .find_map(|(value, name)| (*value == Some(UNSET_SECRET)).then_some(name))
        {
            return Err(malformed(format!(
                "secret variable `{name}` holds the reserved value {UNSET_SECRET}"
            )));
        }
        Ok(Evidence {
            observations: self.observations,
            elapsed_time: self.elapsed_time,
            power: self.power,
            secrets: self.secrets.clone(),
        })
    }
}

/// Probability oracle over the program model.
///
/// Implemented by the model-checking engine that built the program's DTMC.
/// The call is synchronous and cannot be interrupted.
pub trait TerminalDistributionOracle {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Transient distribution over program configurations at `horizon` steps.
    ///
    /// Configurations with zero probability may be included; they are
    /// skipped by the attacker model. Mass still sitting on non-terminating
    /// configurations at the horizon is the caller's to account for.
    fn terminal_distribution(
        &mut self,
        horizon: u32,
    ) -> Result<Vec<(ProgramConfiguration, f64)>, Self::Error>;
}

impl<O: TerminalDistributionOracle + ?Sized> TerminalDistributionOracle for &mut O {
    type Error = O::Error;

    fn terminal_distribution(
        &mut self,
        horizon: u32,
    ) -> Result<Vec<(ProgramConfiguration, f64)>, Self::Error> {
        (**self).terminal_distribution(horizon)
    }
}
