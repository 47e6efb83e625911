use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AttackerModelError;
use crate::schema::StateSchema;

/// Wire value of a field that carries no information in the current phase.
pub const UNDEFINED: i64 = -1;

/// Wire value of a secret variable the program had not assigned yet when the
/// horizon was reached. Kept apart from [`UNDEFINED`], which is a valid secret
/// value.
pub const UNSET_SECRET: i64 = i64::MIN;

/// Flat integer state vector exchanged with the model-checking engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateVector(Vec<i64>);

impl StateVector {
    pub fn new(values: Vec<i64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        self.0.get(index).copied()
    }

    pub fn into_inner(self) -> Vec<i64> {
        self.0
    }
}

impl From<Vec<i64>> for StateVector {
    fn from(values: Vec<i64>) -> Self {
        Self(values)
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Phase {
    Start,
    AwaitingGuess,
    Resolved,
}

impl Phase {
    pub fn id(self) -> i64 {
        match self {
            Phase::Start => 0,
            Phase::AwaitingGuess => 1,
            Phase::Resolved => 2,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Phase::Start),
            1 => Some(Phase::AwaitingGuess),
            2 => Some(Phase::Resolved),
            _ => None,
        }
    }
}

/// What the attacker has seen once the program terminated, together with the
/// true secret values the guesses are scored against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Evidence {
    /// Observation-set id; equal ids are indistinguishable to the attacker.
    pub observations: i64,
    pub elapsed_time: Option<i64>,
    pub power: Option<i64>,
    /// True secret values in declaration order; `None` when the run was cut
    /// off before the variable was assigned.
    pub secrets: Vec<Option<i64>>,
}

/// Per-secret correctness of the attacker's guess, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuessOutcome {
    pub correct: Vec<bool>,
}

impl GuessOutcome {
    pub fn all_correct(&self) -> bool {
        self.correct.iter().all(|&c| c)
    }

    pub fn num_correct(&self) -> usize {
        self.correct.iter().filter(|&&c| c).count()
    }
}

/// A state of the attacker model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttackerState {
    Start,
    AwaitingGuess(Evidence),
    Resolved(GuessOutcome),
}

impl AttackerState {
    pub fn phase(&self) -> Phase {
        match self {
            AttackerState::Start => Phase::Start,
            AttackerState::AwaitingGuess(_) => Phase::AwaitingGuess,
            AttackerState::Resolved(_) => Phase::Resolved,
        }
    }

    /// Flatten into the wire layout described by `schema`.
    pub fn encode(&self, schema: &StateSchema) -> StateVector {
        let mut values = vec![UNDEFINED; schema.num_vars()];
        values[schema.phase_index()] = self.phase().id();
        match self {
            AttackerState::Start => {}
            AttackerState::AwaitingGuess(evidence) => {
                values[schema.observations_index()] = evidence.observations;
                if let Some(i) = schema.time_index() {
                    values[i] = evidence.elapsed_time.unwrap_or(UNDEFINED);
                }
                if let Some(i) = schema.power_index() {
                    values[i] = evidence.power.unwrap_or(UNDEFINED);
                }
                for (slot, value) in values[schema.secrets_offset()..]
                    .iter_mut()
                    .zip(&evidence.secrets)
                {
                    *slot = value.unwrap_or(UNSET_SECRET);
                }
            }
            AttackerState::Resolved(outcome) => {
                for (slot, correct) in values[schema.secrets_offset()..]
                    .iter_mut()
                    .zip(&outcome.correct)
                {
                    *slot = i64::from(*correct);
                }
            }
        }
        StateVector(values)
    }

    /// Parse a wire vector produced under `schema`.
    pub fn decode(schema: &StateSchema, vector: &StateVector) -> Result<Self, AttackerModelError> {
        let malformed = |reason: &str| AttackerModelError::MalformedVector {
            vector: vector.to_string(),
            reason: reason.to_string(),
        };
        if vector.len() != schema.num_vars() {
            return Err(malformed(&format!(
                "expected {} fields, found {}",
                schema.num_vars(),
                vector.len()
            )));
        }
        let values = vector.values();
        let phase = Phase::from_id(values[schema.phase_index()])
            .ok_or_else(|| malformed("unknown phase"))?;
        let secrets = &values[schema.secrets_offset()..];

        let require_undefined = |fields: &[i64]| {
            if fields.iter().all(|&v| v == UNDEFINED) {
                Ok(())
            } else {
                Err(malformed("field outside the phase layout is not undefined"))
            }
        };

        match phase {
            Phase::Start => {
                require_undefined(&values[schema.phase_index() + 1..])?;
                Ok(AttackerState::Start)
            }
            Phase::AwaitingGuess => {
                let tracked = |index: Option<usize>, name: &str| match index {
                    Some(i) if values[i] == UNDEFINED => {
                        Err(malformed(&format!("{name} is undefined")))
                    }
                    Some(i) => Ok(Some(values[i])),
                    None => Ok(None),
                };
                Ok(AttackerState::AwaitingGuess(Evidence {
                    observations: values[schema.observations_index()],
                    elapsed_time: tracked(schema.time_index(), "elapsed time")?,
                    power: tracked(schema.power_index(), "power")?,
                    secrets: secrets
                        .iter()
                        .map(|&v| (v != UNSET_SECRET).then_some(v))
                        .collect(),
                }))
            }
            Phase::Resolved => {
                require_undefined(&values[schema.phase_index() + 1..schema.secrets_offset()])?;
                let correct = secrets
                    .iter()
                    .map(|&flag| match flag {
                        0 => Ok(false),
                        1 => Ok(true),
                        _ => Err(malformed("guess flag is not 0 or 1")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AttackerState::Resolved(GuessOutcome { correct }))
            }
        }
    }
}
