//! Field layout of attacker state vectors.
//!
//! Every attacker state vector has the fields
//!
//! - `_phase`: 0 (start), 1 (awaiting guess) or 2 (resolved),
//! - `_oid`: id of the set of observations the program produced,
//! - `_time`: elapsed time, only when time is tracked,
//! - `_power`: power consumed, only when power is tracked,
//! - one field per secret variable, in declaration order.
//!
//! The layout is fixed when the schema is built and every encoder and
//! decoder indexes vectors through it.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::AttackerModelError;

pub const PHASE_VAR: &str = "_phase";
pub const OBSERVATIONS_VAR: &str = "_oid";
pub const TIME_VAR: &str = "_time";
pub const POWER_VAR: &str = "_power";

const RESERVED: [&str; 4] = [PHASE_VAR, OBSERVATIONS_VAR, TIME_VAR, POWER_VAR];

/// Type of a state-vector field. Attacker vectors only hold integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VarType {
    Int,
}

/// Integer bounds of one state-vector field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarDeclaration {
    pub name: String,
    pub low: i64,
    pub high: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSchema {
    /// Field names in index order.
    names: Vec<String>,
    /// Index lookup by name.
    indices: HashMap<String, usize>,
    time_index: Option<usize>,
    power_index: Option<usize>,
    secrets_offset: usize,
}

impl StateSchema {
    pub fn new<S: AsRef<str>>(
        track_time: bool,
        track_power: bool,
        secret_names: &[S],
    ) -> Result<Self, AttackerModelError> {
        let mut names = vec![PHASE_VAR.to_string(), OBSERVATIONS_VAR.to_string()];
        let time_index = track_time.then(|| {
            names.push(TIME_VAR.to_string());
            names.len() - 1
        });
        let power_index = track_power.then(|| {
            names.push(POWER_VAR.to_string());
            names.len() - 1
        });
        let secrets_offset = names.len();

        let mut indices: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        for name in secret_names {
            let name = name.as_ref();
            if RESERVED.contains(&name) {
                return Err(AttackerModelError::ReservedVariable(name.to_string()));
            }
            if indices.insert(name.to_string(), names.len()).is_some() {
                return Err(AttackerModelError::DuplicateVariable(name.to_string()));
            }
            names.push(name.to_string());
        }

        Ok(Self {
            names,
            indices,
            time_index,
            power_index,
            secrets_offset,
        })
    }

    pub fn num_vars(&self) -> usize {
        self.names.len()
    }

    pub fn var_names(&self) -> &[String] {
        &self.names
    }

    pub fn var_types(&self) -> Vec<VarType> {
        vec![VarType::Int; self.names.len()]
    }

    /// Fields visible to the attacker. Hidden program-model fields such as
    /// the configuration id never make it into the schema, so this is every
    /// field.
    pub fn observable_vars(&self) -> &[String] {
        &self.names
    }

    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn var_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn phase_index(&self) -> usize {
        0
    }

    pub fn observations_index(&self) -> usize {
        1
    }

    pub fn time_index(&self) -> Option<usize> {
        self.time_index
    }

    pub fn power_index(&self) -> Option<usize> {
        self.power_index
    }

    pub fn tracks_time(&self) -> bool {
        self.time_index.is_some()
    }

    pub fn tracks_power(&self) -> bool {
        self.power_index.is_some()
    }

    pub fn secrets_offset(&self) -> usize {
        self.secrets_offset
    }

    pub fn num_secrets(&self) -> usize {
        self.names.len() - self.secrets_offset
    }

    pub fn secret_names(&self) -> &[String] {
        &self.names[self.secrets_offset..]
    }

    pub fn secret_index(&self, name: &str) -> Option<usize> {
        self.var_index(name).filter(|&i| i >= self.secrets_offset)
    }

    /// Per-field bounds for engines that build a variable list.
    pub fn declarations(&self) -> Vec<VarDeclaration> {
        let max = i64::from(i32::MAX);
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let (low, high) = if i == self.phase_index() {
                    (0, 2)
                } else if i < self.secrets_offset {
                    (-1, max)
                } else {
                    (i64::from(i32::MIN), max)
                };
                VarDeclaration {
                    name: name.clone(),
                    low,
                    high,
                }
            })
            .collect()
    }
}
