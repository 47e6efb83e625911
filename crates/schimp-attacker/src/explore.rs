//! Explicit-state construction of a [`ModelGenerator`]'s reachable model.
//!
//! Breadth-first search from the initial states, exploring every state exactly
//! once and reading off all of its choices before moving on. This is what a
//! model-checking engine does when it builds an explicit model from an
//! on-the-fly generator, and it is how the CLI and the integration tests drive
//! the attacker model.

use std::collections::VecDeque;

use indexmap::IndexSet;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{ModelGenerator, ModelType};
use crate::state::StateVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExploreLimits {
    /// Abort once more than this many states have been discovered.
    pub max_states: usize,
}

impl Default for ExploreLimits {
    fn default() -> Self {
        Self {
            max_states: 1_000_000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExploreError<E: std::error::Error + 'static> {
    #[error("state limit of {limit} exceeded")]
    StateLimitExceeded { limit: usize },
    #[error(transparent)]
    Generator(E),
}

/// One choice of an explicit state: its action label and its
/// `(target index, probability)` transitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub action: Option<String>,
    pub transitions: Vec<(usize, f64)>,
}

impl Choice {
    pub fn total_probability(&self) -> f64 {
        self.transitions.iter().map(|(_, p)| p).sum()
    }
}

/// The reachable part of a model, states numbered in discovery order.
///
/// `states` doubles as the state-to-index map.
#[derive(Debug, Clone, Serialize)]
pub struct ExplicitModel {
    pub model_type: ModelType,
    pub var_names: Vec<String>,
    pub initial_states: Vec<usize>,
    pub states: IndexSet<StateVector>,
    pub choices: Vec<Vec<Choice>>,
}

impl ExplicitModel {
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_choices(&self) -> usize {
        self.choices.iter().map(Vec::len).sum()
    }

    pub fn num_transitions(&self) -> usize {
        self.choices
            .iter()
            .flatten()
            .map(|c| c.transitions.len())
            .sum()
    }

    pub fn state(&self, index: usize) -> Option<&StateVector> {
        self.states.get_index(index)
    }

    pub fn choices(&self, index: usize) -> &[Choice] {
        self.choices.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn index_of(&self, state: &StateVector) -> Option<usize> {
        self.states.get_index_of(state)
    }
}

pub fn build_explicit_model<G>(
    generator: &mut G,
    limits: ExploreLimits,
) -> Result<ExplicitModel, ExploreError<G::Error>>
where
    G: ModelGenerator + ?Sized,
    G::Error: 'static,
{
    let mut seen: IndexSet<StateVector> = IndexSet::new();
    let mut queue = VecDeque::new();
    let mut initial_states = Vec::new();

    for init in generator.initial_states() {
        let (index, fresh) = seen.insert_full(init);
        if fresh {
            queue.push_back(index);
        }
        initial_states.push(index);
    }

    let mut choices: Vec<Vec<Choice>> = Vec::new();
    while let Some(current) = queue.pop_front() {
        let Some(state) = seen.get_index(current).cloned() else {
            break;
        };
        generator.explore(&state).map_err(ExploreError::Generator)?;

        let num_choices = generator.num_choices().map_err(ExploreError::Generator)?;
        let mut state_choices = Vec::with_capacity(num_choices);
        for choice in 0..num_choices {
            let action = generator
                .choice_action(choice)
                .map_err(ExploreError::Generator)?;
            let count = generator
                .num_transitions(choice)
                .map_err(ExploreError::Generator)?;
            let mut transitions = Vec::with_capacity(count);
            for offset in 0..count {
                let target = generator
                    .transition_target(choice, offset)
                    .map_err(ExploreError::Generator)?;
                let probability = generator
                    .transition_probability(choice, offset)
                    .map_err(ExploreError::Generator)?;
                let (index, fresh) = seen.insert_full(target);
                if fresh {
                    if seen.len() > limits.max_states {
                        return Err(ExploreError::StateLimitExceeded {
                            limit: limits.max_states,
                        });
                    }
                    queue.push_back(index);
                }
                transitions.push((index, probability));
            }
            state_choices.push(Choice {
                action,
                transitions,
            });
        }

        // States are dequeued in index order, so `choices` stays aligned.
        debug_assert_eq!(choices.len(), current);
        choices.push(state_choices);
        if current > 0 && current % 10_000 == 0 {
            debug!(explored = current, discovered = seen.len(), "exploring");
        }
    }

    let model = ExplicitModel {
        model_type: generator.model_type(),
        var_names: generator.var_names().to_vec(),
        initial_states,
        states: seen,
        choices,
    };
    info!(
        states = model.num_states(),
        choices = model.num_choices(),
        transitions = model.num_transitions(),
        "explicit model built"
    );
    Ok(model)
}
