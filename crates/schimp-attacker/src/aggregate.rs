use std::hash::Hash;

use indexmap::IndexMap;

/// Merges duplicate states, summing their probability mass.
///
/// Several program configurations can differ only in hidden state (for
/// example the position of control flow) and still produce identical
/// attacker-observable evidence; their mass belongs to a single attacker
/// state. States keep the order in which they were first added.
#[derive(Debug, Clone)]
pub struct StateAggregator<S: Hash + Eq> {
    states: IndexMap<S, f64>,
}

impl<S: Hash + Eq> Default for StateAggregator<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Hash + Eq> StateAggregator<S> {
    pub fn new() -> Self {
        Self {
            states: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: IndexMap::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, state: S, probability: f64) {
        *self.states.entry(state).or_insert(0.0) += probability;
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, state: &S) -> Option<f64> {
        self.states.get(state).copied()
    }

    pub fn total_mass(&self) -> f64 {
        self.states.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, f64)> + '_ {
        self.states.iter().map(|(s, &p)| (s, p))
    }

    pub fn into_weighted(self) -> Vec<(S, f64)> {
        self.states.into_iter().collect()
    }
}

impl<S: Hash + Eq> FromIterator<(S, f64)> for StateAggregator<S> {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut aggregator = Self::new();
        for (state, probability) in iter {
            aggregator.add(state, probability);
        }
        aggregator
    }
}
