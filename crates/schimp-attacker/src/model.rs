use serde::Serialize;

use crate::schema::{VarDeclaration, VarType};
use crate::state::StateVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelType {
    Dtmc,
    Mdp,
    Pomdp,
}

/// On-the-fly model-generator contract consumed by a model-checking engine.
///
/// The engine picks a state, calls [`explore`](Self::explore) on it, and then
/// reads the choices and transitions of that state. Every query refers to the
/// most recently explored state; exploring another state invalidates the
/// answers for the previous one, so an engine must finish querying a state
/// before moving on.
pub trait ModelGenerator {
    type Error: std::error::Error;

    fn model_type(&self) -> ModelType;

    fn var_names(&self) -> &[String];

    fn var_types(&self) -> Vec<VarType>;

    fn observable_vars(&self) -> &[String];

    fn var_declarations(&self) -> Vec<VarDeclaration>;

    fn num_vars(&self) -> usize {
        self.var_names().len()
    }

    fn var_index(&self, name: &str) -> Option<usize> {
        self.var_names().iter().position(|n| n == name)
    }

    fn var_name(&self, index: usize) -> Option<&str> {
        self.var_names().get(index).map(String::as_str)
    }

    /// Values of model constants. Models without constants return nothing.
    fn constant_values(&self) -> Vec<(String, i64)> {
        Vec::new()
    }

    /// Supply values for undefined constants.
    fn set_some_undefined_constants(&mut self, values: &[(String, i64)])
        -> Result<(), Self::Error>;

    fn label_names(&self) -> &[String] {
        &[]
    }

    fn num_labels(&self) -> usize {
        self.label_names().len()
    }

    fn label_index(&self, name: &str) -> Option<usize> {
        self.label_names().iter().position(|n| n == name)
    }

    fn label_name(&self, index: usize) -> Result<&str, Self::Error>;

    /// Whether `label` holds in the explored state.
    fn is_label_true(&self, label: &str) -> Result<bool, Self::Error>;

    fn has_single_initial_state(&self) -> bool {
        true
    }

    fn initial_state(&self) -> StateVector;

    fn initial_states(&self) -> Vec<StateVector> {
        vec![self.initial_state()]
    }

    /// The state under the exploration cursor, if any.
    fn explored_state(&self) -> Option<&StateVector>;

    fn explore(&mut self, state: &StateVector) -> Result<(), Self::Error>;

    fn num_choices(&self) -> Result<usize, Self::Error>;

    fn num_transitions(&self, choice: usize) -> Result<usize, Self::Error>;

    fn transition_target(&self, choice: usize, offset: usize) -> Result<StateVector, Self::Error>;

    fn transition_probability(&self, choice: usize, offset: usize) -> Result<f64, Self::Error>;

    /// Action label of a nondeterministic choice.
    fn choice_action(&self, choice: usize) -> Result<Option<String>, Self::Error>;

    fn transition_action(
        &self,
        choice: usize,
        _offset: usize,
    ) -> Result<Option<String>, Self::Error> {
        self.choice_action(choice)
    }
}
