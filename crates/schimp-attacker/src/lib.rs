#![doc = include_str!("../README.md")]

//! SCHIMP attacker model.
//!
//! This crate defines the attacker state-vector schema, the guess enumerator,
//! the observable-state aggregator, the pull-based model-generator contract
//! and the attacker model generator built on top of an external probability
//! oracle.

pub mod aggregate;
pub mod decorate;
pub mod error;
pub mod explore;
pub mod generator;
pub mod guess;
pub mod model;
pub mod oracle;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod schema;
pub mod state;

pub use aggregate::StateAggregator;
pub use decorate::{Decoration, ExecutionContextSummary, ModelInspector, StateDecorator};
pub use error::AttackerModelError;
pub use explore::{build_explicit_model, Choice, ExplicitModel, ExploreError, ExploreLimits};
pub use generator::{AttackerModelConfig, AttackerModelGenerator};
pub use guess::{Domain, GuessAssignment, GuessEnumerator, SecretVariable};
pub use model::{ModelGenerator, ModelType};
pub use oracle::{ProgramConfiguration, TerminalDistributionOracle};
pub use schema::{StateSchema, VarDeclaration, VarType};
pub use state::{AttackerState, Evidence, GuessOutcome, Phase, StateVector, UNDEFINED, UNSET_SECRET};
