//! The attacker model generator.
//!
//! The attacker model is a POMDP built on demand over the DTMC of a SCHIMP
//! program:
//!
//! - phase 0, the single initial state: one probabilistic choice whose
//!   successors are the attacker-observable terminating states of the
//!   program, obtained from the probability oracle and aggregated so that
//!   configurations differing only in hidden state share one successor;
//! - phase 1, the program has terminated and the attacker must guess: one
//!   nondeterministic choice per guess of the secret variables, labelled with
//!   the guess, each leading with probability 1 to the resolved state that
//!   records which secrets were guessed correctly;
//! - phase 2, resolved: a probability-1 self-loop.
//!
//! Only the successors of the explored state are ever computed. Terminating
//! states are recomputed every time the initial state is explored and
//! resolved states every time a transition target is requested.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::StateAggregator;
use crate::error::AttackerModelError;
use crate::guess::{GuessAssignment, GuessEnumerator, SecretVariable};
use crate::model::{ModelGenerator, ModelType};
use crate::oracle::TerminalDistributionOracle;
use crate::schema::{StateSchema, VarDeclaration, VarType};
use crate::state::{AttackerState, Evidence, GuessOutcome, StateVector};

/// Deviation of the terminal mass from 1 that is reported as truncation.
const MASS_TOLERANCE: f64 = 1e-9;

/// Construction parameters of an [`AttackerModelGenerator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackerModelConfig {
    /// Secret variables in declaration order.
    pub secrets: Vec<SecretVariable>,
    /// Track elapsed time in state vectors.
    #[serde(default)]
    pub track_time: bool,
    /// Track consumed power in state vectors.
    #[serde(default)]
    pub track_power: bool,
    /// Number of program-model steps after which the terminal distribution
    /// is taken. Mass on configurations that have not terminated by then is
    /// dropped.
    pub horizon: u32,
}

impl AttackerModelConfig {
    pub fn new(secrets: Vec<SecretVariable>, horizon: u32) -> Self {
        Self {
            secrets,
            track_time: false,
            track_power: false,
            horizon,
        }
    }

    pub fn with_time(mut self, track: bool) -> Self {
        self.track_time = track;
        self
    }

    pub fn with_power(mut self, track: bool) -> Self {
        self.track_power = track;
        self
    }
}

enum Successors {
    /// Start: aggregated terminating states and their probabilities.
    Distribution(Vec<(AttackerState, f64)>),
    /// Awaiting guess: one resolved successor per guess, computed on request.
    Guesses(Evidence),
    /// Resolved: self-loop.
    SelfLoop,
}

struct Exploration {
    vector: StateVector,
    state: AttackerState,
    successors: Successors,
}

pub struct AttackerModelGenerator<O> {
    oracle: O,
    schema: StateSchema,
    enumerator: GuessEnumerator,
    horizon: u32,
    initial: StateVector,
    exploring: Option<Exploration>,
}

impl<O: TerminalDistributionOracle> AttackerModelGenerator<O> {
    pub fn new(oracle: O, config: AttackerModelConfig) -> Result<Self, AttackerModelError> {
        let names: Vec<&str> = config.secrets.iter().map(|s| s.name.as_str()).collect();
        let schema = StateSchema::new(config.track_time, config.track_power, &names)?;
        let enumerator = GuessEnumerator::new(&config.secrets)?;
        let initial = AttackerState::Start.encode(&schema);
        debug!(
            vars = schema.num_vars(),
            guesses = enumerator.size(),
            horizon = config.horizon,
            "attacker model generator ready"
        );
        Ok(Self {
            oracle,
            schema,
            enumerator,
            horizon: config.horizon,
            initial,
            exploring: None,
        })
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    pub fn enumerator(&self) -> &GuessEnumerator {
        &self.enumerator
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    /// Typed view of the state under the exploration cursor.
    pub fn explored(&self) -> Option<&AttackerState> {
        self.exploring.as_ref().map(|e| &e.state)
    }

    fn terminal_states(&mut self) -> Result<Vec<(AttackerState, f64)>, AttackerModelError> {
        info!(horizon = self.horizon, "Querying terminal distribution...");
        let distribution = self
            .oracle
            .terminal_distribution(self.horizon)
            .map_err(|e| AttackerModelError::Oracle(Box::new(e)))?;

        let mut aggregator = StateAggregator::with_capacity(distribution.len());
        let mut terminating = 0usize;
        for (configuration, probability) in &distribution {
            if *probability > 0.0 {
                let evidence = configuration.project(&self.schema)?;
                aggregator.add(AttackerState::AwaitingGuess(evidence), *probability);
                terminating += 1;
            }
        }

        let total = aggregator.total_mass();
        if (total - 1.0).abs() > MASS_TOLERANCE {
            warn!(
                horizon = self.horizon,
                total,
                missing = 1.0 - total,
                "terminal distribution does not sum to 1; residual mass is not redistributed"
            );
        }
        debug!(
            configurations = terminating,
            states = aggregator.len(),
            "aggregated terminating configurations"
        );
        Ok(aggregator.into_weighted())
    }

    fn resolve(
        &self,
        evidence: &Evidence,
        guess: &GuessAssignment,
    ) -> Result<AttackerState, AttackerModelError> {
        let correct = self
            .schema
            .secret_names()
            .iter()
            .zip(&evidence.secrets)
            .map(|(name, truth)| {
                guess
                    .get(name)
                    .map(|guessed| Some(guessed) == *truth)
                    .ok_or_else(|| AttackerModelError::UnknownGuessVariable(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AttackerState::Resolved(GuessOutcome { correct }))
    }

    fn guess(&self, choice: usize) -> Result<GuessAssignment, AttackerModelError> {
        self.enumerator
            .get(choice)
            .ok_or(AttackerModelError::ChoiceOutOfRange {
                choice,
                count: self.enumerator.size(),
            })
    }

    fn exploration(&self) -> Result<&Exploration, AttackerModelError> {
        self.exploring
            .as_ref()
            .ok_or(AttackerModelError::NotExplored)
    }

    fn choice_count(&self, exploration: &Exploration) -> usize {
        match exploration.successors {
            Successors::Guesses(_) => self.enumerator.size(),
            Successors::Distribution(_) | Successors::SelfLoop => 1,
        }
    }

    fn transition_count(exploration: &Exploration) -> usize {
        match &exploration.successors {
            Successors::Distribution(targets) => targets.len(),
            Successors::Guesses(_) | Successors::SelfLoop => 1,
        }
    }

    fn checked_choice(&self, choice: usize) -> Result<&Exploration, AttackerModelError> {
        let exploration = self.exploration()?;
        let count = self.choice_count(exploration);
        if choice >= count {
            return Err(AttackerModelError::ChoiceOutOfRange { choice, count });
        }
        Ok(exploration)
    }

    fn checked_transition(
        &self,
        choice: usize,
        offset: usize,
    ) -> Result<&Exploration, AttackerModelError> {
        let exploration = self.checked_choice(choice)?;
        let count = Self::transition_count(exploration);
        if offset >= count {
            return Err(AttackerModelError::TransitionOutOfRange {
                choice,
                offset,
                count,
            });
        }
        Ok(exploration)
    }
}

impl<O: TerminalDistributionOracle> ModelGenerator for AttackerModelGenerator<O> {
    type Error = AttackerModelError;

    fn model_type(&self) -> ModelType {
        ModelType::Pomdp
    }

    fn var_names(&self) -> &[String] {
        self.schema.var_names()
    }

    fn var_types(&self) -> Vec<VarType> {
        self.schema.var_types()
    }

    fn observable_vars(&self) -> &[String] {
        self.schema.observable_vars()
    }

    fn var_declarations(&self) -> Vec<VarDeclaration> {
        self.schema.declarations()
    }

    fn var_index(&self, name: &str) -> Option<usize> {
        self.schema.var_index(name)
    }

    fn set_some_undefined_constants(
        &mut self,
        values: &[(String, i64)],
    ) -> Result<(), AttackerModelError> {
        if values.is_empty() {
            Ok(())
        } else {
            Err(AttackerModelError::ConstantsNotSupported)
        }
    }

    fn label_name(&self, index: usize) -> Result<&str, AttackerModelError> {
        Err(AttackerModelError::UnknownLabel(format!("#{index}")))
    }

    fn is_label_true(&self, label: &str) -> Result<bool, AttackerModelError> {
        Err(AttackerModelError::UnknownLabel(label.to_string()))
    }

    fn initial_state(&self) -> StateVector {
        self.initial.clone()
    }

    fn explored_state(&self) -> Option<&StateVector> {
        self.exploring.as_ref().map(|e| &e.vector)
    }

    fn explore(&mut self, state: &StateVector) -> Result<(), AttackerModelError> {
        self.exploring = None;
        let decoded = AttackerState::decode(&self.schema, state)?;
        let successors = match &decoded {
            AttackerState::Start => {
                debug!("exploring start state");
                Successors::Distribution(self.terminal_states()?)
            }
            AttackerState::AwaitingGuess(evidence) => {
                debug!(
                    observations = evidence.observations,
                    guesses = self.enumerator.size(),
                    "exploring awaiting-guess state"
                );
                Successors::Guesses(evidence.clone())
            }
            AttackerState::Resolved(_) => Successors::SelfLoop,
        };
        self.exploring = Some(Exploration {
            vector: state.clone(),
            state: decoded,
            successors,
        });
        Ok(())
    }

    fn num_choices(&self) -> Result<usize, AttackerModelError> {
        let exploration = self.exploration()?;
        Ok(self.choice_count(exploration))
    }

    fn num_transitions(&self, choice: usize) -> Result<usize, AttackerModelError> {
        let exploration = self.checked_choice(choice)?;
        Ok(Self::transition_count(exploration))
    }

    fn transition_target(
        &self,
        choice: usize,
        offset: usize,
    ) -> Result<StateVector, AttackerModelError> {
        let exploration = self.checked_transition(choice, offset)?;
        match &exploration.successors {
            Successors::Distribution(targets) => Ok(targets[offset].0.encode(&self.schema)),
            Successors::Guesses(evidence) => {
                let guess = self.guess(choice)?;
                Ok(self.resolve(evidence, &guess)?.encode(&self.schema))
            }
            Successors::SelfLoop => Ok(exploration.vector.clone()),
        }
    }

    fn transition_probability(
        &self,
        choice: usize,
        offset: usize,
    ) -> Result<f64, AttackerModelError> {
        let exploration = self.checked_transition(choice, offset)?;
        match &exploration.successors {
            Successors::Distribution(targets) => Ok(targets[offset].1),
            Successors::Guesses(_) | Successors::SelfLoop => Ok(1.0),
        }
    }

    fn choice_action(&self, choice: usize) -> Result<Option<String>, AttackerModelError> {
        let exploration = self.checked_choice(choice)?;
        match exploration.successors {
            Successors::Guesses(_) => Ok(Some(self.guess(choice)?.to_string())),
            Successors::Distribution(_) | Successors::SelfLoop => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ProgramConfiguration;
    use crate::state::UNSET_SECRET;
    use std::io;

    struct MockOracle {
        distribution: Vec<(ProgramConfiguration, f64)>,
        fail: bool,
        calls: usize,
        horizons: Vec<u32>,
    }

    impl MockOracle {
        fn new(distribution: Vec<(ProgramConfiguration, f64)>) -> Self {
            Self {
                distribution,
                fail: false,
                calls: 0,
                horizons: Vec::new(),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(Vec::new())
            }
        }
    }

    impl TerminalDistributionOracle for MockOracle {
        type Error = io::Error;

        fn terminal_distribution(
            &mut self,
            horizon: u32,
        ) -> Result<Vec<(ProgramConfiguration, f64)>, Self::Error> {
            self.calls += 1;
            self.horizons.push(horizon);
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::Other, "model not built"));
            }
            Ok(self.distribution.clone())
        }
    }

    fn configuration(context_id: usize, observations: i64, x: i64, y: i64) -> ProgramConfiguration {
        ProgramConfiguration {
            context_id,
            observations,
            elapsed_time: None,
            power: None,
            secrets: vec![Some(x), Some(y)],
        }
    }

    fn xy_config() -> AttackerModelConfig {
        AttackerModelConfig::new(
            vec![
                SecretVariable::new("x", 0, 1),
                SecretVariable::new("y", 0, 1),
            ],
            30,
        )
    }

    fn generator(
        distribution: Vec<(ProgramConfiguration, f64)>,
    ) -> AttackerModelGenerator<MockOracle> {
        AttackerModelGenerator::new(MockOracle::new(distribution), xy_config()).unwrap()
    }

    fn awaiting(x: i64, y: i64) -> StateVector {
        StateVector::new(vec![1, 0, x, y])
    }

    #[test]
    fn initial_state_is_phase_zero() {
        let gen = generator(vec![]);
        assert_eq!(gen.initial_state().values(), &[0, -1, -1, -1]);
        assert_eq!(gen.initial_states().len(), 1);
        assert!(gen.has_single_initial_state());
        assert_eq!(gen.model_type(), ModelType::Pomdp);
        assert_eq!(gen.var_names(), &["_phase", "_oid", "x", "y"]);
        assert_eq!(gen.var_index("y"), Some(3));
        assert_eq!(gen.observable_vars().len(), 4);
    }

    #[test]
    fn start_aggregates_hidden_differences() {
        let mut gen = generator(vec![
            (configuration(4, 0, 1, 0), 0.5),
            (configuration(7, 0, 1, 0), 0.5),
        ]);
        let init = gen.initial_state();
        gen.explore(&init).unwrap();
        assert_eq!(gen.num_choices().unwrap(), 1);
        assert_eq!(gen.num_transitions(0).unwrap(), 1);
        assert_eq!(gen.transition_target(0, 0).unwrap(), awaiting(1, 0));
        assert_eq!(gen.transition_probability(0, 0).unwrap(), 1.0);
        assert_eq!(gen.choice_action(0).unwrap(), None);
        assert_eq!(gen.transition_action(0, 0).unwrap(), None);
        assert_eq!(gen.oracle().horizons, vec![30]);
    }

    #[test]
    fn start_skips_zero_probability_configurations() {
        let mut gen = generator(vec![
            (configuration(0, 0, 0, 0), 0.0),
            (configuration(1, 1, 0, 1), 0.25),
            (configuration(2, 2, 1, 1), 0.75),
        ]);
        let init = gen.initial_state();
        gen.explore(&init).unwrap();
        assert_eq!(gen.num_transitions(0).unwrap(), 2);
        let total: f64 = (0..2)
            .map(|o| gen.transition_probability(0, o).unwrap())
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(
            gen.transition_target(0, 0).unwrap(),
            StateVector::new(vec![1, 1, 0, 1])
        );
    }

    #[test]
    fn truncated_mass_is_not_redistributed() {
        let mut gen = generator(vec![
            (configuration(1, 0, 0, 0), 0.3),
            (configuration(2, 1, 1, 1), 0.5),
        ]);
        let init = gen.initial_state();
        gen.explore(&init).unwrap();
        assert_eq!(gen.transition_probability(0, 0).unwrap(), 0.3);
        assert_eq!(gen.transition_probability(0, 1).unwrap(), 0.5);
    }

    #[test]
    fn unassigned_secrets_survive_truncation() {
        let mut gen = generator(vec![
            (configuration(2, 0, 1, 0), 0.9),
            (
                ProgramConfiguration {
                    secrets: vec![Some(1), None],
                    ..configuration(7, 0, 1, 0)
                },
                0.1,
            ),
        ]);
        let init = gen.initial_state();
        gen.explore(&init).unwrap();
        assert_eq!(gen.num_transitions(0).unwrap(), 2);
        assert_eq!(gen.transition_target(0, 0).unwrap(), awaiting(1, 0));
        assert_eq!(gen.transition_probability(0, 0).unwrap(), 0.9);
        let unassigned = gen.transition_target(0, 1).unwrap();
        assert_eq!(unassigned, StateVector::new(vec![1, 0, 1, UNSET_SECRET]));
        assert_eq!(gen.transition_probability(0, 1).unwrap(), 0.1);

        // No guess of y can be right while y is unassigned.
        gen.explore(&unassigned).unwrap();
        let flags: Vec<Vec<i64>> = (0..4)
            .map(|c| gen.transition_target(c, 0).unwrap().values()[2..].to_vec())
            .collect();
        assert_eq!(flags, vec![vec![0, 0], vec![0, 0], vec![1, 0], vec![1, 0]]);
    }

    #[test]
    fn start_recomputed_on_each_exploration() {
        let mut gen = generator(vec![(configuration(1, 0, 0, 0), 1.0)]);
        let init = gen.initial_state();
        gen.explore(&init).unwrap();
        gen.explore(&init).unwrap();
        assert_eq!(gen.oracle().calls, 2);
        gen.explore(&awaiting(0, 0)).unwrap();
        assert_eq!(gen.oracle().calls, 2);
    }

    #[test]
    fn awaiting_guess_offers_every_guess() {
        let mut gen = generator(vec![]);
        gen.explore(&awaiting(1, 0)).unwrap();
        assert_eq!(gen.num_choices().unwrap(), 4);
        let labels: Vec<String> = (0..4)
            .map(|c| gen.choice_action(c).unwrap().unwrap())
            .collect();
        assert_eq!(labels, vec!["x=0,y=0", "x=0,y=1", "x=1,y=0", "x=1,y=1"]);
        for c in 0..4 {
            assert_eq!(gen.num_transitions(c).unwrap(), 1);
            assert_eq!(gen.transition_probability(c, 0).unwrap(), 1.0);
            assert_eq!(
                gen.transition_action(c, 0).unwrap(),
                gen.choice_action(c).unwrap()
            );
        }
    }

    #[test]
    fn guesses_are_scored_per_secret() {
        let mut gen = generator(vec![]);
        gen.explore(&awaiting(1, 0)).unwrap();
        // x=1,y=0 is choice 2, x=0,y=0 is choice 0.
        assert_eq!(
            gen.transition_target(2, 0).unwrap(),
            StateVector::new(vec![2, -1, 1, 1])
        );
        assert_eq!(
            gen.transition_target(0, 0).unwrap(),
            StateVector::new(vec![2, -1, 0, 1])
        );
        assert_eq!(
            gen.transition_target(3, 0).unwrap(),
            StateVector::new(vec![2, -1, 1, 0])
        );
    }

    #[test]
    fn resolved_state_loops() {
        let mut gen = generator(vec![]);
        let resolved = StateVector::new(vec![2, -1, 1, 0]);
        gen.explore(&resolved).unwrap();
        assert_eq!(gen.num_choices().unwrap(), 1);
        assert_eq!(gen.num_transitions(0).unwrap(), 1);
        assert_eq!(gen.transition_target(0, 0).unwrap(), resolved);
        assert_eq!(gen.transition_probability(0, 0).unwrap(), 1.0);
        assert_eq!(gen.choice_action(0).unwrap(), None);
        assert_eq!(
            gen.explored(),
            Some(&AttackerState::Resolved(GuessOutcome {
                correct: vec![true, false]
            }))
        );
    }

    #[test]
    fn resolved_vectors_must_be_canonical() {
        let mut gen = generator(vec![]);
        assert!(matches!(
            gen.explore(&StateVector::new(vec![2, 7, 1, 0])),
            Err(AttackerModelError::MalformedVector { .. })
        ));
        assert!(gen.explored_state().is_none());
    }

    #[test]
    fn last_explored_wins() {
        let mut gen = generator(vec![]);
        gen.explore(&awaiting(0, 1)).unwrap();
        assert_eq!(gen.num_choices().unwrap(), 4);
        let resolved = StateVector::new(vec![2, -1, 0, 0]);
        gen.explore(&resolved).unwrap();
        assert_eq!(gen.num_choices().unwrap(), 1);
        assert_eq!(gen.explored_state(), Some(&resolved));
    }

    #[test]
    fn queries_before_explore_fail() {
        let gen = generator(vec![]);
        assert!(matches!(
            gen.num_choices(),
            Err(AttackerModelError::NotExplored)
        ));
        assert!(matches!(
            gen.transition_target(0, 0),
            Err(AttackerModelError::NotExplored)
        ));
        assert!(gen.explored_state().is_none());
    }

    #[test]
    fn out_of_range_queries_fail() {
        let mut gen = generator(vec![]);
        gen.explore(&awaiting(0, 0)).unwrap();
        assert!(matches!(
            gen.choice_action(4),
            Err(AttackerModelError::ChoiceOutOfRange {
                choice: 4,
                count: 4,
            })
        ));
        assert!(matches!(
            gen.transition_target(1, 1),
            Err(AttackerModelError::TransitionOutOfRange {
                choice: 1,
                offset: 1,
                count: 1,
            })
        ));
    }

    #[test]
    fn oracle_failure_is_fatal_and_leaves_nothing_explored() {
        let mut gen = AttackerModelGenerator::new(MockOracle::failing(), xy_config()).unwrap();
        gen.explore(&awaiting(0, 0)).unwrap();
        let init = gen.initial_state();
        let err = gen.explore(&init).unwrap_err();
        assert!(matches!(err, AttackerModelError::Oracle(_)));
        assert!(err.to_string().contains("model not built"));
        assert!(gen.explored_state().is_none());
        assert!(matches!(
            gen.num_choices(),
            Err(AttackerModelError::NotExplored)
        ));
    }

    #[test]
    fn malformed_oracle_configuration_is_reported() {
        let mut gen = generator(vec![(
            ProgramConfiguration {
                context_id: 3,
                observations: 0,
                elapsed_time: Some(5),
                power: None,
                secrets: vec![Some(0), Some(0)],
            },
            1.0,
        )]);
        let init = gen.initial_state();
        assert!(matches!(
            gen.explore(&init),
            Err(AttackerModelError::MalformedConfiguration {
                context_id: 3,
                ..
            })
        ));
    }

    #[test]
    fn malformed_vector_rejected() {
        let mut gen = generator(vec![]);
        assert!(matches!(
            gen.explore(&StateVector::new(vec![1, 0, 0])),
            Err(AttackerModelError::MalformedVector { .. })
        ));
    }

    #[test]
    fn constants_and_labels_rejected() {
        let mut gen = generator(vec![]);
        gen.set_some_undefined_constants(&[]).unwrap();
        assert!(matches!(
            gen.set_some_undefined_constants(&[("n".to_string(), 3)]),
            Err(AttackerModelError::ConstantsNotSupported)
        ));
        assert!(gen.constant_values().is_empty());
        assert_eq!(gen.num_labels(), 0);
        assert!(gen.label_index("done").is_none());
        assert!(matches!(
            gen.is_label_true("done"),
            Err(AttackerModelError::UnknownLabel(_))
        ));
        assert!(gen.label_name(0).is_err());
    }

    #[test]
    fn time_and_power_carried_into_awaiting_guess() {
        let config = AttackerModelConfig::new(vec![SecretVariable::new("k", 0, 3)], 12)
            .with_time(true)
            .with_power(true);
        let oracle = MockOracle::new(vec![
            (
                ProgramConfiguration {
                    context_id: 1,
                    observations: 5,
                    elapsed_time: Some(40),
                    power: Some(9),
                    secrets: vec![Some(2)],
                },
                0.5,
            ),
            (
                ProgramConfiguration {
                    context_id: 2,
                    observations: 5,
                    elapsed_time: Some(41),
                    power: Some(9),
                    secrets: vec![Some(2)],
                },
                0.5,
            ),
        ]);
        let mut gen = AttackerModelGenerator::new(oracle, config).unwrap();
        assert_eq!(gen.horizon(), 12);
        let init = gen.initial_state();
        assert_eq!(init.values(), &[0, -1, -1, -1, -1]);
        gen.explore(&init).unwrap();
        // Different elapsed times are distinguishable, so nothing merges.
        assert_eq!(gen.num_transitions(0).unwrap(), 2);
        assert_eq!(
            gen.transition_target(0, 1).unwrap(),
            StateVector::new(vec![1, 5, 41, 9, 2])
        );
        gen.explore(&StateVector::new(vec![1, 5, 41, 9, 2])).unwrap();
        assert_eq!(gen.num_choices().unwrap(), 4);
        assert_eq!(
            gen.transition_target(2, 0).unwrap(),
            StateVector::new(vec![2, -1, -1, -1, 1])
        );
    }

    #[test]
    fn config_from_json_defaults_tracking_off() {
        let config: AttackerModelConfig = serde_json::from_str(
            r#"{"secrets": [{"name": "k", "domain": {"lo": 0, "hi": 7}}], "horizon": 12}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            AttackerModelConfig::new(vec![SecretVariable::new("k", 0, 7)], 12)
        );
        let json = serde_json::to_value(config.with_power(true)).unwrap();
        assert_eq!(json["track_power"], true);
        assert_eq!(json["track_time"], false);
    }

    #[test]
    fn empty_domain_rejected_at_construction() {
        let config = AttackerModelConfig::new(vec![SecretVariable::new("x", 1, 0)], 30);
        assert!(matches!(
            AttackerModelGenerator::new(MockOracle::new(vec![]), config),
            Err(AttackerModelError::EmptyDomain { .. })
        ));
    }

    use crate::proptest_generators::arb_terminal_distribution;
    use proptest::prelude::*;
    use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence, RngAlgorithm};

    fn generator_proptest_config() -> ProptestConfig {
        ProptestConfig {
            cases: 64,
            source_file: Some(file!()),
            failure_persistence: Some(Box::new(FileFailurePersistence::WithSource(
                "proptest-regressions",
            ))),
            rng_algorithm: RngAlgorithm::ChaCha,
            ..ProptestConfig::default()
        }
    }

    proptest! {
        #![proptest_config(generator_proptest_config())]

        /// Start successors are distinct phase-1 states whose mass sums to 1.
        #[test]
        fn start_successors_are_a_distribution((secrets, distribution) in arb_terminal_distribution()) {
            let config = AttackerModelConfig::new(secrets, 30);
            let mut gen = AttackerModelGenerator::new(MockOracle::new(distribution), config).unwrap();
            let init = gen.initial_state();
            gen.explore(&init).unwrap();
            prop_assert_eq!(gen.num_choices().unwrap(), 1);
            let count = gen.num_transitions(0).unwrap();
            let mut total = 0.0;
            let mut targets = std::collections::HashSet::new();
            for offset in 0..count {
                let target = gen.transition_target(0, offset).unwrap();
                prop_assert_eq!(target.get(0), Some(1));
                prop_assert!(targets.insert(target));
                total += gen.transition_probability(0, offset).unwrap();
            }
            prop_assert!((total - 1.0).abs() < 1e-9);
        }

        /// Exactly one guess from every awaiting-guess state is fully correct.
        #[test]
        fn exactly_one_guess_is_fully_correct((secrets, distribution) in arb_terminal_distribution()) {
            let config = AttackerModelConfig::new(secrets, 30);
            let mut gen = AttackerModelGenerator::new(MockOracle::new(distribution), config).unwrap();
            let init = gen.initial_state();
            gen.explore(&init).unwrap();
            let awaiting: Vec<StateVector> = (0..gen.num_transitions(0).unwrap())
                .map(|o| gen.transition_target(0, o).unwrap())
                .collect();
            for state in awaiting {
                gen.explore(&state).unwrap();
                let choices = gen.num_choices().unwrap();
                prop_assert_eq!(choices, gen.enumerator().size());
                let mut fully_correct = 0;
                for choice in 0..choices {
                    let target = gen.transition_target(choice, 0).unwrap();
                    let decoded = AttackerState::decode(gen.schema(), &target).unwrap();
                    match decoded {
                        AttackerState::Resolved(outcome) if outcome.all_correct() => fully_correct += 1,
                        AttackerState::Resolved(_) => {}
                        other => prop_assert!(false, "unexpected successor {:?}", other),
                    }
                }
                prop_assert_eq!(fully_correct, 1);
            }
        }
    }
}
