use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::pmf::{CostDistribution, PmfError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionModelError {
    #[error("function model {name}/{arity}: pattern has {found} arguments")]
    PatternArity {
        name: String,
        arity: usize,
        found: usize,
    },
    #[error("function model {name}/{arity} called with {found} arguments")]
    CallArity {
        name: String,
        arity: usize,
        found: usize,
    },
    #[error("function model {name}/{arity}: cost distribution is not finalised")]
    Unfinalised { name: String, arity: usize },
    #[error("duplicate function model for {name}/{arity}")]
    Duplicate { name: String, arity: usize },
    #[error("Probability mass function error: {0}")]
    Pmf(#[from] PmfError),
}

/// One argument position of a function model case: a concrete value, or
/// `None` for the `_` wildcard.
pub type ArgPattern = Vec<Option<i64>>;

/// Stochastic time/power cost of calling an external function, selected by
/// the call's argument values.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionModel {
    name: String,
    arity: usize,
    cases: Vec<(ArgPattern, CostDistribution)>,
}

impl FunctionModel {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
            cases: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn cases(&self) -> &[(ArgPattern, CostDistribution)] {
        &self.cases
    }

    /// Append a case. Earlier cases take priority in [`lookup`](Self::lookup).
    pub fn add(
        &mut self,
        pattern: ArgPattern,
        cost: CostDistribution,
    ) -> Result<(), FunctionModelError> {
        if pattern.len() != self.arity {
            return Err(FunctionModelError::PatternArity {
                name: self.name.clone(),
                arity: self.arity,
                found: pattern.len(),
            });
        }
        if !cost.is_finalised() {
            return Err(FunctionModelError::Unfinalised {
                name: self.name.clone(),
                arity: self.arity,
            });
        }
        self.cases.push((pattern, cost));
        Ok(())
    }

    /// The cost distribution of the first case matching `args`, if any.
    pub fn lookup(&self, args: &[i64]) -> Result<Option<&CostDistribution>, FunctionModelError> {
        if args.len() != self.arity {
            return Err(FunctionModelError::CallArity {
                name: self.name.clone(),
                arity: self.arity,
                found: args.len(),
            });
        }
        Ok(self
            .cases
            .iter()
            .find(|(pattern, _)| {
                pattern
                    .iter()
                    .zip(args)
                    .all(|(p, a)| p.map_or(true, |v| v == *a))
            })
            .map(|(_, cost)| cost))
    }

    /// Render in cost-model file syntax.
    pub fn to_source_string(&self) -> String {
        let mut out = String::new();
        for (pattern, cost) in &self.cases {
            let args: Vec<String> = pattern
                .iter()
                .map(|p| p.map_or_else(|| "_".to_string(), |v| v.to_string()))
                .collect();
            out.push_str(&format!(
                "{}/{}: ({}) -> {}\n",
                self.name,
                self.arity,
                args.join(", "),
                render_cost(cost)
            ));
        }
        out
    }
}

fn render_cost(cost: &CostDistribution) -> String {
    match cost.iter() {
        Ok(mut entries) => match (entries.next(), cost.len()) {
            (Some((outcome, _)), 1) => outcome.to_string(),
            _ => cost.to_string(),
        },
        Err(_) => cost.to_string(),
    }
}

impl fmt::Display for FunctionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_source_string())
    }
}

/// Function models keyed by `(name, arity)`.
#[derive(Debug, Clone, Default)]
pub struct FunctionModelSet {
    models: IndexMap<(String, usize), FunctionModel>,
}

impl FunctionModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: FunctionModel) -> Result<(), FunctionModelError> {
        let key = (model.name.clone(), model.arity);
        if self.models.contains_key(&key) {
            return Err(FunctionModelError::Duplicate {
                name: key.0,
                arity: key.1,
            });
        }
        self.models.insert(key, model);
        Ok(())
    }

    pub fn get(&self, name: &str, arity: usize) -> Option<&FunctionModel> {
        self.models.get(&(name.to_string(), arity))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionModel> {
        self.models.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pmf::Cost;

    fn two_point(a: Cost, b: Cost) -> CostDistribution {
        let mut pmf = CostDistribution::new();
        pmf.add_str(a, "1/2").unwrap();
        pmf.add_str(b, "1/2").unwrap();
        pmf.finalise().unwrap();
        pmf
    }

    fn modexp() -> FunctionModel {
        let mut model = FunctionModel::new("modexp", 2);
        model
            .add(
                vec![Some(0), None],
                CostDistribution::point(Cost::new(1, 1)),
            )
            .unwrap();
        model
            .add(
                vec![None, None],
                two_point(Cost::new(5, 2), Cost::new(9, 4)),
            )
            .unwrap();
        model
    }

    #[test]
    fn lookup_prefers_first_matching_case() {
        let model = modexp();
        let exact = model.lookup(&[0, 17]).unwrap().unwrap();
        assert_eq!(exact.expected_time().unwrap(), 1.0);
        let fallback = model.lookup(&[3, 17]).unwrap().unwrap();
        assert_eq!(fallback.expected_time().unwrap(), 7.0);
    }

    #[test]
    fn lookup_without_match_is_none() {
        let mut model = FunctionModel::new("f", 1);
        model
            .add(vec![Some(4)], CostDistribution::point(Cost::new(1, 0)))
            .unwrap();
        assert!(model.lookup(&[5]).unwrap().is_none());
    }

    #[test]
    fn arity_mismatches_rejected() {
        let mut model = modexp();
        assert!(matches!(
            model.lookup(&[1]),
            Err(FunctionModelError::CallArity { found: 1, .. })
        ));
        assert!(matches!(
            model.add(vec![None], CostDistribution::point(Cost::new(0, 0))),
            Err(FunctionModelError::PatternArity { found: 1, .. })
        ));
    }

    #[test]
    fn unfinalised_cost_rejected() {
        let mut model = FunctionModel::new("f", 0);
        let mut open = CostDistribution::new();
        open.add_str(Cost::new(1, 1), "1").unwrap();
        assert!(matches!(
            model.add(vec![], open),
            Err(FunctionModelError::Unfinalised { .. })
        ));
    }

    #[test]
    fn duplicate_models_rejected() {
        let mut set = FunctionModelSet::new();
        set.insert(modexp()).unwrap();
        set.insert(FunctionModel::new("modexp", 3)).unwrap();
        assert!(matches!(
            set.insert(FunctionModel::new("modexp", 2)),
            Err(FunctionModelError::Duplicate { arity: 2, .. })
        ));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("modexp", 2).unwrap().cases().len(), 2);
        assert!(set.get("modexp", 1).is_none());
    }

    #[test]
    fn source_rendering() {
        let text = modexp().to_source_string();
        assert_eq!(
            text,
            "modexp/2: (0, _) -> (1, 1)\nmodexp/2: (_, _) -> {(5, 2): 1/2, (9, 4): 1/2}\n"
        );
    }
}
