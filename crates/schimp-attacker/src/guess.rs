use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AttackerModelError;

/// Inclusive integer range `[lo, hi]` of values a secret variable may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    pub lo: i64,
    pub hi: i64,
}

impl Domain {
    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Number of values in the range, `None` if it does not fit in `usize`.
    pub fn cardinality(&self) -> Option<usize> {
        if self.is_empty() {
            return Some(0);
        }
        let width = i128::from(self.hi) - i128::from(self.lo) + 1;
        usize::try_from(width).ok()
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lo <= value && value <= self.hi
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// A secret variable the attacker tries to infer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretVariable {
    pub name: String,
    pub domain: Domain,
}

impl SecretVariable {
    pub fn new(name: impl Into<String>, lo: i64, hi: i64) -> Self {
        Self {
            name: name.into(),
            domain: Domain::new(lo, hi),
        }
    }
}

/// One guessed value per secret variable, in declaration order.
///
/// Displays as `name=value` pairs joined by `,`, which is the action label of
/// the corresponding choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuessAssignment {
    names: Arc<[String]>,
    values: Vec<i64>,
}

impl GuessAssignment {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for GuessAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Random-access enumeration of every combination of secret-variable values.
///
/// Index `i` is decoded in mixed radix against the domain cardinalities, with
/// the last-declared variable as the least significant digit, so for
/// `x ∈ [0,1], y ∈ [0,1]` the order is `x=0,y=0`, `x=0,y=1`, `x=1,y=0`,
/// `x=1,y=1`.
#[derive(Debug, Clone)]
pub struct GuessEnumerator {
    names: Arc<[String]>,
    domains: Vec<Domain>,
    radices: Vec<usize>,
    size: usize,
}

impl GuessEnumerator {
    /// Empty domains are rejected, so a successfully built enumerator always
    /// has at least one guess. With no secret variables the single guess is
    /// the empty assignment.
    pub fn new(secrets: &[SecretVariable]) -> Result<Self, AttackerModelError> {
        let mut radices = Vec::with_capacity(secrets.len());
        let mut size: usize = 1;
        for secret in secrets {
            let domain = secret.domain;
            if domain.is_empty() {
                return Err(AttackerModelError::EmptyDomain {
                    name: secret.name.clone(),
                    lo: domain.lo,
                    hi: domain.hi,
                });
            }
            let radix = domain
                .cardinality()
                .ok_or(AttackerModelError::GuessSpaceOverflow)?;
            size = size
                .checked_mul(radix)
                .ok_or(AttackerModelError::GuessSpaceOverflow)?;
            radices.push(radix);
        }
        Ok(Self {
            names: secrets.iter().map(|s| s.name.clone()).collect(),
            domains: secrets.iter().map(|s| s.domain).collect(),
            radices,
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// The `index`-th guess, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<GuessAssignment> {
        if index >= self.size {
            return None;
        }
        let mut rest = index;
        let mut values = vec![0i64; self.domains.len()];
        for pos in (0..self.domains.len()).rev() {
            let radix = self.radices[pos];
            let digit = rest % radix;
            rest /= radix;
            // lo + digit <= hi, so the sum always fits back into i64.
            values[pos] = (i128::from(self.domains[pos].lo) + digit as i128) as i64;
        }
        Some(GuessAssignment {
            names: Arc::clone(&self.names),
            values,
        })
    }

    /// All guesses in index order. Restartable: each call starts from 0.
    pub fn iter(&self) -> impl Iterator<Item = GuessAssignment> + '_ {
        (0..self.size).filter_map(move |i| self.get(i))
    }
}
