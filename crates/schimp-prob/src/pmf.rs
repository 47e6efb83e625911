use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::{One, Signed, Zero};
use num::ToPrimitive;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PmfError {
    #[error("probability mass function is already finalised")]
    AlreadyFinalised,
    #[error("probability mass function has not been finalised")]
    NotFinalised,
    #[error("probability mass function has no outcomes")]
    Empty,
    #[error("negative probability weight {0}")]
    NegativeWeight(BigRational),
    #[error("invalid probability weight \"{0}\"")]
    InvalidWeight(String),
    #[error("probabilities sum to {sum}, expected 1 (tolerance {tolerance})")]
    InvalidTotal {
        sum: BigRational,
        tolerance: BigRational,
    },
    #[error("sample point {0} is outside [0, 1)")]
    InvalidSamplePoint(f64),
}

/// Default tolerance on the total mass accepted by [`ProbabilityMassFunction::finalise`]: `1e-9`.
pub fn default_tolerance() -> BigRational {
    BigRational::new(BigInt::one(), BigInt::from(1_000_000_000u64))
}

/// A finite discrete distribution over outcomes of type `T`.
///
/// The distribution is built in two stages. While open, weighted outcomes are
/// accumulated with [`add`](Self::add) / [`add_str`](Self::add_str); adding the
/// same outcome twice sums its weights. [`finalise`](Self::finalise) then
/// checks that the total mass is 1 within a tolerance, rescales the weights so
/// the total is exactly 1, and freezes the distribution. Queries are only
/// available on a finalised distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMassFunction<T: Hash + Eq> {
    weights: IndexMap<T, BigRational>,
    finalised: bool,
}

impl<T: Hash + Eq> Default for ProbabilityMassFunction<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq> ProbabilityMassFunction<T> {
    /// An open distribution with no outcomes.
    pub fn new() -> Self {
        Self {
            weights: IndexMap::new(),
            finalised: false,
        }
    }

    /// An already finalised distribution placing all mass on `outcome`.
    pub fn point(outcome: T) -> Self {
        let mut weights = IndexMap::new();
        weights.insert(outcome, BigRational::one());
        Self {
            weights,
            finalised: true,
        }
    }

    /// Accumulate `weight` onto `outcome`.
    pub fn add(&mut self, outcome: T, weight: BigRational) -> Result<(), PmfError> {
        if self.finalised {
            return Err(PmfError::AlreadyFinalised);
        }
        if weight.is_negative() {
            return Err(PmfError::NegativeWeight(weight));
        }
        *self.weights.entry(outcome).or_insert_with(BigRational::zero) += weight;
        Ok(())
    }

    /// Accumulate a weight written as a decimal (`"0.25"`), integer (`"1"`)
    /// or fraction (`"1/4"`).
    pub fn add_str(&mut self, outcome: T, weight: &str) -> Result<(), PmfError> {
        let weight = parse_weight(weight)?;
        self.add(outcome, weight)
    }

    pub fn is_finalised(&self) -> bool {
        self.finalised
    }

    /// Number of distinct outcomes added so far, including zero-weight ones.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Total accumulated mass. Available before finalisation.
    pub fn total(&self) -> BigRational {
        self.weights
            .values()
            .fold(BigRational::zero(), |acc, w| acc + w)
    }

    /// Validate and freeze with the [`default_tolerance`].
    pub fn finalise(&mut self) -> Result<(), PmfError> {
        self.finalise_with_tolerance(&default_tolerance())
    }

    /// Validate that the total mass is within `tolerance` of 1, normalize the
    /// weights to sum to exactly 1 and freeze the distribution.
    ///
    /// On error the distribution is left open and unchanged.
    pub fn finalise_with_tolerance(&mut self, tolerance: &BigRational) -> Result<(), PmfError> {
        if self.finalised {
            return Err(PmfError::AlreadyFinalised);
        }
        if self.weights.is_empty() {
            return Err(PmfError::Empty);
        }
        let sum = self.total();
        if (&sum - BigRational::one()).abs() > *tolerance {
            return Err(PmfError::InvalidTotal {
                sum,
                tolerance: tolerance.clone(),
            });
        }
        if !sum.is_one() {
            for weight in self.weights.values_mut() {
                *weight = &*weight / &sum;
            }
        }
        self.finalised = true;
        Ok(())
    }

    fn ensure_finalised(&self) -> Result<(), PmfError> {
        if self.finalised {
            Ok(())
        } else {
            Err(PmfError::NotFinalised)
        }
    }

    /// Exact probability of `outcome` (zero for outcomes never added).
    pub fn probability(&self, outcome: &T) -> Result<BigRational, PmfError> {
        self.ensure_finalised()?;
        Ok(self
            .weights
            .get(outcome)
            .cloned()
            .unwrap_or_else(BigRational::zero))
    }

    /// Outcomes with strictly positive probability, in insertion order.
    pub fn support(&self) -> Result<impl Iterator<Item = &T> + '_, PmfError> {
        self.ensure_finalised()?;
        Ok(self
            .weights
            .iter()
            .filter(|(_, w)| w.is_positive())
            .map(|(outcome, _)| outcome))
    }

    /// All `(outcome, probability)` pairs in insertion order.
    pub fn iter(&self) -> Result<impl Iterator<Item = (&T, &BigRational)> + '_, PmfError> {
        self.ensure_finalised()?;
        Ok(self.weights.iter())
    }

    /// Exact expectation of `f` over the distribution.
    pub fn expectation<F>(&self, f: F) -> Result<BigRational, PmfError>
    where
        F: Fn(&T) -> BigRational,
    {
        self.ensure_finalised()?;
        Ok(self
            .weights
            .iter()
            .fold(BigRational::zero(), |acc, (outcome, w)| acc + f(outcome) * w))
    }

    /// Map a uniform sample point `u ∈ [0, 1)` to an outcome by inverse CDF
    /// over insertion order.
    pub fn sample(&self, u: f64) -> Result<&T, PmfError> {
        self.ensure_finalised()?;
        if !(0.0..1.0).contains(&u) {
            return Err(PmfError::InvalidSamplePoint(u));
        }
        let point = BigRational::from_float(u).ok_or(PmfError::InvalidSamplePoint(u))?;
        let mut cumulative = BigRational::zero();
        let mut last = None;
        for (outcome, weight) in self.weights.iter().filter(|(_, w)| w.is_positive()) {
            cumulative += weight;
            if point < cumulative {
                return Ok(outcome);
            }
            last = Some(outcome);
        }
        last.ok_or(PmfError::Empty)
    }
}

impl<T: Hash + Eq + fmt::Display> fmt::Display for ProbabilityMassFunction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (outcome, weight)) in self.weights.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{outcome}: {weight}")?;
        }
        write!(f, "}}")
    }
}

/// Parse a probability weight from decimal, integer or `n/d` fraction text.
pub fn parse_weight(text: &str) -> Result<BigRational, PmfError> {
    let invalid = || PmfError::InvalidWeight(text.to_string());
    let trimmed = text.trim();
    if let Some((numer, denom)) = trimmed.split_once('/') {
        let (numer, denom) = (numer.trim(), denom.trim());
        if !is_integer_text(numer) || !is_integer_text(denom) {
            return Err(invalid());
        }
        let numer: BigInt = numer.parse().map_err(|_| invalid())?;
        let denom: BigInt = denom.parse().map_err(|_| invalid())?;
        if denom.is_zero() {
            return Err(invalid());
        }
        return Ok(BigRational::new(numer, denom));
    }
    let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let int_digits = int_part.strip_prefix(['+', '-']).unwrap_or(int_part);
    if !int_digits.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
        || (int_digits.is_empty() && frac_part.is_empty())
    {
        return Err(invalid());
    }
    let numer: BigInt = format!("{int_part}{frac_part}")
        .parse()
        .map_err(|_| invalid())?;
    let denom = num::pow(BigInt::from(10u32), frac_part.len());
    Ok(BigRational::new(numer, denom))
}

/// An optionally signed run of ASCII digits. `BigInt`'s own parser also
/// accepts `_` separators.
fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Lossy conversion used only for reporting.
pub fn rational_to_f64(r: &BigRational) -> f64 {
    if let Some(v) = r.to_f64() {
        return v;
    }
    let n = r.numer().to_f64().unwrap_or(f64::INFINITY);
    let d = r.denom().to_f64().unwrap_or(1.0);
    n / d
}

/// Time and power consumed by one modelled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cost {
    pub time: i64,
    pub power: i64,
}

impl Cost {
    pub fn new(time: i64, power: i64) -> Self {
        Self { time, power }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.time, self.power)
    }
}

/// Distribution over the cost of an external function call.
pub type CostDistribution = ProbabilityMassFunction<Cost>;

impl ProbabilityMassFunction<Cost> {
    pub fn expected_time(&self) -> Result<f64, PmfError> {
        let e = self.expectation(|c| BigRational::from_integer(BigInt::from(c.time)))?;
        Ok(rational_to_f64(&e))
    }

    pub fn expected_power(&self) -> Result<f64, PmfError> {
        let e = self.expectation(|c| BigRational::from_integer(BigInt::from(c.power)))?;
        Ok(rational_to_f64(&e))
    }
}
