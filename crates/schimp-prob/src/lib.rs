#![doc = include_str!("../README.md")]

pub mod function_model;
pub mod pmf;

pub use function_model::{ArgPattern, FunctionModel, FunctionModelError, FunctionModelSet};
pub use pmf::{Cost, CostDistribution, PmfError, ProbabilityMassFunction};
