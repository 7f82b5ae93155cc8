//! Rule-based classification of records into buckets.
//!
//! - **predicate**: pluggable label tests (whole word, exact, substring)
//! - **rules**: ordered match rules, membership modes and fallbacks
//! - **aggregate**: per-bucket summation of sample vectors

pub mod aggregate;
pub mod predicate;
pub mod rules;

pub use aggregate::{classify_and_aggregate, Aggregation};
pub use predicate::{AnyOf, Contains, ExactLabel, Predicate, WholeWord};
pub use rules::{
    build_rules, Fallback, MatchKind, MatchRule, Membership, RuleSet, RuleSpec, Tokenizer, OTHERS,
};
