//! Pluggable label predicates used by match rules and exclusions.
//!
//! A predicate sees every present classification label of a record (or a
//! single token in multi-membership mode) and answers whether it matches.

use crate::error::{BucketError, Result};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// A test on the labels of one record.
pub trait Predicate {
    /// Whether any of `labels` satisfies this predicate.
    fn matches(&self, labels: &[&str]) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&[&str]) -> bool,
{
    fn matches(&self, labels: &[&str]) -> bool {
        self(labels)
    }
}

/// Case-insensitive whole-word keyword match.
///
/// `chloroflexi` matches "Bacteria;Chloroflexi;Anaerolineae" but not
/// "Chloroflexia".
#[derive(Debug, Clone)]
pub struct WholeWord {
    pattern: Regex,
}

impl WholeWord {
    /// Match a single keyword.
    pub fn new(keyword: &str) -> Result<Self> {
        Self::any_of(&[keyword])
    }

    /// Match any of several keywords.
    pub fn any_of<S: AsRef<str>>(keywords: &[S]) -> Result<Self> {
        if keywords.is_empty() {
            return Err(BucketError::InvalidParameter(
                "Whole-word matcher needs at least one keyword".to_string(),
            ));
        }
        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        let source = format!(r"\b(?:{})\b", alternation);
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| BucketError::InvalidPattern {
                pattern: source.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { pattern })
    }
}

impl Predicate for WholeWord {
    fn matches(&self, labels: &[&str]) -> bool {
        labels.iter().any(|l| self.pattern.is_match(l))
    }
}

/// Case-sensitive exact label match against a fixed set.
#[derive(Debug, Clone)]
pub struct ExactLabel {
    values: HashSet<String>,
}

impl ExactLabel {
    /// Match any of the given labels exactly.
    pub fn new<S: AsRef<str>>(values: &[S]) -> Self {
        Self {
            values: values.iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }
}

impl Predicate for ExactLabel {
    fn matches(&self, labels: &[&str]) -> bool {
        labels.iter().any(|l| self.values.contains(*l))
    }
}

/// Case-insensitive substring match.
#[derive(Debug, Clone)]
pub struct Contains {
    needles: Vec<String>,
}

impl Contains {
    /// Match labels containing any of the given substrings.
    pub fn new<S: AsRef<str>>(needles: &[S]) -> Self {
        Self {
            needles: needles.iter().map(|n| n.as_ref().to_lowercase()).collect(),
        }
    }
}

impl Predicate for Contains {
    fn matches(&self, labels: &[&str]) -> bool {
        labels.iter().any(|l| {
            let lower = l.to_lowercase();
            self.needles.iter().any(|n| lower.contains(n.as_str()))
        })
    }
}

/// Matches when any inner predicate matches.
pub struct AnyOf(pub Vec<Box<dyn Predicate>>);

impl Predicate for AnyOf {
    fn matches(&self, labels: &[&str]) -> bool {
        self.0.iter().any(|p| p.matches(labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_word_ignores_case() {
        let p = WholeWord::new("chloroflexi").unwrap();
        assert!(p.matches(&["Bacteria;Chloroflexi;Anaerolineae"]));
        assert!(p.matches(&["CHLOROFLEXI"]));
        assert!(!p.matches(&["Chloroflexia"]));
        assert!(!p.matches(&[]));
    }

    #[test]
    fn test_whole_word_respects_boundaries() {
        let p = WholeWord::new("proteobacteria").unwrap();
        assert!(!p.matches(&["Deltaproteobacteria"]));
        assert!(!p.matches(&["p__Proteobacteria"]));
        assert!(p.matches(&["k__Bacteria; Proteobacteria"]));
    }

    #[test]
    fn test_whole_word_escapes_keywords() {
        let p = WholeWord::any_of(&["cyanobacteria", "chloroplast"]).unwrap();
        assert!(p.matches(&["Chloroplast"]));
        assert!(p.matches(&["x", "Cyanobacteria"]));
        let dotted = WholeWord::new("a.b").unwrap();
        assert!(!dotted.matches(&["axb"]));
        assert!(dotted.matches(&["a.b"]));
    }

    #[test]
    fn test_whole_word_requires_keywords() {
        let empty: [&str; 0] = [];
        assert!(WholeWord::any_of(&empty).is_err());
    }

    #[test]
    fn test_exact_label() {
        let p = ExactLabel::new(&["RpS3", "DsrA"]);
        assert!(p.matches(&["DsrA"]));
        assert!(!p.matches(&["dsra"]));
        assert!(!p.matches(&["DsrAB"]));
    }

    #[test]
    fn test_contains() {
        let p = Contains::new(&["rps3"]);
        assert!(p.matches(&["Ribosomal protein RPS3"]));
        assert!(!p.matches(&["RpL2"]));
    }

    #[test]
    fn test_closure_and_any_of() {
        let short = |labels: &[&str]| labels.iter().any(|l| l.len() == 1);
        let any = AnyOf(vec![
            Box::new(short),
            Box::new(ExactLabel::new(&["Firmicutes"])),
        ]);
        assert!(any.matches(&["E"]));
        assert!(any.matches(&["Firmicutes"]));
        assert!(!any.matches(&["Bacteroidetes"]));
    }
}
