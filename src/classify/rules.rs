//! Ordered match rules, membership modes and fallbacks.

use super::predicate::{Contains, ExactLabel, Predicate, WholeWord};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved catch-all bucket name.
pub const OTHERS: &str = "Others";

/// One bucket with its matcher and an optional exclusion.
///
/// A rule applies when the matcher accepts the labels and the exclusion, if
/// any, does not.
pub struct MatchRule {
    bucket: String,
    matcher: Box<dyn Predicate>,
    exclusion: Option<Box<dyn Predicate>>,
}

impl MatchRule {
    /// Create a rule routing matching records to `bucket`.
    pub fn new<P: Predicate + 'static>(bucket: &str, matcher: P) -> Self {
        Self {
            bucket: bucket.to_string(),
            matcher: Box::new(matcher),
            exclusion: None,
        }
    }

    /// Suppress this rule for records the exclusion matches.
    pub fn excluding<P: Predicate + 'static>(mut self, exclusion: P) -> Self {
        self.exclusion = Some(Box::new(exclusion));
        self
    }

    /// Target bucket.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Whether this rule claims the given labels.
    pub fn applies(&self, labels: &[&str]) -> bool {
        self.matcher.matches(labels)
            && !self
                .exclusion
                .as_ref()
                .is_some_and(|exclusion| exclusion.matches(labels))
    }
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchRule")
            .field("bucket", &self.bucket)
            .field("has_exclusion", &self.exclusion.is_some())
            .finish()
    }
}

/// How a label is split into tokens in multi-membership mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tokenizer {
    /// Every non-whitespace character is a token (COG letter strings).
    Chars,
    /// Tokens are separated by a delimiter and trimmed.
    Delimited(String),
}

impl Tokenizer {
    /// Split a label into tokens.
    pub fn split<'a>(&self, label: &'a str) -> Vec<&'a str> {
        match self {
            Tokenizer::Chars => label
                .char_indices()
                .filter(|(_, c)| !c.is_whitespace())
                .map(|(i, c)| &label[i..i + c.len_utf8()])
                .collect(),
            Tokenizer::Delimited(delimiter) => label
                .split(delimiter.as_str())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

/// How many buckets a record may contribute to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Membership {
    /// Each record goes to the first applicable rule, or the fallback.
    #[default]
    Exclusive,
    /// Each token of each label is tested against every rule, and every
    /// applicable rule receives the record's full sample vector.
    ///
    /// Bucket totals are then not a partition of the input: a record with
    /// two matching tokens is counted twice.
    Multi { tokens: Tokenizer },
}

/// Where records or tokens that match no rule go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fallback {
    /// A fixed catch-all bucket.
    Others {
        #[serde(default = "default_others")]
        bucket: String,
    },
    /// The label itself becomes the bucket (categorical ids).
    RawLabel,
    /// The value is dropped and reported.
    Discard,
}

fn default_others() -> String {
    OTHERS.to_string()
}

impl Default for Fallback {
    fn default() -> Self {
        Fallback::Others {
            bucket: default_others(),
        }
    }
}

/// An ordered rule list plus its membership mode and fallback.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<MatchRule>,
    membership: Membership,
    fallback: Fallback,
}

impl RuleSet {
    /// Exclusive first-match rules with an `Others` fallback.
    pub fn new(rules: Vec<MatchRule>) -> Self {
        Self {
            rules,
            membership: Membership::Exclusive,
            fallback: Fallback::default(),
        }
    }

    /// Set the membership mode.
    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }

    /// Set the fallback.
    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    /// Membership mode.
    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    /// Fallback for unmatched values.
    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    /// Bucket of the first rule that applies, in declared order.
    pub fn first_match(&self, labels: &[&str]) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.applies(labels))
            .map(MatchRule::bucket)
    }

    /// Buckets of every rule that applies, in declared order.
    pub fn all_matches<'a>(&'a self, labels: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.applies(labels))
            .map(MatchRule::bucket)
    }
}

/// How a rule's keywords are compared to labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Case-insensitive whole word.
    #[default]
    WholeWord,
    /// Case-sensitive exact label.
    Exact,
    /// Case-insensitive substring.
    Contains,
}

/// Serializable description of a [`MatchRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Target bucket.
    pub bucket: String,
    /// Keywords, any of which claims the record.
    pub keywords: Vec<String>,
    /// How keywords are compared.
    #[serde(rename = "match", default)]
    pub matching: MatchKind,
    /// Keywords that suppress this rule, compared the same way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl RuleSpec {
    /// A rule matching its own bucket name exactly.
    pub fn exact(bucket: &str) -> Self {
        Self::exact_any(bucket, &[bucket])
    }

    /// A rule matching any of `keywords` exactly.
    pub fn exact_any(bucket: &str, keywords: &[&str]) -> Self {
        Self {
            bucket: bucket.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            matching: MatchKind::Exact,
            exclude: Vec::new(),
        }
    }

    /// A rule matching any of `keywords` as whole words.
    pub fn whole_word(bucket: &str, keywords: &[&str]) -> Self {
        Self {
            bucket: bucket.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            matching: MatchKind::WholeWord,
            exclude: Vec::new(),
        }
    }

    /// Add exclusion keywords.
    pub fn excluding(mut self, keywords: &[&str]) -> Self {
        self.exclude = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Build the rule.
    pub fn to_rule(&self) -> Result<MatchRule> {
        let rule = MatchRule::new(&self.bucket, AnyMatcher::build(self.matching, &self.keywords)?);
        if self.exclude.is_empty() {
            Ok(rule)
        } else {
            Ok(rule.excluding(AnyMatcher::build(self.matching, &self.exclude)?))
        }
    }
}

/// Build a rule set from specs.
pub fn build_rules(specs: &[RuleSpec]) -> Result<Vec<MatchRule>> {
    specs.iter().map(RuleSpec::to_rule).collect()
}

enum AnyMatcher {
    WholeWord(WholeWord),
    Exact(ExactLabel),
    Contains(Contains),
}

impl AnyMatcher {
    fn build(kind: MatchKind, keywords: &[String]) -> Result<Self> {
        Ok(match kind {
            MatchKind::WholeWord => AnyMatcher::WholeWord(WholeWord::any_of(keywords)?),
            MatchKind::Exact => AnyMatcher::Exact(ExactLabel::new(keywords)),
            MatchKind::Contains => AnyMatcher::Contains(Contains::new(keywords)),
        })
    }
}

impl Predicate for AnyMatcher {
    fn matches(&self, labels: &[&str]) -> bool {
        match self {
            AnyMatcher::WholeWord(p) => p.matches(labels),
            AnyMatcher::Exact(p) => p.matches(labels),
            AnyMatcher::Contains(p) => p.matches(labels),
        }
    }
}
