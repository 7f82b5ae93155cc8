//! Classify records into buckets and sum their sample vectors.

use super::rules::{Fallback, Membership, RuleSet, OTHERS};
use crate::data::{BucketTotals, Record, SampleAxis};
use crate::error::Result;
use crate::warning::Warning;
use std::collections::HashMap;

/// Label used when a discarded record has no label at all.
const MISSING_LABEL: &str = "<missing>";

/// Result of classifying and aggregating a set of records.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Summed sample vectors per bucket, in first-touched order.
    pub totals: BucketTotals,
    /// Number of contributions per bucket (records, or tokens in multi mode).
    pub counts: HashMap<String, usize>,
    /// Labels dropped by a `Discard` fallback with their occurrence counts.
    pub discarded: Vec<(String, usize)>,
    /// Labels routed to a catch-all bucket with their occurrence counts.
    pub unmatched: Vec<(String, usize)>,
    /// Warnings raised while aggregating.
    pub warnings: Vec<Warning>,
}

impl Aggregation {
    /// Number of contributions routed to a bucket.
    pub fn count(&self, bucket: &str) -> usize {
        self.counts.get(bucket).copied().unwrap_or(0)
    }
}

struct Accumulator<'r> {
    totals: BucketTotals,
    counts: HashMap<String, usize>,
    discarded: Vec<(String, usize)>,
    unmatched: Vec<(String, usize)>,
    fallback: &'r Fallback,
}

fn tally(seen: &mut Vec<(String, usize)>, label: &str) {
    match seen.iter_mut().find(|(l, _)| l == label) {
        Some((_, n)) => *n += 1,
        None => seen.push((label.to_string(), 1)),
    }
}

impl<'r> Accumulator<'r> {
    fn add(&mut self, bucket: &str, values: &[f64]) -> Result<()> {
        self.totals.add(bucket, values)?;
        *self.counts.entry(bucket.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn fall_back(&mut self, label: Option<&str>, values: &[f64]) -> Result<()> {
        let fallback = self.fallback;
        match (fallback, label) {
            (Fallback::Others { bucket }, _) => {
                tally(&mut self.unmatched, label.unwrap_or(MISSING_LABEL));
                self.add(bucket, values)
            }
            (Fallback::RawLabel, Some(label)) => self.add(label, values),
            (Fallback::RawLabel, None) => {
                tally(&mut self.unmatched, MISSING_LABEL);
                self.add(OTHERS, values)
            }
            (Fallback::Discard, _) => {
                tally(&mut self.discarded, label.unwrap_or(MISSING_LABEL));
                Ok(())
            }
        }
    }
}

/// Assign every record to its bucket(s) and sum sample vectors per bucket.
///
/// In exclusive mode each record lands in exactly one bucket: the first rule
/// that applies, else the fallback. A record without any label never matches.
/// In multi-membership mode every token of every label is tested against all
/// rules and each applicable rule receives the full record vector. A record
/// that yields no tokens goes to the fallback whole.
///
/// Every fallback outcome is reported: each distinct label sent to the
/// catch-all bucket or discarded produces one counted warning.
///
/// # Errors
/// `DimensionMismatch` if a record's sample vector does not match the axis.
pub fn classify_and_aggregate(
    records: &[Record],
    axis: &SampleAxis,
    rules: &RuleSet,
) -> Result<Aggregation> {
    let mut acc = Accumulator {
        totals: BucketTotals::new(axis.len()),
        counts: HashMap::new(),
        discarded: Vec::new(),
        unmatched: Vec::new(),
        fallback: rules.fallback(),
    };

    for record in records {
        let labels = record.labels();
        let values = record.values();

        match rules.membership() {
            Membership::Exclusive => match rules.first_match(&labels) {
                Some(bucket) => acc.add(bucket, values)?,
                None => acc.fall_back(record.first_label(), values)?,
            },
            Membership::Multi { tokens } => {
                let mut n_tokens = 0;
                for label in &labels {
                    for token in tokens.split(label) {
                        n_tokens += 1;
                        let single = [token];
                        let mut matched = false;
                        for bucket in rules.all_matches(&single) {
                            acc.add(bucket, values)?;
                            matched = true;
                        }
                        if !matched {
                            acc.fall_back(Some(token), values)?;
                        }
                    }
                }
                if n_tokens == 0 {
                    acc.fall_back(record.first_label(), values)?;
                }
            }
        }
    }

    let catch_all = match rules.fallback() {
        Fallback::Others { bucket } => bucket.as_str(),
        _ => OTHERS,
    };
    let warnings: Vec<Warning> = acc
        .unmatched
        .iter()
        .map(|(label, occurrences)| Warning::UnmatchedLabel {
            label: label.clone(),
            bucket: catch_all.to_string(),
            occurrences: *occurrences,
        })
        .chain(
            acc.discarded
                .iter()
                .map(|(label, occurrences)| Warning::DiscardedLabel {
                    label: label.clone(),
                    occurrences: *occurrences,
                }),
        )
        .collect();
    for warning in &warnings {
        warning.emit();
    }

    for bucket in acc.totals.buckets() {
        tracing::debug!(
            "Bucket '{}' received {} contributions",
            bucket,
            acc.counts.get(bucket).copied().unwrap_or(0)
        );
    }

    Ok(Aggregation {
        totals: acc.totals,
        counts: acc.counts,
        discarded: acc.discarded,
        unmatched: acc.unmatched,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::rules::{build_rules, RuleSpec, Tokenizer};
    use approx::assert_relative_eq;

    fn axis() -> SampleAxis {
        SampleAxis::new(&["A", "B"]).unwrap()
    }

    fn taxon_rules() -> RuleSet {
        let specs = vec![
            RuleSpec::whole_word("Deltaproteobacteria", &["deltaproteobacteria"]),
            RuleSpec::whole_word("Anaerolineae", &["anaerolineae"]),
            RuleSpec::whole_word("Dehalococcoidia", &["dehalococcoidia"]),
            RuleSpec::whole_word("Other Chloroflexi", &["chloroflexi"])
                .excluding(&["anaerolineae", "dehalococcoidia"]),
            RuleSpec::whole_word("Firmicutes", &["firmicutes"]),
        ];
        RuleSet::new(build_rules(&specs).unwrap())
    }

    #[test]
    fn test_exclusive_conserves_total() {
        let records = vec![
            Record::labelled("Deltaproteobacteria", vec![10.0, 0.0]),
            Record::labelled("Firmicutes", vec![10.0, 10.0]),
            Record::labelled("Euryarchaeota", vec![1.5, 2.5]),
            Record::new(vec![None], vec![3.0, 0.0]),
        ];
        let agg = classify_and_aggregate(&records, &axis(), &taxon_rules()).unwrap();

        assert_eq!(
            agg.totals.buckets(),
            &["Deltaproteobacteria", "Firmicutes", "Others"]
        );
        assert_eq!(agg.totals.get("Others"), Some(&[4.5, 2.5][..]));
        assert_eq!(agg.count("Others"), 2);
        let input: f64 = records.iter().map(Record::total).sum();
        assert_relative_eq!(agg.totals.grand_total(), input);
        assert_eq!(
            agg.unmatched,
            vec![("Euryarchaeota".to_string(), 1), ("<missing>".to_string(), 1)]
        );
    }

    #[test]
    fn test_others_fallback_warns_per_label() {
        let rules = RuleSet::new(build_rules(&[RuleSpec::exact("Firmicutes")]).unwrap());
        let records = vec![
            Record::labelled("Weird taxon", vec![1.0, 0.0]),
            Record::labelled("Firmicutes", vec![3.0, 3.0]),
            Record::labelled("Weird taxon", vec![1.0, 2.0]),
        ];
        let agg = classify_and_aggregate(&records, &axis(), &rules).unwrap();

        assert_eq!(agg.totals.get(OTHERS), Some(&[2.0, 2.0][..]));
        assert_eq!(
            agg.warnings,
            vec![Warning::UnmatchedLabel {
                label: "Weird taxon".into(),
                bucket: OTHERS.into(),
                occurrences: 2
            }]
        );
    }

    #[test]
    fn test_multi_membership_record_without_tokens_falls_back() {
        let rules = RuleSet::new(build_rules(&[RuleSpec::exact("C")]).unwrap()).with_membership(
            Membership::Multi {
                tokens: Tokenizer::Delimited(";".into()),
            },
        );
        let records = vec![
            Record::labelled(";;", vec![7.0, 0.0]),
            Record::labelled("C", vec![1.0, 1.0]),
        ];
        let agg = classify_and_aggregate(&records, &axis(), &rules).unwrap();

        assert_eq!(agg.totals.get(OTHERS), Some(&[7.0, 0.0][..]));
        assert_relative_eq!(agg.totals.grand_total(), 9.0);
        assert_eq!(
            agg.warnings,
            vec![Warning::UnmatchedLabel {
                label: ";;".into(),
                bucket: OTHERS.into(),
                occurrences: 1
            }]
        );
    }

    #[test]
    fn test_child_clade_wins_over_parent() {
        let records = vec![
            Record::new(
                vec![Some("Chloroflexi".into()), Some("Anaerolineae".into())],
                vec![1.0, 1.0],
            ),
            Record::new(
                vec![Some("Chloroflexi".into()), Some("Dehalococcoidia".into())],
                vec![2.0, 2.0],
            ),
            Record::labelled("Chloroflexi", vec![4.0, 4.0]),
        ];
        let agg = classify_and_aggregate(&records, &axis(), &taxon_rules()).unwrap();

        assert_eq!(agg.totals.get("Anaerolineae"), Some(&[1.0, 1.0][..]));
        assert_eq!(agg.totals.get("Dehalococcoidia"), Some(&[2.0, 2.0][..]));
        assert_eq!(agg.totals.get("Other Chloroflexi"), Some(&[4.0, 4.0][..]));
    }

    #[test]
    fn test_raw_label_fallback() {
        let rules = RuleSet::new(Vec::new()).with_fallback(Fallback::RawLabel);
        let records = vec![
            Record::labelled("1B", vec![1.0, 0.0]),
            Record::labelled("5H", vec![2.0, 2.0]),
            Record::labelled("1B", vec![1.0, 3.0]),
        ];
        let agg = classify_and_aggregate(&records, &axis(), &rules).unwrap();
        assert_eq!(agg.totals.buckets(), &["1B", "5H"]);
        assert_eq!(agg.totals.get("1B"), Some(&[2.0, 3.0][..]));
    }

    #[test]
    fn test_multi_membership_counts_every_token() {
        let specs = vec![
            RuleSpec::exact("C"),
            RuleSpec::exact("E"),
            RuleSpec::exact_any("CELLULAR", &["D", "T", "M"]),
        ];
        let rules = RuleSet::new(build_rules(&specs).unwrap())
            .with_membership(Membership::Multi {
                tokens: Tokenizer::Chars,
            })
            .with_fallback(Fallback::Discard);
        let records = vec![
            Record::labelled("CE", vec![1.0, 2.0]),
            Record::labelled("DT", vec![10.0, 0.0]),
            Record::labelled("R", vec![5.0, 5.0]),
        ];
        let agg = classify_and_aggregate(&records, &axis(), &rules).unwrap();

        assert_eq!(agg.totals.get("C"), Some(&[1.0, 2.0][..]));
        assert_eq!(agg.totals.get("E"), Some(&[1.0, 2.0][..]));
        // One contribution per matching token.
        assert_eq!(agg.totals.get("CELLULAR"), Some(&[20.0, 0.0][..]));
        assert_eq!(agg.discarded, vec![("R".to_string(), 1)]);
        assert_eq!(
            agg.warnings,
            vec![Warning::DiscardedLabel {
                label: "R".into(),
                occurrences: 1
            }]
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let records = vec![Record::labelled("Firmicutes", vec![1.0])];
        assert!(classify_and_aggregate(&records, &axis(), &taxon_rules()).is_err());
    }
}
