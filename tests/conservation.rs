//! Property tests for the classifier-aggregator.

use proptest::prelude::*;
use taxon_buckets::prelude::*;

const LABELS: [&str; 5] = [
    "Bacteria; Firmicutes",
    "Deltaproteobacteria",
    "Chloroflexi; Anaerolineae",
    "Chloroflexi",
    "unclassified",
];

fn samples() -> SampleAxis {
    SampleAxis::new(&["3_cm", "40_cm", "153_cm"]).unwrap()
}

fn taxon_rules() -> RuleSet {
    RuleSet::new(
        build_rules(&[
            RuleSpec::whole_word("Firmicutes", &["firmicutes"]),
            RuleSpec::whole_word("Anaerolineae", &["anaerolineae"]),
            RuleSpec::whole_word("Other Chloroflexi", &["chloroflexi"])
                .excluding(&["anaerolineae"]),
        ])
        .unwrap(),
    )
}

fn cog_rules() -> RuleSet {
    RuleSet::new(
        build_rules(&[
            RuleSpec::exact("E"),
            RuleSpec::exact("C"),
            RuleSpec::exact_any("INFORMATION", &["J", "K"]),
        ])
        .unwrap(),
    )
    .with_membership(Membership::Multi {
        tokens: Tokenizer::Chars,
    })
    .with_fallback(Fallback::Discard)
}

fn values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..1000.0, 3)
}

proptest! {
    #[test]
    fn exclusive_with_others_conserves_total(
        rows in prop::collection::vec((0usize..=LABELS.len(), values()), 0..40)
    ) {
        let records: Vec<Record> = rows
            .iter()
            .map(|(label, v)| match LABELS.get(*label) {
                Some(label) => Record::labelled(label, v.clone()),
                None => Record::new(vec![None], v.clone()),
            })
            .collect();

        let agg = classify_and_aggregate(&records, &samples(), &taxon_rules()).unwrap();

        let input: Vec<f64> = (0..3)
            .map(|j| records.iter().map(|r| r.values()[j]).sum())
            .collect();
        for (total, expected) in agg.totals.column_totals().iter().zip(&input) {
            prop_assert!((total - expected).abs() <= 1e-9 * expected.max(1.0));
        }
        prop_assert_eq!(agg.counts.values().sum::<usize>(), records.len());
    }

    #[test]
    fn child_clade_never_lands_in_parent(
        rows in prop::collection::vec((0usize..LABELS.len(), values()), 1..40)
    ) {
        let records: Vec<Record> = rows
            .iter()
            .map(|(label, v)| Record::labelled(LABELS[*label], v.clone()))
            .collect();
        let agg = classify_and_aggregate(&records, &samples(), &taxon_rules()).unwrap();

        let plain_chloroflexi = rows.iter().filter(|(label, _)| *label == 3).count();
        prop_assert_eq!(agg.count("Other Chloroflexi"), plain_chloroflexi);
    }

    #[test]
    fn multi_membership_counts_each_matching_token(
        rows in prop::collection::vec(("[ECJKR]{1,6}", values()), 0..30)
    ) {
        let records: Vec<Record> = rows
            .iter()
            .map(|(letters, v)| Record::labelled(letters, v.clone()))
            .collect();

        let agg = classify_and_aggregate(&records, &samples(), &cog_rules()).unwrap();

        let expected: f64 = rows
            .iter()
            .map(|(letters, v)| {
                let hits = letters.chars().filter(|c| "ECJK".contains(*c)).count();
                hits as f64 * v.iter().sum::<f64>()
            })
            .sum();
        let total = agg.totals.grand_total();
        prop_assert!((total - expected).abs() <= 1e-9 * expected.max(1.0));

        let discarded: usize = agg.discarded.iter().map(|(_, n)| n).sum();
        let r_tokens: usize = rows.iter().map(|(l, _)| l.matches('R').count()).sum();
        prop_assert_eq!(discarded, r_tokens);
    }
}
