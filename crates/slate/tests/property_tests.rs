// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use proptest::prelude::*;
use slate::classify::{GradeBand, LabelMode, agreement_label, classify_grade};
use slate::clean::coerce_value;
use slate::query::{AggregationMode, COUNT, QueryConfig, Resolution, resolve};
use slate::schema::{ColumnPolicy, SurveySchema, normalise_header};
use slate::stats::pearson;
use slate::table::{Column, Table};

proptest! {
    #[test]
    fn classify_is_total_and_deterministic(grade in proptest::option::of(prop::num::f64::ANY)) {
        let band = classify_grade(grade);
        prop_assert!(GradeBand::DISPLAY_ORDER.contains(&band));
        prop_assert_eq!(classify_grade(grade), band);
    }

    #[test]
    fn bands_partition_the_scale(grade in 0.0f64..5.0) {
        let band = classify_grade(Some(grade));
        let expected = if grade <= 1.25 {
            GradeBand::Excellent
        } else if grade <= 1.75 {
            GradeBand::VeryGood
        } else if grade <= 2.25 {
            GradeBand::Good
        } else if grade <= 2.75 {
            GradeBand::Fair
        } else if grade <= 3.00 {
            GradeBand::Pass
        } else {
            GradeBand::Fail
        };
        prop_assert_eq!(band, expected);
    }

    #[test]
    fn agreement_labels_are_distinct_on_the_scale(code in 1i64..=5) {
        let label = agreement_label(Some(code as f64));
        for other in 1i64..=5 {
            if other != code {
                prop_assert_ne!(label, agreement_label(Some(other as f64)));
            }
        }
    }

    #[test]
    fn codes_off_the_scale_are_unknown(code in prop::num::f64::ANY) {
        let on_scale = code.fract() == 0.0 && (1.0..=5.0).contains(&code);
        if !on_scale {
            prop_assert_eq!(
                agreement_label(Some(code)).label(),
                "Unknown"
            );
        }
    }

    #[test]
    fn flag_policy_never_leaves_a_gap(cell in proptest::option::of(".*")) {
        let coerced = coerce_value(cell.as_deref(), ColumnPolicy::FlagFill);
        match cell.as_deref().and_then(|s| s.trim().parse::<f64>().ok()) {
            Some(v) if v.is_nan() => prop_assert!(coerced.is_some_and(f64::is_nan)),
            Some(v) => prop_assert_eq!(coerced, Some(v)),
            None => prop_assert_eq!(coerced, Some(0.0)),
        }
    }

    #[test]
    // letters q..z cannot spell a parseable float ("inf", "nan", exponents)
    fn score_policy_preserves_gaps(cell in proptest::option::of("[q-z ]{0,8}")) {
        prop_assert_eq!(coerce_value(cell.as_deref(), ColumnPolicy::ScorePropagate), None);
    }

    #[test]
    fn normalisation_is_idempotent(header in "[a-zA-Z:()?]{0,12}([ \t\n]{1,3}[a-zA-Z:()?]{0,12}){0,4}") {
        let once = normalise_header(&header);
        prop_assert_eq!(normalise_header(&once), once.clone());
        prop_assert!(!once.contains('\n'));
        prop_assert!(!once.starts_with(' ') && !once.ends_with(' '));
    }

    #[test]
    fn negating_one_side_flips_the_coefficient(values in prop::collection::vec((0.0f64..10.0, 0.0f64..10.0), 2..40)) {
        let xs: Vec<Option<f64>> = values.iter().map(|(x, _)| Some(*x)).collect();
        let ys: Vec<Option<f64>> = values.iter().map(|(_, y)| Some(*y)).collect();
        let negated: Vec<Option<f64>> = ys.iter().map(|y| y.map(|v| -v)).collect();
        let plain = pearson(&xs, &ys).unwrap();
        let flipped = pearson(&xs, &negated).unwrap();
        match (plain, flipped) {
            (Some(a), Some(b)) => prop_assert!((a + b).abs() < 1e-9),
            (None, None) => {}
            _ => prop_assert!(false, "degenerate status must agree"),
        }
    }

    #[test]
    fn correlation_is_bounded(values in prop::collection::vec((0.0f64..10.0, 0.0f64..10.0), 2..40)) {
        let xs: Vec<Option<f64>> = values.iter().map(|(x, _)| Some(*x)).collect();
        let ys: Vec<Option<f64>> = values.iter().map(|(_, y)| Some(*y)).collect();
        if let Some(r) = pearson(&xs, &ys).unwrap() {
            prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&r));
        }
    }

    #[test]
    fn frequency_counts_sum_to_complete_rows(flags in prop::collection::vec(proptest::option::of(0i64..2), 1..60)) {
        let mut table = Table::new("flags");
        table.add_column("flag", Column::from_i64(flags.clone())).unwrap();
        let config = QueryConfig::new(AggregationMode::FrequencyCount).with_x("flag");
        let resolution = resolve(&table, &config, &SurveySchema::builtin()).unwrap();
        let complete = flags.iter().filter(|f| f.is_some()).count();
        match resolution {
            Resolution::Chart { table: out, .. } => {
                let counts = out.get_column(COUNT).unwrap();
                let total: f64 = (0..out.row_count()).filter_map(|i| counts.to_f64(i)).sum();
                prop_assert_eq!(total as usize, complete);
                // no zero-count groups
                for i in 0..out.row_count() {
                    prop_assert!(counts.to_f64(i).unwrap_or(0.0) > 0.0);
                }
            }
            Resolution::Insufficient { .. } => prop_assert!(false, "x was provided"),
        }
    }

    #[test]
    fn likert_long_form_counts_match_inputs(codes in prop::collection::vec(proptest::option::of(1i64..=5), 1..40)) {
        let mut table = Table::new("survey");
        let as_f64: Vec<Option<f64>> = codes.iter().map(|c| c.map(|v| v as f64)).collect();
        table.add_column("Q1", Column::from_f64(as_f64)).unwrap();
        let config = QueryConfig::new(AggregationMode::LikertDistribution)
            .with_columns(&["Q1"])
            .with_label_mode(LabelMode::Agreement);
        let resolution = resolve(&table, &config, &SurveySchema::builtin()).unwrap();
        let Resolution::Chart { table: out, .. } = resolution else {
            return Err(TestCaseError::fail("questions were provided"));
        };
        // every respondent lands in exactly one labelled bucket
        let counts = out.get_column(COUNT).unwrap();
        let total: f64 = (0..out.row_count()).filter_map(|i| counts.to_f64(i)).sum();
        prop_assert_eq!(total as usize, codes.len());
    }
}
