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

use slate::classify::{BinaryLabel, LabelMode};
use slate::clean::{GRADE_CATEGORY, PERFORMANCE_TARGET, clean_survey};
use slate::encoding::ChartKind;
use slate::query::{
    AggStat, AggregationMode, COUNT, CORRELATION, Metric, PERCENTAGE, QueryConfig, QUESTION,
    RESPONSE, Resolution, resolve,
};
use slate::schema::SurveySchema;
use slate::table::{ColumnBuilder, Table};

const GRADE: &str = "Current Year Average Grade:";

fn raw_column(table: &mut Table, name: &str, cells: &[&str]) {
    let mut builder = ColumnBuilder::new();
    for cell in cells {
        builder.push(cell);
    }
    table.add_column(name, builder.finish()).unwrap();
}

fn cleaned_survey() -> Table {
    let mut raw = Table::new("survey");
    raw_column(
        &mut raw,
        GRADE,
        &["1.0", "1.5", "2.0", "3.5", "", "2.5"],
    );
    raw_column(&mut raw, "Coding", &["1", "0", "1", "1", "0", ""]);
    raw_column(&mut raw, "Research", &["0", "0", "1", "0", "1", "1"]);
    raw_column(&mut raw, "AI CHATBOT", &["1", "1", "0", "1", "0", "1"]);
    raw_column(
        &mut raw,
        "General Perception of AI in Higher Education",
        &["5", "4", "3", "2", "1", ""],
    );
    clean_survey(&raw, &SurveySchema::builtin()).unwrap().table
}

fn chart(resolution: Resolution) -> Table {
    match resolution {
        Resolution::Chart { table, .. } => table,
        Resolution::Insufficient { missing } => {
            panic!("expected chart, selection missing {missing:?}")
        }
    }
}

fn count_for(table: &Table, x_col: &str, x_val: &str, y_col: &str) -> Option<f64> {
    let x = table.get_column(x_col).unwrap();
    let y = table.get_column(y_col).unwrap();
    (0..table.row_count())
        .find(|&i| x.get_string(i).as_deref() == Some(x_val))
        .and_then(|i| y.to_f64(i))
}

#[test]
fn frequency_counts_grade_bands() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::FrequencyCount).with_x(GRADE_CATEGORY);
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    // 1.0 Excellent, 1.5 Very Good, 2.0 Good, 3.5 Fail, missing Unknown, 2.5 Fair
    assert_eq!(table.row_count(), 6);
    assert_eq!(count_for(&table, GRADE_CATEGORY, "Excellent", COUNT), Some(1.0));
    assert_eq!(count_for(&table, GRADE_CATEGORY, "Unknown", COUNT), Some(1.0));
    let total: f64 = (0..table.row_count())
        .filter_map(|i| table.get_column(COUNT).unwrap().to_f64(i))
        .sum();
    assert_eq!(total, 6.0);
    // canonical band ordering, not data order
    let bands = table.get_column(GRADE_CATEGORY).unwrap();
    assert_eq!(bands.get_string(0).as_deref(), Some("Excellent"));
    assert_eq!(bands.get_string(5).as_deref(), Some("Unknown"));
}

#[test]
fn frequency_omits_zero_count_groups() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::FrequencyCount).with_x("Coding");
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    // flag policy turned every cell into 0 or 1, nothing else appears
    assert_eq!(table.row_count(), 2);
}

#[test]
fn frequency_sort_orders_rows_by_count_even_with_color() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::FrequencyCount)
        .with_x("Coding")
        .with_color("Research")
        .sorted(true);
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    // pair counts: (1,0)=2, (0,0)=1, (1,1)=1, (0,1)=2
    let counts: Vec<f64> = (0..table.row_count())
        .filter_map(|i| table.get_column(COUNT).unwrap().to_f64(i))
        .collect();
    assert_eq!(counts, vec![1.0, 1.0, 2.0, 2.0]);
}

#[test]
fn likert_agreement_distribution() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::LikertDistribution)
        .with_columns(&["General Perception of AI in Higher Education"]);
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    // codes 5,4,3,2,1 and one missing: each label once, Unknown once
    assert_eq!(table.row_count(), 6);
    let responses = table.get_column(RESPONSE).unwrap();
    assert_eq!(responses.get_string(0).as_deref(), Some("Strongly Disagree"));
    assert_eq!(responses.get_string(4).as_deref(), Some("Strongly Agree"));
    assert_eq!(responses.get_string(5).as_deref(), Some("Unknown"));
    for i in 0..table.row_count() {
        assert_eq!(table.get_column(COUNT).unwrap().to_f64(i), Some(1.0));
    }
}

#[test]
fn likert_percentage_sums_to_hundred_per_group() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::LikertDistribution)
        .with_columns(&["Coding", "Research"])
        .with_label_mode(LabelMode::Binary)
        .as_percentage();
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    let questions = table.get_column(QUESTION).unwrap();
    let pct = table.get_column(PERCENTAGE).unwrap();
    for question in ["Coding", "Research"] {
        let sum: f64 = (0..table.row_count())
            .filter(|&i| questions.get_string(i).as_deref() == Some(question))
            .filter_map(|i| pct.to_f64(i))
            .sum();
        assert!((sum - 100.0).abs() < 1e-9, "{question} sums to {sum}");
    }
}

#[test]
fn likert_binary_counts_match_flags() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::LikertDistribution)
        .with_columns(&["Coding", "Research"])
        .with_label_mode(LabelMode::Binary);
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    let questions = table.get_column(QUESTION).unwrap();
    let responses = table.get_column(RESPONSE).unwrap();
    let counts = table.get_column(COUNT).unwrap();
    let lookup = |q: &str, r: &str| -> Option<f64> {
        (0..table.row_count())
            .find(|&i| {
                questions.get_string(i).as_deref() == Some(q)
                    && responses.get_string(i).as_deref() == Some(r)
            })
            .and_then(|i| counts.to_f64(i))
    };
    assert_eq!(lookup("Coding", "Yes"), Some(3.0));
    assert_eq!(lookup("Coding", "No"), Some(3.0));
    assert_eq!(lookup("Research", "Yes"), Some(3.0));
    assert_eq!(lookup("Research", "No"), Some(3.0));
}

#[test]
fn binary_only_drops_unselected_rows() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::LikertDistribution)
        .with_columns(&["Coding", "Research"])
        .with_label_mode(LabelMode::BinaryOnly(BinaryLabel::Yes));
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    let responses = table.get_column(RESPONSE).unwrap();
    for i in 0..table.row_count() {
        assert_eq!(responses.get_string(i).as_deref(), Some("Yes"));
    }
    assert_eq!(table.row_count(), 2);
}

#[test]
fn likert_joins_grade_category() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::LikertDistribution)
        .with_columns(&["Coding"])
        .with_label_mode(LabelMode::Binary)
        .with_x(GRADE_CATEGORY);
    let (table, encoding) = resolve(&survey, &config, &SurveySchema::builtin())
        .unwrap()
        .chart()
        .unwrap();
    assert_eq!(encoding.x.as_deref(), Some(GRADE_CATEGORY));
    assert_eq!(encoding.color.as_deref(), Some(RESPONSE));
    // the Excellent respondent coded, so exactly one Yes in that band
    assert_eq!(count_for(&table, GRADE_CATEGORY, "Excellent", COUNT), Some(1.0));
}

#[test]
fn likert_sort_keyed_on_level_orders_questions() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::LikertDistribution)
        .with_columns(&["Coding", "Research", "AI CHATBOT"])
        .with_label_mode(LabelMode::Binary)
        .sorted_by_level("Yes", false);
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    // Yes counts: AI CHATBOT 4, Coding 3, Research 3; ties keep selection order
    let questions = table.get_column(QUESTION).unwrap();
    assert_eq!(questions.get_string(0).as_deref(), Some("AI CHATBOT"));
    assert_eq!(questions.get_string(2).as_deref(), Some("Coding"));
    assert_eq!(questions.get_string(4).as_deref(), Some("Research"));
}

#[test]
fn aggregate_grouped_joins_count_mean_median() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::Aggregate(AggStat::Mean))
        .with_x("Coding")
        .with_columns(&[GRADE]);
    let (table, encoding) = resolve(&survey, &config, &SurveySchema::builtin())
        .unwrap()
        .chart()
        .unwrap();
    let mean_col = format!("{GRADE} (mean)");
    assert_eq!(encoding.y.as_deref(), Some(mean_col.as_str()));
    assert!(table.has_column(COUNT));
    assert!(table.has_column(&format!("{GRADE} (median)")));
    // coders: grades 1.0, 2.0, 3.5
    let mean = count_for(&table, "Coding", "1", &mean_col).unwrap();
    assert!((mean - (1.0 + 2.0 + 3.5) / 3.0).abs() < 1e-9);
    assert_eq!(count_for(&table, "Coding", "1", COUNT), Some(3.0));
}

#[test]
fn aggregate_global_lays_out_one_row_per_metric() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::Aggregate(AggStat::Median))
        .with_columns(&[GRADE, "Research"]);
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    assert_eq!(table.row_count(), 2);
    // grade has one missing cell, so its count is 5
    assert_eq!(count_for(&table, "Metric", GRADE, COUNT), Some(5.0));
    let median = count_for(&table, "Metric", GRADE, "Median").unwrap();
    assert!((median - 2.0).abs() < 1e-9);
}

#[test]
fn correlation_against_derived_target() {
    let mut raw = Table::new("survey");
    raw_column(&mut raw, GRADE, &["1", "3", "1", "3"]);
    raw_column(&mut raw, "Coding", &["1", "0", "1", "0"]);
    let survey = clean_survey(&raw, &SurveySchema::builtin()).unwrap().table;
    // derived target is the negated grade: [-1, -3, -1, -3]
    let target = survey.get_column(PERFORMANCE_TARGET).unwrap();
    assert_eq!(target.f64_values(), vec![Some(-1.0), Some(-3.0), Some(-1.0), Some(-3.0)]);
    let config = QueryConfig::new(AggregationMode::CorrelationTrend)
        .with_columns(&["Coding"])
        .with_target(PERFORMANCE_TARGET);
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    let r = table.get_column(CORRELATION).unwrap().to_f64(0).unwrap();
    assert!((r - 1.0).abs() < 1e-9);
}

#[test]
fn correlation_inverts_for_inverted_scale_targets() {
    let mut raw = Table::new("survey");
    raw_column(&mut raw, GRADE, &["1", "3", "1", "3"]);
    raw_column(&mut raw, "Coding", &["1", "0", "1", "0"]);
    let survey = clean_survey(&raw, &SurveySchema::builtin()).unwrap().table;
    // targeting the raw grade column directly flips the sign back
    let config = QueryConfig::new(AggregationMode::CorrelationTrend)
        .with_columns(&["Coding"])
        .with_target(GRADE);
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    let r = table.get_column(CORRELATION).unwrap().to_f64(0).unwrap();
    assert!((r - 1.0).abs() < 1e-9);
}

#[test]
fn correlation_sorted_descending() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::CorrelationTrend)
        .with_columns(&["Coding", "Research", "AI CHATBOT"])
        .with_target(PERFORMANCE_TARGET)
        .sorted(false);
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    let corr = table.get_column(CORRELATION).unwrap();
    let values: Vec<f64> = (0..table.row_count()).filter_map(|i| corr.to_f64(i)).collect();
    for pair in values.windows(2) {
        assert!(pair[0] >= pair[1]);
    }
}

#[test]
fn zero_variance_attribute_gives_none_not_error() {
    let mut raw = Table::new("survey");
    raw_column(&mut raw, GRADE, &["1", "2", "3"]);
    raw_column(&mut raw, "Coding", &["1", "1", "1"]);
    let survey = clean_survey(&raw, &SurveySchema::builtin()).unwrap().table;
    let config = QueryConfig::new(AggregationMode::CorrelationTrend)
        .with_columns(&["Coding"])
        .with_target(PERFORMANCE_TARGET);
    let table = chart(resolve(&survey, &config, &SurveySchema::builtin()).unwrap());
    assert_eq!(table.get_column(CORRELATION).unwrap().to_f64(0), None);
}

#[test]
fn empty_selections_are_insufficient_in_every_mode() {
    let survey = cleaned_survey();
    let schema = SurveySchema::builtin();
    let modes = [
        AggregationMode::Raw,
        AggregationMode::FrequencyCount,
        AggregationMode::LikertDistribution,
        AggregationMode::Aggregate(AggStat::Mean),
        AggregationMode::CorrelationTrend,
    ];
    for mode in modes {
        let resolution = resolve(&survey, &QueryConfig::new(mode), &schema).unwrap();
        assert!(
            matches!(resolution, Resolution::Insufficient { .. }),
            "{mode:?} should be insufficient with an empty selection"
        );
    }
}

#[test]
fn raw_mode_selects_columns_verbatim() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::Raw)
        .with_x("Respondent")
        .with_metric(Metric::Column(GRADE.to_string()))
        .with_color(GRADE_CATEGORY);
    let (table, encoding) = resolve(&survey, &config, &SurveySchema::builtin())
        .unwrap()
        .chart()
        .unwrap();
    assert_eq!(table.row_count(), survey.row_count());
    assert_eq!(encoding.x.as_deref(), Some("Respondent"));
    assert_eq!(encoding.y.as_deref(), Some(GRADE));
    assert_eq!(encoding.color.as_deref(), Some(GRADE_CATEGORY));
}

#[test]
fn stacked_bar_suggested_for_colored_counts() {
    let survey = cleaned_survey();
    let config = QueryConfig::new(AggregationMode::LikertDistribution)
        .with_columns(&["Coding"])
        .with_label_mode(LabelMode::Binary);
    let (_, encoding) = resolve(&survey, &config, &SurveySchema::builtin())
        .unwrap()
        .chart()
        .unwrap();
    let kinds = slate::suggest_kinds(&encoding, AggregationMode::LikertDistribution);
    assert!(kinds.contains(&ChartKind::StackedBar));
    assert!(kinds.contains(&ChartKind::GroupedBar));
    assert!(!kinds.contains(&ChartKind::Bubble));
}
