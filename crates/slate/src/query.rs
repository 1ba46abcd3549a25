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

use crate::classify::{GradeBand, LabelMode};
use crate::clean::GRADE_CATEGORY;
use crate::encoding::ChartEncoding;
use crate::error::{QueryError, Result};
use crate::schema::SurveySchema;
use crate::stats;
use crate::table::{Column, Table};
use itertools::Itertools;
use std::collections::HashMap;
use tracing::warn;

pub const COUNT: &str = "Count";
pub const PERCENTAGE: &str = "Percentage";
pub const QUESTION: &str = "Question";
pub const RESPONSE: &str = "Response";
pub const ATTRIBUTE: &str = "Attribute";
pub const CORRELATION: &str = "Correlation";
pub const METRIC: &str = "Metric";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggStat {
    Mean,
    Median,
}

impl AggStat {
    pub fn column_suffix(&self) -> &'static str {
        match self {
            AggStat::Mean => "mean",
            AggStat::Median => "median",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    Raw,
    FrequencyCount,
    LikertDistribution,
    Aggregate(AggStat),
    CorrelationTrend,
}

/// A y-axis selection: a table column, or the typed row-count sentinel the
/// raw mode degrades through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metric {
    Column(String),
    CountOfRows,
}

/// Sorting request. Count-shaped modes sort rows by their natural metric;
/// Likert mode instead reorders the x categories by aggregate count, keyed
/// on one colour level when `level` is set (e.g. order modes by their
/// "Yes" count).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDirective {
    pub ascending: bool,
    pub level: Option<String>,
}

impl SortDirective {
    pub fn new(ascending: bool) -> Self {
        Self {
            ascending,
            level: None,
        }
    }
}

/// Immutable description of one resolver request.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub mode: AggregationMode,
    pub x: Option<String>,
    pub color: Option<String>,
    pub metrics: Vec<Metric>,
    pub target: Option<String>,
    pub label_mode: LabelMode,
    pub percentage: bool,
    pub sort: Option<SortDirective>,
}

impl QueryConfig {
    pub fn new(mode: AggregationMode) -> Self {
        Self {
            mode,
            x: None,
            color: None,
            metrics: Vec::new(),
            target: None,
            label_mode: LabelMode::Agreement,
            percentage: false,
            sort: None,
        }
    }
    pub fn with_x(mut self, x: &str) -> Self {
        self.x = Some(x.to_string());
        self
    }
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }
    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.metrics
            .extend(columns.iter().map(|c| Metric::Column(c.to_string())));
        self
    }
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }
    pub fn with_label_mode(mut self, mode: LabelMode) -> Self {
        self.label_mode = mode;
        self
    }
    pub fn as_percentage(mut self) -> Self {
        self.percentage = true;
        self
    }
    pub fn sorted(mut self, ascending: bool) -> Self {
        self.sort = Some(SortDirective::new(ascending));
        self
    }
    pub fn sorted_by_level(mut self, level: &str, ascending: bool) -> Self {
        self.sort = Some(SortDirective {
            ascending,
            level: Some(level.to_string()),
        });
        self
    }
}

/// Resolver output. An under-specified request is a signal, not an error;
/// the caller renders a placeholder instead of failing.
#[derive(Debug, Clone)]
pub enum Resolution {
    Chart {
        table: Table,
        encoding: ChartEncoding,
    },
    Insufficient {
        missing: Vec<String>,
    },
}

impl Resolution {
    fn insufficient(missing: &[&str]) -> Self {
        Resolution::Insufficient {
            missing: missing.iter().map(|m| m.to_string()).collect(),
        }
    }
    pub fn chart(self) -> Option<(Table, ChartEncoding)> {
        match self {
            Resolution::Chart { table, encoding } => Some((table, encoding)),
            Resolution::Insufficient { .. } => None,
        }
    }
}

fn metric_columns(metrics: &[Metric]) -> Vec<String> {
    metrics
        .iter()
        .filter_map(|m| match m {
            Metric::Column(name) => Some(name.clone()),
            Metric::CountOfRows => None,
        })
        .collect()
}

pub fn resolve(table: &Table, config: &QueryConfig, schema: &SurveySchema) -> Result<Resolution> {
    match config.mode {
        AggregationMode::Raw => resolve_raw(table, config),
        AggregationMode::FrequencyCount => resolve_frequency(table, config),
        AggregationMode::LikertDistribution => resolve_likert(table, config),
        AggregationMode::Aggregate(stat) => resolve_aggregate(table, config, stat),
        AggregationMode::CorrelationTrend => resolve_correlation(table, config, schema),
    }
}

fn resolve_raw(table: &Table, config: &QueryConfig) -> Result<Resolution> {
    let Some(x) = config.x.as_deref() else {
        return Ok(Resolution::insufficient(&["x"]));
    };
    let Some(first) = config.metrics.first() else {
        return Ok(Resolution::insufficient(&["metrics"]));
    };
    if matches!(first, Metric::CountOfRows) {
        // a row-count y over raw rows is really a frequency count
        return resolve_frequency(table, config);
    }
    let columns = metric_columns(&config.metrics);
    let mut selected: Vec<&str> = vec![x];
    selected.extend(columns.iter().map(String::as_str));
    if let Some(color) = config.color.as_deref() {
        if !selected.contains(&color) {
            selected.push(color);
        }
    }
    for name in &selected {
        if !table.has_column(name) {
            return Err(QueryError::ColumnNotFound {
                column: name.to_string(),
            }
            .into());
        }
    }
    let mut out = table.select(&selected)?;
    if let Some(sort) = &config.sort {
        out = out.sort_by_f64(&columns[0], sort.ascending)?;
    }
    let mut encoding = ChartEncoding::xy(x, &columns[0]);
    if let Some(color) = config.color.as_deref() {
        encoding = encoding.with_color(color);
    }
    Ok(Resolution::Chart {
        table: out,
        encoding,
    })
}

type GroupKey = (String, Option<String>);

fn group_counts(
    table: &Table,
    x: &str,
    color: Option<&str>,
) -> Result<HashMap<GroupKey, usize>> {
    let x_col = table.get_column(x)?;
    let color_col = color.map(|c| table.get_column(c)).transpose()?;
    let mut counts: HashMap<GroupKey, usize> = HashMap::new();
    for i in 0..table.row_count() {
        let Some(x_val) = x_col.get_string(i) else {
            continue;
        };
        let color_val = match &color_col {
            Some(col) => match col.get_string(i) {
                Some(v) => Some(v),
                None => continue,
            },
            None => None,
        };
        *counts.entry((x_val, color_val)).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Canonical display order for a grouping column, when one exists.
fn category_order(column: &str, config: &QueryConfig, questions: &[String]) -> Option<Vec<String>> {
    if column == QUESTION {
        Some(questions.to_vec())
    } else if column == RESPONSE {
        Some(config.label_mode.display_order())
    } else if column == GRADE_CATEGORY {
        Some(GradeBand::display_labels())
    } else {
        None
    }
}

fn ordered_categories(
    values: impl Iterator<Item = String>,
    canonical: Option<Vec<String>>,
) -> Vec<String> {
    let present: Vec<String> = values.unique().collect();
    match canonical {
        // prune canonical levels absent from the data
        Some(order) => {
            let mut out: Vec<String> =
                order.into_iter().filter(|c| present.contains(c)).collect();
            for v in present {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
            out
        }
        None => present.into_iter().sorted().collect(),
    }
}

fn counts_to_table(
    name: &str,
    x: &str,
    color: Option<&str>,
    counts: &HashMap<GroupKey, usize>,
    config: &QueryConfig,
    questions: &[String],
) -> Result<Resolution> {
    let mut x_cats = ordered_categories(
        counts.keys().map(|(x, _)| x.clone()),
        category_order(x, config, questions),
    );
    let color_cats = ordered_categories(
        counts.keys().filter_map(|(_, c)| c.clone()),
        color.and_then(|c| category_order(c, config, questions)),
    );
    let likert = config.mode == AggregationMode::LikertDistribution;
    if let Some(sort) = config.sort.as_ref().filter(|_| likert) {
        let total = |cat: &String| -> usize {
            counts
                .iter()
                .filter(|((x, c), _)| {
                    x == cat && sort.level.as_ref().is_none_or(|l| c.as_deref() == Some(l))
                })
                .map(|(_, n)| *n)
                .sum()
        };
        // stable on ties, so the canonical category order survives
        if sort.ascending {
            x_cats.sort_by_key(|cat| total(cat));
        } else {
            x_cats.sort_by_key(|cat| std::cmp::Reverse(total(cat)));
        }
    }
    let x_totals: HashMap<String, usize> = x_cats
        .iter()
        .map(|cat| {
            let total = counts
                .iter()
                .filter(|((x, _), _)| x == cat)
                .map(|(_, n)| *n)
                .sum();
            (cat.clone(), total)
        })
        .collect();

    let mut x_out: Vec<Option<String>> = Vec::new();
    let mut color_out: Vec<Option<String>> = Vec::new();
    let mut count_out: Vec<Option<f64>> = Vec::new();
    for x_cat in &x_cats {
        let colors: Vec<Option<String>> = if color.is_some() {
            color_cats.iter().cloned().map(Some).collect()
        } else {
            vec![None]
        };
        for color_cat in colors {
            let key = (x_cat.clone(), color_cat.clone());
            let Some(&n) = counts.get(&key) else {
                // zero-count groups are omitted, not emitted as zeros
                continue;
            };
            x_out.push(Some(x_cat.clone()));
            color_out.push(color_cat);
            let value = if config.percentage {
                let total = x_totals.get(x_cat).copied().unwrap_or(0).max(1);
                n as f64 * 100.0 / total as f64
            } else {
                n as f64
            };
            count_out.push(Some(value));
        }
    }

    let y_name = if config.percentage { PERCENTAGE } else { COUNT };
    let mut out = Table::new(name);
    out.add_column(x, Column::from_labels(x_out))?;
    if let Some(color) = color {
        out.add_column(color, Column::from_labels(color_out))?;
    }
    out.add_column(y_name, Column::from_f64(count_out))?;
    if !likert {
        // count modes order rows by their natural metric
        if let Some(sort) = &config.sort {
            out = out.sort_by_f64(y_name, sort.ascending)?;
        }
    }
    let mut encoding = ChartEncoding::xy(x, y_name);
    if let Some(color) = color {
        encoding = encoding.with_color(color);
    }
    Ok(Resolution::Chart {
        table: out,
        encoding,
    })
}

fn resolve_frequency(table: &Table, config: &QueryConfig) -> Result<Resolution> {
    let Some(x) = config.x.as_deref() else {
        return Ok(Resolution::insufficient(&["x"]));
    };
    let color = config.color.as_deref().filter(|c| *c != x);
    let counts = group_counts(table, x, color)?;
    counts_to_table("frequency", x, color, &counts, config, &[])
}

fn resolve_likert(table: &Table, config: &QueryConfig) -> Result<Resolution> {
    let questions: Vec<String> = metric_columns(&config.metrics)
        .into_iter()
        .filter(|q| {
            let present = table.has_column(q);
            if !present {
                warn!(question = %q, "question column absent, skipped");
            }
            present
        })
        .collect();
    if questions.is_empty() {
        return Ok(Resolution::insufficient(&["questions"]));
    }
    let x = config.x.as_deref().unwrap_or(QUESTION);
    let color = config.color.as_deref().unwrap_or(RESPONSE);
    if x == color {
        return Err(QueryError::InvalidConfig {
            reason: "x and colour dimensions must differ".to_string(),
        }
        .into());
    }

    // wide to long: one row per (respondent, question) with a rendered label
    let mut long = Table::new("likert");
    {
        let mut question_out: Vec<Option<String>> = Vec::new();
        let mut response_out: Vec<Option<String>> = Vec::new();
        let mut join_names: Vec<String> = Vec::new();
        for dim in [x, color] {
            if dim != QUESTION && dim != RESPONSE {
                if !table.has_column(dim) {
                    return Err(QueryError::ColumnNotFound {
                        column: dim.to_string(),
                    }
                    .into());
                }
                join_names.push(dim.to_string());
            }
        }
        let mut join_out: HashMap<String, Vec<Option<String>>> = join_names
            .iter()
            .map(|n| (n.clone(), Vec::new()))
            .collect();
        for question in &questions {
            let col = table.get_column(question)?;
            for i in 0..table.row_count() {
                let Some(label) = config.label_mode.render(col.to_f64(i)) else {
                    continue;
                };
                question_out.push(Some(question.clone()));
                response_out.push(Some(label));
                for name in &join_names {
                    let source = table.get_column(name)?;
                    if let Some(values) = join_out.get_mut(name) {
                        values.push(source.get_string(i));
                    }
                }
            }
        }
        long.add_column(QUESTION, Column::from_labels(question_out))?;
        long.add_column(RESPONSE, Column::from_labels(response_out))?;
        for (name, values) in join_out {
            long.add_column(&name, Column::from_labels(values))?;
        }
    }

    let counts = group_counts(&long, x, Some(color))?;
    counts_to_table("likert", x, Some(color), &counts, config, &questions)
}

fn resolve_aggregate(table: &Table, config: &QueryConfig, stat: AggStat) -> Result<Resolution> {
    let metrics = metric_columns(&config.metrics);
    if metrics.is_empty() {
        return Ok(Resolution::insufficient(&["metrics"]));
    }
    for metric in &metrics {
        let column = table.get_column(metric)?;
        if !column.data_type().is_numeric() {
            return Err(QueryError::NonNumericMetric {
                metric: metric.clone(),
            }
            .into());
        }
    }
    match config.x.as_deref() {
        Some(x) => grouped_aggregate(table, config, stat, x, &metrics),
        None => global_aggregate(table, config, stat, &metrics),
    }
}

fn grouped_aggregate(
    table: &Table,
    config: &QueryConfig,
    stat: AggStat,
    x: &str,
    metrics: &[String],
) -> Result<Resolution> {
    let color = config.color.as_deref().filter(|c| *c != x);
    let x_col = table.get_column(x)?;
    let color_col = color.map(|c| table.get_column(c)).transpose()?;
    let mut groups: HashMap<GroupKey, Vec<usize>> = HashMap::new();
    for i in 0..table.row_count() {
        let Some(x_val) = x_col.get_string(i) else {
            continue;
        };
        let color_val = match &color_col {
            Some(col) => match col.get_string(i) {
                Some(v) => Some(v),
                None => continue,
            },
            None => None,
        };
        groups.entry((x_val, color_val)).or_default().push(i);
    }

    let mut keys: Vec<GroupKey> = groups.keys().cloned().collect();
    keys.sort();

    let mut x_out: Vec<Option<String>> = Vec::new();
    let mut color_out: Vec<Option<String>> = Vec::new();
    let mut count_out: Vec<Option<i64>> = Vec::new();
    let mut stat_out: HashMap<String, Vec<Option<f64>>> = HashMap::new();
    for key in &keys {
        let rows = &groups[key];
        x_out.push(Some(key.0.clone()));
        color_out.push(key.1.clone());
        count_out.push(Some(rows.len() as i64));
        for metric in metrics {
            let column = table.get_column(metric)?;
            let values: Vec<f64> = rows.iter().filter_map(|&i| column.to_f64(i)).collect();
            stat_out
                .entry(format!("{metric} (mean)"))
                .or_default()
                .push(stats::mean(&values));
            stat_out
                .entry(format!("{metric} (median)"))
                .or_default()
                .push(stats::median(&values));
        }
    }

    let mut out = Table::new("aggregate");
    out.add_column(x, Column::from_labels(x_out))?;
    if let Some(color) = color {
        out.add_column(color, Column::from_labels(color_out))?;
    }
    out.add_column(COUNT, Column::from_i64(count_out))?;
    for metric in metrics {
        for suffix in ["mean", "median"] {
            let name = format!("{metric} ({suffix})");
            if let Some(values) = stat_out.remove(&name) {
                out.add_column(&name, Column::from_f64(values))?;
            }
        }
    }
    let y_name = format!("{} ({})", metrics[0], stat.column_suffix());
    if let Some(sort) = &config.sort {
        out = out.sort_by_f64(&y_name, sort.ascending)?;
    }
    let mut encoding = ChartEncoding::xy(x, &y_name);
    if let Some(color) = color {
        encoding = encoding.with_color(color);
    }
    Ok(Resolution::Chart {
        table: out,
        encoding,
    })
}

fn global_aggregate(
    table: &Table,
    config: &QueryConfig,
    stat: AggStat,
    metrics: &[String],
) -> Result<Resolution> {
    let mut name_out: Vec<Option<String>> = Vec::new();
    let mut count_out: Vec<Option<i64>> = Vec::new();
    let mut mean_out: Vec<Option<f64>> = Vec::new();
    let mut median_out: Vec<Option<f64>> = Vec::new();
    for metric in metrics {
        let column = table.get_column(metric)?;
        let values: Vec<f64> = (0..column.len()).filter_map(|i| column.to_f64(i)).collect();
        name_out.push(Some(metric.clone()));
        count_out.push(Some(values.len() as i64));
        mean_out.push(stats::mean(&values));
        median_out.push(stats::median(&values));
    }
    let mut out = Table::new("aggregate");
    out.add_column(METRIC, Column::from_labels(name_out))?;
    out.add_column(COUNT, Column::from_i64(count_out))?;
    out.add_column("Mean", Column::from_f64(mean_out))?;
    out.add_column("Median", Column::from_f64(median_out))?;
    let y_name = match stat {
        AggStat::Mean => "Mean",
        AggStat::Median => "Median",
    };
    if let Some(sort) = &config.sort {
        out = out.sort_by_f64(y_name, sort.ascending)?;
    }
    Ok(Resolution::Chart {
        table: out,
        encoding: ChartEncoding::xy(METRIC, y_name),
    })
}

fn resolve_correlation(
    table: &Table,
    config: &QueryConfig,
    schema: &SurveySchema,
) -> Result<Resolution> {
    let attrs: Vec<String> = metric_columns(&config.metrics)
        .into_iter()
        .filter(|attr| {
            let present = table.has_column(attr);
            if !present {
                warn!(column = %attr, "attribute column absent, skipped");
            }
            present
        })
        .collect();
    let mut missing = Vec::new();
    if attrs.is_empty() {
        missing.push("attributes");
    }
    if config.target.is_none() {
        missing.push("target");
    }
    if !missing.is_empty() {
        return Ok(Resolution::insufficient(&missing));
    }
    let target = config.target.as_deref().unwrap_or_default();
    let invert = schema
        .spec_for(target)
        .map(|spec| spec.inverted_scale)
        .unwrap_or(false);
    let coefficients = stats::correlate(table, &attrs, target, invert)?;

    let mut out = Table::new("correlation");
    out.add_column(
        ATTRIBUTE,
        Column::from_labels(coefficients.iter().map(|(a, _)| Some(a.clone())).collect()),
    )?;
    out.add_column(
        CORRELATION,
        Column::from_f64(coefficients.iter().map(|(_, c)| *c).collect()),
    )?;
    if let Some(sort) = &config.sort {
        out = out.sort_by_f64(CORRELATION, sort.ascending)?;
    }
    Ok(Resolution::Chart {
        table: out,
        encoding: ChartEncoding::xy(ATTRIBUTE, CORRELATION),
    })
}

/// Per-flag user totals (sum of 0/1 flags), descending. The usage-habits
/// page draws this directly.
pub fn usage_totals(table: &Table, flags: &[String]) -> Result<Table> {
    let mut name_out: Vec<Option<String>> = Vec::new();
    let mut total_out: Vec<Option<f64>> = Vec::new();
    for flag in flags {
        if !table.has_column(flag) {
            warn!(column = %flag, "flag column absent, skipped from totals");
            continue;
        }
        let column = table.get_column(flag)?;
        let total: f64 = (0..column.len()).filter_map(|i| column.to_f64(i)).sum();
        name_out.push(Some(flag.clone()));
        total_out.push(Some(total));
    }
    let mut out = Table::new("usage_totals");
    out.add_column("Tool", Column::from_labels(name_out))?;
    out.add_column("Users", Column::from_f64(total_out))?;
    Ok(out.sort_by_f64("Users", false)?)
}
