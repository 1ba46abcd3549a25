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

use crate::error::Result;
use crate::table::{Column, Table};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ProfilingConfig {
    pub high_null_threshold: f64,
    pub low_variance_threshold: f64,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            high_null_threshold: 50.0,
            low_variance_threshold: 1e-10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfileKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ProfileKind,
    pub total_count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub cardinality: usize,
    pub numeric_stats: Option<NumericStats>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurveySummary {
    pub respondents: usize,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
    pub avg_null_percentage: f64,
    pub total_issues: usize,
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let base = pos.floor() as usize;
    let frac = pos - base as f64;
    if base + 1 < sorted.len() {
        sorted[base] + frac * (sorted[base + 1] - sorted[base])
    } else {
        sorted[base]
    }
}

fn numeric_stats(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let (skewness, kurtosis) = if std_dev > 0.0 {
        let m3 = values.iter().map(|v| ((v - mean) / std_dev).powi(3)).sum::<f64>() / n;
        let m4 = values.iter().map(|v| ((v - mean) / std_dev).powi(4)).sum::<f64>() / n;
        (m3, m4 - 3.0)
    } else {
        (0.0, 0.0)
    };
    Some(NumericStats {
        mean,
        median: quantile(&sorted, 0.5),
        std_dev,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        q25: quantile(&sorted, 0.25),
        q75: quantile(&sorted, 0.75),
        skewness,
        kurtosis,
    })
}

fn profile_column(name: &str, column: &Column, config: &ProfilingConfig) -> ColumnProfile {
    let total_count = column.len();
    let null_count = column.null_count();
    let null_percentage = if total_count == 0 {
        0.0
    } else {
        null_count as f64 * 100.0 / total_count as f64
    };
    let kind = if column.data_type().is_numeric() {
        ProfileKind::Numeric
    } else {
        ProfileKind::Categorical
    };
    let distinct: HashSet<String> = (0..total_count)
        .filter_map(|i| column.get_string(i))
        .collect();
    let numeric_stats = if kind == ProfileKind::Numeric {
        let values: Vec<f64> = (0..total_count).filter_map(|i| column.to_f64(i)).collect();
        numeric_stats(&values)
    } else {
        None
    };
    let mut issues = Vec::new();
    if null_percentage > config.high_null_threshold {
        issues.push(format!("high null percentage ({null_percentage:.1}%)"));
    }
    if distinct.len() <= 1 && total_count > 1 {
        issues.push("constant column".to_string());
    }
    if let Some(stats) = &numeric_stats {
        if stats.std_dev < config.low_variance_threshold && distinct.len() > 1 {
            issues.push("near-zero variance".to_string());
        }
    }
    ColumnProfile {
        name: name.to_string(),
        kind,
        total_count,
        null_count,
        null_percentage,
        cardinality: distinct.len(),
        numeric_stats,
        issues,
    }
}

pub fn profile_table(table: &Table, config: &ProfilingConfig) -> Vec<ColumnProfile> {
    let names: Vec<String> = table.column_names().into_iter().cloned().collect();
    names
        .par_iter()
        .filter_map(|name| {
            table
                .get_column(name)
                .ok()
                .map(|column| profile_column(name, column, config))
        })
        .collect()
}

pub fn summarise(table: &Table, profiles: &[ColumnProfile]) -> SurveySummary {
    let numeric_columns = profiles.iter().filter(|p| p.kind == ProfileKind::Numeric).count();
    let avg_null_percentage = if profiles.is_empty() {
        0.0
    } else {
        profiles.iter().map(|p| p.null_percentage).sum::<f64>() / profiles.len() as f64
    };
    SurveySummary {
        respondents: table.row_count(),
        numeric_columns,
        categorical_columns: profiles.len() - numeric_columns,
        avg_null_percentage,
        total_issues: profiles.iter().map(|p| p.issues.len()).sum(),
    }
}

pub fn profiles_to_json(profiles: &[ColumnProfile]) -> Result<String> {
    Ok(serde_json::to_string_pretty(profiles)?)
}
