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

use crate::error::{DataError, DataResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int64,
    Float64,
    String,
    Boolean,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int64 => "Int64",
            DataType::Float64 => "Float64",
            DataType::String => "String",
            DataType::Boolean => "Boolean",
        }
    }
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }
}

/// Immutable typed column. Values are shared, so cloning a column or a
/// table is cheap.
#[derive(Debug, Clone)]
pub enum Column {
    Int64(Arc<[Option<i64>]>),
    Float64(Arc<[Option<f64>]>),
    String(Arc<[Option<Arc<str>>]>),
    Boolean(Arc<[Option<bool>]>),
}

impl Column {
    pub fn from_i64(values: Vec<Option<i64>>) -> Self {
        Column::Int64(values.into())
    }
    pub fn from_f64(values: Vec<Option<f64>>) -> Self {
        Column::Float64(values.into())
    }
    pub fn from_bool(values: Vec<Option<bool>>) -> Self {
        Column::Boolean(values.into())
    }
    pub fn from_labels(values: Vec<Option<String>>) -> Self {
        Column::String(
            values
                .into_iter()
                .map(|v| v.map(Arc::from))
                .collect::<Vec<_>>()
                .into(),
        )
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Column::Int64(_) => DataType::Int64,
            Column::Float64(_) => DataType::Float64,
            Column::String(_) => DataType::String,
            Column::Boolean(_) => DataType::Boolean,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::String(v) => v.len(),
            Column::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Int64(v) => v.iter().filter(|x| x.is_none()).count(),
            Column::Float64(v) => v.iter().filter(|x| x.is_none()).count(),
            Column::String(v) => v.iter().filter(|x| x.is_none()).count(),
            Column::Boolean(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Numeric view of the value at `index`. Strings and booleans coerce
    /// where a sensible numeric reading exists.
    pub fn to_f64(&self, index: usize) -> Option<f64> {
        match self {
            Column::Int64(v) => v.get(index).copied().flatten().map(|x| x as f64),
            Column::Float64(v) => v.get(index).copied().flatten(),
            Column::Boolean(v) => v
                .get(index)
                .copied()
                .flatten()
                .map(|b| if b { 1.0 } else { 0.0 }),
            Column::String(v) => v
                .get(index)
                .and_then(|x| x.as_deref())
                .and_then(|s| s.trim().parse::<f64>().ok()),
        }
    }

    pub fn get_string(&self, index: usize) -> Option<String> {
        match self {
            Column::Int64(v) => v.get(index).copied().flatten().map(|x| x.to_string()),
            Column::Float64(v) => v.get(index).copied().flatten().map(|x| x.to_string()),
            Column::String(v) => v.get(index).and_then(|x| x.as_deref()).map(str::to_string),
            Column::Boolean(v) => v.get(index).copied().flatten().map(|x| x.to_string()),
        }
    }

    pub fn f64_values(&self) -> Vec<Option<f64>> {
        (0..self.len()).map(|i| self.to_f64(i)).collect()
    }

    pub fn select_rows(&self, indices: &[usize]) -> Self {
        match self {
            Column::Int64(v) => Column::Int64(
                indices
                    .iter()
                    .map(|&i| v.get(i).copied().flatten())
                    .collect::<Vec<_>>()
                    .into(),
            ),
            Column::Float64(v) => Column::Float64(
                indices
                    .iter()
                    .map(|&i| v.get(i).copied().flatten())
                    .collect::<Vec<_>>()
                    .into(),
            ),
            Column::String(v) => Column::String(
                indices
                    .iter()
                    .map(|&i| v.get(i).and_then(|x| x.clone()))
                    .collect::<Vec<_>>()
                    .into(),
            ),
            Column::Boolean(v) => Column::Boolean(
                indices
                    .iter()
                    .map(|&i| v.get(i).copied().flatten())
                    .collect::<Vec<_>>()
                    .into(),
            ),
        }
    }

    pub fn from_strings(values: &[Option<String>], data_type: DataType) -> DataResult<Self> {
        match data_type {
            DataType::Int64 => {
                let parsed = values
                    .iter()
                    .map(|v| parse_cell(v.as_deref(), |s| s.parse::<i64>().ok(), "Int64"))
                    .collect::<DataResult<Vec<_>>>()?;
                Ok(Column::Int64(parsed.into()))
            }
            DataType::Float64 => {
                let parsed = values
                    .iter()
                    .map(|v| parse_cell(v.as_deref(), |s| s.parse::<f64>().ok(), "Float64"))
                    .collect::<DataResult<Vec<_>>>()?;
                Ok(Column::Float64(parsed.into()))
            }
            DataType::Boolean => {
                let parsed = values
                    .iter()
                    .map(|v| parse_cell(v.as_deref(), parse_bool, "Boolean"))
                    .collect::<DataResult<Vec<_>>>()?;
                Ok(Column::Boolean(parsed.into()))
            }
            DataType::String => Ok(Column::from_labels(
                values
                    .iter()
                    .map(|v| v.as_ref().map(|s| s.to_string()))
                    .collect(),
            )),
        }
    }
}

fn parse_cell<T>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    type_name: &str,
) -> DataResult<Option<T>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse(s).map(Some).ok_or_else(|| DataError::ParseError {
            value: s.to_string(),
            data_type: type_name.to_string(),
        }),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Accumulates raw string cells and infers the narrowest type that fits
/// every non-empty value.
#[derive(Debug, Default)]
pub struct ColumnBuilder {
    values: Vec<Option<String>>,
}

impl ColumnBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.values.push(None);
        } else {
            self.values.push(Some(trimmed.to_string()));
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn finish(self) -> Column {
        let data_type = self.infer_type();
        Column::from_strings(&self.values, data_type)
            .unwrap_or_else(|_| Column::from_labels(self.values))
    }

    fn infer_type(&self) -> DataType {
        let non_null: Vec<&str> = self
            .values
            .iter()
            .filter_map(|v| v.as_deref())
            .collect();
        if non_null.is_empty() {
            return DataType::String;
        }
        if non_null.iter().all(|s| s.parse::<i64>().is_ok()) {
            return DataType::Int64;
        }
        if non_null.iter().all(|s| s.parse::<f64>().is_ok()) {
            return DataType::Float64;
        }
        if non_null.iter().all(|s| parse_bool(s).is_some()) {
            return DataType::Boolean;
        }
        DataType::String
    }
}
