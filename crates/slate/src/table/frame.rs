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

use super::column::Column;
use crate::error::{DataError, DataResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct TableMetadata {
    pub id: Uuid,
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub created_at: DateTime<Utc>,
    pub source_path: Option<String>,
}

impl TableMetadata {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            row_count: 0,
            column_count: 0,
            created_at: Utc::now(),
            source_path: None,
        }
    }
}

/// Ordered collection of equally sized columns.
#[derive(Debug, Clone)]
pub struct Table {
    columns: HashMap<String, Arc<Column>>,
    column_order: Vec<String>,
    metadata: TableMetadata,
}

impl Table {
    pub fn new(name: &str) -> Self {
        Self {
            columns: HashMap::new(),
            column_order: Vec::new(),
            metadata: TableMetadata::new(name),
        }
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    pub fn set_source_path(&mut self, path: &str) {
        self.metadata.source_path = Some(path.to_string());
    }

    pub fn row_count(&self) -> usize {
        self.column_order
            .first()
            .and_then(|name| self.columns.get(name))
            .map_or(0, |c| c.len())
    }

    pub fn column_count(&self) -> usize {
        self.column_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.column_count() == 0
    }

    pub fn column_names(&self) -> Vec<&String> {
        self.column_order.iter().collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn get_column(&self, name: &str) -> DataResult<&Arc<Column>> {
        self.columns
            .get(name)
            .ok_or_else(|| DataError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    pub fn add_column(&mut self, name: &str, column: Column) -> DataResult<()> {
        if !self.column_order.is_empty() {
            let expected = self.row_count();
            if column.len() != expected {
                return Err(DataError::LengthMismatch {
                    expected,
                    actual: column.len(),
                });
            }
        }
        if !self.columns.contains_key(name) {
            self.column_order.push(name.to_string());
        }
        self.columns.insert(name.to_string(), Arc::new(column));
        self.metadata.row_count = self.row_count();
        self.metadata.column_count = self.column_count();
        Ok(())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> DataResult<()> {
        let column = self
            .columns
            .remove(from)
            .ok_or_else(|| DataError::ColumnNotFound {
                column: from.to_string(),
            })?;
        self.columns.insert(to.to_string(), column);
        if let Some(slot) = self.column_order.iter_mut().find(|n| *n == from) {
            *slot = to.to_string();
        }
        Ok(())
    }

    pub fn select(&self, names: &[&str]) -> DataResult<Table> {
        let mut out = Table::new(&self.metadata.name);
        out.metadata.source_path = self.metadata.source_path.clone();
        for name in names {
            let column = self.get_column(name)?;
            out.column_order.push((*name).to_string());
            out.columns.insert((*name).to_string(), Arc::clone(column));
        }
        out.metadata.row_count = out.row_count();
        out.metadata.column_count = out.column_count();
        Ok(out)
    }

    pub fn select_rows(&self, indices: &[usize]) -> Table {
        let mut out = Table::new(&self.metadata.name);
        out.metadata.source_path = self.metadata.source_path.clone();
        for name in &self.column_order {
            let column = self.columns[name].select_rows(indices);
            out.column_order.push(name.clone());
            out.columns.insert(name.clone(), Arc::new(column));
        }
        out.metadata.row_count = out.row_count();
        out.metadata.column_count = out.column_count();
        out
    }

    pub fn filter<F: Fn(usize) -> bool>(&self, predicate: F) -> Table {
        let indices: Vec<usize> = (0..self.row_count()).filter(|&i| predicate(i)).collect();
        self.select_rows(&indices)
    }

    /// Stable sort on a numeric reading of `column`. Missing values always
    /// order last.
    pub fn sort_by_f64(&self, column: &str, ascending: bool) -> DataResult<Table> {
        let col = self.get_column(column)?;
        let mut indices: Vec<usize> = (0..self.row_count()).collect();
        indices.sort_by(|&a, &b| match (col.to_f64(a), col.to_f64(b)) {
            (Some(x), Some(y)) => {
                let ordering = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                if ascending { ordering } else { ordering.reverse() }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Ok(self.select_rows(&indices))
    }

    /// Stable sort placing rows in the order their `column` value appears in
    /// `order`; values absent from `order` keep their position at the end.
    pub fn sort_by_key_order(&self, column: &str, order: &[String]) -> DataResult<Table> {
        let col = self.get_column(column)?;
        let rank = |i: usize| -> usize {
            col.get_string(i)
                .and_then(|v| order.iter().position(|o| *o == v))
                .unwrap_or(order.len())
        };
        let mut indices: Vec<usize> = (0..self.row_count()).collect();
        indices.sort_by_key(|&i| rank(i));
        Ok(self.select_rows(&indices))
    }

    pub fn row_strings(&self, index: usize) -> Vec<String> {
        self.column_order
            .iter()
            .map(|name| {
                self.columns[name]
                    .get_string(index)
                    .unwrap_or_else(|| "null".to_string())
            })
            .collect()
    }

    pub fn print_sample(&self, n: usize) {
        let headers: Vec<String> = self.column_order.clone();
        println!("{}", headers.join(" | "));
        println!("{}", headers.iter().map(|h| "-".repeat(h.len())).collect::<Vec<_>>().join("-|-"));
        for i in 0..self.row_count().min(n) {
            println!("{}", self.row_strings(i).join(" | "));
        }
        if self.row_count() > n {
            println!("... ({} rows total)", self.row_count());
        }
    }
}
