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

use super::column::ColumnBuilder;
use super::frame::Table;
use crate::error::{DataError, DataResult};
use std::path::Path;
use tracing::debug;

/// Reads a CSV file into a string-cell table. Quoted headers may contain
/// embedded line breaks; canonicalisation happens later against the schema.
pub fn read_csv<P: AsRef<Path>>(path: P, name: &str) -> DataResult<Table> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(DataError::EmptyTable);
    }
    let mut builders: Vec<ColumnBuilder> = headers.iter().map(|_| ColumnBuilder::new()).collect();
    for record in reader.records() {
        let record = record?;
        for (i, builder) in builders.iter_mut().enumerate() {
            builder.push(record.get(i).unwrap_or(""));
        }
    }
    let mut table = Table::new(name);
    table.set_source_path(&path.display().to_string());
    for (header, builder) in headers.iter().zip(builders) {
        table.add_column(header, builder.finish())?;
    }
    if table.is_empty() {
        return Err(DataError::EmptyTable);
    }
    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded csv file"
    );
    Ok(table)
}

pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> DataResult<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    let headers: Vec<String> = table.column_names().into_iter().cloned().collect();
    writer.write_record(&headers)?;
    for i in 0..table.row_count() {
        writer.write_record(table.row_strings(i))?;
    }
    writer.flush().map_err(|e| DataError::FileReadError {
        path: path.as_ref().display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}
