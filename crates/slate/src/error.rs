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

use thiserror::Error;
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to parse YAML schema: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Failed to read schema file '{path}': {source}")]
    SchemaFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Duplicate column declaration: '{name}'")]
    DuplicateColumn { name: String },
    #[error("Column '{name}' is not declared in the survey schema")]
    UndeclaredColumn { name: String },
    #[error("Schema declares no columns")]
    EmptySchema,
}
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Survey file '{path}' not found")]
    FileNotFound { path: String },
    #[error("Failed to read survey file '{path}': {reason}")]
    FileReadError { path: String, reason: String },
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Loaded table is empty")]
    EmptyTable,
    #[error("Column '{column}' not found in table")]
    ColumnNotFound { column: String },
    #[error("Column length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Row index {0} out of bounds")]
    OutOfBounds(usize),
    #[error("Failed to parse value '{value}' as {data_type}")]
    ParseError { value: String, data_type: String },
}
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Column '{column}' is not available to the resolver")]
    ColumnNotFound { column: String },
    #[error("Chart kind '{kind}' cannot encode this result: {reason}")]
    IncompatibleEncoding { kind: String, reason: String },
    #[error("Metric '{metric}' is not numeric")]
    NonNumericMetric { metric: String },
    #[error("Invalid query configuration: {reason}")]
    InvalidConfig { reason: String },
}
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Series length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("Target column '{column}' has no numeric observations")]
    EmptyTarget { column: String },
}
pub type Result<T> = std::result::Result<T, AnalysisError>;
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type QueryResult<T> = std::result::Result<T, QueryError>;
impl AnalysisError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Query(_)
                | AnalysisError::Stats(_)
                | AnalysisError::Data(DataError::ColumnNotFound { .. })
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            AnalysisError::Schema(_) => "Schema",
            AnalysisError::Data(_) => "Data",
            AnalysisError::Query(_) => "Query",
            AnalysisError::Stats(_) => "Statistics",
            AnalysisError::Io(_) => "I/O",
            AnalysisError::Serialisation(_) => "Serialisation",
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Data(DataError::FileNotFound { path }) => format!(
                "Survey file '{path}' was not found. Supply a valid CSV file to continue."
            ),
            AnalysisError::Data(DataError::EmptyTable) => {
                "The survey table is empty. Provide a file with at least one respondent row."
                    .to_string()
            }
            AnalysisError::Query(QueryError::IncompatibleEncoding { kind, .. }) => format!(
                "The '{kind}' chart cannot be drawn from the current selection. Adjust the chart kind or the selected dimensions."
            ),
            _ => self.to_string(),
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}
impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
}
pub fn error_severity(error: &AnalysisError) -> ErrorSeverity {
    match error {
        AnalysisError::Query(_) => ErrorSeverity::Warning,
        AnalysisError::Stats(_) => ErrorSeverity::Warning,
        AnalysisError::Schema(SchemaError::EmptySchema) => ErrorSeverity::Critical,
        AnalysisError::Schema(_) => ErrorSeverity::Error,
        _ => ErrorSeverity::Error,
    }
}
