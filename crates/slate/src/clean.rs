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

use crate::classify::classify_grade;
use crate::error::{DataError, Result};
use crate::schema::{ColumnPolicy, SchemaReport, SurveySchema, normalise_header};
use crate::table::{Column, Table};
use tracing::{debug, warn};

pub const GRADE_CATEGORY: &str = "Grade Category";
pub const PERFORMANCE_TARGET: &str = "Performance Target";
pub const RESPONDENT: &str = "Respondent";

/// A survey table after header canonicalisation, policy coercion and
/// derived-column synthesis, together with what the schema check found.
#[derive(Debug, Clone)]
pub struct CleanedSurvey {
    pub table: Table,
    pub report: SchemaReport,
}

/// One numeric cell under a cleaning policy. Flag columns absorb anything
/// unparseable as 0, score columns keep it missing.
pub fn coerce_value(raw: Option<&str>, policy: ColumnPolicy) -> Option<f64> {
    let parsed = raw.and_then(|s| s.trim().parse::<f64>().ok());
    match policy {
        ColumnPolicy::FlagFill => Some(parsed.unwrap_or(0.0)),
        ColumnPolicy::ScorePropagate => parsed,
        ColumnPolicy::Text => None,
    }
}

fn coerce_column(source: &Column, policy: ColumnPolicy) -> Column {
    let values: Vec<Option<f64>> = (0..source.len())
        .map(|i| match policy {
            ColumnPolicy::FlagFill => Some(source.to_f64(i).unwrap_or(0.0)),
            _ => source.to_f64(i),
        })
        .collect();
    Column::from_f64(values)
}

fn has_identity_column(raw: &Table) -> bool {
    raw.column_names().iter().any(|name| {
        let n = normalise_header(name).to_ascii_lowercase();
        n == "respondent" || n == "id" || n == "respondent id"
    })
}

pub fn clean_survey(raw: &Table, schema: &SurveySchema) -> Result<CleanedSurvey> {
    if raw.is_empty() {
        return Err(DataError::EmptyTable.into());
    }
    let mut report = schema.validate(raw);
    for missing in &report.missing {
        warn!(column = %missing, "declared column absent from survey file");
    }

    let mut table = Table::new(raw.metadata().name.as_str());
    if let Some(source) = &raw.metadata().source_path {
        table.set_source_path(source);
    }
    if !has_identity_column(raw) {
        let ids: Vec<Option<i64>> = (1..=raw.row_count() as i64).map(Some).collect();
        table.add_column(RESPONDENT, Column::from_i64(ids))?;
    }
    for header in raw.column_names().into_iter().cloned().collect::<Vec<_>>() {
        let source = raw.get_column(&header)?;
        let (name, column) = match schema.resolve_header(&header) {
            Some(spec) if spec.policy != ColumnPolicy::Text => {
                (spec.name.clone(), coerce_column(source, spec.policy))
            }
            Some(spec) => (spec.name.clone(), source.as_ref().clone()),
            None => (header.clone(), source.as_ref().clone()),
        };
        if table.has_column(&name) {
            // two header variants canonicalise to the same spec; first wins
            warn!(header = %header, canonical = %name, "duplicate header variant dropped");
            report.collisions.push((header.clone(), name));
            continue;
        }
        table.add_column(&name, column)?;
    }

    if table.has_column(&schema.grade.name) {
        let grade = table.get_column(&schema.grade.name)?.clone();
        let categories: Vec<Option<String>> = (0..grade.len())
            .map(|i| Some(classify_grade(grade.to_f64(i)).label().to_string()))
            .collect();
        table.add_column(GRADE_CATEGORY, Column::from_labels(categories))?;
        let target: Vec<Option<f64>> =
            (0..grade.len()).map(|i| grade.to_f64(i).map(|g| -g)).collect();
        table.add_column(PERFORMANCE_TARGET, Column::from_f64(target))?;
    } else {
        warn!(column = %schema.grade.name, "grade column missing, performance analyses degrade");
    }

    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        missing = report.missing.len(),
        renamed = report.renamed.len(),
        "cleaned survey table"
    );
    Ok(CleanedSurvey { table, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnBuilder;

    fn raw_table() -> Table {
        let mut t = Table::new("survey");
        let mut grade = ColumnBuilder::new();
        let mut coding = ColumnBuilder::new();
        for (g, c) in [("1.5", "1"), ("", "x"), ("3.5", ""), ("2.0", "0")] {
            grade.push(g);
            coding.push(c);
        }
        t.add_column("Current Year\nAverage Grade:", grade.finish())
            .unwrap();
        t.add_column("Coding ", coding.finish()).unwrap();
        t
    }

    #[test]
    fn canonicalises_headers_and_applies_policies() {
        let cleaned = clean_survey(&raw_table(), &SurveySchema::builtin()).unwrap();
        let table = &cleaned.table;
        assert!(table.has_column("Current Year Average Grade:"));
        assert!(table.has_column("Coding"));
        let coding = table.get_column("Coding").unwrap();
        // flag policy: unparseable and missing both become 0
        assert_eq!(coding.f64_values(), vec![Some(1.0), Some(0.0), Some(0.0), Some(0.0)]);
        let grade = table.get_column("Current Year Average Grade:").unwrap();
        assert_eq!(grade.to_f64(1), None);
    }

    #[test]
    fn derives_category_target_and_respondent() {
        let cleaned = clean_survey(&raw_table(), &SurveySchema::builtin()).unwrap();
        let table = &cleaned.table;
        let category = table.get_column(GRADE_CATEGORY).unwrap();
        assert_eq!(category.get_string(0).as_deref(), Some("Very Good"));
        assert_eq!(category.get_string(1).as_deref(), Some("Unknown"));
        assert_eq!(category.get_string(2).as_deref(), Some("Fail"));
        let target = table.get_column(PERFORMANCE_TARGET).unwrap();
        assert_eq!(target.to_f64(0), Some(-1.5));
        assert_eq!(target.to_f64(1), None);
        let ids = table.get_column(RESPONDENT).unwrap();
        assert_eq!(ids.to_f64(3), Some(4.0));
    }

    #[test]
    fn reports_missing_declared_columns() {
        let cleaned = clean_survey(&raw_table(), &SurveySchema::builtin()).unwrap();
        assert!(!cleaned.report.is_complete());
        assert!(cleaned
            .report
            .missing
            .iter()
            .any(|m| m == "AI CHATBOT"));
        assert!(cleaned
            .report
            .renamed
            .iter()
            .any(|(from, to)| from == "Coding " && to == "Coding"));
    }

    #[test]
    fn colliding_header_variants_keep_first_and_get_reported() {
        let mut t = Table::new("survey");
        let mut first = ColumnBuilder::new();
        let mut second = ColumnBuilder::new();
        for (a, b) in [("1", "0"), ("1", "0"), ("0", "1")] {
            first.push(a);
            second.push(b);
        }
        t.add_column("Coding", first.finish()).unwrap();
        t.add_column("Coding ", second.finish()).unwrap();
        let cleaned = clean_survey(&t, &SurveySchema::builtin()).unwrap();
        // the first variant's values survive, the second is dropped
        let coding = cleaned.table.get_column("Coding").unwrap();
        assert_eq!(coding.f64_values(), vec![Some(1.0), Some(1.0), Some(0.0)]);
        assert_eq!(
            cleaned.report.collisions,
            vec![("Coding ".to_string(), "Coding".to_string())]
        );
    }

    #[test]
    fn empty_table_is_an_error() {
        let empty = Table::new("empty");
        assert!(clean_survey(&empty, &SurveySchema::builtin()).is_err());
    }
}
