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

use crate::error::{SchemaError, SchemaResult};
use crate::table::Table;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapses every whitespace run (spaces, tabs, embedded line breaks) to a
/// single space and trims the ends. All header lookups go through this.
pub fn normalise_header(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw.trim(), " ").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnPolicy {
    /// Numeric 0/1 flag; unparseable or missing values become 0.
    FlagFill,
    /// Numeric score; unparseable or missing values stay missing.
    ScorePropagate,
    /// Free text, passed through untouched.
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub policy: ColumnPolicy,
    /// Lower raw values mean better outcomes (grade scales).
    #[serde(default)]
    pub inverted_scale: bool,
}

impl ColumnSpec {
    pub fn flag(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            policy: ColumnPolicy::FlagFill,
            inverted_scale: false,
        }
    }
    pub fn score(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            policy: ColumnPolicy::ScorePropagate,
            inverted_scale: false,
        }
    }
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }
    pub fn inverted(mut self) -> Self {
        self.inverted_scale = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikertSection {
    pub name: String,
    pub score_column: String,
    #[serde(default)]
    pub question_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySchema {
    pub grade: ColumnSpec,
    #[serde(default)]
    pub tools: Vec<ColumnSpec>,
    #[serde(default)]
    pub modes: Vec<ColumnSpec>,
    #[serde(default)]
    pub sections: Vec<LikertSection>,
    #[serde(default)]
    pub extra: Vec<ColumnSpec>,
}

/// Outcome of checking a loaded table against the declared schema. Missing
/// columns degrade the affected analyses instead of failing the load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaReport {
    pub present: Vec<String>,
    pub missing: Vec<String>,
    pub renamed: Vec<(String, String)>,
    /// Raw headers dropped because an earlier header already canonicalised
    /// to the same spec, as (raw header, canonical name).
    pub collisions: Vec<(String, String)>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl Default for SurveySchema {
    fn default() -> Self {
        SurveySchema::builtin()
    }
}

impl SurveySchema {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            SchemaError::SchemaFileError {
                path: path.as_ref().display().to_string(),
                source,
            }
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> SchemaResult<Self> {
        let schema: SurveySchema = serde_yaml::from_str(raw)?;
        schema.check_declarations()?;
        Ok(schema)
    }

    /// Schema of the original AI-usage survey export, including the legacy
    /// header variants that dataset actually shipped with (trailing spaces,
    /// line-broken headers).
    pub fn builtin() -> Self {
        let sections = vec![
            LikertSection {
                name: "General Perception".to_string(),
                score_column: "General Perception of AI in Higher Education".to_string(),
                question_columns: (1..=5)
                    .map(|i| format!("General Perception Q{i}"))
                    .collect(),
            },
            LikertSection {
                name: "Current Use".to_string(),
                score_column: "Current use of AI in Higher Education".to_string(),
                question_columns: (1..=5).map(|i| format!("Current Use Q{i}")).collect(),
            },
            LikertSection {
                name: "Student Experience".to_string(),
                score_column: "Impact of AI on the Students Experience".to_string(),
                question_columns: (1..=5)
                    .map(|i| format!("Student Experience Q{i}"))
                    .collect(),
            },
            LikertSection {
                name: "Concerns".to_string(),
                score_column: "Concern about the use of AI in higher education".to_string(),
                question_columns: (1..=5).map(|i| format!("Concerns Q{i}")).collect(),
            },
            LikertSection {
                name: "Future Expectations".to_string(),
                score_column: "Future expectations of AI in higher education".to_string(),
                question_columns: (1..=5)
                    .map(|i| format!("Future Expectations Q{i}"))
                    .collect(),
            },
        ];
        let mut extra: Vec<ColumnSpec> = sections
            .iter()
            .map(|s| ColumnSpec::score(&s.score_column))
            .collect();
        extra.extend(
            sections
                .iter()
                .flat_map(|s| s.question_columns.iter())
                .map(|q| ColumnSpec::score(q)),
        );
        Self {
            grade: ColumnSpec::score("Current Year Average Grade:")
                .with_aliases(&["Current Year Average Grade", "Average Grade:"])
                .inverted(),
            tools: vec![
                ColumnSpec::flag("AI CHATBOT"),
                ColumnSpec::flag("AI FOR PROGRAMMING"),
                ColumnSpec::flag("WRITING ASSISTANT"),
            ],
            modes: vec![
                ColumnSpec::flag("Coding"),
                ColumnSpec::flag("Academic Assignment"),
                ColumnSpec::flag("Learning Support"),
                ColumnSpec::flag("Research"),
            ],
            sections,
            extra,
        }
    }

    pub fn all_specs(&self) -> impl Iterator<Item = &ColumnSpec> {
        std::iter::once(&self.grade)
            .chain(self.tools.iter())
            .chain(self.modes.iter())
            .chain(self.extra.iter())
    }

    pub fn spec_for(&self, canonical: &str) -> Option<&ColumnSpec> {
        self.all_specs().find(|s| s.name == canonical)
    }

    /// Maps a raw header to its canonical spec. Normalised forms are tried
    /// first, then the explicit alias table.
    pub fn resolve_header(&self, raw: &str) -> Option<&ColumnSpec> {
        let normalised = normalise_header(raw);
        self.all_specs().find(|spec| {
            normalise_header(&spec.name) == normalised
                || spec
                    .aliases
                    .iter()
                    .any(|alias| normalise_header(alias) == normalised)
        })
    }

    pub fn validate(&self, table: &Table) -> SchemaReport {
        let mut report = SchemaReport::default();
        let headers: Vec<String> = table.column_names().into_iter().cloned().collect();
        let normalised: HashSet<String> =
            headers.iter().map(|h| normalise_header(h)).collect();
        for spec in self.all_specs() {
            let canonical = normalise_header(&spec.name);
            let found = normalised.contains(&canonical)
                || spec
                    .aliases
                    .iter()
                    .any(|alias| normalised.contains(&normalise_header(alias)));
            if found {
                report.present.push(spec.name.clone());
            } else {
                report.missing.push(spec.name.clone());
            }
        }
        for header in &headers {
            if let Some(spec) = self.resolve_header(header) {
                if header != &spec.name {
                    report.renamed.push((header.clone(), spec.name.clone()));
                }
            }
        }
        report
    }

    fn check_declarations(&self) -> SchemaResult<()> {
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut count = 0usize;
        for spec in self.all_specs() {
            count += 1;
            let key = normalise_header(&spec.name);
            if let Some(previous) = seen.insert(key, spec.name.clone()) {
                return Err(SchemaError::DuplicateColumn { name: previous });
            }
        }
        if count == 0 {
            return Err(SchemaError::EmptySchema);
        }
        for section in &self.sections {
            if self.spec_for(&section.score_column).is_none() && section.score_column != self.grade.name
            {
                return Err(SchemaError::UndeclaredColumn {
                    name: section.score_column.clone(),
                });
            }
        }
        Ok(())
    }
}
