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

//! Survey analysis core for AI-usage questionnaires: schema-driven cleaning,
//! grade classification, Likert labelling, profiling, correlation, and an
//! aggregation resolver that pairs each result table with a chart encoding.

pub mod classify;
pub mod clean;
pub mod encoding;
pub mod error;
pub mod profile;
pub mod query;
pub mod schema;
pub mod session;
pub mod stats;
pub mod table;

pub use classify::{BinaryLabel, GradeBand, LabelMode, LikertLabel, classify_grade};
pub use clean::{CleanedSurvey, GRADE_CATEGORY, PERFORMANCE_TARGET, RESPONDENT, clean_survey};
pub use encoding::{ChartEncoding, ChartKind, Role, check_compatibility, suggest_kinds};
pub use error::{AnalysisError, Result};
pub use profile::{ColumnProfile, ProfilingConfig, SurveySummary, profile_table, summarise};
pub use query::{
    AggStat, AggregationMode, Metric, QueryConfig, Resolution, SortDirective, resolve,
    usage_totals,
};
pub use schema::{ColumnPolicy, ColumnSpec, SchemaReport, SurveySchema};
pub use session::Session;
pub use table::{Column, DataType, Table};

use crate::error::DataError;
use std::path::Path;
use std::sync::Arc;

/// The three correlation tabs of the impact-analysis page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactPreset {
    Tools,
    Modes,
    Perception,
}

/// Facade over schema, session and resolver, with the original dashboard's
/// three analysis pages as presets.
pub struct SurveyAnalysisSystem {
    session: Session,
}

impl Default for SurveyAnalysisSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SurveyAnalysisSystem {
    pub fn new() -> Self {
        Self {
            session: Session::new(SurveySchema::builtin()),
        }
    }

    pub fn with_schema_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            session: Session::new(SurveySchema::from_yaml_file(path)?),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<CleanedSurvey>> {
        self.session.load(path)
    }

    pub fn run(&mut self, config: &QueryConfig) -> Result<Resolution> {
        self.session.run(config)
    }

    fn snapshot(&self) -> Result<Arc<CleanedSurvey>> {
        self.session
            .snapshot()
            .cloned()
            .ok_or_else(|| DataError::EmptyTable.into())
    }

    /// Grade-band distribution of the cohort.
    pub fn overview(&mut self) -> Result<Resolution> {
        let config = QueryConfig::new(AggregationMode::FrequencyCount).with_x(GRADE_CATEGORY);
        self.session.run(&config)
    }

    /// Per-tool user totals, most used first.
    pub fn tool_usage(&self) -> Result<Table> {
        let survey = self.snapshot()?;
        let flags: Vec<String> = self
            .session
            .schema()
            .tools
            .iter()
            .map(|spec| spec.name.clone())
            .collect();
        usage_totals(&survey.table, &flags)
    }

    /// Stacked No/Yes counts per usage mode.
    pub fn mode_usage(&mut self) -> Result<Resolution> {
        let modes: Vec<&str> = self
            .session
            .schema()
            .modes
            .iter()
            .map(|spec| spec.name.as_str())
            .collect();
        let config = QueryConfig::new(AggregationMode::LikertDistribution)
            .with_columns(&modes)
            .with_label_mode(LabelMode::Binary)
            .sorted_by_level("Yes", false);
        self.session.run(&config)
    }

    /// Correlations against the derived performance target, strongest first.
    pub fn impact(&mut self, preset: ImpactPreset) -> Result<Resolution> {
        let schema = self.session.schema();
        let attrs: Vec<String> = match preset {
            ImpactPreset::Tools => schema.tools.iter().map(|s| s.name.clone()).collect(),
            ImpactPreset::Modes => schema.modes.iter().map(|s| s.name.clone()).collect(),
            ImpactPreset::Perception => schema
                .sections
                .iter()
                .map(|s| s.score_column.clone())
                .collect(),
        };
        let mut config = QueryConfig::new(AggregationMode::CorrelationTrend)
            .with_target(PERFORMANCE_TARGET)
            .sorted(false);
        config.metrics = attrs.into_iter().map(Metric::Column).collect();
        self.session.run(&config)
    }

    pub fn profile(&self) -> Result<Vec<ColumnProfile>> {
        let survey = self.snapshot()?;
        Ok(profile_table(&survey.table, &ProfilingConfig::default()))
    }

    pub fn summary(&self) -> Result<SurveySummary> {
        let survey = self.snapshot()?;
        let profiles = profile_table(&survey.table, &ProfilingConfig::default());
        Ok(summarise(&survey.table, &profiles))
    }
}
