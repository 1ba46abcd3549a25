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

use crate::clean::{CleanedSurvey, clean_survey};
use crate::error::{DataError, Result};
use crate::query::{QueryConfig, Resolution, resolve};
use crate::schema::SurveySchema;
use crate::table::read_csv;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::info;

/// Identity of a source file. A matching stamp means the memoized snapshot
/// is reused without re-reading the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStamp {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
}

impl SourceStamp {
    fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|_| DataError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub detail: String,
}

/// Holds at most one live cleaned snapshot. Loading a changed or different
/// file replaces the snapshot wholesale.
#[derive(Debug, Default)]
pub struct Session {
    schema: SurveySchema,
    snapshot: Option<(SourceStamp, Arc<CleanedSurvey>)>,
    history: Vec<OperationRecord>,
}

impl Session {
    pub fn new(schema: SurveySchema) -> Self {
        Self {
            schema,
            snapshot: None,
            history: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SurveySchema {
        &self.schema
    }

    pub fn snapshot(&self) -> Option<&Arc<CleanedSurvey>> {
        self.snapshot.as_ref().map(|(_, survey)| survey)
    }

    pub fn history(&self) -> &[OperationRecord] {
        &self.history
    }

    fn record(&mut self, operation: &str, detail: String) {
        self.history.push(OperationRecord {
            timestamp: Utc::now(),
            operation: operation.to_string(),
            detail,
        });
    }

    /// Parses and cleans the file, memoized on (path, byte length, mtime).
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<CleanedSurvey>> {
        let path = path.as_ref();
        let stamp = SourceStamp::of(path)?;
        if let Some((cached_stamp, survey)) = &self.snapshot {
            if *cached_stamp == stamp {
                let survey = Arc::clone(survey);
                info!(path = %path.display(), "snapshot reused, source unchanged");
                self.record("load", format!("cache hit for {}", path.display()));
                return Ok(survey);
            }
        }
        let raw = read_csv(path, "survey")?;
        let cleaned = Arc::new(clean_survey(&raw, &self.schema)?);
        info!(
            path = %path.display(),
            rows = cleaned.table.row_count(),
            missing = cleaned.report.missing.len(),
            "survey loaded and cleaned"
        );
        self.record(
            "load",
            format!("{} ({} rows)", path.display(), cleaned.table.row_count()),
        );
        self.snapshot = Some((stamp, Arc::clone(&cleaned)));
        Ok(cleaned)
    }

    /// One linear resolve pass over the current snapshot.
    pub fn run(&mut self, config: &QueryConfig) -> Result<Resolution> {
        let survey = self
            .snapshot()
            .cloned()
            .ok_or(DataError::EmptyTable)?;
        let resolution = resolve(&survey.table, config, &self.schema)?;
        self.record("query", format!("{:?}", config.mode));
        Ok(resolution)
    }
}
