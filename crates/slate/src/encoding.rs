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

use crate::error::{QueryError, QueryResult};
use crate::query::AggregationMode;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    X,
    Y,
    Color,
    Size,
    Text,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::X => "x",
            Role::Y => "y",
            Role::Color => "color",
            Role::Size => "size",
            Role::Text => "text",
        }
    }
}

/// Column-to-role assignment the renderer collaborator consumes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartEncoding {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub text: Option<String>,
}

impl ChartEncoding {
    pub fn xy(x: &str, y: &str) -> Self {
        Self {
            x: Some(x.to_string()),
            y: Some(y.to_string()),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::X => self.x.as_deref(),
            Role::Y => self.y.as_deref(),
            Role::Color => self.color.as_deref(),
            Role::Size => self.size.as_deref(),
            Role::Text => self.text.as_deref(),
        }
    }

    pub fn mappings(&self) -> Vec<(Role, &str)> {
        [Role::X, Role::Y, Role::Color, Role::Size, Role::Text]
            .into_iter()
            .filter_map(|role| self.get(role).map(|c| (role, c)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChartKind {
    Pie,
    Bar,
    StackedBar,
    GroupedBar,
    HorizontalBar,
    Line,
    Area,
    Scatter,
    Bubble,
    Histogram,
    Box,
    Violin,
    Strip,
    Heatmap,
    Funnel,
}

#[derive(Debug, Clone)]
pub struct KindSpec {
    pub kind: ChartKind,
    pub name: &'static str,
    pub required: &'static [Role],
    pub optional: &'static [Role],
}

pub static CATALOGUE: [KindSpec; 15] = [
    KindSpec { kind: ChartKind::Pie, name: "pie", required: &[Role::X, Role::Y], optional: &[Role::Text] },
    KindSpec { kind: ChartKind::Bar, name: "bar", required: &[Role::X, Role::Y], optional: &[Role::Color, Role::Text] },
    KindSpec { kind: ChartKind::StackedBar, name: "stacked_bar", required: &[Role::X, Role::Y, Role::Color], optional: &[Role::Text] },
    KindSpec { kind: ChartKind::GroupedBar, name: "grouped_bar", required: &[Role::X, Role::Y, Role::Color], optional: &[Role::Text] },
    KindSpec { kind: ChartKind::HorizontalBar, name: "horizontal_bar", required: &[Role::X, Role::Y], optional: &[Role::Color] },
    KindSpec { kind: ChartKind::Line, name: "line", required: &[Role::X, Role::Y], optional: &[Role::Color] },
    KindSpec { kind: ChartKind::Area, name: "area", required: &[Role::X, Role::Y], optional: &[Role::Color] },
    KindSpec { kind: ChartKind::Scatter, name: "scatter", required: &[Role::X, Role::Y], optional: &[Role::Color, Role::Size, Role::Text] },
    KindSpec { kind: ChartKind::Bubble, name: "bubble", required: &[Role::X, Role::Y, Role::Size], optional: &[Role::Color] },
    KindSpec { kind: ChartKind::Histogram, name: "histogram", required: &[Role::X], optional: &[Role::Color] },
    KindSpec { kind: ChartKind::Box, name: "box", required: &[Role::Y], optional: &[Role::X, Role::Color] },
    KindSpec { kind: ChartKind::Violin, name: "violin", required: &[Role::Y], optional: &[Role::X, Role::Color] },
    KindSpec { kind: ChartKind::Strip, name: "strip", required: &[Role::Y], optional: &[Role::X, Role::Color] },
    KindSpec { kind: ChartKind::Heatmap, name: "heatmap", required: &[Role::X, Role::Y, Role::Color], optional: &[Role::Text] },
    KindSpec { kind: ChartKind::Funnel, name: "funnel", required: &[Role::X, Role::Y], optional: &[Role::Color] },
];

pub fn kind_spec(kind: ChartKind) -> &'static KindSpec {
    CATALOGUE
        .iter()
        .find(|spec| spec.kind == kind)
        .unwrap_or(&CATALOGUE[1])
}

/// Chart kinds whose required roles are all filled by the encoding and
/// whose geometry fits the resolver mode that produced it.
pub fn suggest_kinds(encoding: &ChartEncoding, mode: AggregationMode) -> Vec<ChartKind> {
    CATALOGUE
        .iter()
        .filter(|spec| spec.required.iter().all(|role| encoding.get(*role).is_some()))
        .filter(|spec| match mode {
            // coefficients are signed, part-of-whole kinds cannot show them
            AggregationMode::CorrelationTrend => {
                !matches!(spec.kind, ChartKind::Pie | ChartKind::Funnel)
            }
            _ => true,
        })
        .map(|spec| spec.kind)
        .collect()
}

/// A kind/encoding mismatch is a recoverable configuration warning, the
/// session stays usable.
pub fn check_compatibility(kind: ChartKind, encoding: &ChartEncoding) -> QueryResult<()> {
    let spec = kind_spec(kind);
    for role in spec.required {
        if encoding.get(*role).is_none() {
            return Err(QueryError::IncompatibleEncoding {
                kind: spec.name.to_string(),
                reason: format!("required role '{}' has no column assigned", role.as_str()),
            });
        }
    }
    for (role, _) in encoding.mappings() {
        if !spec.required.contains(&role) && !spec.optional.contains(&role) {
            return Err(QueryError::IncompatibleEncoding {
                kind: spec.name.to_string(),
                reason: format!("role '{}' is not supported by this kind", role.as_str()),
            });
        }
    }
    Ok(())
}
