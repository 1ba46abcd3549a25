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

use serde::{Deserialize, Serialize};

/// Philippine-style grade bands where lower numeric grades are better.
/// Band upper bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeBand {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Pass,
    Fail,
    Unknown,
}

impl GradeBand {
    pub const DISPLAY_ORDER: [GradeBand; 7] = [
        GradeBand::Excellent,
        GradeBand::VeryGood,
        GradeBand::Good,
        GradeBand::Fair,
        GradeBand::Pass,
        GradeBand::Fail,
        GradeBand::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GradeBand::Excellent => "Excellent",
            GradeBand::VeryGood => "Very Good",
            GradeBand::Good => "Good",
            GradeBand::Fair => "Fair",
            GradeBand::Pass => "Pass",
            GradeBand::Fail => "Fail",
            GradeBand::Unknown => "Unknown",
        }
    }

    pub fn display_labels() -> Vec<String> {
        Self::DISPLAY_ORDER.iter().map(|b| b.label().to_string()).collect()
    }
}

pub fn classify_grade(grade: Option<f64>) -> GradeBand {
    match grade {
        None => GradeBand::Unknown,
        Some(g) if g.is_nan() => GradeBand::Unknown,
        Some(g) if g <= 1.25 => GradeBand::Excellent,
        Some(g) if g <= 1.75 => GradeBand::VeryGood,
        Some(g) if g <= 2.25 => GradeBand::Good,
        Some(g) if g <= 2.75 => GradeBand::Fair,
        Some(g) if g <= 3.00 => GradeBand::Pass,
        Some(_) => GradeBand::Fail,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LikertLabel {
    StronglyDisagree,
    Disagree,
    Neutral,
    Agree,
    StronglyAgree,
    Unknown,
}

impl LikertLabel {
    pub const DISPLAY_ORDER: [LikertLabel; 6] = [
        LikertLabel::StronglyDisagree,
        LikertLabel::Disagree,
        LikertLabel::Neutral,
        LikertLabel::Agree,
        LikertLabel::StronglyAgree,
        LikertLabel::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LikertLabel::StronglyDisagree => "Strongly Disagree",
            LikertLabel::Disagree => "Disagree",
            LikertLabel::Neutral => "Neutral",
            LikertLabel::Agree => "Agree",
            LikertLabel::StronglyAgree => "Strongly Agree",
            LikertLabel::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryLabel {
    No,
    Yes,
}

impl BinaryLabel {
    pub fn label(&self) -> &'static str {
        match self {
            BinaryLabel::No => "No",
            BinaryLabel::Yes => "Yes",
        }
    }
}

/// How numeric response codes render as category labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelMode {
    /// 1..5 agreement scale.
    Agreement,
    /// 0/1 No/Yes flags.
    Binary,
    /// 0/1 flags, keeping only rows with the chosen label.
    BinaryOnly(BinaryLabel),
}

fn as_code(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

pub fn agreement_label(code: Option<f64>) -> LikertLabel {
    match code.and_then(as_code) {
        Some(1) => LikertLabel::StronglyDisagree,
        Some(2) => LikertLabel::Disagree,
        Some(3) => LikertLabel::Neutral,
        Some(4) => LikertLabel::Agree,
        Some(5) => LikertLabel::StronglyAgree,
        _ => LikertLabel::Unknown,
    }
}

pub fn binary_label(code: Option<f64>) -> Option<BinaryLabel> {
    match code.and_then(as_code) {
        Some(0) => Some(BinaryLabel::No),
        Some(1) => Some(BinaryLabel::Yes),
        _ => None,
    }
}

impl LabelMode {
    /// Renders a response code. `None` means the row is dropped in this
    /// mode, not that the code is unknown.
    pub fn render(&self, code: Option<f64>) -> Option<String> {
        match self {
            LabelMode::Agreement => Some(agreement_label(code).label().to_string()),
            LabelMode::Binary => Some(
                binary_label(code)
                    .map(|b| b.label().to_string())
                    .unwrap_or_else(|| "Unknown".to_string()),
            ),
            LabelMode::BinaryOnly(selected) => match binary_label(code) {
                Some(b) if b == *selected => Some(b.label().to_string()),
                _ => None,
            },
        }
    }

    /// Fixed category ordering for display, independent of data order.
    pub fn display_order(&self) -> Vec<String> {
        match self {
            LabelMode::Agreement => LikertLabel::DISPLAY_ORDER
                .iter()
                .map(|l| l.label().to_string())
                .collect(),
            LabelMode::Binary => vec![
                "No".to_string(),
                "Yes".to_string(),
                "Unknown".to_string(),
            ],
            LabelMode::BinaryOnly(selected) => vec![selected.label().to_string()],
        }
    }
}
