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

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use slate::query::{AggStat, AggregationMode, Metric, QueryConfig};
use slate::{
    BinaryLabel, ImpactPreset, LabelMode, Resolution, SurveyAnalysisSystem, suggest_kinds,
};
use tracing::Level;

#[derive(Parser)]
#[command(name = "survey-dashboard-demo")]
#[command(about = "Terminal front end for the slate survey analysis core")]
struct Cli {
    /// Survey CSV export to analyse
    #[arg(long, default_value = "dataset.csv")]
    data: String,
    /// Optional YAML schema overriding the builtin one
    #[arg(long)]
    schema: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cohort summary and grade-band distribution
    Overview,
    /// Usage-habits page: tool totals or per-mode No/Yes counts
    Usage {
        #[arg(value_enum, default_value_t = UsageKind::Tools)]
        kind: UsageKind,
    },
    /// Impact-analysis page: correlations against the performance target
    Impact {
        #[arg(value_enum, default_value_t = ImpactKind::Tools)]
        kind: ImpactKind,
    },
    /// Free-form resolver queries
    Explore {
        #[arg(long, value_enum)]
        mode: ExploreMode,
        #[arg(long)]
        x: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Comma-separated metric / question / attribute columns
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        #[arg(long)]
        target: Option<String>,
        /// Label 0/1 responses as No/Yes instead of the agreement scale
        #[arg(long)]
        binary: bool,
        /// Keep only one binary response level
        #[arg(long, value_enum)]
        only: Option<OnlyLevel>,
        #[arg(long)]
        percentage: bool,
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
        /// Order Likert x categories by this response level's count
        #[arg(long)]
        sort_level: Option<String>,
    },
    /// Per-column profile of the cleaned table
    Profile,
}

#[derive(Clone, Copy, ValueEnum)]
enum UsageKind {
    Tools,
    Modes,
}

#[derive(Clone, Copy, ValueEnum)]
enum ImpactKind {
    Tools,
    Modes,
    Perception,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExploreMode {
    Raw,
    Frequency,
    Likert,
    Mean,
    Median,
    Correlation,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnlyLevel {
    No,
    Yes,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortOrder {
    Asc,
    Desc,
}

fn print_resolution(resolution: &Resolution, mode: AggregationMode) {
    match resolution {
        Resolution::Chart { table, encoding } => {
            table.print_sample(50);
            println!();
            for (role, column) in encoding.mappings() {
                println!("{:>6} -> {column}", role.as_str());
            }
            let kinds: Vec<&str> = suggest_kinds(encoding, mode)
                .into_iter()
                .map(|k| slate::encoding::kind_spec(k).name)
                .collect();
            println!("chart kinds: {}", kinds.join(", "));
        }
        Resolution::Insufficient { missing } => {
            println!("selection incomplete, still needed: {}", missing.join(", "));
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
    let cli = Cli::parse();

    let mut system = match &cli.schema {
        Some(path) => SurveyAnalysisSystem::with_schema_file(path)
            .with_context(|| format!("loading schema from {path}"))?,
        None => SurveyAnalysisSystem::new(),
    };
    system
        .load(&cli.data)
        .with_context(|| format!("loading survey data from {}", cli.data))?;

    match cli.command {
        Command::Overview => {
            let summary = system.summary()?;
            println!(
                "{} respondents, {} numeric / {} categorical columns, avg {:.1}% missing",
                summary.respondents,
                summary.numeric_columns,
                summary.categorical_columns,
                summary.avg_null_percentage
            );
            println!();
            print_resolution(&system.overview()?, AggregationMode::FrequencyCount);
        }
        Command::Usage { kind } => match kind {
            UsageKind::Tools => system.tool_usage()?.print_sample(20),
            UsageKind::Modes => print_resolution(&system.mode_usage()?, AggregationMode::LikertDistribution),
        },
        Command::Impact { kind } => {
            let preset = match kind {
                ImpactKind::Tools => ImpactPreset::Tools,
                ImpactKind::Modes => ImpactPreset::Modes,
                ImpactKind::Perception => ImpactPreset::Perception,
            };
            print_resolution(&system.impact(preset)?, AggregationMode::CorrelationTrend);
        }
        Command::Explore {
            mode,
            x,
            color,
            columns,
            target,
            binary,
            only,
            percentage,
            sort,
            sort_level,
        } => {
            let aggregation = match mode {
                ExploreMode::Raw => AggregationMode::Raw,
                ExploreMode::Frequency => AggregationMode::FrequencyCount,
                ExploreMode::Likert => AggregationMode::LikertDistribution,
                ExploreMode::Mean => AggregationMode::Aggregate(AggStat::Mean),
                ExploreMode::Median => AggregationMode::Aggregate(AggStat::Median),
                ExploreMode::Correlation => AggregationMode::CorrelationTrend,
            };
            let mut config = QueryConfig::new(aggregation);
            config.x = x;
            config.color = color;
            config.metrics = columns.into_iter().map(Metric::Column).collect();
            config.target = target;
            config.label_mode = match (only, binary) {
                (Some(OnlyLevel::No), _) => LabelMode::BinaryOnly(BinaryLabel::No),
                (Some(OnlyLevel::Yes), _) => LabelMode::BinaryOnly(BinaryLabel::Yes),
                (None, true) => LabelMode::Binary,
                (None, false) => LabelMode::Agreement,
            };
            config.percentage = percentage;
            config.sort = sort.map(|s| slate::SortDirective {
                ascending: matches!(s, SortOrder::Asc),
                level: sort_level,
            });
            print_resolution(&system.run(&config)?, aggregation);
        }
        Command::Profile => {
            let profiles = system.profile()?;
            for profile in &profiles {
                let stats = profile
                    .numeric_stats
                    .as_ref()
                    .map(|s| format!("mean {:.2}, median {:.2}, std {:.2}", s.mean, s.median, s.std_dev))
                    .unwrap_or_else(|| format!("{} distinct values", profile.cardinality));
                println!(
                    "{:<45} {:>5.1}% missing  {}",
                    profile.name, profile.null_percentage, stats
                );
                for issue in &profile.issues {
                    println!("{:<45} issue: {issue}", "");
                }
            }
        }
    }
    Ok(())
}
