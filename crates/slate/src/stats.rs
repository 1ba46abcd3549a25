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

use crate::error::{DataResult, StatsError};
use crate::table::Table;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Pearson correlation over pairwise-complete observations. A row counts
/// for a pair only when both sides are present. Degenerate inputs (fewer
/// than two complete pairs, or zero variance on either side) give `None`.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> std::result::Result<Option<f64>, StatsError> {
    if xs.len() != ys.len() {
        return Err(StatsError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return Ok(None);
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return Ok(None);
    }
    Ok(Some(cov / (var_x.sqrt() * var_y.sqrt())))
}

/// Correlates each attribute column against the target. Attribute gaps are
/// zero-filled (flag reading), target gaps exclude the row pairwise.
/// `invert` flips every coefficient's sign.
pub fn correlate(
    table: &Table,
    attrs: &[String],
    target: &str,
    invert: bool,
) -> DataResult<Vec<(String, Option<f64>)>> {
    let target_col = table.get_column(target)?;
    let target_values = target_col.f64_values();
    let mut out = Vec::with_capacity(attrs.len());
    for attr in attrs {
        let attr_col = table.get_column(attr)?;
        let attr_values: Vec<Option<f64>> = attr_col
            .f64_values()
            .into_iter()
            .map(|v| Some(v.unwrap_or(0.0)))
            .collect();
        let coef = pearson(&attr_values, &target_values)
            .ok()
            .flatten()
            .map(|c| if invert { -c } else { c });
        out.push((attr.clone(), coef));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn perfect_positive_and_negative() {
        let xs = vec![Some(1.0), Some(2.0), Some(3.0)];
        let ys = vec![Some(2.0), Some(4.0), Some(6.0)];
        let r = pearson(&xs, &ys).unwrap().unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let zs = vec![Some(6.0), Some(4.0), Some(2.0)];
        let r = pearson(&xs, &zs).unwrap().unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_is_none() {
        let xs = vec![Some(1.0), Some(1.0), Some(1.0)];
        let ys = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(pearson(&xs, &ys).unwrap(), None);
    }

    #[test]
    fn pairwise_complete_skips_gaps() {
        let xs = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let ys = vec![Some(1.0), Some(2.0), None, Some(4.0)];
        // only rows 0 and 3 survive
        let r = pearson(&xs, &ys).unwrap().unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(pearson(&[Some(1.0)], &[Some(1.0), Some(2.0)]).is_err());
    }

    #[test]
    fn inversion_flips_signs_only() {
        let mut t = Table::new("t");
        t.add_column(
            "flag",
            Column::from_f64(vec![Some(1.0), Some(0.0), Some(1.0), Some(0.0)]),
        )
        .unwrap();
        t.add_column(
            "grade",
            Column::from_f64(vec![Some(1.0), Some(3.0), Some(1.0), Some(3.0)]),
        )
        .unwrap();
        let plain = correlate(&t, &["flag".to_string()], "grade", false).unwrap();
        let flipped = correlate(&t, &["flag".to_string()], "grade", true).unwrap();
        let r = plain[0].1.unwrap();
        assert!((r + 1.0).abs() < 1e-12);
        assert!((flipped[0].1.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn attribute_gaps_are_zero_filled() {
        let mut t = Table::new("t");
        t.add_column("flag", Column::from_f64(vec![Some(1.0), None, Some(1.0), None])).unwrap();
        t.add_column(
            "target",
            Column::from_f64(vec![Some(-1.0), Some(-3.0), Some(-1.0), Some(-3.0)]),
        )
        .unwrap();
        let r = correlate(&t, &["flag".to_string()], "target", false).unwrap()[0]
            .1
            .unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }
}
