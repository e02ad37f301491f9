use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::{DataError, TimeSeries, Window};

/// Holdings trajectory and its decline from the running peak.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrawdownCurves {
    /// Value trajectory, compounded from a unit base when the input is returns.
    pub holdings: TimeSeries,
    /// Decline from the running peak as a fraction, 0 at every new peak.
    pub drawdown: TimeSeries,
}

/// Compute the holdings and drawdown curves for a series.
///
/// With `is_returns` the input values are treated as period returns and
/// compounded cumulatively into a holdings curve; otherwise the values are
/// used as the holdings directly. The drawdown at each point is the
/// fractional decline from the running maximum, so it is never positive and
/// is exactly zero wherever the series sets a new peak.
pub fn compute_drawdown(
    series: &TimeSeries,
    is_returns: bool,
) -> Result<DrawdownCurves, DataError> {
    if series.is_empty() {
        return Err(DataError::Empty);
    }

    let holdings_values = if is_returns {
        let mut eq = 1.0_f64;
        let mut out = Vec::with_capacity(series.values.len());
        for r in &series.values {
            eq *= 1.0 + *r;
            out.push(eq);
        }
        out
    } else {
        series.values.clone()
    };

    if let Some(index) = holdings_values.iter().position(|v| !v.is_finite()) {
        return Err(DataError::NonFinite { index });
    }

    // A zero or negative holdings value makes the peak ratio meaningless.
    if let Some(index) = holdings_values.iter().position(|v| *v <= 0.0) {
        return Err(DataError::NonPositive {
            index,
            value: holdings_values[index],
        });
    }

    let mut peak = holdings_values[0];
    let mut drawdown_values = Vec::with_capacity(holdings_values.len());
    for &h in &holdings_values {
        if h > peak {
            peak = h;
        }
        drawdown_values.push((h - peak) / peak);
    }

    let holdings = TimeSeries {
        dates: series.dates.clone(),
        values: holdings_values,
        name: series.name.clone(),
    };
    let drawdown = TimeSeries {
        dates: series.dates.clone(),
        values: drawdown_values,
        name: series.name.clone(),
    };

    Ok(DrawdownCurves { holdings, drawdown })
}

/// Deepest decline over the whole series, as a non-positive fraction.
pub fn max_drawdown(series: &TimeSeries, is_returns: bool) -> Result<f64, DataError> {
    let curves = compute_drawdown(series, is_returns)?;
    Ok(curves
        .drawdown
        .values
        .iter()
        .fold(0.0_f64, |acc, &dd| acc.min(dd)))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Drawdown {
    pub start: NaiveDate,
    pub trough: NaiveDate,
    pub end: NaiveDate,
    /// Depth as a negative fraction (e.g. -0.25 for -25%)
    pub depth: f64,
    /// Duration in observations, from the first decline to recovery
    pub duration: u32,
}

/// Compute the worst drawdown episodes for a series.
///
/// Scans the drawdown curve, identifies episodes (from a peak until
/// recovery), and returns the `top_n` deepest ones.
pub fn top_drawdowns(
    series: &TimeSeries,
    is_returns: bool,
    top_n: usize,
) -> Result<Vec<Drawdown>, DataError> {
    let mut segments = all_drawdowns(series, is_returns)?;

    // Sort by depth (most negative first) and take top_n
    segments.sort_by(|a, b| a.depth.partial_cmp(&b.depth).unwrap_or(std::cmp::Ordering::Equal));
    segments.truncate(top_n);

    Ok(segments)
}

/// Compute all drawdown episodes, in chronological order.
pub fn all_drawdowns(series: &TimeSeries, is_returns: bool) -> Result<Vec<Drawdown>, DataError> {
    let curves = compute_drawdown(series, is_returns)?;
    Ok(segments_from_curve(&curves.drawdown))
}

fn segments_from_curve(drawdown: &TimeSeries) -> Vec<Drawdown> {
    let n = drawdown.values.len();

    let mut segments: Vec<Drawdown> = Vec::new();
    let mut in_dd = false;
    let mut start_idx = 0usize;
    let mut trough_idx = 0usize;
    let mut min_dd = 0.0_f64;

    for i in 0..n {
        let dd = drawdown.values[i];
        if !in_dd {
            if dd < 0.0 {
                in_dd = true;
                start_idx = i;
                trough_idx = i;
                min_dd = dd;
            }
        } else {
            if dd < min_dd {
                min_dd = dd;
                trough_idx = i;
            }

            if dd >= 0.0 {
                // Recovered
                segments.push(Drawdown {
                    start: drawdown.dates[start_idx],
                    trough: drawdown.dates[trough_idx],
                    end: drawdown.dates[i],
                    depth: min_dd,
                    duration: (i - start_idx + 1) as u32,
                });
                in_dd = false;
            }
        }
    }

    // Handle open drawdown at the end
    if in_dd {
        let last = n - 1;
        segments.push(Drawdown {
            start: drawdown.dates[start_idx],
            trough: drawdown.dates[trough_idx],
            end: drawdown.dates[last],
            depth: min_dd,
            duration: (last - start_idx + 1) as u32,
        });
    }

    segments
}

/// Returns compounded per calendar month, one row per year.
///
/// A month with no observations stays `None`; the table never fills gaps
/// with synthetic zeros.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MonthlyReturnTable {
    rows: Vec<MonthlyRow>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonthlyRow {
    pub year: i32,
    pub months: [Option<f64>; 12],
}

impl MonthlyReturnTable {
    fn from_grouped(grouped: BTreeMap<(i32, u32), f64>) -> Self {
        let mut rows: Vec<MonthlyRow> = Vec::new();
        for ((year, month), value) in grouped {
            if rows.last().map(|r| r.year) != Some(year) {
                rows.push(MonthlyRow {
                    year,
                    months: [None; 12],
                });
            }
            let row = rows.last_mut().expect("row pushed above");
            row.months[(month - 1) as usize] = Some(value);
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[MonthlyRow] {
        &self.rows
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows.iter().map(|r| r.year).collect()
    }

    pub fn get(&self, year: i32, month: u32) -> Option<f64> {
        if !(1..=12).contains(&month) {
            return None;
        }
        self.rows
            .iter()
            .find(|r| r.year == year)
            .and_then(|r| r.months[(month - 1) as usize])
    }

    /// Present cells in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, u32, f64)> + '_ {
        self.rows.iter().flat_map(|row| {
            row.months
                .iter()
                .copied()
                .enumerate()
                .filter_map(move |(idx, value)| value.map(|v| (row.year, (idx + 1) as u32, v)))
        })
    }

    /// Number of months present in the table.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Compound a return series into a per-month table over a trailing window.
pub fn compute_monthly_returns(
    returns: &TimeSeries,
    window: Window,
) -> Result<MonthlyReturnTable, DataError> {
    let windowed = returns.window(window)?;
    let grouped = grouped_compounded(&windowed, |date| (date.year(), date.month()));
    Ok(MonthlyReturnTable::from_grouped(grouped))
}

/// Compound a return series per calendar year over a trailing window.
pub fn compute_yearly_returns(
    returns: &TimeSeries,
    window: Window,
) -> Result<Vec<(i32, f64)>, DataError> {
    let windowed = returns.window(window)?;
    let grouped = grouped_compounded(&windowed, |date| date.year());
    Ok(grouped.into_iter().collect())
}

fn compound_slice(values: &[f64]) -> f64 {
    values.iter().fold(1.0_f64, |acc, r| acc * (1.0 + r)) - 1.0
}

fn grouped_compounded<K: Ord>(
    series: &TimeSeries,
    key_fn: impl Fn(&NaiveDate) -> K,
) -> BTreeMap<K, f64> {
    let mut grouped: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for (date, ret) in series.dates.iter().zip(series.values.iter()) {
        grouped.entry(key_fn(date)).or_default().push(*ret);
    }

    let mut out = BTreeMap::new();
    for (key, vals) in grouped {
        out.insert(key, compound_slice(&vals));
    }
    out
}
