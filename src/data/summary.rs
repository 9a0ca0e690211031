use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::model::{CellValue, Column, ColumnType, Table};

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Descriptive statistics of one numeric column. Undefined statistics are `None`
/// (no values at all, or a single value for `std`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Frequency summary of one text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextProfile {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    pub memory_bytes: usize,
    pub column_profiles: Vec<ColumnProfile>,
    pub text_profiles: Vec<TextProfile>,
}

impl DatasetProfile {
    pub fn memory_kib(&self) -> f64 {
        self.memory_bytes as f64 / 1024.0
    }
}

/// The first rows of a table rendered as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Summarizer
// ---------------------------------------------------------------------------

/// Profile every column of the table. Never fails; deterministic.
pub fn summarize(table: &Table) -> DatasetProfile {
    let mut column_profiles = Vec::new();
    let mut text_profiles = Vec::new();

    for column in table.columns() {
        match column.column_type() {
            t if t.is_numeric() => {
                column_profiles.push(profile_numeric(column.name(), column.numeric_values()))
            }
            ColumnType::Text => text_profiles.push(profile_text(&column)),
            _ => {}
        }
    }

    let profile = DatasetProfile {
        row_count: table.row_count(),
        column_count: table.column_count(),
        memory_bytes: table.estimated_memory_bytes(),
        column_profiles,
        text_profiles,
    };
    log::debug!(
        "Summarized {} rows: {} numeric / {} text profiles, ~{:.2} KB",
        profile.row_count,
        profile.column_profiles.len(),
        profile.text_profiles.len(),
        profile.memory_kib()
    );
    profile
}

/// Count, mean, sample std (ddof = 1), min, quartiles and max of `values`.
pub fn profile_numeric(name: &str, mut values: Vec<f64>) -> ColumnProfile {
    values.sort_by(f64::total_cmp);
    let count = values.len();

    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    let std = mean.filter(|_| count > 1).map(|m| {
        let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    ColumnProfile {
        column: name.to_string(),
        count,
        mean,
        std,
        min: values.first().copied(),
        p25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        p75: quantile(&values, 0.75),
        max: values.last().copied(),
    }
}

/// Quantile of already sorted values, interpolating linearly between the two
/// nearest order statistics.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

fn profile_text(column: &Column<'_>) -> TextProfile {
    // value -> (frequency, first position)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut count = 0;
    for value in column.values() {
        if let CellValue::Text(s) = value {
            let next = counts.len();
            counts.entry(s).or_insert((0, next)).0 += 1;
            count += 1;
        }
    }

    let top = counts
        .iter()
        .max_by(|(_, (fa, pa)), (_, (fb, pb))| fa.cmp(fb).then(pb.cmp(pa)))
        .map(|(value, (freq, _))| (value.clone(), *freq));

    TextProfile {
        column: column.name().to_string(),
        count,
        unique: counts.len(),
        freq: top.as_ref().map_or(0, |(_, freq)| *freq),
        top: top.map(|(value, _)| value),
    }
}

/// Render the first `rows` rows of the table for display.
pub fn preview(table: &Table, rows: usize) -> TablePreview {
    let head = table.head(rows);
    let columns: Vec<Column<'_>> = head.columns().collect();
    TablePreview {
        columns: columns.iter().map(|c| c.name().to_string()).collect(),
        rows: (0..head.row_count())
            .map(|row| columns.iter().map(|c| c.value(row).to_string()).collect())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnData;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn quartiles_interpolate_linearly() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(quantile(&sorted, 0.25), Some(17.5));
        assert_eq!(quantile(&sorted, 0.5), Some(25.0));
        assert_eq!(quantile(&sorted, 0.75), Some(32.5));
        assert_eq!(quantile(&sorted, 0.0), Some(10.0));
        assert_eq!(quantile(&sorted, 1.0), Some(40.0));
        assert_eq!(quantile(&[5.0], 0.75), Some(5.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn age_profile() {
        let p = profile_numeric("age", vec![40.0, 10.0, 30.0, 20.0]);
        assert_eq!(p.count, 4);
        assert_eq!(p.mean, Some(25.0));
        assert_eq!(p.min, Some(10.0));
        assert_eq!(p.median, Some(25.0));
        assert_eq!(p.max, Some(40.0));
        assert!(close(p.std, (500.0f64 / 3.0).sqrt()));
    }

    #[test]
    fn degenerate_profiles_leave_statistics_undefined() {
        let empty = profile_numeric("x", vec![]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.median, None);

        let single = profile_numeric("x", vec![3.0]);
        assert_eq!(single.mean, Some(3.0));
        assert_eq!(single.std, None);
    }

    #[test]
    fn text_profile_counts_and_breaks_ties_by_first_seen() {
        let text = |s: &str| CellValue::Text(s.to_string());
        let table = Table::from_columns(vec![ColumnData::new(
            "city",
            vec![
                text("Salvador"),
                text("Recife"),
                CellValue::Null,
                text("Recife"),
                text("Salvador"),
                text("Natal"),
            ],
        )])
        .unwrap();

        let profile = summarize(&table);
        assert!(profile.column_profiles.is_empty());
        assert_eq!(
            profile.text_profiles,
            vec![TextProfile {
                column: "city".into(),
                count: 5,
                unique: 3,
                top: Some("Salvador".into()),
                freq: 2,
            }]
        );
    }

    #[test]
    fn summarize_skips_booleans_and_reads_shape() {
        let table = Table::from_columns(vec![
            ColumnData::new("n", vec![CellValue::Integer(1), CellValue::Integer(3)]),
            ColumnData::new("ok", vec![CellValue::Bool(true), CellValue::Bool(false)]),
        ])
        .unwrap();
        let profile = summarize(&table);
        assert_eq!(profile.row_count, 2);
        assert_eq!(profile.column_count, 2);
        assert_eq!(profile.memory_bytes, 2 * 8 + 2);
        assert_eq!(profile.column_profiles.len(), 1);
        assert_eq!(profile.column_profiles[0].mean, Some(2.0));
        assert_eq!(summarize(&table), profile);
    }

    #[test]
    fn preview_renders_head_rows() {
        let table = Table::from_columns(vec![
            ColumnData::new(
                "n",
                (1..=8).map(CellValue::Integer).collect(),
            ),
            ColumnData::new(
                "v",
                (1..=8)
                    .map(|i| if i % 2 == 0 { CellValue::Null } else { CellValue::Float(i as f64 / 2.0) })
                    .collect(),
            ),
        ])
        .unwrap();

        let head = preview(&table, 5);
        assert_eq!(head.columns, vec!["n", "v"]);
        assert_eq!(head.rows.len(), 5);
        assert_eq!(head.rows[0], vec!["1", "0.5"]);
        assert_eq!(head.rows[1], vec!["2", "NaN"]);
    }
}
