use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::cohort::FilteredView;
use crate::models::{Attribute, CategoricalAttribute, NumericAttribute, Record};

/// Mean of an attribute over the view, `None` when the view is empty.
pub fn mean_of(view: &FilteredView<'_>, attr: NumericAttribute) -> Option<f64> {
    mean(view.iter().map(|record| record.numeric(attr)))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEntry<T> {
    pub category: String,
    pub value: T,
}

/// Per-category results, ordered by category. Only categories observed in
/// the view appear.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Grouped<T> {
    entries: Vec<GroupEntry<T>>,
}

impl<T> Grouped<T> {
    pub fn get(&self, category: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| &entry.value)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.category.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupEntry<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Buckets rows by the group attribute's label, sorted for display.
fn group_rows<'a>(view: &FilteredView<'a>, group: Attribute) -> Vec<(String, Vec<&'a Record>)> {
    let mut groups: HashMap<String, Vec<&'a Record>> = HashMap::new();
    for record in view.iter() {
        groups
            .entry(record.group_label(group))
            .or_default()
            .push(record);
    }

    let mut groups: Vec<(String, Vec<&'a Record>)> = groups.into_iter().collect();
    groups.sort_by(|a, b| compare_labels(group, &a.0, &b.0));
    groups
}

fn compare_labels(attr: Attribute, a: &str, b: &str) -> Ordering {
    match attr {
        Attribute::Numeric(_) => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.cmp(b),
        },
        // Age group labels already sort in bin order.
        Attribute::Categorical(_) => a.cmp(b),
    }
}

pub fn group_means(
    view: &FilteredView<'_>,
    group: impl Into<Attribute>,
    value: NumericAttribute,
) -> Grouped<f64> {
    let entries = group_rows(view, group.into())
        .into_iter()
        .filter_map(|(category, rows)| {
            mean(rows.iter().map(|record| record.numeric(value)))
                .map(|value| GroupEntry { category, value })
        })
        .collect();
    Grouped { entries }
}

/// Box-plot summary of one numeric attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Distribution {
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        Some(Self {
            count: values.len(),
            min: values[0],
            q1: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q3: quantile(&values, 0.75),
            max: values[values.len() - 1],
        })
    }
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn group_distribution(
    view: &FilteredView<'_>,
    group: impl Into<Attribute>,
    value: NumericAttribute,
) -> Grouped<Distribution> {
    let entries = group_rows(view, group.into())
        .into_iter()
        .filter_map(|(category, rows)| {
            Distribution::from_values(rows.iter().map(|record| record.numeric(value)).collect())
                .map(|value| GroupEntry { category, value })
        })
        .collect();
    Grouped { entries }
}

/// Dense row-by-column counts. Every pairing of an observed row category
/// with an observed column category is present, zero when unobserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountGrid {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl CountGrid {
    pub fn get(&self, row: &str, column: &str) -> Option<usize> {
        let r = self.rows.iter().position(|value| value == row)?;
        let c = self.columns.iter().position(|value| value == column)?;
        self.counts.get(r)?.get(c).copied()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn group_counts_2d(
    view: &FilteredView<'_>,
    row: impl Into<Attribute>,
    column: impl Into<Attribute>,
) -> CountGrid {
    let (row, column) = (row.into(), column.into());
    let rows: Vec<String> = group_rows(view, row).into_iter().map(|(c, _)| c).collect();
    let columns: Vec<String> = group_rows(view, column).into_iter().map(|(c, _)| c).collect();

    let mut counts = vec![vec![0usize; columns.len()]; rows.len()];
    for record in view.iter() {
        let r = rows.iter().position(|value| *value == record.group_label(row));
        let c = columns.iter().position(|value| *value == record.group_label(column));
        if let (Some(r), Some(c)) = (r, c) {
            counts[r][c] += 1;
        }
    }

    CountGrid {
        rows,
        columns,
        counts,
    }
}

/// Pairwise Pearson correlation over all numeric attributes. `None` marks an
/// undefined coefficient (fewer than two rows or a constant column).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub attributes: Vec<NumericAttribute>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericAttribute, b: NumericAttribute) -> Option<f64> {
        let i = self.attributes.iter().position(|attr| *attr == a)?;
        let j = self.attributes.iter().position(|attr| *attr == b)?;
        *self.values.get(i)?.get(j)?
    }
}

pub fn correlation_matrix(view: &FilteredView<'_>) -> CorrelationMatrix {
    let attributes = NumericAttribute::ALL.to_vec();
    let columns: Vec<Vec<f64>> = attributes
        .iter()
        .map(|attr| view.iter().map(|record| record.numeric(*attr)).collect())
        .collect();

    let n = attributes.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = has_variance(&columns[i]).then_some(1.0);
        for j in (i + 1)..n {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix { attributes, values }
}

fn has_variance(values: &[f64]) -> bool {
    values.len() >= 2 && values.iter().any(|v| *v != values[0])
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || !has_variance(xs) || !has_variance(ys) {
        return None;
    }
    let mean_x = mean(xs.iter().copied())?;
    let mean_y = mean(ys.iter().copied())?;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Headline means for a single occupation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationInsights {
    pub occupation: String,
    pub count: usize,
    pub avg_stress_level: Option<f64>,
    pub avg_physical_activity_level: Option<f64>,
    pub avg_daily_steps: Option<f64>,
}

pub fn occupation_insights(view: &FilteredView<'_>, occupation: &str) -> OccupationInsights {
    let rows = view.matching(CategoricalAttribute::Occupation, occupation);
    OccupationInsights {
        occupation: occupation.to_string(),
        count: rows.len(),
        avg_stress_level: mean_of(&rows, NumericAttribute::StressLevel),
        avg_physical_activity_level: mean_of(&rows, NumericAttribute::PhysicalActivityLevel),
        avg_daily_steps: mean_of(&rows, NumericAttribute::DailySteps),
    }
}
