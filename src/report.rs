use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{
    self, CorrelationMatrix, CountGrid, Distribution, Grouped, OccupationInsights,
};
use crate::cohort::{FilterSelection, FilteredView};
use crate::models::{CategoricalAttribute, Dataset, NumericAttribute};

/// Occupation featured in the headline insights block.
pub const FEATURED_OCCUPATION: &str = "Engineer";

const NO_DATA: &str = "No records match the current filters.";

/// Everything the dashboard shows for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub selection: FilterSelection,
    pub total_rows: usize,
    pub matching_rows: usize,
    pub insights: OccupationInsights,
    pub sleep_by_occupation: Grouped<f64>,
    pub sleep_by_stress: Grouped<Distribution>,
    pub correlations: CorrelationMatrix,
    pub bmi_by_age_group: CountGrid,
    pub steps_by_bmi: Grouped<Distribution>,
}

pub fn build_dashboard(
    dataset: &Dataset,
    selection: &FilterSelection,
    featured_occupation: &str,
    generated_at: DateTime<Utc>,
) -> Dashboard {
    let view = selection.apply(dataset);

    Dashboard {
        generated_at,
        selection: selection.clone(),
        total_rows: dataset.len(),
        matching_rows: view.len(),
        // Headline insights ignore the filters.
        insights: aggregate::occupation_insights(&FilteredView::all(dataset), featured_occupation),
        sleep_by_occupation: aggregate::group_means(
            &view,
            CategoricalAttribute::Occupation,
            NumericAttribute::SleepDuration,
        ),
        sleep_by_stress: aggregate::group_distribution(
            &view,
            NumericAttribute::StressLevel,
            NumericAttribute::SleepDuration,
        ),
        correlations: aggregate::correlation_matrix(&view),
        bmi_by_age_group: aggregate::group_counts_2d(
            &view,
            CategoricalAttribute::AgeGroup,
            CategoricalAttribute::BmiCategory,
        ),
        steps_by_bmi: aggregate::group_distribution(
            &view,
            CategoricalAttribute::BmiCategory,
            NumericAttribute::DailySteps,
        ),
    }
}

fn fmt_option(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{value:.precision$}"),
        None => "n/a".to_string(),
    }
}

fn join_set(values: &std::collections::BTreeSet<String>) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

pub fn render_insights(insights: &OccupationInsights) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## {} Insights", insights.occupation);

    if insights.count == 0 {
        let _ = writeln!(output, "No {} records in the dataset.", insights.occupation);
        return output;
    }

    let _ = writeln!(
        output,
        "- Avg Stress Level: {}",
        fmt_option(insights.avg_stress_level, 2)
    );
    let _ = writeln!(
        output,
        "- Avg Physical Activity Level: {}",
        fmt_option(insights.avg_physical_activity_level, 2)
    );
    let _ = writeln!(
        output,
        "- Avg Daily Steps: {} steps",
        fmt_option(insights.avg_daily_steps, 0)
    );
    output
}

fn render_distributions(output: &mut String, groups: &Grouped<Distribution>, label: &str) {
    if groups.is_empty() {
        let _ = writeln!(output, "{NO_DATA}");
        return;
    }

    let _ = writeln!(output, "| {label} | n | min | q1 | median | q3 | max |");
    let _ = writeln!(output, "|---|---|---|---|---|---|---|");
    for entry in groups.iter() {
        let d = &entry.value;
        let _ = writeln!(
            output,
            "| {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |",
            entry.category, d.count, d.min, d.q1, d.median, d.q3, d.max
        );
    }
}

pub fn render_correlations(matrix: &CorrelationMatrix) -> String {
    let mut output = String::new();
    let _ = write!(output, "| |");
    for attr in &matrix.attributes {
        let _ = write!(output, " {attr} |");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "|---|{}", "---|".repeat(matrix.attributes.len()));

    for (attr, row) in matrix.attributes.iter().zip(&matrix.values) {
        let _ = write!(output, "| {attr} |");
        for value in row {
            let _ = write!(output, " {} |", fmt_option(*value, 2));
        }
        let _ = writeln!(output);
    }
    output
}

fn render_count_grid(output: &mut String, grid: &CountGrid, row_label: &str) {
    if grid.is_empty() {
        let _ = writeln!(output, "{NO_DATA}");
        return;
    }

    let _ = write!(output, "| {row_label} |");
    for column in &grid.columns {
        let _ = write!(output, " {column} |");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "|---|{}", "---|".repeat(grid.columns.len()));

    for (row, counts) in grid.rows.iter().zip(&grid.counts) {
        let _ = write!(output, "| {row} |");
        for count in counts {
            let _ = write!(output, " {count} |");
        }
        let _ = writeln!(output);
    }
}

pub fn render_markdown(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Sleep Health and Lifestyle Dashboard");
    let _ = writeln!(
        output,
        "Generated {} over {} records",
        dashboard.generated_at.format("%Y-%m-%d %H:%M UTC"),
        dashboard.total_rows
    );
    let _ = writeln!(output);
    output.push_str(&render_insights(&dashboard.insights));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Filters");
    let _ = writeln!(
        output,
        "- Occupations: {}",
        join_set(&dashboard.selection.occupations)
    );
    let _ = writeln!(
        output,
        "- BMI Categories: {}",
        join_set(&dashboard.selection.bmi_categories)
    );
    let _ = writeln!(
        output,
        "- Matching records: {} of {}",
        dashboard.matching_rows, dashboard.total_rows
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sleep Duration by Occupation");
    if dashboard.sleep_by_occupation.is_empty() {
        let _ = writeln!(output, "{NO_DATA}");
    } else {
        for entry in dashboard.sleep_by_occupation.iter() {
            let _ = writeln!(output, "- {}: {:.2} h", entry.category, entry.value);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Stress Level vs Sleep Duration");
    render_distributions(&mut output, &dashboard.sleep_by_stress, "Stress Level");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Correlation Between Numerical Features");
    if dashboard.matching_rows == 0 {
        let _ = writeln!(output, "{NO_DATA}");
    } else {
        output.push_str(&render_correlations(&dashboard.correlations));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## BMI Category Count Across Age Groups");
    render_count_grid(&mut output, &dashboard.bmi_by_age_group, "Age Group");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Steps vs BMI Category");
    render_distributions(&mut output, &dashboard.steps_by_bmi, "BMI Category");

    output
}

/// Selection-widget values: distinct categories in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Categories {
    pub occupations: Vec<String>,
    pub bmi_categories: Vec<String>,
    pub age_groups: Vec<String>,
}

impl Categories {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            occupations: dataset.distinct(CategoricalAttribute::Occupation),
            bmi_categories: dataset.distinct(CategoricalAttribute::BmiCategory),
            age_groups: dataset.distinct(CategoricalAttribute::AgeGroup),
        }
    }
}

pub fn render_categories(categories: &Categories) -> String {
    let mut output = String::new();
    for (title, values) in [
        ("Occupations", &categories.occupations),
        ("BMI Categories", &categories.bmi_categories),
        ("Age Groups", &categories.age_groups),
    ] {
        let _ = writeln!(output, "{title}:");
        for value in values {
            let _ = writeln!(output, "- {value}");
        }
    }
    output
}
