use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{CategoricalAttribute, Dataset, Record};

/// The user's current choice of occupations and BMI categories.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSelection {
    pub occupations: BTreeSet<String>,
    pub bmi_categories: BTreeSet<String>,
}

impl FilterSelection {
    /// Every occupation and BMI category present in the dataset.
    pub fn all(dataset: &Dataset) -> Self {
        Self {
            occupations: dataset
                .distinct(CategoricalAttribute::Occupation)
                .into_iter()
                .collect(),
            bmi_categories: dataset
                .distinct(CategoricalAttribute::BmiCategory)
                .into_iter()
                .collect(),
        }
    }

    /// Uses the given values, or every distinct value when `None`.
    pub fn from_choices(
        dataset: &Dataset,
        occupations: Option<Vec<String>>,
        bmi_categories: Option<Vec<String>>,
    ) -> Self {
        let defaults = Self::all(dataset);
        Self {
            occupations: occupations
                .map(|values| values.into_iter().collect())
                .unwrap_or(defaults.occupations),
            bmi_categories: bmi_categories
                .map(|values| values.into_iter().collect())
                .unwrap_or(defaults.bmi_categories),
        }
    }

    pub fn apply<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        select(dataset, &self.occupations, &self.bmi_categories)
    }
}

/// Rows of a dataset in their original order. Borrowed, never copied.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    rows: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            rows: dataset.records().iter().collect(),
        }
    }

    pub fn rows(&self) -> &[&'a Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.rows.iter().copied()
    }

    /// Narrows the view to rows whose attribute equals `value`.
    pub fn matching(&self, attr: CategoricalAttribute, value: &str) -> FilteredView<'a> {
        FilteredView {
            rows: self
                .iter()
                .filter(|record| record.category(attr) == value)
                .collect(),
        }
    }
}

/// Rows whose occupation is in `occupations` and whose BMI category is in
/// `bmi_categories`. An empty set matches nothing.
pub fn select<'a>(
    dataset: &'a Dataset,
    occupations: &BTreeSet<String>,
    bmi_categories: &BTreeSet<String>,
) -> FilteredView<'a> {
    FilteredView {
        rows: dataset
            .records()
            .iter()
            .filter(|record| {
                occupations.contains(&record.occupation)
                    && bmi_categories.contains(&record.bmi_category)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{fixtures::six_rows, load_from_reader};

    fn dataset() -> Dataset {
        load_from_reader(six_rows().as_bytes()).unwrap()
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn full_selection_returns_dataset_in_order() {
        let dataset = dataset();
        let view = FilterSelection::all(&dataset).apply(&dataset);
        assert_eq!(view, FilteredView::all(&dataset));
        let ages: Vec<u32> = view.iter().map(|r| r.age).collect();
        assert_eq!(ages, vec![27, 28, 44, 52, 33, 59]);
    }

    #[test]
    fn empty_sets_select_nothing() {
        let dataset = dataset();
        let all = FilterSelection::all(&dataset);

        assert!(select(&dataset, &BTreeSet::new(), &all.bmi_categories).is_empty());
        assert!(select(&dataset, &all.occupations, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn engineers_keep_original_order() {
        let dataset = dataset();
        let all = FilterSelection::all(&dataset);
        let view = select(&dataset, &set(&["Engineer"]), &all.bmi_categories);

        assert_eq!(view.len(), 2);
        assert_eq!(view.rows()[0].age, 27);
        assert_eq!(view.rows()[1].age, 44);
    }

    #[test]
    fn both_constraints_must_hold() {
        let dataset = dataset();
        let view = select(&dataset, &set(&["Doctor", "Nurse"]), &set(&["Normal", "Obese"]));

        for record in view.iter() {
            assert!(["Doctor", "Nurse"].contains(&record.occupation.as_str()));
            assert!(["Normal", "Obese"].contains(&record.bmi_category.as_str()));
        }
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn unknown_values_match_nothing() {
        let dataset = dataset();
        let all = FilterSelection::all(&dataset);
        assert!(select(&dataset, &set(&["Pilot"]), &all.bmi_categories).is_empty());
    }

    #[test]
    fn absent_choices_default_to_everything() {
        let dataset = dataset();
        let selection =
            FilterSelection::from_choices(&dataset, Some(vec!["Nurse".to_string()]), None);

        assert_eq!(selection.occupations, set(&["Nurse"]));
        assert_eq!(selection.bmi_categories, set(&["Normal", "Obese", "Overweight"]));
        assert_eq!(selection.apply(&dataset).len(), 2);
    }

    #[test]
    fn matching_narrows_a_view() {
        let dataset = dataset();
        let doctors = FilteredView::all(&dataset).matching(CategoricalAttribute::Occupation, "Doctor");
        let steps: Vec<u32> = doctors.iter().map(|r| r.daily_steps).collect();
        assert_eq!(steps, vec![10000, 8000]);
    }
}
