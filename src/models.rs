use std::fmt;

use serde::{Serialize, Serializer};

/// Age buckets derived at load time. Edges are fixed: `[0,25)`, `[25,35)`,
/// `[35,45)`, `[45,55)`, `[55,100)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgeGroup {
    #[serde(rename = "18-25")]
    UpTo25,
    #[serde(rename = "26-35")]
    From26To35,
    #[serde(rename = "36-45")]
    From36To45,
    #[serde(rename = "46-55")]
    From46To55,
    #[serde(rename = "56+")]
    From56,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 5] = [
        AgeGroup::UpTo25,
        AgeGroup::From26To35,
        AgeGroup::From36To45,
        AgeGroup::From46To55,
        AgeGroup::From56,
    ];

    /// Returns `None` for ages outside `[0, 100)`.
    pub fn from_age(age: i64) -> Option<AgeGroup> {
        match age {
            0..=24 => Some(AgeGroup::UpTo25),
            25..=34 => Some(AgeGroup::From26To35),
            35..=44 => Some(AgeGroup::From36To45),
            45..=54 => Some(AgeGroup::From46To55),
            55..=99 => Some(AgeGroup::From56),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::UpTo25 => "18-25",
            AgeGroup::From26To35 => "26-35",
            AgeGroup::From36To45 => "36-45",
            AgeGroup::From46To55 => "46-55",
            AgeGroup::From56 => "56+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericAttribute {
    Age,
    SleepDuration,
    QualityOfSleep,
    PhysicalActivityLevel,
    StressLevel,
    HeartRate,
    DailySteps,
}

impl NumericAttribute {
    /// Column order of the source file; the correlation matrix follows it.
    pub const ALL: [NumericAttribute; 7] = [
        NumericAttribute::Age,
        NumericAttribute::SleepDuration,
        NumericAttribute::QualityOfSleep,
        NumericAttribute::PhysicalActivityLevel,
        NumericAttribute::StressLevel,
        NumericAttribute::HeartRate,
        NumericAttribute::DailySteps,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            NumericAttribute::Age => "Age",
            NumericAttribute::SleepDuration => "Sleep Duration",
            NumericAttribute::QualityOfSleep => "Quality of Sleep",
            NumericAttribute::PhysicalActivityLevel => "Physical Activity Level",
            NumericAttribute::StressLevel => "Stress Level",
            NumericAttribute::HeartRate => "Heart Rate",
            NumericAttribute::DailySteps => "Daily Steps",
        }
    }
}

impl fmt::Display for NumericAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalAttribute {
    Gender,
    Occupation,
    BmiCategory,
    BloodPressure,
    SleepDisorder,
    AgeGroup,
}

impl CategoricalAttribute {
    pub fn column_name(self) -> &'static str {
        match self {
            CategoricalAttribute::Gender => "Gender",
            CategoricalAttribute::Occupation => "Occupation",
            CategoricalAttribute::BmiCategory => "BMI Category",
            CategoricalAttribute::BloodPressure => "Blood Pressure",
            CategoricalAttribute::SleepDisorder => "Sleep Disorder",
            CategoricalAttribute::AgeGroup => "Age Group",
        }
    }
}

impl Serialize for NumericAttribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.column_name())
    }
}

impl Serialize for CategoricalAttribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.column_name())
    }
}

impl fmt::Display for CategoricalAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Any attribute that can label a group. Numeric attributes group by their
/// rendered value, so stress level 3 becomes the category "3".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Numeric(NumericAttribute),
    Categorical(CategoricalAttribute),
}

impl From<NumericAttribute> for Attribute {
    fn from(value: NumericAttribute) -> Self {
        Attribute::Numeric(value)
    }
}

impl From<CategoricalAttribute> for Attribute {
    fn from(value: CategoricalAttribute) -> Self {
        Attribute::Categorical(value)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Numeric(attr) => fmt::Display::fmt(attr, f),
            Attribute::Categorical(attr) => fmt::Display::fmt(attr, f),
        }
    }
}

/// One subject's row after cleaning. The source identifier is not kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub gender: String,
    pub age: u32,
    pub occupation: String,
    pub sleep_duration: f64,
    pub quality_of_sleep: u32,
    pub physical_activity_level: f64,
    pub stress_level: u32,
    pub bmi_category: String,
    pub blood_pressure: String,
    pub heart_rate: u32,
    pub daily_steps: u32,
    pub sleep_disorder: String,
    pub age_group: AgeGroup,
}

impl Record {
    pub fn numeric(&self, attr: NumericAttribute) -> f64 {
        match attr {
            NumericAttribute::Age => self.age as f64,
            NumericAttribute::SleepDuration => self.sleep_duration,
            NumericAttribute::QualityOfSleep => self.quality_of_sleep as f64,
            NumericAttribute::PhysicalActivityLevel => self.physical_activity_level,
            NumericAttribute::StressLevel => self.stress_level as f64,
            NumericAttribute::HeartRate => self.heart_rate as f64,
            NumericAttribute::DailySteps => self.daily_steps as f64,
        }
    }

    pub fn category(&self, attr: CategoricalAttribute) -> &str {
        match attr {
            CategoricalAttribute::Gender => &self.gender,
            CategoricalAttribute::Occupation => &self.occupation,
            CategoricalAttribute::BmiCategory => &self.bmi_category,
            CategoricalAttribute::BloodPressure => &self.blood_pressure,
            CategoricalAttribute::SleepDisorder => &self.sleep_disorder,
            CategoricalAttribute::AgeGroup => self.age_group.label(),
        }
    }

    pub fn group_label(&self, attr: Attribute) -> String {
        match attr {
            Attribute::Numeric(attr) => self.numeric(attr).to_string(),
            Attribute::Categorical(attr) => self.category(attr).to_string(),
        }
    }
}

/// The cleaned table. Built once by the loader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct values of a categorical attribute in first-seen order.
    pub fn distinct(&self, attr: CategoricalAttribute) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut values = Vec::new();
        for record in &self.records {
            let value = record.category(attr);
            if seen.insert(value) {
                values.push(value.to_string());
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_group_edges_are_left_closed() {
        assert_eq!(AgeGroup::from_age(0), Some(AgeGroup::UpTo25));
        assert_eq!(AgeGroup::from_age(24), Some(AgeGroup::UpTo25));
        assert_eq!(AgeGroup::from_age(25), Some(AgeGroup::From26To35));
        assert_eq!(AgeGroup::from_age(35), Some(AgeGroup::From36To45));
        assert_eq!(AgeGroup::from_age(45), Some(AgeGroup::From46To55));
        assert_eq!(AgeGroup::from_age(55), Some(AgeGroup::From56));
        assert_eq!(AgeGroup::from_age(99), Some(AgeGroup::From56));
    }

    #[test]
    fn ages_outside_range_have_no_group() {
        assert_eq!(AgeGroup::from_age(-1), None);
        assert_eq!(AgeGroup::from_age(100), None);
    }

    #[test]
    fn labels_sort_in_bin_order() {
        let mut labels: Vec<&str> = AgeGroup::ALL.iter().map(|g| g.label()).collect();
        labels.reverse();
        labels.sort();
        let expected: Vec<&str> = AgeGroup::ALL.iter().map(|g| g.label()).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn numeric_group_labels_render_values() {
        let record = Record {
            gender: "Male".to_string(),
            age: 28,
            occupation: "Doctor".to_string(),
            sleep_duration: 6.2,
            quality_of_sleep: 6,
            physical_activity_level: 60.0,
            stress_level: 8,
            bmi_category: "Normal".to_string(),
            blood_pressure: "125/80".to_string(),
            heart_rate: 75,
            daily_steps: 10000,
            sleep_disorder: "Insomnia".to_string(),
            age_group: AgeGroup::From26To35,
        };

        assert_eq!(record.group_label(NumericAttribute::StressLevel.into()), "8");
        assert_eq!(record.group_label(NumericAttribute::SleepDuration.into()), "6.2");
        assert_eq!(record.group_label(CategoricalAttribute::AgeGroup.into()), "26-35");
    }
}
