use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use csv::StringRecord;
use tracing::{debug, info};

use crate::error::{DatasetError, MalformedInput};
use crate::models::{AgeGroup, Dataset, Record};

pub const DEFAULT_SOURCE: &str = "Sleep_health_and_lifestyle_dataset.csv";

const IDENTIFIER_COLUMN: &str = "Person ID";

/// Cell contents treated as missing. Matches the NA tokens common tabular
/// tooling recognises by default, including `None`.
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>",
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN",
];

pub fn load(path: &Path) -> Result<Dataset, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = load_from_reader(file)?;
    info!(
        source = %path.display(),
        rows = dataset.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

pub fn load_from_reader<R: Read>(source: R) -> Result<Dataset, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for result in reader.records() {
        let row = result?;
        let line = row.position().map(|p| p.line() as usize).unwrap_or_default();

        if columns.has_missing(&row) {
            debug!(line, "dropping row with missing value");
            dropped += 1;
            continue;
        }

        records.push(columns.parse(&row, line)?);
    }

    debug!(kept = records.len(), dropped, "rows cleaned");
    Ok(Dataset::new(records))
}

fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell.trim())
}

/// Header positions of every retained column.
struct Columns {
    gender: usize,
    age: usize,
    occupation: usize,
    sleep_duration: usize,
    quality_of_sleep: usize,
    physical_activity_level: usize,
    stress_level: usize,
    bmi_category: usize,
    blood_pressure: usize,
    heart_rate: usize,
    daily_steps: usize,
    sleep_disorder: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, MalformedInput> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| MalformedInput::MissingColumn(name.to_string()))
        };

        // The identifier must be present even though it is discarded.
        find(IDENTIFIER_COLUMN)?;

        Ok(Self {
            gender: find("Gender")?,
            age: find("Age")?,
            occupation: find("Occupation")?,
            sleep_duration: find("Sleep Duration")?,
            quality_of_sleep: find("Quality of Sleep")?,
            physical_activity_level: find("Physical Activity Level")?,
            stress_level: find("Stress Level")?,
            bmi_category: find("BMI Category")?,
            blood_pressure: find("Blood Pressure")?,
            heart_rate: find("Heart Rate")?,
            daily_steps: find("Daily Steps")?,
            sleep_disorder: find("Sleep Disorder")?,
        })
    }

    fn retained(&self) -> [usize; 12] {
        [
            self.gender,
            self.age,
            self.occupation,
            self.sleep_duration,
            self.quality_of_sleep,
            self.physical_activity_level,
            self.stress_level,
            self.bmi_category,
            self.blood_pressure,
            self.heart_rate,
            self.daily_steps,
            self.sleep_disorder,
        ]
    }

    fn has_missing(&self, row: &StringRecord) -> bool {
        self.retained()
            .iter()
            .any(|&index| row.get(index).map_or(true, is_missing))
    }

    fn parse(&self, row: &StringRecord, line: usize) -> Result<Record, MalformedInput> {
        let age = parse_age(row, self.age, line)?;
        let age_group =
            AgeGroup::from_age(age).ok_or(MalformedInput::AgeOutOfRange { row: line, age })?;

        Ok(Record {
            gender: text_cell(row, self.gender),
            age: age as u32,
            occupation: text_cell(row, self.occupation),
            sleep_duration: parse_finite(row, self.sleep_duration, "Sleep Duration", line)?,
            quality_of_sleep: parse_cell(row, self.quality_of_sleep, "Quality of Sleep", line)?,
            physical_activity_level: parse_finite(
                row,
                self.physical_activity_level,
                "Physical Activity Level",
                line,
            )?,
            stress_level: parse_cell(row, self.stress_level, "Stress Level", line)?,
            bmi_category: text_cell(row, self.bmi_category),
            blood_pressure: text_cell(row, self.blood_pressure),
            heart_rate: parse_cell(row, self.heart_rate, "Heart Rate", line)?,
            daily_steps: parse_cell(row, self.daily_steps, "Daily Steps", line)?,
            sleep_disorder: text_cell(row, self.sleep_disorder),
            age_group,
        })
    }
}

fn text_cell(row: &StringRecord, index: usize) -> String {
    row.get(index).unwrap_or_default().to_string()
}

fn parse_cell<T: FromStr>(
    row: &StringRecord,
    index: usize,
    column: &str,
    line: usize,
) -> Result<T, MalformedInput> {
    let raw = row.get(index).unwrap_or_default();
    raw.parse::<T>().map_err(|_| MalformedInput::InvalidValue {
        row: line,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Whole-number ages, written either as `27` or `27.0`.
fn parse_age(row: &StringRecord, index: usize, line: usize) -> Result<i64, MalformedInput> {
    if let Ok(age) = row.get(index).unwrap_or_default().parse::<i64>() {
        return Ok(age);
    }
    let age = parse_finite(row, index, "Age", line)?;
    if age.fract() == 0.0 && age.abs() < i64::MAX as f64 {
        Ok(age as i64)
    } else {
        Err(MalformedInput::InvalidValue {
            row: line,
            column: "Age".to_string(),
            value: row.get(index).unwrap_or_default().to_string(),
        })
    }
}

fn parse_finite(
    row: &StringRecord,
    index: usize,
    column: &str,
    line: usize,
) -> Result<f64, MalformedInput> {
    let value: f64 = parse_cell(row, index, column, line)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MalformedInput::InvalidValue {
            row: line,
            column: column.to_string(),
            value: row.get(index).unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const HEADER: &str = "Person ID,Gender,Age,Occupation,Sleep Duration,Quality of Sleep,Physical Activity Level,Stress Level,BMI Category,Blood Pressure,Heart Rate,Daily Steps,Sleep Disorder";

    /// Six subjects over three occupations, already clean.
    pub fn six_rows() -> String {
        [
            HEADER,
            "1,Male,27,Engineer,6.1,6,42,6,Overweight,126/83,77,4200,Insomnia",
            "2,Female,28,Doctor,6.2,6,60,8,Normal,125/80,75,10000,Sleep Apnea",
            "3,Male,44,Engineer,7.8,8,75,3,Normal,120/80,68,7000,Insomnia",
            "4,Female,52,Nurse,6.5,7,40,7,Obese,140/90,80,5000,Sleep Apnea",
            "5,Male,33,Doctor,7.2,7,50,5,Normal,128/85,70,8000,Insomnia",
            "6,Female,59,Nurse,8.1,9,75,3,Overweight,140/95,68,7000,Sleep Apnea",
        ]
        .join("\n")
    }
}
