use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// A cell as read from disk; `None` marks a missing value.
pub(crate) type Cell = Option<String>;

/// Untyped, header-addressed table as it comes off disk.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Table {
    pub(crate) name: String,
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<Cell>>,
}

impl Table {
    pub(crate) fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Table {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    pub(crate) fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Index of `column`, or a `MissingColumns` error naming it.
    pub(crate) fn require(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| AnalysisError::MissingColumns {
                table: self.name.clone(),
                columns: vec![column.to_string()],
            })
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One joined row: a (Country, year) observation with all four metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct MergedRecord {
    #[serde(rename = "Country")]
    pub(crate) country: String,
    pub(crate) year: i32,
    #[serde(rename = "Life Expectancy")]
    pub(crate) life_expectancy: Option<f64>,
    #[serde(rename = "Alcohol")]
    pub(crate) alcohol: Option<f64>,
    #[serde(rename = "Suicide Rate")]
    pub(crate) suicide_rate: Option<f64>,
    #[serde(rename = "Happiness Score")]
    pub(crate) happiness_score: Option<f64>,
}

/// The four numeric metrics of a `MergedRecord`, in column order of the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Metric {
    Alcohol,
    HappinessScore,
    LifeExpectancy,
    SuicideRate,
}

impl Metric {
    pub(crate) const ALL: [Metric; 4] = [
        Metric::Alcohol,
        Metric::HappinessScore,
        Metric::LifeExpectancy,
        Metric::SuicideRate,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Metric::Alcohol => "Alcohol",
            Metric::HappinessScore => "Happiness Score",
            Metric::LifeExpectancy => "Life Expectancy",
            Metric::SuicideRate => "Suicide Rate",
        }
    }

    pub(crate) fn value(self, record: &MergedRecord) -> Option<f64> {
        match self {
            Metric::Alcohol => record.alcohol,
            Metric::HappinessScore => record.happiness_score,
            Metric::LifeExpectancy => record.life_expectancy,
            Metric::SuicideRate => record.suicide_rate,
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
