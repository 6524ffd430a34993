use std::collections::HashMap;

use log::{info, warn};

use crate::error::{AnalysisError, Result};
use crate::models::{Cell, MergedRecord, Table};

pub(crate) const SELECTED_COUNTRIES: [&str; 10] = [
    "Portugal",
    "Paraguay",
    "Mauritius",
    "Turkmenistan",
    "France",
    "Slovakia",
    "Norway",
    "Sri Lanka",
    "Montenegro",
    "Chile",
];

const SUICIDE_RATE_COLUMN: &str = "suicides/100k pop";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LifeExpectancyRow {
    pub(crate) country: String,
    pub(crate) year: i32,
    pub(crate) life_expectancy: Option<f64>,
    pub(crate) alcohol: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SuicideRow {
    pub(crate) country: String,
    pub(crate) year: Option<f64>,
    pub(crate) suicide_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HappinessRow {
    pub(crate) country: String,
    pub(crate) happiness_score: Option<f64>,
}

/// Keeps the rows whose Country is one of `SELECTED_COUNTRIES`.
pub(crate) fn filter_countries(table: &Table) -> Result<Table> {
    let idx = table.require("Country")?;
    let rows: Vec<Vec<Cell>> = table
        .rows
        .iter()
        .filter(|row| {
            row[idx]
                .as_deref()
                .is_some_and(|country| SELECTED_COUNTRIES.contains(&country))
        })
        .cloned()
        .collect();

    let filtered = Table::new(&table.name, table.headers.clone(), rows);
    info!("Filtered {}: {} of {} rows kept", table.name, filtered.len(), table.len());
    if filtered.is_empty() {
        warn!("{} has no rows for the selected countries", table.name);
    }
    Ok(filtered)
}

fn invalid(table: &Table, column: &str, row: usize, value: &str) -> AnalysisError {
    AnalysisError::InvalidValue {
        table: table.name.clone(),
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}

fn parse_number(table: &Table, column: &str, row: usize, cell: &Cell) -> Result<Option<f64>> {
    match cell {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(table, column, row, value)),
    }
}

fn country_of(table: &Table, idx: usize, row: usize, cells: &[Cell]) -> Result<String> {
    cells[idx]
        .clone()
        .ok_or_else(|| invalid(table, "Country", row, ""))
}

pub(crate) fn life_expectancy_rows(table: &Table) -> Result<Vec<LifeExpectancyRow>> {
    let country_idx = table.require("Country")?;
    let year_idx = table.require("year")?;
    let life_idx = table.require("Life expectancy")?;
    let alcohol_idx = table.require("Alcohol")?;

    let mut rows = Vec::with_capacity(table.len());
    for (i, cells) in table.rows.iter().enumerate() {
        // fractional years truncate; a missing year has no integer form
        let year = parse_number(table, "year", i, &cells[year_idx])?
            .filter(|y| y.is_finite())
            .ok_or_else(|| invalid(table, "year", i, cells[year_idx].as_deref().unwrap_or("")))?
            .trunc() as i32;

        rows.push(LifeExpectancyRow {
            country: country_of(table, country_idx, i, cells)?,
            year,
            life_expectancy: parse_number(table, "Life expectancy", i, &cells[life_idx])?,
            alcohol: parse_number(table, "Alcohol", i, &cells[alcohol_idx])?,
        });
    }
    Ok(rows)
}

pub(crate) fn suicide_rows(table: &Table) -> Result<Vec<SuicideRow>> {
    let country_idx = table.require("Country")?;
    let year_idx = table.require("year")?;
    let rate_idx = table.require(SUICIDE_RATE_COLUMN)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            Ok(SuicideRow {
                country: country_of(table, country_idx, i, cells)?,
                year: parse_number(table, "year", i, &cells[year_idx])?,
                suicide_rate: parse_number(table, SUICIDE_RATE_COLUMN, i, &cells[rate_idx])?,
            })
        })
        .collect()
}

pub(crate) fn happiness_rows(table: &Table) -> Result<Vec<HappinessRow>> {
    let country_idx = table.require("Country")?;
    let score_idx = table.require("Happiness Score")?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            Ok(HappinessRow {
                country: country_of(table, country_idx, i, cells)?,
                happiness_score: parse_number(table, "Happiness Score", i, &cells[score_idx])?,
            })
        })
        .collect()
}

// Whole-number years only; anything else can never equal an integer year.
fn join_year(year: f64) -> Option<i32> {
    if year.is_finite() && year.fract() == 0.0 {
        Some(year as i32)
    } else {
        None
    }
}

/// Inner join on (Country, year), then on Country with the happiness scores.
///
/// Every matching pair is emitted in the order of the life-expectancy rows,
/// so a country-year with several suicide rows yields several records.
pub(crate) fn merge(
    life: &[LifeExpectancyRow],
    suicide: &[SuicideRow],
    happiness: &[HappinessRow],
) -> Vec<MergedRecord> {
    let mut suicide_by_key: HashMap<(&str, i32), Vec<&SuicideRow>> = HashMap::new();
    for row in suicide {
        if let Some(year) = row.year.and_then(join_year) {
            suicide_by_key
                .entry((row.country.as_str(), year))
                .or_default()
                .push(row);
        }
    }

    let mut happiness_by_country: HashMap<&str, Vec<&HappinessRow>> = HashMap::new();
    for row in happiness {
        happiness_by_country
            .entry(row.country.as_str())
            .or_default()
            .push(row);
    }

    let mut merged = Vec::new();
    for le in life {
        let Some(matches) = suicide_by_key.get(&(le.country.as_str(), le.year)) else {
            continue;
        };
        let Some(scores) = happiness_by_country.get(le.country.as_str()) else {
            continue;
        };
        for s in matches {
            for h in scores {
                merged.push(MergedRecord {
                    country: le.country.clone(),
                    year: le.year,
                    life_expectancy: le.life_expectancy,
                    alcohol: le.alcohol,
                    suicide_rate: s.suicide_rate,
                    happiness_score: h.happiness_score,
                });
            }
        }
    }
    merged
}

/// Filters the three cleaned tables to the selected countries and joins them.
pub(crate) fn merge_tables(life: &Table, suicide: &Table, happiness: &Table) -> Result<Vec<MergedRecord>> {
    let life = life_expectancy_rows(&filter_countries(life)?)?;
    let suicide = suicide_rows(&filter_countries(suicide)?)?;
    let happiness = happiness_rows(&filter_countries(happiness)?)?;

    let merged = merge(&life, &suicide, &happiness);
    info!("Merged table: {} rows", merged.len());
    if merged.is_empty() {
        warn!("Merged table is empty, aggregates and charts will be empty");
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(value: &str) -> Cell {
        Some(value.to_string())
    }

    fn life(country: &str, year: i32, le: f64, alcohol: f64) -> LifeExpectancyRow {
        LifeExpectancyRow {
            country: country.into(),
            year,
            life_expectancy: Some(le),
            alcohol: Some(alcohol),
        }
    }

    fn suicide(country: &str, year: f64, rate: f64) -> SuicideRow {
        SuicideRow {
            country: country.into(),
            year: Some(year),
            suicide_rate: Some(rate),
        }
    }

    fn happiness(country: &str, score: f64) -> HappinessRow {
        HappinessRow {
            country: country.into(),
            happiness_score: Some(score),
        }
    }

    #[test]
    fn test_filter_countries_keeps_allowlist_only() {
        let table = Table::new(
            "Suicide Rates",
            vec!["Country".into(), "year".into()],
            vec![
                vec![cell("Chile"), cell("2010")],
                vec![cell("Albania"), cell("2010")],
                vec![None, cell("2010")],
                vec![cell("Sri Lanka"), cell("2011")],
            ],
        );
        let filtered = filter_countries(&table).unwrap();
        assert_eq!(filtered.len(), 2);
        for row in &filtered.rows {
            assert!(SELECTED_COUNTRIES.contains(&row[0].as_deref().unwrap()));
        }
    }

    #[test]
    fn test_portugal_broadcasts_happiness_to_matching_year() {
        let merged = merge(
            &[life("Portugal", 2010, 79.8, 12.0), life("Portugal", 2015, 81.1, 11.5)],
            &[suicide("Portugal", 2010.0, 8.4)],
            &[happiness("Portugal", 7.2)],
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].country, "Portugal");
        assert_eq!(merged[0].year, 2010);
        assert_eq!(merged[0].happiness_score, Some(7.2));
        assert_eq!(merged[0].life_expectancy, Some(79.8));
        assert_eq!(merged[0].suicide_rate, Some(8.4));
    }

    #[test]
    fn test_merge_is_inner_on_all_three_tables() {
        let merged = merge(
            &[
                life("France", 2000, 79.0, 13.0),
                life("Chile", 2000, 77.0, 7.0),
                life("Norway", 2001, 81.0, 6.0),
            ],
            &[
                suicide("France", 2000.0, 18.0),
                suicide("Chile", 2000.0, 10.0),
                suicide("Norway", 2000.0, 11.0),
            ],
            // Chile has no happiness score
            &[happiness("France", 6.6), happiness("Norway", 7.5)],
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].country, "France");
    }

    #[test]
    fn test_merge_emits_every_matching_suicide_row() {
        let merged = merge(
            &[life("Chile", 1999, 77.0, 7.0)],
            &[
                suicide("Chile", 1999.0, 2.0),
                suicide("Chile", 1999.0, 20.0),
                suicide("Chile", 1999.5, 5.0),
            ],
            &[happiness("Chile", 6.4)],
        );
        let rates: Vec<Option<f64>> = merged.iter().map(|r| r.suicide_rate).collect();
        assert_eq!(rates, vec![Some(2.0), Some(20.0)]);
    }

    #[test]
    fn test_life_rows_cast_year_to_integer() {
        let table = Table::new(
            "Life Expectancy Data",
            vec!["Country".into(), "year".into(), "Life expectancy".into(), "Alcohol".into()],
            vec![vec![cell("Norway"), cell("2014.0"), cell("81.8"), None]],
        );
        let rows = life_expectancy_rows(&table).unwrap();
        assert_eq!(rows, vec![LifeExpectancyRow {
            country: "Norway".into(),
            year: 2014,
            life_expectancy: Some(81.8),
            alcohol: None,
        }]);
    }

    #[test]
    fn test_life_rows_reject_missing_year() {
        let table = Table::new(
            "Life Expectancy Data",
            vec!["Country".into(), "year".into(), "Life expectancy".into(), "Alcohol".into()],
            vec![vec![cell("Norway"), None, cell("81.8"), cell("6.0")]],
        );
        assert!(matches!(
            life_expectancy_rows(&table),
            Err(AnalysisError::InvalidValue { ref column, .. }) if column == "year"
        ));
    }

    #[test]
    fn test_suicide_rows_reject_non_numeric_rate() {
        let table = Table::new(
            "Suicide Rates",
            vec!["Country".into(), "year".into(), SUICIDE_RATE_COLUMN.into()],
            vec![vec![cell("France"), cell("2001"), cell("high")]],
        );
        let err = suicide_rows(&table).unwrap_err();
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn test_merge_tables_end_to_end() {
        let life_table = Table::new(
            "Life Expectancy Data",
            vec!["Country".into(), "year".into(), "Life expectancy".into(), "Alcohol".into()],
            vec![
                vec![cell("Portugal"), cell("2015"), cell("81.1"), cell("11.5")],
                vec![cell("Portugal"), cell("2010"), cell("79.8"), cell("12.0")],
                vec![cell("Spain"), cell("2010"), cell("82.0"), cell("10.0")],
            ],
        );
        let suicide_table = Table::new(
            "Suicide Rates",
            vec!["Country".into(), "year".into(), SUICIDE_RATE_COLUMN.into()],
            vec![
                vec![cell("Portugal"), cell("2010"), cell("8.4")],
                vec![cell("Spain"), cell("2010"), cell("7.0")],
            ],
        );
        let happiness_table = Table::new(
            "Happiness 2019",
            vec!["Country".into(), "Happiness Score".into()],
            vec![vec![cell("Portugal"), cell("7.2")], vec![cell("Spain"), cell("6.3")]],
        );

        let merged = merge_tables(&life_table, &suicide_table, &happiness_table).unwrap();
        assert_eq!(merged.len(), 1);
        let record = &merged[0];
        assert!(SELECTED_COUNTRIES.contains(&record.country.as_str()));
        assert_eq!(record.year, 2010);
        assert_eq!(record.happiness_score, Some(7.2));
    }
}
