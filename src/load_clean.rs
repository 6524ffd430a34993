use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Cell, Table};

pub(crate) const LIFE_EXPECTANCY_TABLE: &str = "Life Expectancy Data";
pub(crate) const HAPPINESS_TABLE: &str = "Happiness 2019";
pub(crate) const SUICIDE_TABLE: &str = "Suicide Rates";

// Cell contents read as missing values
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN",
];

/// Locations of the three source files.
#[derive(Debug, Clone)]
pub(crate) struct DataPaths {
    pub(crate) life_expectancy: PathBuf,
    pub(crate) happiness: PathBuf,
    pub(crate) suicide: PathBuf,
}

/// The three raw tables, before any cleaning.
#[derive(Debug, Clone)]
pub(crate) struct Datasets {
    pub(crate) life_expectancy: Table,
    pub(crate) happiness: Table,
    pub(crate) suicide: Table,
}

pub(crate) fn parse_cell(value: &str) -> Cell {
    if MISSING_TOKENS.contains(&value) {
        None
    } else {
        Some(value.to_string())
    }
}

// Load a headed CSV file into a Table
pub(crate) fn load_table(path: &Path, name: &str) -> Result<Table> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<Cell> = record.iter().map(parse_cell).collect();
        rows.push(row);
    }

    info!("Loaded {} rows from {} ({})", rows.len(), name, path.display());
    Ok(Table::new(name, headers, rows))
}

pub(crate) fn load_datasets(paths: &DataPaths) -> Result<Datasets> {
    Ok(Datasets {
        life_expectancy: load_table(&paths.life_expectancy, LIFE_EXPECTANCY_TABLE)?,
        happiness: load_table(&paths.happiness, HAPPINESS_TABLE)?,
        suicide: load_table(&paths.suicide, SUICIDE_TABLE)?,
    })
}

/// Writes `rows` with a header line taken from the row type's field names.
pub(crate) fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
