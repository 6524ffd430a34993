use itertools::Itertools;
use log::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::models::{Cell, Table};

pub(crate) const REQUIRED_LIFE_EXPECTANCY_COLUMNS: [&str; 4] =
    ["Country", "year", "Life expectancy", "Alcohol"];

const LIFE_EXPECTANCY_RENAMES: &[(&str, &str)] = &[("Year", "year")];
const HAPPINESS_RENAMES: &[(&str, &str)] =
    &[("Country or region", "Country"), ("Score", "Happiness Score")];
const SUICIDE_RENAMES: &[(&str, &str)] = &[("country", "Country")];

pub(crate) fn strip_column_names(table: &mut Table) {
    for header in table.headers.iter_mut() {
        *header = header.trim().to_string();
    }
}

/// Renames headers that match a `(from, to)` pair exactly; others are left alone.
pub(crate) fn rename_columns(table: &mut Table, renames: &[(&str, &str)]) {
    for header in table.headers.iter_mut() {
        if let Some((_, to)) = renames.iter().find(|(from, _)| header.as_str() == *from) {
            *header = to.to_string();
        }
    }
}

/// Fails with every absent column listed, not just the first.
pub(crate) fn require_columns(table: &Table, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|column| table.column_index(column).is_none())
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::MissingColumns {
            table: table.name.clone(),
            columns: missing,
        })
    }
}

// Numeric cells compare by value, so "82.2" and "82.20" are the same cell
fn dedup_key(cell: &Cell) -> Option<String> {
    cell.as_deref().map(|value| match value.trim().parse::<f64>() {
        Ok(number) => number.to_string(),
        Err(_) => value.to_string(),
    })
}

/// Drops repeated rows, keeping the first occurrence of each.
pub(crate) fn drop_duplicates(table: &mut Table) {
    let before = table.rows.len();
    let rows = std::mem::take(&mut table.rows);
    table.rows = rows
        .into_iter()
        .unique_by(|row| row.iter().map(dedup_key).collect::<Vec<_>>())
        .collect();
    debug!("{}: dropped {} duplicate rows", table.name, before - table.rows.len());
}

/// Fills each missing cell from the row above. Gaps in the first row stay missing.
pub(crate) fn forward_fill(table: &mut Table) {
    for row_idx in 1..table.rows.len() {
        let (filled, rest) = table.rows.split_at_mut(row_idx);
        let previous = &filled[row_idx - 1];
        for (cell, above) in rest[0].iter_mut().zip(previous.iter()) {
            if cell.is_none() {
                cell.clone_from(above);
            }
        }
    }
}

/// Turns cells of `column` that are not numbers into missing values.
pub(crate) fn coerce_numeric(table: &mut Table, column: &str) -> Result<()> {
    let idx = table.require(column)?;
    let mut coerced = 0;
    for row in table.rows.iter_mut() {
        if let Some(value) = &row[idx] {
            if value.trim().parse::<f64>().is_err() {
                row[idx] = None;
                coerced += 1;
            }
        }
    }
    if coerced > 0 {
        debug!("{}: {} non-numeric {:?} values set missing", table.name, coerced, column);
    }
    Ok(())
}

pub(crate) fn strip_values(table: &mut Table, column: &str) -> Result<()> {
    let idx = table.require(column)?;
    for row in table.rows.iter_mut() {
        if let Some(value) = row[idx].as_mut() {
            *value = value.trim().to_string();
        }
    }
    Ok(())
}

pub(crate) fn clean_life_expectancy(mut table: Table) -> Result<Table> {
    strip_column_names(&mut table);
    rename_columns(&mut table, LIFE_EXPECTANCY_RENAMES);
    require_columns(&table, &REQUIRED_LIFE_EXPECTANCY_COLUMNS)?;
    drop_duplicates(&mut table);
    forward_fill(&mut table);

    info!("Cleaned {}: {} rows", table.name, table.len());
    Ok(table)
}

pub(crate) fn clean_suicide(mut table: Table) -> Result<Table> {
    strip_column_names(&mut table);
    rename_columns(&mut table, SUICIDE_RENAMES);
    drop_duplicates(&mut table);
    coerce_numeric(&mut table, "year")?;
    forward_fill(&mut table);

    info!("Cleaned {}: {} rows", table.name, table.len());
    Ok(table)
}

pub(crate) fn clean_happiness(mut table: Table) -> Result<Table> {
    strip_column_names(&mut table);
    rename_columns(&mut table, HAPPINESS_RENAMES);
    drop_duplicates(&mut table);
    strip_values(&mut table, "Country")?;

    info!("Cleaned {}: {} rows", table.name, table.len());
    Ok(table)
}
