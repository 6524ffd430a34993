use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use crate::clean::{clean_happiness, clean_life_expectancy, clean_suicide};
use crate::eda::render_all;
use crate::eda_statistics::{summarize, Aggregates};
use crate::load_clean::{load_datasets, write_csv, DataPaths};
use crate::merge::merge_tables;
use crate::models::{MergedRecord, Metric};

/// Joins life expectancy, happiness and suicide data for ten countries and charts it
#[derive(Parser, Debug)]
#[command(name = "wellbeing_analysis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Life expectancy dataset (WHO)
    #[arg(long, env = "LIFE_EXPECTANCY_CSV", default_value = "Life Expectancy Data.csv")]
    life_expectancy: PathBuf,

    /// World Happiness Report 2019 scores
    #[arg(long, env = "HAPPINESS_CSV", default_value = "2019.csv")]
    happiness: PathBuf,

    /// Suicide rates by country, year, sex and age group
    #[arg(long, env = "SUICIDE_CSV", default_value = "master.csv")]
    suicide: PathBuf,

    /// Directory the chart images are written to
    #[arg(long, default_value = "charts")]
    output_dir: PathBuf,

    /// Also write the merged six-column table as CSV
    #[arg(long)]
    export_merged: Option<PathBuf>,

    /// Also write the stacked country/year/metric means as CSV
    #[arg(long)]
    export_stacked: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    no_charts: bool,
}

impl Cli {
    fn data_paths(&self) -> DataPaths {
        DataPaths {
            life_expectancy: self.life_expectancy.clone(),
            happiness: self.happiness.clone(),
            suicide: self.suicide.clone(),
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        let datasets = load_datasets(&self.data_paths()).context("failed to load datasets")?;

        let life = clean_life_expectancy(datasets.life_expectancy)?;
        let suicide = clean_suicide(datasets.suicide)?;
        let happiness = clean_happiness(datasets.happiness)?;

        let merged = merge_tables(&life, &suicide, &happiness)?;
        log_summaries(&merged);

        let aggregates = Aggregates::from_records(&merged);
        let stacked = aggregates.pivot.stack();
        info!(
            "Pivot: {} countries x {} years, {} stacked values",
            aggregates.pivot.countries.len(),
            aggregates.pivot.years.len(),
            stacked.len()
        );

        if let Some(path) = &self.export_merged {
            write_csv(path, &merged)
                .with_context(|| format!("failed to export merged table to {}", path.display()))?;
        }
        if let Some(path) = &self.export_stacked {
            write_csv(path, &stacked)
                .with_context(|| format!("failed to export stacked table to {}", path.display()))?;
        }

        if !self.no_charts {
            render_all(&aggregates, &self.output_dir).context("failed to render charts")?;
        }
        Ok(())
    }
}

fn log_summaries(records: &[MergedRecord]) {
    for metric in Metric::ALL {
        let values: Vec<f64> = records.iter().filter_map(|r| metric.value(r)).collect();
        if let Some(s) = summarize(&values) {
            info!(
                "{}: n={} mean={:.2} median={:.2} std dev={:.2}",
                metric.label(),
                s.count,
                s.mean,
                s.median,
                s.std_dev
            );
        }
    }
}
