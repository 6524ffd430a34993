use std::collections::{BTreeMap, BTreeSet, HashMap};

use itertools::Itertools;
use ndarray::{Array1, Array2, Axis};
use ndarray_stats::interpolate::Linear;
use ndarray_stats::QuantileExt;
use noisy_float::types::n64;
use ordered_float::OrderedFloat;
use serde::Serialize;
use statrs::statistics::{Data, Distribution, OrderStatistics};

use crate::models::{MergedRecord, Metric};

pub(crate) const OTHERS_LABEL: &str = "Others";

/// Happiness bins as `(lower, upper, label)`; lower bound exclusive, upper inclusive.
pub(crate) const HAPPINESS_BINS: [(f64, f64, &str); 5] = [
    (0.0, 4.0, "0-4"),
    (4.0, 5.0, "4-5"),
    (5.0, 6.0, "5-6"),
    (6.0, 7.0, "6-7"),
    (7.0, 10.0, "7-10"),
];

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

// Pivot: mean of every metric by Country x year
#[derive(Debug, Clone)]
pub(crate) struct PivotTable {
    pub(crate) countries: Vec<String>,
    pub(crate) years: Vec<i32>,
    /// One countries x years matrix per metric; NaN where no value exists.
    pub(crate) cells: BTreeMap<Metric, Array2<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StackedRow {
    #[serde(rename = "Country")]
    pub(crate) country: String,
    pub(crate) year: i32,
    pub(crate) metric: Metric,
    pub(crate) value: f64,
}

impl PivotTable {
    pub(crate) fn from_records(records: &[MergedRecord]) -> Self {
        let countries: Vec<String> = records
            .iter()
            .map(|r| r.country.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let years: Vec<i32> = records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let country_pos: HashMap<&str, usize> = countries
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let year_pos: HashMap<i32, usize> = years.iter().enumerate().map(|(i, &y)| (y, i)).collect();

        let mut cells = BTreeMap::new();
        for metric in Metric::ALL {
            let mut sums = Array2::<f64>::zeros((countries.len(), years.len()));
            let mut counts = Array2::<f64>::zeros((countries.len(), years.len()));
            for record in records {
                if let Some(value) = metric.value(record).filter(|v| !v.is_nan()) {
                    let idx = (country_pos[record.country.as_str()], year_pos[&record.year]);
                    sums[idx] += value;
                    counts[idx] += 1.0;
                }
            }
            let means = ndarray::Zip::from(&sums)
                .and(&counts)
                .map_collect(|&s, &n| if n > 0.0 { s / n } else { f64::NAN });
            cells.insert(metric, means);
        }

        PivotTable {
            countries,
            years,
            cells,
        }
    }

    #[cfg(test)]
    pub(crate) fn get(&self, metric: Metric, country: &str, year: i32) -> Option<f64> {
        let i = self.countries.iter().position(|c| c == country)?;
        let j = self.years.iter().position(|&y| y == year)?;
        let value = self.cells.get(&metric)?[(i, j)];
        (!value.is_nan()).then_some(value)
    }

    /// Long format: one row per Country x year x metric that holds a value.
    pub(crate) fn stack(&self) -> Vec<StackedRow> {
        let mut rows = Vec::new();
        for (i, country) in self.countries.iter().enumerate() {
            for (j, &year) in self.years.iter().enumerate() {
                for (&metric, matrix) in &self.cells {
                    let value = matrix[(i, j)];
                    if !value.is_nan() {
                        rows.push(StackedRow {
                            country: country.clone(),
                            year,
                            metric,
                            value,
                        });
                    }
                }
            }
        }
        rows
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PieSlice {
    pub(crate) label: String,
    pub(crate) value: f64,
}

/// Suicide Rate summed per country, largest first. The first `top_n` countries
/// keep their own slice and the rest are summed into a trailing "Others" slice.
pub(crate) fn suicide_share_by_country(records: &[MergedRecord], top_n: usize) -> Vec<PieSlice> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for record in records {
        *totals.entry(record.country.as_str()).or_insert(0.0) += record.suicide_rate.unwrap_or(0.0);
    }

    let ranked: Vec<(&str, f64)> = totals
        .into_iter()
        .sorted_by_key(|&(country, total)| (std::cmp::Reverse(OrderedFloat(total)), country))
        .collect();

    let others: f64 = ranked.iter().skip(top_n).map(|&(_, total)| total).sum();
    let mut slices: Vec<PieSlice> = ranked
        .into_iter()
        .take(top_n)
        .map(|(country, total)| PieSlice {
            label: country.to_string(),
            value: total,
        })
        .collect();
    slices.push(PieSlice {
        label: OTHERS_LABEL.to_string(),
        value: others,
    });
    slices
}

/// Index into `HAPPINESS_BINS`, or `None` when the score falls outside (0, 10].
pub(crate) fn happiness_bin(score: f64) -> Option<usize> {
    HAPPINESS_BINS
        .iter()
        .position(|&(lower, upper, _)| score > lower && score <= upper)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BinnedRates {
    pub(crate) label: &'static str,
    pub(crate) suicide_rates: Vec<f64>,
}

pub(crate) fn suicide_rates_by_happiness_bin(records: &[MergedRecord]) -> Vec<BinnedRates> {
    let mut bins: Vec<BinnedRates> = HAPPINESS_BINS
        .iter()
        .map(|&(_, _, label)| BinnedRates {
            label,
            suicide_rates: Vec::new(),
        })
        .collect();

    for record in records {
        let (Some(score), Some(rate)) = (record.happiness_score, record.suicide_rate) else {
            continue;
        };
        if let Some(bin) = happiness_bin(score) {
            bins[bin].suicide_rates.push(rate);
        }
    }
    bins
}

/// Quantile `q` with linear interpolation between the closest ranks.
fn linear_quantile(values: &mut Array1<f64>, q: f64) -> Option<f64> {
    values
        .quantile_axis_skipnan_mut(Axis(0), n64(q), &Linear)
        .ok()
        .map(|quantile| quantile.into_scalar())
}

/// Box-and-whisker summary; whiskers reach the furthest data point within 1.5 IQR.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoxStats {
    pub(crate) lower_whisker: f64,
    pub(crate) q1: f64,
    pub(crate) median: f64,
    pub(crate) q3: f64,
    pub(crate) upper_whisker: f64,
    pub(crate) outliers: Vec<f64>,
}

impl BoxStats {
    pub(crate) fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut data = Array1::from(values.to_vec());
        let q1 = linear_quantile(&mut data, 0.25)?;
        let median = linear_quantile(&mut data, 0.5)?;
        let q3 = linear_quantile(&mut data, 0.75)?;

        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let (inside, outliers): (Vec<f64>, Vec<f64>) = values
            .iter()
            .partition(|&&v| v >= low_fence && v <= high_fence);
        let lower_whisker = inside.iter().copied().fold(f64::INFINITY, f64::min).min(q1);
        let upper_whisker = inside.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(q3);

        Some(BoxStats {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            outliers,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct YearlyMeans {
    pub(crate) year: i32,
    pub(crate) life_expectancy: Option<f64>,
    pub(crate) suicide_rate: Option<f64>,
}

pub(crate) fn yearly_means(records: &[MergedRecord]) -> Vec<YearlyMeans> {
    records
        .iter()
        .into_group_map_by(|r| r.year)
        .into_iter()
        .sorted_by_key(|(year, _)| *year)
        .map(|(year, group)| {
            let life: Vec<f64> = group.iter().filter_map(|r| r.life_expectancy).collect();
            let suicide: Vec<f64> = group.iter().filter_map(|r| r.suicide_rate).collect();
            YearlyMeans {
                year,
                life_expectancy: mean(&life),
                suicide_rate: mean(&suicide),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CountryMeans {
    pub(crate) country: String,
    pub(crate) happiness_score: Option<f64>,
    pub(crate) alcohol: Option<f64>,
}

pub(crate) fn country_means(records: &[MergedRecord]) -> Vec<CountryMeans> {
    records
        .iter()
        .into_group_map_by(|r| r.country.as_str())
        .into_iter()
        .sorted_by_key(|(country, _)| *country)
        .map(|(country, group)| {
            let happiness: Vec<f64> = group.iter().filter_map(|r| r.happiness_score).collect();
            let alcohol: Vec<f64> = group.iter().filter_map(|r| r.alcohol).collect();
            CountryMeans {
                country: country.to_string(),
                happiness_score: mean(&happiness),
                alcohol: mean(&alcohol),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Histogram {
    /// `counts.len() + 1` ascending bin edges
    pub(crate) edges: Vec<f64>,
    pub(crate) counts: Vec<usize>,
}

/// Equal-width histogram over [min, max]; the last bin also takes the maximum.
pub(crate) fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if bins == 0 {
        return None;
    }
    let data: Array1<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let mut lo = *data.min().ok()?;
    let mut hi = *data.max().ok()?;
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for &v in data.iter() {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Some(Histogram { edges, counts })
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Summary {
    pub(crate) count: usize,
    pub(crate) mean: f64,
    pub(crate) median: f64,
    pub(crate) std_dev: f64,
}

pub(crate) fn summarize(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values.to_vec());
    Some(Summary {
        count: values.len(),
        mean: data.mean()?,
        median: data.median(),
        std_dev: data.std_dev().unwrap_or(f64::NAN),
    })
}

/// Every chart input, computed once from the merged table.
#[derive(Debug, Clone)]
pub(crate) struct Aggregates {
    pub(crate) pivot: PivotTable,
    pub(crate) life_expectancy_histogram: Option<Histogram>,
    pub(crate) suicide_share: Vec<PieSlice>,
    pub(crate) happiness_bins: Vec<BinnedRates>,
    pub(crate) yearly: Vec<YearlyMeans>,
    pub(crate) by_country: Vec<CountryMeans>,
}

impl Aggregates {
    pub(crate) fn from_records(records: &[MergedRecord]) -> Self {
        let life: Vec<f64> = records.iter().filter_map(|r| r.life_expectancy).collect();
        Aggregates {
            pivot: PivotTable::from_records(records),
            life_expectancy_histogram: histogram(&life, 10),
            suicide_share: suicide_share_by_country(records, 5),
            happiness_bins: suicide_rates_by_happiness_bin(records),
            yearly: yearly_means(records),
            by_country: country_means(records),
        }
    }
}
