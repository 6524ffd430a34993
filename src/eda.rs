use std::path::{Path, PathBuf};

use log::{info, warn};
use plotters::element::Pie;
use plotters::prelude::*;

use crate::eda_statistics::{
    Aggregates, BinnedRates, BoxStats, CountryMeans, Histogram, PieSlice, YearlyMeans,
    HAPPINESS_BINS,
};
use crate::error::Result;

pub(crate) const HISTOGRAM_FILE: &str = "life_expectancy_histogram.png";
pub(crate) const PIE_FILE: &str = "suicide_share_pie.png";
pub(crate) const BOX_PLOT_FILE: &str = "suicide_by_happiness_box.png";
pub(crate) const TREND_FILE: &str = "life_vs_suicide_trend.png";
pub(crate) const SCATTER_FILE: &str = "happiness_vs_alcohol_scatter.png";

const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
const LIGHT_BLUE: RGBColor = RGBColor(173, 216, 230);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const ORANGE: RGBColor = RGBColor(255, 165, 0);

// "Paired" qualitative palette
const PAIRED: [RGBColor; 12] = [
    RGBColor(166, 206, 227),
    RGBColor(31, 120, 180),
    RGBColor(178, 223, 138),
    RGBColor(51, 160, 44),
    RGBColor(251, 154, 153),
    RGBColor(227, 26, 28),
    RGBColor(253, 191, 111),
    RGBColor(255, 127, 0),
    RGBColor(202, 178, 214),
    RGBColor(106, 61, 154),
    RGBColor(255, 255, 153),
    RGBColor(177, 89, 40),
];

/// `min..max` widened by 5% each side; a flat range is widened by 1.
fn padded_range(values: impl Iterator<Item = f64>) -> Option<std::ops::Range<f64>> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    Some((lo - pad)..(hi + pad))
}

pub(crate) fn render_histogram(hist: &Histogram, output: &Path) -> Result<()> {
    let root = BitMapBackend::new(output, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_count = hist.counts.iter().copied().max().unwrap_or(0) as u32;
    let x_range = hist.edges[0]..hist.edges[hist.edges.len() - 1];

    let mut chart = ChartBuilder::on(&root)
        .caption("Distribution of Life Expectancy", ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0u32..max_count + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Life Expectancy (years)")
        .y_desc("Frequency")
        .axis_desc_style(("sans-serif", 20))
        .draw()?;

    let bars = || {
        hist.counts
            .iter()
            .enumerate()
            .map(|(i, &count)| [(hist.edges[i], 0u32), (hist.edges[i + 1], count as u32)])
    };
    chart.draw_series(bars().map(|corners| Rectangle::new(corners, LIGHT_GREEN.mix(0.7).filled())))?;
    chart.draw_series(bars().map(|corners| Rectangle::new(corners, BLACK.stroke_width(1))))?;

    root.present()?;
    Ok(())
}

pub(crate) fn render_pie(slices: &[PieSlice], output: &Path) -> Result<()> {
    let root = BitMapBackend::new(output, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled("Countries with High Suicide Rates", ("sans-serif", 32))?;

    // zero-sized slices carry no angle
    let visible: Vec<&PieSlice> = slices.iter().filter(|s| s.value > 0.0).collect();
    let sizes: Vec<f64> = visible.iter().map(|s| s.value).collect();
    let labels: Vec<&str> = visible.iter().map(|s| s.label.as_str()).collect();
    let colors: Vec<RGBColor> = (0..visible.len()).map(|i| PAIRED[i % PAIRED.len()]).collect();

    let dims = area.dim_in_pixel();
    let center = (dims.0 as i32 / 2, dims.1 as i32 / 2);
    let radius = f64::from(dims.0.min(dims.1)) * 0.35;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(140.0);
    pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
    pie.percentages(("sans-serif", radius * 0.07).into_font().color(&BLACK));
    area.draw(&pie)?;

    root.present()?;
    Ok(())
}

pub(crate) fn render_box_plot(bins: &[BinnedRates], output: &Path) -> Result<()> {
    let stats: Vec<(usize, BoxStats)> = bins
        .iter()
        .enumerate()
        .filter_map(|(i, bin)| BoxStats::from_values(&bin.suicide_rates).map(|s| (i, s)))
        .collect();

    let y_range = padded_range(bins.iter().flat_map(|b| b.suicide_rates.iter().copied()))
        .map(|r| r.start.min(0.0)..r.end)
        .unwrap_or(0.0..1.0);

    let root = BitMapBackend::new(output, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Suicide Rates by Happiness Bins", ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(HAPPINESS_BINS.len() as f64 - 0.5), y_range)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(HAPPINESS_BINS.len())
        .x_label_formatter(&|x| {
            let idx = x.round();
            if (x - idx).abs() < 1e-6 && idx >= 0.0 {
                HAPPINESS_BINS
                    .get(idx as usize)
                    .map(|&(_, _, label)| label.to_string())
                    .unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc("Happiness Bins")
        .y_desc("Suicide Rate (per 100k population)")
        .axis_desc_style(("sans-serif", 20))
        .draw()?;

    let half = 0.3;
    for (i, s) in &stats {
        let x = *i as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, s.q1), (x + half, s.q3)],
            LIGHT_BLUE.filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, s.q1), (x + half, s.q3)],
            BLUE.stroke_width(1),
        )))?;

        let cap = half / 2.0;
        chart.draw_series(
            [
                vec![(x, s.q3), (x, s.upper_whisker)],
                vec![(x, s.q1), (x, s.lower_whisker)],
                vec![(x - cap, s.upper_whisker), (x + cap, s.upper_whisker)],
                vec![(x - cap, s.lower_whisker), (x + cap, s.lower_whisker)],
            ]
            .into_iter()
            .map(|line| PathElement::new(line, BLUE.stroke_width(1))),
        )?;

        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x - half, s.median), (x + half, s.median)],
            RED.stroke_width(2),
        )))?;

        chart.draw_series(
            s.outliers
                .iter()
                .map(|&v| Circle::new((x, v), 4, BLUE.stroke_width(1))),
        )?;
    }

    root.present()?;
    Ok(())
}

pub(crate) fn render_trend(yearly: &[YearlyMeans], output: &Path) -> Result<()> {
    let life: Vec<(i32, f64)> = yearly
        .iter()
        .filter_map(|y| y.life_expectancy.map(|v| (y.year, v)))
        .collect();
    let suicide: Vec<(i32, f64)> = yearly
        .iter()
        .filter_map(|y| y.suicide_rate.map(|v| (y.year, v)))
        .collect();

    let first = yearly.first().map(|y| y.year).unwrap_or(0);
    let last = yearly.last().map(|y| y.year).unwrap_or(0);
    let y_range = padded_range(life.iter().chain(suicide.iter()).map(|&(_, v)| v))
        .map(|r| r.start.min(0.0)..r.end)
        .unwrap_or(0.0..1.0);

    let root = BitMapBackend::new(output, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Life Expectancy and Suicide Rates Over Time", ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((first - 1)..(last + 1), y_range)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Average Value")
        .axis_desc_style(("sans-serif", 20))
        .x_label_formatter(&|x| x.to_string())
        .draw()?;

    chart
        .draw_series(LineSeries::new(life.iter().copied(), PURPLE.stroke_width(2)))?
        .label("Avg Life Expectancy")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PURPLE.stroke_width(2)));
    chart.draw_series(PointSeries::of_element(
        life.iter().copied(),
        5,
        &PURPLE,
        &|c, s, st| EmptyElement::at(c) + Circle::new((0, 0), s, st.filled()),
    ))?;

    chart
        .draw_series(LineSeries::new(suicide.iter().copied(), ORANGE.stroke_width(2)))?
        .label("Avg Suicide Rate")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE.stroke_width(2)));
    chart.draw_series(PointSeries::of_element(
        suicide.iter().copied(),
        5,
        &ORANGE,
        &|c, s, st| EmptyElement::at(c) + Rectangle::new([(-s, -s), (s, s)], st.filled()),
    ))?;

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

pub(crate) fn render_scatter(by_country: &[CountryMeans], output: &Path) -> Result<()> {
    let points: Vec<(&str, f64, f64)> = by_country
        .iter()
        .filter_map(|c| Some((c.country.as_str(), c.happiness_score?, c.alcohol?)))
        .collect();

    let x_range = padded_range(points.iter().map(|&(_, h, _)| h)).unwrap_or(0.0..10.0);
    let y_range = padded_range(points.iter().map(|&(_, _, a)| a)).unwrap_or(0.0..1.0);

    let root = BitMapBackend::new(output, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Happiness Score vs Alcohol Consumption by Country", ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Happiness Score")
        .y_desc("Alcohol Consumption (per capita)")
        .axis_desc_style(("sans-serif", 20))
        .draw()?;

    for (i, &(country, happiness, alcohol)) in points.iter().enumerate() {
        chart
            .draw_series(std::iter::once(Circle::new(
                (happiness, alcohol),
                8,
                Palette99::pick(i).filled(),
            )))?
            .label(country)
            .legend(move |(x, y)| Circle::new((x, y), 5, Palette99::pick(i).filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Writes every chart that has data into `output_dir`, returning the files written.
pub(crate) fn render_all(aggregates: &Aggregates, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();

    match &aggregates.life_expectancy_histogram {
        Some(hist) => {
            let path = output_dir.join(HISTOGRAM_FILE);
            render_histogram(hist, &path)?;
            written.push(path);
        }
        None => warn!("No life expectancy values, skipping histogram"),
    }

    if aggregates.suicide_share.iter().any(|s| s.value > 0.0) {
        let path = output_dir.join(PIE_FILE);
        render_pie(&aggregates.suicide_share, &path)?;
        written.push(path);
    } else {
        warn!("No suicide rates to share out, skipping pie chart");
    }

    if aggregates.happiness_bins.iter().any(|b| !b.suicide_rates.is_empty()) {
        let path = output_dir.join(BOX_PLOT_FILE);
        render_box_plot(&aggregates.happiness_bins, &path)?;
        written.push(path);
    } else {
        warn!("No binned suicide rates, skipping box plot");
    }

    if aggregates.yearly.is_empty() {
        warn!("No yearly averages, skipping trend chart");
    } else {
        let path = output_dir.join(TREND_FILE);
        render_trend(&aggregates.yearly, &path)?;
        written.push(path);
    }

    if aggregates.by_country.is_empty() {
        warn!("No per-country averages, skipping scatter plot");
    } else {
        let path = output_dir.join(SCATTER_FILE);
        render_scatter(&aggregates.by_country, &path)?;
        written.push(path);
    }

    for path in &written {
        info!("Chart saved to {}", path.display());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MergedRecord;

    #[test]
    fn test_padded_range() {
        let range = padded_range([2.0, 4.0].into_iter()).unwrap();
        assert!((range.start - 1.9).abs() < 1e-12);
        assert!((range.end - 4.1).abs() < 1e-12);

        let flat = padded_range(std::iter::once(3.0)).unwrap();
        assert_eq!(flat, 2.0..4.0);

        assert!(padded_range(std::iter::empty()).is_none());
    }

    #[test]
    fn test_render_all_skips_every_chart_without_data() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("charts");
        let written = render_all(&Aggregates::from_records(&[]), &out).unwrap();
        assert!(written.is_empty());
        assert!(out.is_dir());
    }

    fn record(
        country: &str,
        year: i32,
        life: f64,
        alcohol: f64,
        suicide: f64,
        score: f64,
    ) -> MergedRecord {
        MergedRecord {
            country: country.into(),
            year,
            life_expectancy: Some(life),
            alcohol: Some(alcohol),
            suicide_rate: Some(suicide),
            happiness_score: Some(score),
        }
    }

    #[test]
    fn test_render_all_writes_five_charts() {
        let records = vec![
            record("Norway", 2010, 81.0, 6.6, 11.2, 7.554),
            record("Norway", 2011, 81.3, 6.5, 10.9, 7.554),
            record("France", 2010, 81.7, 12.1, 16.4, 6.592),
            record("France", 2011, 82.0, 11.8, 16.0, 6.592),
            record("Chile", 2010, 79.1, 7.2, 10.1, 6.444),
            record("Sri Lanka", 2010, 74.6, 2.4, 28.8, 4.366),
            record("Paraguay", 2011, 74.0, 7.1, 5.3, 5.743),
            record("Montenegro", 2011, 75.6, 4.8, 17.5, 5.523),
        ];
        let dir = tempfile::tempdir().unwrap();
        let written = render_all(&Aggregates::from_records(&records), dir.path()).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![HISTOGRAM_FILE, PIE_FILE, BOX_PLOT_FILE, TREND_FILE, SCATTER_FILE]);
        for path in &written {
            assert!(path.starts_with(dir.path()));
            assert!(std::fs::metadata(path).unwrap().len() > 0);
        }
    }
}
