//! Chart descriptions handed to a renderer.
//!
//! Every builder returns a self-contained [`ChartSpec`]: named series of ready
//! to plot points plus ticks, limits and colour range. Nothing here draws, and
//! no builder depends on state left behind by another.

use serde::Serialize;

use crate::animation::{plan_with_target, FramePlan};
use crate::config::AnalyticsConfig;
use crate::daily::{aggregate, races_per_day};
use crate::decimate::{decimate_most_recent, DecimationPolicy};
use crate::error::AnalyticsResult;
use crate::histogram::{accuracy_histogram, speed_counts, speed_histogram, Binning, Histogram, Tick};
use crate::personal_best::{track, PbMode};
use crate::record::RecordSequence;
use crate::smoothing::{cumulative_average, running_average};
use crate::util::{min_max, normalize};

const SPARSE_MARKER_SIZE: f64 = 20.0;
const DENSE_MARKER_SIZE: f64 = 1.0;

/// Quanta for the scatter decimation, per chart
const ACCURACY_BY_ATTEMPT_QUANTA: (f64, f64) = (100.0, 0.00101);
const SPEED_BY_ATTEMPT_QUANTA: (f64, f64) = (150.0, 3.0);
const SPEED_VS_ACCURACY_QUANTA: (f64, f64) = (0.001, 1.0);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ChartKind {
    Speed,
    Accuracy,
    SpeedHistogram,
    SpeedCounts,
    AccuracyHistogram,
    AccuracyByAttempt,
    SpeedByAttempt,
    SpeedVsAccuracy,
    DailyRaces,
    DailySpeed,
}

impl ChartKind {
    pub fn build(self, seq: &RecordSequence, cfg: &AnalyticsConfig) -> AnalyticsResult<ChartSpec> {
        match self {
            ChartKind::Speed => speed_chart(seq, cfg),
            ChartKind::Accuracy => accuracy_chart(seq, cfg),
            ChartKind::SpeedHistogram => speed_histogram_chart(seq),
            ChartKind::SpeedCounts => speed_counts_chart(seq),
            ChartKind::AccuracyHistogram => accuracy_histogram_chart(seq),
            ChartKind::AccuracyByAttempt => accuracy_by_attempt_chart(seq, cfg),
            ChartKind::SpeedByAttempt => speed_by_attempt_chart(seq, cfg),
            ChartKind::SpeedVsAccuracy => speed_vs_accuracy_chart(seq, cfg),
            ChartKind::DailyRaces => Ok(daily_races_chart(seq)),
            ChartKind::DailySpeed => Ok(daily_speed_chart(seq)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesKind {
    Line,
    /// Staircase: consecutive points share either x or y, never a diagonal.
    Step,
    Scatter,
    Bar,
    /// Horizontal reference line between two points of equal y.
    HorizontalRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: f64,
    pub y: f64,
    /// Position on the chart's colour scale, in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<f64>,
}

impl SeriesPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, color: None }
    }

    pub fn colored(x: f64, y: f64, color: f64) -> Self {
        Self {
            x,
            y,
            color: Some(color),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSeries {
    pub name: String,
    pub kind: SeriesKind,
    pub points: Vec<SeriesPoint>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>, kind: SeriesKind, points: Vec<SeriesPoint>) -> Self {
        Self {
            name: name.into(),
            kind,
            points,
        }
    }

    fn line(name: impl Into<String>, xs: &[f64], ys: &[f64]) -> Self {
        let points = xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| SeriesPoint::new(x, y))
            .collect();
        Self::new(name, SeriesKind::Line, points)
    }
}

/// Value range behind the colour of scatter points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Limits {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<NamedSeries>,
    pub x_ticks: Vec<Tick>,
    /// Values labelled on a secondary y axis (PB values).
    pub secondary_y_ticks: Vec<f64>,
    pub color_scale: Option<ColorScale>,
    pub marker_size: Option<f64>,
    pub bar_width: Option<f64>,
    pub x_limits: Limits,
    pub y_limits: Limits,
}

impl ChartSpec {
    fn new(kind: ChartKind, title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            series: Vec::new(),
            x_ticks: Vec::new(),
            secondary_y_ticks: Vec::new(),
            color_scale: None,
            marker_size: None,
            bar_width: None,
            x_limits: Limits::default(),
            y_limits: Limits::default(),
        }
    }

    pub fn series_named(&self, name: &str) -> Option<&NamedSeries> {
        self.series.iter().find(|s| s.name == name)
    }

    fn attempt_limits(mut self, seq: &RecordSequence) -> Self {
        self.x_limits = Limits {
            min: Some(seq.first().attempt as f64),
            max: Some(seq.last().attempt as f64),
        };
        self
    }
}

fn marker_size(len: usize, cfg: &AnalyticsConfig) -> f64 {
    if len > cfg.dense_marker_threshold {
        DENSE_MARKER_SIZE
    } else {
        SPARSE_MARKER_SIZE
    }
}

/// Overall and "Average of N" lines shared by the speed and accuracy charts
fn average_series(
    xs: &[f64],
    ys: &[f64],
    cfg: &AnalyticsConfig,
) -> AnalyticsResult<Vec<NamedSeries>> {
    let mut out = Vec::new();
    if cfg.show_average {
        out.push(NamedSeries::line("Average", xs, &cumulative_average(ys)?));
    }
    if cfg.average_window > 0 {
        let window = cfg.average_window.min(ys.len());
        out.push(NamedSeries::line(
            format!("Average of {window}"),
            xs,
            &running_average(ys, window)?,
        ));
    }
    Ok(out)
}

/// Speed over attempts with PB trajectory, ceilings and averages
pub fn speed_chart(seq: &RecordSequence, cfg: &AnalyticsConfig) -> AnalyticsResult<ChartSpec> {
    let xs = seq.attempt_axis();
    let speeds = seq.speeds();
    let mut chart = ChartSpec::new(
        ChartKind::Speed,
        "Typing Speed",
        "Amount of races",
        "Speed (WPM)",
    )
    .attempt_limits(seq);

    chart.series.push(NamedSeries::line("Speed", &xs, &speeds));

    if cfg.show_pb {
        let pb = track(&seq.attempts(), &speeds, cfg.pb_mode)?;
        let points = pb
            .points
            .iter()
            .map(|p| SeriesPoint::new(p.attempt as f64, p.value))
            .collect();
        let kind = match pb.mode {
            PbMode::Gradual => SeriesKind::Line,
            PbMode::Snap => SeriesKind::Step,
        };
        chart.series.push(NamedSeries::new("PB's", kind, points));
        for ceiling in &pb.ceilings {
            chart.series.push(NamedSeries::new(
                "PB ceiling",
                SeriesKind::HorizontalRule,
                vec![
                    SeriesPoint::new(ceiling.from_attempt as f64, ceiling.value),
                    SeriesPoint::new(ceiling.to_attempt as f64, ceiling.value),
                ],
            ));
        }
        chart.secondary_y_ticks = pb.ticks();
    }

    chart.series.extend(average_series(&xs, &speeds, cfg)?);
    Ok(chart)
}

/// Accuracy over attempts with averages
pub fn accuracy_chart(seq: &RecordSequence, cfg: &AnalyticsConfig) -> AnalyticsResult<ChartSpec> {
    let xs = seq.attempt_axis();
    let accuracies = seq.accuracies();
    let mut chart = ChartSpec::new(
        ChartKind::Accuracy,
        "Typing Accuracy",
        "Amount of races",
        "Accuracy",
    )
    .attempt_limits(seq);
    chart.y_limits.max = Some(1.0);

    chart
        .series
        .push(NamedSeries::line("Accuracy", &xs, &accuracies));
    chart.series.extend(average_series(&xs, &accuracies, cfg)?);
    Ok(chart)
}

fn histogram_bars(name: &str, histogram: &Histogram) -> NamedSeries {
    let points = histogram
        .bins
        .iter()
        .map(|b| SeriesPoint::new((b.lower + b.upper) / 2.0, b.count as f64))
        .collect();
    NamedSeries::new(name, SeriesKind::Bar, points)
}

pub fn speed_histogram_chart(seq: &RecordSequence) -> AnalyticsResult<ChartSpec> {
    let histogram = speed_histogram(&seq.speeds())?;
    let mut chart = ChartSpec::new(
        ChartKind::SpeedHistogram,
        "Typing test speed distribution",
        "Speed (WPM)",
        "Amount of races",
    );
    chart.bar_width = Some(1.0);
    chart.series.push(histogram_bars("Races", &histogram));
    Ok(chart)
}

/// One bar per distinct observed speed
pub fn speed_counts_chart(seq: &RecordSequence) -> AnalyticsResult<ChartSpec> {
    let points = speed_counts(&seq.speeds())?
        .into_iter()
        .map(|(speed, count)| SeriesPoint::new(speed, count as f64))
        .collect();
    let mut chart = ChartSpec::new(
        ChartKind::SpeedCounts,
        "Typing test speed distribution",
        "Speed (WPM)",
        "Amount of races",
    );
    chart.bar_width = Some(1.0);
    chart
        .series
        .push(NamedSeries::new("Races", SeriesKind::Bar, points));
    Ok(chart)
}

pub fn accuracy_histogram_chart(seq: &RecordSequence) -> AnalyticsResult<ChartSpec> {
    let hist = accuracy_histogram(&seq.accuracies())?;
    let mut chart = ChartSpec::new(
        ChartKind::AccuracyHistogram,
        "Typing test accuracy distribution",
        "Accuracy (%)",
        "Amount of races",
    );
    chart.bar_width = Some(0.01);
    chart.series.push(histogram_bars("Races", &hist.histogram));
    chart.x_ticks = hist.ticks;
    Ok(chart)
}

/// Scatter of `ys` over attempts, coloured by `colors`, decimated above the
/// configured threshold.
fn attempt_scatter(
    seq: &RecordSequence,
    ys: &[f64],
    colors: &[f64],
    quanta: (f64, f64),
    cfg: &AnalyticsConfig,
) -> AnalyticsResult<(NamedSeries, ColorScale)> {
    let xs = seq.attempt_axis();
    let (lo, hi) = min_max(colors).unwrap_or((0.0, 0.0));
    let kept = DecimationPolicy::new(cfg.decimation_threshold).apply(&xs, ys, quanta.0, quanta.1)?;

    let points = kept
        .xs
        .iter()
        .zip(&kept.ys)
        .zip(&kept.source_indices)
        .map(|((&x, &y), &i)| SeriesPoint::colored(x, y, normalize(colors[i], lo, hi)))
        .collect();

    Ok((
        NamedSeries::new("Races", SeriesKind::Scatter, points),
        ColorScale {
            label: String::new(),
            min: lo,
            max: hi,
        },
    ))
}

/// Accuracy over attempts, coloured by speed
pub fn accuracy_by_attempt_chart(
    seq: &RecordSequence,
    cfg: &AnalyticsConfig,
) -> AnalyticsResult<ChartSpec> {
    let (series, mut scale) = attempt_scatter(
        seq,
        &seq.accuracies(),
        &seq.speeds(),
        ACCURACY_BY_ATTEMPT_QUANTA,
        cfg,
    )?;
    scale.label = "Speed".to_string();

    let mut chart = ChartSpec::new(
        ChartKind::AccuracyByAttempt,
        "Typing Accuracy",
        "Amount of races",
        "Accuracy",
    )
    .attempt_limits(seq);
    chart.y_limits.max = Some(1.0);
    chart.marker_size = Some(marker_size(seq.len(), cfg));
    chart.color_scale = Some(scale);
    chart.series.push(series);
    Ok(chart)
}

/// Speed over attempts, coloured by accuracy
pub fn speed_by_attempt_chart(
    seq: &RecordSequence,
    cfg: &AnalyticsConfig,
) -> AnalyticsResult<ChartSpec> {
    let (series, mut scale) = attempt_scatter(
        seq,
        &seq.speeds(),
        &seq.accuracies(),
        SPEED_BY_ATTEMPT_QUANTA,
        cfg,
    )?;
    scale.label = "Accuracy".to_string();

    let mut chart = ChartSpec::new(
        ChartKind::SpeedByAttempt,
        "Typing Speed",
        "Amount of races",
        "Speed (WPM)",
    )
    .attempt_limits(seq);
    chart.marker_size = Some(marker_size(seq.len(), cfg));
    chart.color_scale = Some(scale);
    chart.series.push(series);
    Ok(chart)
}

/// Speed against accuracy, coloured by attempt. Always decimated; the most
/// recent race wins each cell so recent form dominates the picture.
pub fn speed_vs_accuracy_chart(
    seq: &RecordSequence,
    cfg: &AnalyticsConfig,
) -> AnalyticsResult<ChartSpec> {
    let attempts = seq.attempt_axis();
    let (lo, hi) = (seq.first().attempt as f64, seq.last().attempt as f64);
    let kept = decimate_most_recent(
        &seq.accuracies(),
        &seq.speeds(),
        SPEED_VS_ACCURACY_QUANTA.0,
        SPEED_VS_ACCURACY_QUANTA.1,
    )?;

    let points = kept
        .xs
        .iter()
        .zip(&kept.ys)
        .zip(&kept.source_indices)
        .map(|((&x, &y), &i)| SeriesPoint::colored(x, y, normalize(attempts[i], lo, hi)))
        .collect();

    let mut chart = ChartSpec::new(
        ChartKind::SpeedVsAccuracy,
        "Speed/Accuracy",
        "Accuracy",
        "Speed (WPM)",
    );
    chart.marker_size = Some(marker_size(seq.len(), cfg));
    chart.color_scale = Some(ColorScale {
        label: "Attempts".to_string(),
        min: lo,
        max: hi,
    });
    chart
        .series
        .push(NamedSeries::new("Races", SeriesKind::Scatter, points));
    Ok(chart)
}

fn day_ticks(days: impl Iterator<Item = chrono::NaiveDate>) -> Vec<Tick> {
    days.enumerate()
        .map(|(i, day)| Tick {
            value: i as f64,
            position: i as f64,
            label: day.format("%Y-%m-%d").to_string(),
        })
        .collect()
}

/// Races per day, one bar per day with at least one race
pub fn daily_races_chart(seq: &RecordSequence) -> ChartSpec {
    let days = races_per_day(seq);
    let points = days
        .iter()
        .enumerate()
        .map(|(i, (_, count))| SeriesPoint::new(i as f64, *count as f64))
        .collect();

    let mut chart = ChartSpec::new(
        ChartKind::DailyRaces,
        "Total races per day",
        "Time (in days)",
        "Races",
    );
    chart.bar_width = Some(0.8);
    chart.x_ticks = day_ticks(days.iter().map(|(d, _)| *d));
    chart
        .series
        .push(NamedSeries::new("Races", SeriesKind::Bar, points));
    chart
}

/// Best, worst and average speed per day
pub fn daily_speed_chart(seq: &RecordSequence) -> ChartSpec {
    let buckets = aggregate(seq);
    let xs: Vec<f64> = (0..buckets.len()).map(|i| i as f64).collect();
    let best: Vec<f64> = buckets.iter().map(|b| b.best_speed).collect();
    let worst: Vec<f64> = buckets.iter().map(|b| b.worst_speed).collect();
    let average: Vec<f64> = buckets.iter().map(|b| b.average_speed).collect();

    let mut chart = ChartSpec::new(
        ChartKind::DailySpeed,
        "Daily speed",
        "Time (in days)",
        "Speed (WPM)",
    );
    chart.x_ticks = day_ticks(buckets.iter().map(|b| b.date));
    chart.series.push(NamedSeries::line("Best", &xs, &best));
    chart.series.push(NamedSeries::line("Worst", &xs, &worst));
    chart.series.push(NamedSeries::line("Average", &xs, &average));
    chart
}

/// Histogram revealed cumulatively, frame by frame, over fixed edges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimatedHistogram {
    pub title: String,
    pub plan: FramePlan,
    pub edges: Vec<f64>,
    pub ticks: Vec<Tick>,
    /// Bin counts per frame.
    pub frames: Vec<Vec<usize>>,
}

fn animate(
    title: &str,
    values: &[f64],
    binning: &Binning,
    frame_step: Option<usize>,
    cfg: &AnalyticsConfig,
) -> AnalyticsResult<AnimatedHistogram> {
    let plan = plan_with_target(
        values.len(),
        frame_step,
        cfg.frame_target,
        cfg.animation_duration_secs,
    )?;

    let mut counts = vec![0usize; binning.bin_count()];
    let mut revealed = 0;
    let mut frames = Vec::with_capacity(plan.frame_count);
    for len in plan.frames() {
        for &v in &values[revealed..len] {
            if let Some(i) = binning.index_of(v) {
                counts[i] += 1;
            }
        }
        revealed = len;
        frames.push(counts.clone());
    }

    Ok(AnimatedHistogram {
        title: title.to_string(),
        plan,
        edges: binning.edges(),
        ticks: binning.ticks(),
        frames,
    })
}

pub fn animated_accuracy_histogram(
    seq: &RecordSequence,
    frame_step: Option<usize>,
    cfg: &AnalyticsConfig,
) -> AnalyticsResult<AnimatedHistogram> {
    let accuracies = seq.accuracies();
    let binning = Binning::for_accuracy(&accuracies)?;
    animate(
        "Typing test accuracy distribution",
        &accuracies,
        &binning,
        frame_step,
        cfg,
    )
}

/// Speed bins are spanned rather than unit-width to keep frames small.
pub fn animated_speed_histogram(
    seq: &RecordSequence,
    frame_step: Option<usize>,
    cfg: &AnalyticsConfig,
) -> AnalyticsResult<AnimatedHistogram> {
    let speeds = seq.speeds();
    let binning = Binning::for_speed_spanned(&speeds, cfg.speed_bin_count)?;
    animate(
        "Typing test wpm distribution",
        &speeds,
        &binning,
        frame_step,
        cfg,
    )
}
