//! Chart generation and rendering for the dashboard.
//!
//! Each dashboard request produces three SVG images in the artifact
//! directory:
//! - **Line Chart**: account balance over time
//! - **Moving-Average Chart**: the balance series overlaid with its trailing
//!   moving average
//! - **Pie Chart**: the share of debit vs. credit entries
//!
//! Artifacts are ephemeral. Filenames embed a seconds-resolution timestamp
//! plus a process-wide sequence number so concurrent requests never collide,
//! and each generation sweeps artifacts older than [ARTIFACT_RETENTION] out
//! of the directory.

use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use svg::{
    Document,
    node::{
        Text as TextNode,
        element::{Circle, Group, Line as SvgLine, Path as SvgPath, Rectangle, Text, path::Data},
    },
};
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, statement::{Statement, TransactionKind}};

use super::analysis::{KindTally, moving_average, tally_by_kind};

/// How long a generated chart image stays on disk.
///
/// Artifacts older than this are deleted the next time charts are generated.
/// Fresh artifacts are left alone so one request can never sweep away images
/// a concurrent request just wrote.
const ARTIFACT_RETENTION: Duration = Duration::from_secs(5 * 60);

const ARTIFACT_EXTENSION: &str = ".svg";

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day][hour][minute][second]");

/// Makes artifact filenames unique within a single timestamp second.
static ARTIFACT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

// Chart geometry. The time-series charts share one frame; the pie chart has
// its own, squarer canvas.
const CHART_WIDTH: f64 = 1000.0;
const CHART_HEIGHT: f64 = 420.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 90.0;
const PIE_WIDTH: f64 = 640.0;
const PIE_HEIGHT: f64 = 440.0;
const PIE_START_ANGLE_DEGREES: f64 = 140.0;

const Y_TICKS: usize = 5;
const MAX_DATE_TICKS: usize = 12;

const BALANCE_COLOR: &str = "#2563eb";
const MOVING_AVG_COLOR: &str = "#f97316";
const DEBIT_COLOR: &str = "#dc2626";
const CREDIT_COLOR: &str = "#16a34a";
const AXIS_COLOR: &str = "#374151";
const GRID_COLOR: &str = "#d1d5db";
const TEXT_COLOR: &str = "#111827";

/// The three charts the dashboard produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChartKind {
    /// Balance over time.
    Line,
    /// Balance overlaid with its moving average.
    MovingAvg,
    /// Debit/credit split.
    Pie,
}

impl ChartKind {
    /// The fixed filename prefix for artifacts of this kind.
    pub(crate) fn filename_prefix(self) -> &'static str {
        match self {
            Self::Line => "line_chart_",
            Self::MovingAvg => "moving_avg_",
            Self::Pie => "pie_chart_",
        }
    }
}

/// A chart image written to the artifact directory.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChartArtifact {
    /// Which of the three charts this is.
    pub kind: ChartKind,
    /// The artifact's filename within the artifact directory.
    pub filename: String,
    /// When the artifact was generated (UTC).
    pub generated_at: OffsetDateTime,
}

impl ChartArtifact {
    fn new(kind: ChartKind, stamp: &str, generated_at: OffsetDateTime) -> Self {
        Self {
            kind,
            filename: format!("{}{stamp}{ARTIFACT_EXTENSION}", kind.filename_prefix()),
            generated_at,
        }
    }
}

/// Check whether `name` is a filename this module could have produced for
/// `kind`: the kind's fixed prefix, then a non-empty run of ASCII digits and
/// underscores, then the artifact extension.
///
/// Everything else, including anything with path separators or traversal
/// sequences, is rejected. The charts viewer uses this to refuse
/// caller-supplied names that were not minted here.
pub(crate) fn is_valid_artifact_name(kind: ChartKind, name: &str) -> bool {
    let Some(stem) = name.strip_prefix(kind.filename_prefix()) else {
        return false;
    };
    let Some(stem) = stem.strip_suffix(ARTIFACT_EXTENSION) else {
        return false;
    };

    !stem.is_empty() && stem.bytes().all(|byte| byte.is_ascii_digit() || byte == b'_')
}

/// Render the three dashboard charts for `statements` into `chart_dir`.
///
/// Returns `None` without touching the filesystem when `statements` is
/// empty. Otherwise stale artifacts are swept from the directory and three
/// fresh SVG files are written, sharing one timestamp.
///
/// `statements` are re-sorted by date before any series is computed, even
/// though the query already orders them; chart geometry breaks silently on
/// unsorted input.
///
/// # Errors
/// Returns [Error::ChartWrite] if the artifact directory cannot be created
/// or a chart image cannot be written. Sweep failures are not errors.
pub(super) fn generate_charts(
    statements: &[Statement],
    window: usize,
    chart_dir: &Path,
) -> Result<Option<[ChartArtifact; 3]>, Error> {
    if statements.is_empty() {
        return Ok(None);
    }

    let mut statements = statements.to_vec();
    statements.sort_by_key(|statement| statement.txn_date);

    let averages = moving_average(&statements, window);
    let tally = tally_by_kind(&statements);

    fs::create_dir_all(chart_dir).map_err(|error| {
        Error::ChartWrite(chart_dir.display().to_string(), error.to_string())
    })?;
    sweep_stale_artifacts(chart_dir);

    let labels: Vec<String> = statements
        .iter()
        .map(|statement| statement.txn_date.to_string())
        .collect();
    let balances: Vec<f64> = statements
        .iter()
        .map(|statement| statement.balance)
        .collect();

    let generated_at = OffsetDateTime::now_utc();
    let stamp = artifact_stamp(generated_at);

    let line = ChartArtifact::new(ChartKind::Line, &stamp, generated_at);
    save_chart(chart_dir, &line, line_chart(&labels, &balances))?;

    let moving_avg = ChartArtifact::new(ChartKind::MovingAvg, &stamp, generated_at);
    save_chart(
        chart_dir,
        &moving_avg,
        moving_average_chart(&labels, &balances, &averages, window),
    )?;

    let pie = ChartArtifact::new(ChartKind::Pie, &stamp, generated_at);
    save_chart(chart_dir, &pie, pie_chart(&tally))?;

    Ok(Some([line, moving_avg, pie]))
}

fn artifact_stamp(generated_at: OffsetDateTime) -> String {
    let timestamp = generated_at
        .format(&TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| generated_at.unix_timestamp().to_string());
    let sequence = ARTIFACT_SEQUENCE.fetch_add(1, Ordering::Relaxed);

    format!("{timestamp}_{sequence}")
}

/// Delete artifacts older than [ARTIFACT_RETENTION] from `chart_dir`.
///
/// Best-effort: a directory that cannot be read or a file that cannot be
/// removed is logged and skipped, never an error.
fn sweep_stale_artifacts(chart_dir: &Path) {
    let entries = match fs::read_dir(chart_dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::debug!(
                "could not read chart directory {}: {error}",
                chart_dir.display()
            );
            return;
        }
    };

    for entry in entries {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();

        let is_stale = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .map(|modified| {
                modified
                    .elapsed()
                    .map(|age| age > ARTIFACT_RETENTION)
                    .unwrap_or(false)
            })
            .unwrap_or(false);

        if !is_stale {
            continue;
        }

        if let Err(error) = fs::remove_file(&path) {
            tracing::debug!("could not remove stale chart {}: {error}", path.display());
        }
    }
}

fn save_chart(chart_dir: &Path, artifact: &ChartArtifact, document: Document) -> Result<(), Error> {
    let path = chart_dir.join(&artifact.filename);

    svg::save(&path, &document)
        .map_err(|error| Error::ChartWrite(artifact.filename.clone(), error.to_string()))
}

/// Maps data coordinates onto the drawable region of a time-series chart.
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    min_value: f64,
    max_value: f64,
    points: usize,
}

impl PlotArea {
    /// Fit a plot area to `values`, padding the value range so the series
    /// does not touch the frame. A flat series gets an artificial range of
    /// one unit either side so it renders as a centered line.
    fn from_values(values: impl Iterator<Item = f64>, points: usize) -> Self {
        let mut min_value = f64::INFINITY;
        let mut max_value = f64::NEG_INFINITY;

        for value in values {
            min_value = min_value.min(value);
            max_value = max_value.max(value);
        }

        if min_value == max_value {
            min_value -= 1.0;
            max_value += 1.0;
        } else {
            let padding = (max_value - min_value) * 0.05;
            min_value -= padding;
            max_value += padding;
        }

        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
            height: CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
            min_value,
            max_value,
            points,
        }
    }

    fn x(&self, index: usize) -> f64 {
        if self.points <= 1 {
            return self.left + self.width / 2.0;
        }

        self.left + index as f64 / (self.points - 1) as f64 * self.width
    }

    fn y(&self, value: f64) -> f64 {
        let span = self.max_value - self.min_value;

        self.top + (self.max_value - value) / span * self.height
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

fn blank_document(width: f64, height: f64) -> Document {
    Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0.0, 0.0, width, height))
        .set("font-family", "Helvetica, Arial, sans-serif")
        .add(
            Rectangle::new()
                .set("x", 0.0)
                .set("y", 0.0)
                .set("width", width)
                .set("height", height)
                .set("fill", "white"),
        )
}

fn chart_title(title: &str, width: f64) -> Text {
    Text::new()
        .set("x", width / 2.0)
        .set("y", 26.0)
        .set("text-anchor", "middle")
        .set("font-size", 16.0)
        .set("font-weight", "bold")
        .set("fill", TEXT_COLOR)
        .add(TextNode::new(title))
}

/// Render the axis lines, the horizontal grid with value labels, the rotated
/// date tick labels, and the axis names.
fn axes(area: &PlotArea, labels: &[String], x_name: &str, y_name: &str) -> Group {
    let mut group = Group::new().set("font-size", 11.0);

    for tick in 0..Y_TICKS {
        let value = area.min_value
            + (area.max_value - area.min_value) * tick as f64 / (Y_TICKS - 1) as f64;
        let y = area.y(value);

        group = group.add(
            SvgLine::new()
                .set("x1", area.left)
                .set("x2", area.right())
                .set("y1", y)
                .set("y2", y)
                .set("stroke", GRID_COLOR)
                .set("stroke-width", 1.0),
        );
        group = group.add(
            Text::new()
                .set("x", area.left - 8.0)
                .set("y", y + 4.0)
                .set("text-anchor", "end")
                .set("fill", TEXT_COLOR)
                .add(TextNode::new(tick_label(value))),
        );
    }

    group = group.add(
        SvgLine::new()
            .set("x1", area.left)
            .set("x2", area.left)
            .set("y1", area.top)
            .set("y2", area.bottom())
            .set("stroke", AXIS_COLOR)
            .set("stroke-width", 1.5),
    );
    group = group.add(
        SvgLine::new()
            .set("x1", area.left)
            .set("x2", area.right())
            .set("y1", area.bottom())
            .set("y2", area.bottom())
            .set("stroke", AXIS_COLOR)
            .set("stroke-width", 1.5),
    );

    // With many points there is no room for a label per date, so label every
    // `step`th point.
    let step = labels.len().div_ceil(MAX_DATE_TICKS).max(1);
    for (index, label) in labels.iter().enumerate().step_by(step) {
        let x = area.x(index);
        let tick_top = area.bottom();
        let label_y = tick_top + 20.0;

        group = group.add(
            SvgLine::new()
                .set("x1", x)
                .set("x2", x)
                .set("y1", tick_top)
                .set("y2", tick_top + 5.0)
                .set("stroke", AXIS_COLOR)
                .set("stroke-width", 1.0),
        );
        group = group.add(
            Text::new()
                .set("x", x)
                .set("y", label_y)
                .set("text-anchor", "end")
                .set("fill", TEXT_COLOR)
                .set("transform", format!("rotate(-45 {x} {label_y})"))
                .add(TextNode::new(label.clone())),
        );
    }

    group = group.add(
        Text::new()
            .set("x", area.left + area.width / 2.0)
            .set("y", CHART_HEIGHT - 10.0)
            .set("text-anchor", "middle")
            .set("font-size", 13.0)
            .set("fill", TEXT_COLOR)
            .add(TextNode::new(x_name)),
    );

    let y_name_y = area.top + area.height / 2.0;
    group.add(
        Text::new()
            .set("x", 18.0)
            .set("y", y_name_y)
            .set("text-anchor", "middle")
            .set("font-size", 13.0)
            .set("fill", TEXT_COLOR)
            .set("transform", format!("rotate(-90 18 {y_name_y})"))
            .add(TextNode::new(y_name)),
    )
}

fn tick_label(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn series_path(area: &PlotArea, values: &[f64]) -> Data {
    let mut data = Data::new().move_to((area.x(0), area.y(values[0])));

    for (index, &value) in values.iter().enumerate().skip(1) {
        data = data.line_to((area.x(index), area.y(value)));
    }

    data
}

fn series_markers(area: &PlotArea, values: &[f64], color: &str) -> Group {
    let mut group = Group::new();

    for (index, &value) in values.iter().enumerate() {
        group = group.add(
            Circle::new()
                .set("cx", area.x(index))
                .set("cy", area.y(value))
                .set("r", 3.0)
                .set("fill", color),
        );
    }

    group
}

fn legend(entries: &[(&str, &str)], x: f64, y: f64) -> Group {
    let mut group = Group::new().set("font-size", 12.0);
    let mut entry_y = y;

    for (label, color) in entries {
        group = group.add(
            Rectangle::new()
                .set("x", x)
                .set("y", entry_y - 9.0)
                .set("width", 18.0)
                .set("height", 9.0)
                .set("fill", *color),
        );
        group = group.add(
            Text::new()
                .set("x", x + 24.0)
                .set("y", entry_y)
                .set("fill", TEXT_COLOR)
                .add(TextNode::new(*label)),
        );
        entry_y += 18.0;
    }

    group
}

fn line_chart(labels: &[String], balances: &[f64]) -> Document {
    let area = PlotArea::from_values(balances.iter().copied(), balances.len());

    blank_document(CHART_WIDTH, CHART_HEIGHT)
        .add(chart_title("Balance over time", CHART_WIDTH))
        .add(axes(&area, labels, "Date", "Balance"))
        .add(
            SvgPath::new()
                .set("fill", "none")
                .set("stroke", BALANCE_COLOR)
                .set("stroke-width", 2.0)
                .set("d", series_path(&area, balances)),
        )
        .add(series_markers(&area, balances, BALANCE_COLOR))
        .add(legend(
            &[("Daily balance", BALANCE_COLOR)],
            CHART_WIDTH - 220.0,
            MARGIN_TOP + 14.0,
        ))
}

fn moving_average_chart(
    labels: &[String],
    balances: &[f64],
    averages: &[f64],
    window: usize,
) -> Document {
    let area = PlotArea::from_values(
        balances.iter().chain(averages.iter()).copied(),
        balances.len(),
    );
    let average_label = format!("{window}-day moving average");

    blank_document(CHART_WIDTH, CHART_HEIGHT)
        .add(chart_title(
            &format!("{window}-day moving average of balance"),
            CHART_WIDTH,
        ))
        .add(axes(&area, labels, "Date", "Balance"))
        .add(
            SvgPath::new()
                .set("fill", "none")
                .set("stroke", BALANCE_COLOR)
                .set("stroke-width", 1.5)
                .set("stroke-dasharray", "6 4")
                .set("opacity", 0.4)
                .set("d", series_path(&area, balances)),
        )
        .add(
            SvgPath::new()
                .set("fill", "none")
                .set("stroke", MOVING_AVG_COLOR)
                .set("stroke-width", 2.5)
                .set("d", series_path(&area, averages)),
        )
        .add(legend(
            &[
                ("Daily balance", BALANCE_COLOR),
                (&average_label, MOVING_AVG_COLOR),
            ],
            CHART_WIDTH - 220.0,
            MARGIN_TOP + 14.0,
        ))
}

fn pie_chart(tally: &KindTally) -> Document {
    let center_x = 230.0;
    let center_y = 240.0;
    let radius = 150.0;

    let mut document = blank_document(PIE_WIDTH, PIE_HEIGHT).add(chart_title(
        "Transaction type distribution (debit vs credit)",
        PIE_WIDTH,
    ));

    let total = tally.total();
    let slices = [
        (TransactionKind::Debit.label(), tally.debit, DEBIT_COLOR),
        (TransactionKind::Credit.label(), tally.credit, CREDIT_COLOR),
    ];

    let mut start_angle = PIE_START_ANGLE_DEGREES;
    for (_, count, color) in slices {
        if total == 0 || count == 0 {
            continue;
        }

        let fraction = count as f64 / total as f64;
        let sweep = fraction * 360.0;

        // A full-circle wedge has coincident arc endpoints, which SVG
        // renders as nothing, so draw a circle instead.
        if count == total {
            document = document.add(
                Circle::new()
                    .set("cx", center_x)
                    .set("cy", center_y)
                    .set("r", radius)
                    .set("fill", color),
            );
        } else {
            document = document.add(
                SvgPath::new()
                    .set("fill", color)
                    .set("d", wedge_path(center_x, center_y, radius, start_angle, sweep)),
            );
        }

        let (label_x, label_y) = point_on_circle(
            center_x,
            center_y,
            radius * 0.62,
            start_angle + sweep / 2.0,
        );
        document = document.add(
            Text::new()
                .set("x", label_x)
                .set("y", label_y)
                .set("text-anchor", "middle")
                .set("font-size", 13.0)
                .set("fill", "white")
                .add(TextNode::new(format!("{:.1}%", fraction * 100.0))),
        );

        start_angle += sweep;
    }

    if total == 0 {
        document = document.add(
            Text::new()
                .set("x", center_x)
                .set("y", center_y)
                .set("text-anchor", "middle")
                .set("font-size", 13.0)
                .set("fill", TEXT_COLOR)
                .add(TextNode::new("No debit or credit entries")),
        );
    }

    let legend_entries: Vec<(&str, &str)> = slices
        .iter()
        .map(|&(label, _, color)| (label, color))
        .collect();

    document.add(legend(&legend_entries, 450.0, 200.0))
}

/// The point at `degrees` on the circle around `(center_x, center_y)`.
///
/// Angles are measured counterclockwise from the positive x axis, the same
/// orientation the pie wedges are laid out in.
fn point_on_circle(center_x: f64, center_y: f64, radius: f64, degrees: f64) -> (f64, f64) {
    let radians = degrees.to_radians();

    (
        center_x + radius * radians.cos(),
        center_y - radius * radians.sin(),
    )
}

fn wedge_path(center_x: f64, center_y: f64, radius: f64, start_degrees: f64, sweep_degrees: f64) -> String {
    let (start_x, start_y) = point_on_circle(center_x, center_y, radius, start_degrees);
    let (end_x, end_y) = point_on_circle(center_x, center_y, radius, start_degrees + sweep_degrees);
    // Counterclockwise wedges are sweep-flag 0 in SVG's y-down coordinates.
    let large_arc = if sweep_degrees > 180.0 { 1 } else { 0 };

    format!(
        "M {center_x} {center_y} L {start_x} {start_y} \
        A {radius} {radius} 0 {large_arc} 0 {end_x} {end_y} Z"
    )
}
