use std::{fs, path::Path};

use charming::{
    component::{Axis, Grid, Legend},
    element::{AxisLabel, AxisType, Formatter, NameLocation, Orient, TextStyle},
    series::Line,
    Chart, ImageRenderer,
};

use super::{Axes, Canvas, Exporter, FigureError, LegendLocation, Scale, TickFormat};

// javascript twin of TickFormat::Size, evaluated by the echarts runtime
pub static SIZE_TICK_FORMATTER: &str = "function (value) { \
    return value <= 65536 ? Math.trunc(value).toString() : '2^' + Math.trunc(Math.log2(value)); }";

static LABEL_FONT_SIZE: u8 = 14;
static AXIS_LABEL_FONT_SIZE: i32 = 12;

// offsets in percent of the canvas
static OUTER_OFFSET: f64 = 8.0;
static TIGHT_OUTER_OFFSET: f64 = 3.0;
static CELL_GAP: f64 = 10.0;
static TIGHT_CELL_GAP: f64 = 4.0;
static LEGEND_SPACE: f64 = 8.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct SvgExporter;

impl Exporter for SvgExporter {
    fn export(&mut self, canvas: &Canvas, path: &Path) -> Result<(), FigureError> {
        let (width, height) = canvas.size_pixels();
        let mut renderer = ImageRenderer::new(width, height);

        let svg = renderer
            .render(&to_chart(canvas))
            .map_err(|err| FigureError::Render {
                path: path.to_path_buf(),
                message: format!("{err:?}"),
            })?;

        fs::write(path, svg).map_err(|source| FigureError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

// one echarts grid per axes, row-major
pub fn to_chart(canvas: &Canvas) -> Chart {
    let layout = canvas.layout();
    let legend = canvas.axes().iter().find_map(Axes::legend);

    let mut chart = Chart::new().background_color("white");
    if let Some(location) = legend {
        chart = chart.legend(create_legend(location));
    }

    for (index, axes) in canvas.axes().iter().enumerate() {
        let (row, col) = grid_cell(index, layout.cols());

        chart = chart.grid(create_grid(
            row,
            col,
            layout.rows(),
            layout.cols(),
            canvas.tight_layout(),
            legend.is_some(),
        ));

        chart = add_axes_to_chart(chart, axes, index as i32);
    }

    chart
}

fn add_axes_to_chart(mut chart: Chart, axes: &Axes, index: i32) -> Chart {
    let mut x_axis = match axes.x_scale {
        Scale::Linear => Axis::new().type_(AxisType::Value),
        Scale::Log { base } => Axis::new().type_(AxisType::Log).log_base(base),
    }
    .grid_index(index)
    .name_location(NameLocation::Middle)
    .name_gap(25)
    .name_text_style(TextStyle::new().font_size(LABEL_FONT_SIZE).color("black"));

    let mut x_axis_label = AxisLabel::new()
        .font_size(AXIS_LABEL_FONT_SIZE)
        .color("black");
    if axes.x_ticks == TickFormat::Size {
        x_axis_label = x_axis_label.formatter(Formatter::Function(SIZE_TICK_FORMATTER.into()));
    }
    x_axis = x_axis.axis_label(x_axis_label);

    if let Some(name) = &axes.x_label {
        x_axis = x_axis.name(name.as_str());
    }

    let mut y_axis = Axis::new()
        .type_(AxisType::Value)
        .grid_index(index)
        .name_location(NameLocation::Middle)
        .name_gap(40)
        .name_text_style(TextStyle::new().font_size(LABEL_FONT_SIZE).color("black"))
        .axis_label(
            AxisLabel::new()
                .font_size(AXIS_LABEL_FONT_SIZE)
                .color("black"),
        );

    if let Some(name) = &axes.y_label {
        y_axis = y_axis.name(name.as_str());
    }

    chart = chart.x_axis(x_axis).y_axis(y_axis);

    for line in axes.lines() {
        let data: Vec<Vec<f64>> = line.points.iter().map(|&(x, y)| vec![x, y]).collect();
        chart = chart.series(
            Line::new()
                .name(line.label.as_str())
                .data(data)
                .show_symbol(false)
                .x_axis_index(index)
                .y_axis_index(index),
        );
    }

    chart
}

fn create_legend(location: LegendLocation) -> Legend {
    let legend = Legend::new().text_style(TextStyle::new().font_size(LABEL_FONT_SIZE).color("black"));

    match legend_anchor(location) {
        Some((left, top)) => legend.left(left).top(top).orient(Orient::Vertical),
        // echarts places a horizontal legend above the grids by default, which
        // never covers a line
        None => legend,
    }
}

fn legend_anchor(location: LegendLocation) -> Option<(&'static str, &'static str)> {
    let anchor = match location {
        LegendLocation::Best => return None,
        LegendLocation::UpperRight => ("right", "top"),
        LegendLocation::UpperLeft => ("left", "top"),
        LegendLocation::LowerLeft => ("left", "bottom"),
        LegendLocation::LowerRight => ("right", "bottom"),
        LegendLocation::CenterLeft => ("left", "middle"),
        LegendLocation::CenterRight => ("right", "middle"),
        LegendLocation::LowerCenter => ("center", "bottom"),
        LegendLocation::UpperCenter => ("center", "top"),
        LegendLocation::Center => ("center", "middle"),
    };

    Some(anchor)
}

fn grid_cell(index: usize, num_cols: usize) -> (usize, usize) {
    (index / num_cols, index % num_cols)
}

fn create_grid(
    row: usize,
    col: usize,
    num_rows: usize,
    num_cols: usize,
    tight: bool,
    with_legend: bool,
) -> Grid {
    let (outer, gap) = if tight {
        (TIGHT_OUTER_OFFSET, TIGHT_CELL_GAP)
    } else {
        (OUTER_OFFSET, CELL_GAP)
    };
    let top_outer = if with_legend {
        outer + LEGEND_SPACE
    } else {
        outer
    };

    let (left, right) = cell_offsets(col, num_cols, outer, outer, gap);
    let (top, bottom) = cell_offsets(row, num_rows, top_outer, outer, gap);

    Grid::new()
        .left(percent(left).as_str())
        .right(percent(right).as_str())
        .top(percent(top).as_str())
        .bottom(percent(bottom).as_str())
        .contain_label(true)
}

// offsets from both canvas edges of cell `index` out of `count` cells
fn cell_offsets(index: usize, count: usize, start: f64, end: f64, gap: f64) -> (f64, f64) {
    let available = 100.0 - start - end;
    let num_gaps = (count - 1) as f64;
    // gaps never take more than half of the room
    let gap = if num_gaps > 0.0 {
        gap.min(available / 2.0 / num_gaps)
    } else {
        gap
    };

    let cell = (available - gap * num_gaps) / count as f64;
    let from_start = start + index as f64 * (cell + gap);
    let from_end = 100.0 - from_start - cell;
    (from_start, from_end)
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}
