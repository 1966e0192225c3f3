mod render;

pub use render::{to_chart, SvgExporter, SIZE_TICK_FORMATTER};

use std::{
    fs,
    ops::{Index, IndexMut},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

pub const PIXELS_PER_INCH: f64 = 100.0;

// canvases not created through a preset
pub const DEFAULT_SIZE_INCHES: (f64, f64) = (6.4, 4.8);

pub const SIZE_TICK_THRESHOLD: f64 = 65536.0;

#[derive(Debug, Error)]
pub enum FigureError {
    #[error("a layout needs at least one row and one column, got {rows}x{cols}")]
    EmptyLayout { rows: usize, cols: usize },

    #[error("failed to create output folder {path}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    rows: usize,
    cols: usize,
}

impl Layout {
    pub fn single() -> Self {
        Self { rows: 1, cols: 1 }
    }

    pub fn grid(rows: usize, cols: usize) -> Result<Self, FigureError> {
        if rows == 0 || cols == 0 {
            return Err(FigureError::EmptyLayout { rows, cols });
        }

        Ok(Self { rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn num_axes(&self) -> usize {
        self.rows * self.cols
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::single()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxesId(usize);

// a 1x1 layout hands out its axes directly, anything bigger the row-major grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subplots {
    Single(AxesId),
    Grid { cols: usize, ids: Vec<AxesId> },
}

impl Subplots {
    pub fn single(&self) -> Option<AxesId> {
        match self {
            Subplots::Single(id) => Some(*id),
            Subplots::Grid { .. } => None,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<AxesId> {
        match self {
            Subplots::Single(id) => (row == 0 && col == 0).then_some(*id),
            Subplots::Grid { cols, ids } => {
                if col >= *cols {
                    return None;
                }
                ids.get(row * cols + col).copied()
            }
        }
    }

    pub fn ids(&self) -> Vec<AxesId> {
        match self {
            Subplots::Single(id) => vec![*id],
            Subplots::Grid { ids, .. } => ids.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    Linear,
    Log { base: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFormat {
    Auto,
    Size,
}

impl TickFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            TickFormat::Auto => value.to_string(),
            TickFormat::Size => {
                if value <= SIZE_TICK_THRESHOLD {
                    format!("{}", value as i64)
                } else {
                    format!("2^{}", value.log2() as i64)
                }
            }
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LegendLocation {
    #[default]
    Best,
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
    CenterLeft,
    CenterRight,
    LowerCenter,
    UpperCenter,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_scale: Scale,
    pub x_ticks: TickFormat,
    lines: Vec<Line>,
    legend: Option<LegendLocation>,
}

impl Axes {
    fn new() -> Self {
        Self {
            x_label: None,
            y_label: None,
            x_scale: Scale::Linear,
            x_ticks: TickFormat::Auto,
            lines: Vec::new(),
            legend: None,
        }
    }

    pub fn set_labels(&mut self, x_label: &str, y_label: &str) {
        self.x_label = Some(x_label.to_owned());
        self.y_label = Some(y_label.to_owned());
    }

    pub fn plot(&mut self, label: impl Into<String>, points: impl IntoIterator<Item = (f64, f64)>) {
        self.lines.push(Line {
            label: label.into(),
            points: points.into_iter().collect(),
        });
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn legend(&self) -> Option<LegendLocation> {
        self.legend
    }

    pub fn show_legend(&mut self, location: LegendLocation) {
        self.legend = Some(location);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width_inches: f64,
    height_inches: f64,
    layout: Layout,
    axes: Vec<Axes>,
    tight_layout: bool,
}

impl Canvas {
    pub fn new(layout: Layout) -> (Self, Subplots) {
        let axes = (0..layout.num_axes()).map(|_| Axes::new()).collect();
        let canvas = Self {
            width_inches: DEFAULT_SIZE_INCHES.0,
            height_inches: DEFAULT_SIZE_INCHES.1,
            layout,
            axes,
            tight_layout: false,
        };

        let subplots = if layout.num_axes() == 1 {
            Subplots::Single(AxesId(0))
        } else {
            Subplots::Grid {
                cols: layout.cols(),
                ids: (0..layout.num_axes()).map(AxesId).collect(),
            }
        };

        (canvas, subplots)
    }

    pub fn size_inches(&self) -> (f64, f64) {
        (self.width_inches, self.height_inches)
    }

    pub fn set_size_inches(&mut self, width: f64, height: f64) {
        self.width_inches = width;
        self.height_inches = height;
    }

    pub fn size_pixels(&self) -> (u32, u32) {
        (
            (self.width_inches * PIXELS_PER_INCH).round() as u32,
            (self.height_inches * PIXELS_PER_INCH).round() as u32,
        )
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn axes(&self) -> &[Axes] {
        &self.axes
    }

    pub fn get(&self, id: AxesId) -> Option<&Axes> {
        self.axes.get(id.0)
    }

    pub fn get_mut(&mut self, id: AxesId) -> Option<&mut Axes> {
        self.axes.get_mut(id.0)
    }

    pub fn tight_layout(&self) -> bool {
        self.tight_layout
    }

    pub fn set_tight_layout(&mut self, tight: bool) {
        self.tight_layout = tight;
    }
}

// panics for an id handed out by a canvas with more axes, see `Canvas::get`
impl Index<AxesId> for Canvas {
    type Output = Axes;

    fn index(&self, id: AxesId) -> &Axes {
        &self.axes[id.0]
    }
}

impl IndexMut<AxesId> for Canvas {
    fn index_mut(&mut self, id: AxesId) -> &mut Axes {
        &mut self.axes[id.0]
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Small,
    Medium,
    Tall,
    Short,
    #[default]
    Wide,
    Full,
}

impl Preset {
    pub fn size_inches(&self) -> (f64, f64) {
        match self {
            Preset::Small => (4.5, 3.0),
            Preset::Medium => (6.5, 4.0),
            Preset::Tall => (4.5, 5.5),
            Preset::Short => (7.0, 3.0),
            Preset::Wide => (11.0, 4.0),
            Preset::Full => (16.0, 10.0),
        }
    }

    pub fn create(&self, layout: Layout) -> (Canvas, Subplots) {
        let (mut canvas, subplots) = Canvas::new(layout);
        let (width, height) = self.size_inches();
        canvas.set_size_inches(width, height);
        (canvas, subplots)
    }
}

pub fn small(layout: Layout) -> (Canvas, Subplots) {
    Preset::Small.create(layout)
}

pub fn medium(layout: Layout) -> (Canvas, Subplots) {
    Preset::Medium.create(layout)
}

pub fn tall(layout: Layout) -> (Canvas, Subplots) {
    Preset::Tall.create(layout)
}

pub fn short(layout: Layout) -> (Canvas, Subplots) {
    Preset::Short.create(layout)
}

pub fn wide(layout: Layout) -> (Canvas, Subplots) {
    Preset::Wide.create(layout)
}

pub fn full(layout: Layout) -> (Canvas, Subplots) {
    Preset::Full.create(layout)
}

pub trait Exporter {
    fn export(&mut self, canvas: &Canvas, path: &Path) -> Result<(), FigureError>;
}

pub fn save<P: AsRef<Path>>(
    prefix: P,
    canvas: Canvas,
    legend: Option<LegendLocation>,
) -> Result<(), FigureError> {
    save_with(&mut SvgExporter, prefix, canvas, legend)
}

pub fn save_with<E: Exporter, P: AsRef<Path>>(
    exporter: &mut E,
    prefix: P,
    mut canvas: Canvas,
    legend: Option<LegendLocation>,
) -> Result<(), FigureError> {
    let prefix = prefix.as_ref();

    if let Some(folder) = prefix.parent() {
        if !folder.as_os_str().is_empty() && !folder.exists() {
            fs::create_dir_all(folder).map_err(|source| FigureError::CreateFolder {
                path: folder.to_path_buf(),
                source,
            })?;
        }
    }

    finalize(&mut canvas, legend);

    println!("{}", prefix.display());

    // the prefix may contain dots, so append instead of set_extension
    let mut path = prefix.as_os_str().to_owned();
    path.push(".svg");
    exporter.export(&canvas, Path::new(&path))
}

fn finalize(canvas: &mut Canvas, legend: Option<LegendLocation>) {
    if canvas.axes.len() > 1 {
        canvas.set_tight_layout(true);
    }

    if let Some(location) = legend {
        for axes in canvas.axes.iter_mut() {
            if !axes.lines.is_empty() {
                axes.show_legend(location);
            }
        }
    }
}
