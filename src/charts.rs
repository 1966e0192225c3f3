use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::{
    figure::{self, Axes, Canvas, Exporter, Layout, LegendLocation, Preset, Scale, TickFormat},
    series::{read_series, SeriesError},
};

pub const SIZE_AXIS_LABEL: &str = "size";
pub const RATE_AXIS_LABEL: &str = "normalised rate";
pub const SIZE_AXIS_LOG_BASE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotOutcome {
    Plotted,
    SkippedMissing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub name: String,
    pub preset: Preset,
    pub output_prefix: PathBuf,
    pub inputs: Vec<PathBuf>,
}

impl ChartSpec {
    pub fn compose(&self) -> Result<Canvas> {
        let (mut canvas, subplots) = self.preset.create(Layout::single());
        let axes = &mut canvas[subplots.ids()[0]];
        configure_size_axes(axes);

        let mut num_plotted = 0;
        for input in &self.inputs {
            let outcome = plot_if_exists(axes, input)
                .with_context(|| format!("failed to build the {} chart", self.name))?;

            match outcome {
                PlotOutcome::Plotted => num_plotted += 1,
                PlotOutcome::SkippedMissing => {
                    debug!("skipping missing series {}", input.display())
                }
            }
        }

        info!(
            "{} chart: {num_plotted} of {} series available",
            self.name,
            self.inputs.len()
        );

        Ok(canvas)
    }

    pub fn render<E: Exporter>(
        &self,
        exporter: &mut E,
        legend: Option<LegendLocation>,
    ) -> Result<()> {
        let canvas = self.compose()?;
        figure::save_with(exporter, &self.output_prefix, canvas, legend)
            .with_context(|| format!("failed to save the {} chart", self.name))
    }
}

// safe to repeat
pub fn configure_size_axes(axes: &mut Axes) {
    axes.set_labels(SIZE_AXIS_LABEL, RATE_AXIS_LABEL);
    axes.x_scale = Scale::Log {
        base: SIZE_AXIS_LOG_BASE,
    };
    axes.x_ticks = TickFormat::Size;
}

pub fn plot_if_exists<P: AsRef<Path>>(
    axes: &mut Axes,
    csv_path: P,
) -> Result<PlotOutcome, SeriesError> {
    configure_size_axes(axes);

    let csv_path = csv_path.as_ref();
    if !csv_path.exists() {
        return Ok(PlotOutcome::SkippedMissing);
    }

    let series = read_series(csv_path)?;
    axes.plot(series.name.as_str(), series.points());

    Ok(PlotOutcome::Plotted)
}

pub fn render_charts<E: Exporter>(
    specs: &[ChartSpec],
    exporter: &mut E,
    legend: Option<LegendLocation>,
) -> Result<()> {
    for spec in specs {
        spec.render(exporter, legend)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use crate::figure::{tests::RecordingExporter, wide};

    fn write_csv(folder: &Path, file_name: &str, content: &str) -> PathBuf {
        let path = folder.join(file_name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_is_skipped_but_axes_are_configured() {
        let folder = tempfile::tempdir().unwrap();
        let (mut canvas, subplots) = wide(Layout::single());
        let axes = &mut canvas[subplots.single().unwrap()];

        let outcome = plot_if_exists(axes, folder.path().join("absent.csv")).unwrap();

        assert_eq!(outcome, PlotOutcome::SkippedMissing);
        assert!(axes.lines().is_empty());
        assert_eq!(axes.x_label.as_deref(), Some("size"));
        assert_eq!(axes.y_label.as_deref(), Some("normalised rate"));
        assert_eq!(axes.x_scale, Scale::Log { base: 4.0 });
        assert_eq!(axes.x_ticks, TickFormat::Size);
    }

    #[test]
    fn plots_size_against_normalised_rate() {
        let folder = tempfile::tempdir().unwrap();
        let path = write_csv(
            folder.path(),
            "foo.csv",
            "size,rate,Foo\n1024,0.5,0.9\n4096,0.6,0.95\n",
        );
        let (mut canvas, subplots) = wide(Layout::single());
        let axes = &mut canvas[subplots.single().unwrap()];

        assert_eq!(plot_if_exists(axes, &path).unwrap(), PlotOutcome::Plotted);
        // configuring twice leaves the setup as it was
        assert_eq!(plot_if_exists(axes, &path).unwrap(), PlotOutcome::Plotted);

        assert_eq!(axes.lines().len(), 2);
        let line = &axes.lines()[0];
        assert_eq!(line.label, "Foo");
        assert_eq!(line.points, vec![(1024.0, 0.9), (4096.0, 0.95)]);
        assert_eq!(axes.x_scale, Scale::Log { base: 4.0 });
    }

    #[test]
    fn malformed_file_is_an_error() {
        let folder = tempfile::tempdir().unwrap();
        let path = write_csv(folder.path(), "bad.csv", "size,rate,Bad\n1,2\n");
        let (mut canvas, subplots) = wide(Layout::single());
        let axes = &mut canvas[subplots.single().unwrap()];

        assert!(matches!(
            plot_if_exists(axes, path),
            Err(SeriesError::FieldCount { .. })
        ));
        assert!(axes.lines().is_empty());
    }

    #[test]
    fn malformed_series_aborts_before_saving() {
        let folder = tempfile::tempdir().unwrap();
        let good = write_csv(folder.path(), "good.csv", "size,rate,Good\n1,1,1\n");
        let bad = write_csv(folder.path(), "bad.csv", "size,rate,Bad\n1,x,1\n");

        let specs = vec![
            ChartSpec {
                name: "broken".into(),
                preset: Preset::Wide,
                output_prefix: folder.path().join("out/broken"),
                inputs: vec![good.clone(), bad],
            },
            ChartSpec {
                name: "after".into(),
                preset: Preset::Wide,
                output_prefix: folder.path().join("out/after"),
                inputs: vec![good],
            },
        ];

        let mut exporter = RecordingExporter::default();
        let err = render_charts(&specs, &mut exporter, Some(LegendLocation::Best)).unwrap_err();

        assert!(format!("{err:#}").contains("broken"));
        assert!(exporter.exported.is_empty());
        assert!(!folder.path().join("out/broken.svg").exists());
        assert!(!folder.path().join("out/after.svg").exists());
    }

    #[test]
    fn compose_uses_the_chart_preset() {
        let spec = ChartSpec {
            name: "tall".into(),
            preset: Preset::Tall,
            output_prefix: PathBuf::from("unused"),
            inputs: Vec::new(),
        };

        let canvas = spec.compose().unwrap();

        assert_eq!(canvas.size_inches(), (4.5, 5.5));
        assert_eq!(canvas.axes().len(), 1);
        assert_eq!(canvas.axes()[0].x_label.as_deref(), Some("size"));
    }
}
