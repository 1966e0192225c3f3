use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{collections::HashSet, fs, path::Path, path::PathBuf, str::FromStr};

use crate::{
    charts::ChartSpec,
    figure::{LegendLocation, Preset},
};

// config that is read from a file.
// without a file, the built-in suite below is used, which mirrors the
// result files the benchmark binaries write
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartSuiteConfig {
    #[serde(default = "default_results_folder")]
    pub results_folder: PathBuf,
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,
    #[serde(default)]
    pub legend: LegendSetting,
    pub charts: Vec<ChartConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    pub name: String,
    #[serde(default)]
    pub preset: Preset,
    pub series: Vec<String>,
}

// `"none"` disables legends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct LegendSetting(pub Option<LegendLocation>);

impl Default for LegendSetting {
    fn default() -> Self {
        Self(Some(LegendLocation::Best))
    }
}

impl TryFrom<String> for LegendSetting {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "none" {
            return Ok(Self(None));
        }
        LegendLocation::from_str(&value).map(|location| Self(Some(location)))
    }
}

fn default_results_folder() -> PathBuf {
    PathBuf::from("out/results")
}

fn default_output_folder() -> PathBuf {
    PathBuf::from("out")
}

fn chart(name: &str, series: &[&str]) -> ChartConfig {
    ChartConfig {
        name: name.to_owned(),
        preset: Preset::Wide,
        series: series.iter().map(|s| s.to_string()).collect(),
    }
}

impl Default for ChartSuiteConfig {
    fn default() -> Self {
        Self {
            results_folder: default_results_folder(),
            output_folder: default_output_folder(),
            legend: LegendSetting::default(),
            charts: vec![
                chart(
                    "comparison",
                    &["signalsmith", "fftw-estimate", "fftw-measure", "kissfft"],
                ),
                chart(
                    "previous",
                    &[
                        "signalsmith",
                        "previous-v4",
                        "previous-permute",
                        "previous",
                    ],
                ),
                chart(
                    "history",
                    &[
                        "signalsmith",
                        "dev-history-radix23",
                        "dev-history-factorise",
                        "dev-history-direct",
                    ],
                ),
            ],
        }
    }
}

impl ChartSuiteConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_file_str = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::from_toml(&config_file_str)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for chart in &self.charts {
            if !names.insert(chart.name.as_str()) {
                bail!("chart {} is declared more than once", chart.name);
            }
        }
        Ok(())
    }

    pub fn legend(&self) -> Option<LegendLocation> {
        self.legend.0
    }

    pub fn result_path(&self, series: &str) -> PathBuf {
        let mut path = self.results_folder.clone();
        path.push(format!("{series}.csv"));
        path
    }

    pub fn output_prefix(&self, chart_name: &str) -> PathBuf {
        let mut path = self.output_folder.clone();
        path.push(chart_name);
        path
    }

    pub fn chart_specs(&self) -> Vec<ChartSpec> {
        self.charts
            .iter()
            .map(|chart| ChartSpec {
                name: chart.name.clone(),
                preset: chart.preset,
                output_prefix: self.output_prefix(&chart.name),
                inputs: chart
                    .series
                    .iter()
                    .map(|series| self.result_path(series))
                    .collect(),
            })
            .collect()
    }

    // an empty selection means all charts
    pub fn select(&self, names: &[String]) -> Result<Vec<ChartSpec>> {
        let specs = self.chart_specs();
        if names.is_empty() {
            return Ok(specs);
        }

        for name in names {
            if !specs.iter().any(|spec| &spec.name == name) {
                bail!("unknown chart {name}");
            }
        }

        Ok(specs
            .into_iter()
            .filter(|spec| names.contains(&spec.name))
            .collect())
    }
}
