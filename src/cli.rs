use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Draws benchmark comparison charts from result csv files")]
pub struct Args {
    /// Chart suite in toml, the built-in suite is used without one
    pub config_file: Option<PathBuf>,

    /// Only draw the chart with this name, can be repeated
    #[arg(long = "chart", value_name = "NAME")]
    pub charts: Vec<String>,

    /// Print the selected charts and their candidate files instead of drawing
    #[arg(long)]
    pub list: bool,
}
