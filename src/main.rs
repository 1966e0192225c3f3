mod cli;

use anyhow::Result;
use bench_graphs::{charts, config::ChartSuiteConfig, figure::SvgExporter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bench_graphs=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    let suite_config = match &args.config_file {
        Some(path) => ChartSuiteConfig::from_file(path)?,
        None => ChartSuiteConfig::default(),
    };

    let specs = suite_config.select(&args.charts)?;

    if args.list {
        for spec in &specs {
            println!("{} -> {}.svg", spec.name, spec.output_prefix.display());
            for input in &spec.inputs {
                println!("\t{}", input.display());
            }
        }
        return Ok(());
    }

    charts::render_charts(&specs, &mut SvgExporter, suite_config.legend())
}
