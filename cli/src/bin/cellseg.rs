use cellseg::{DirectorySink, FileImageSource, Pipeline, ThresholdMethod};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cli::RunConfig;
use color_eyre::eyre::{Result, WrapErr};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Cut a blood smear image into one PNG per red blood cell", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the JSON schema of the configuration file
    Schema,
}

#[derive(Args)]
struct RunArgs {
    /// Blood smear image to segment
    input: Option<PathBuf>,
    /// Directory receiving cellN.png crops and the 00.png overview
    output_dir: Option<PathBuf>,
    /// TOML or JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Minimum distance in pixels between two cell centres
    #[arg(long)]
    min_distance: Option<f32>,
    /// Threshold selection method
    #[arg(long, value_enum)]
    threshold: Option<ThresholdArg>,
    /// Level for the fixed threshold method
    #[arg(long, required_if_eq("threshold", "fixed"))]
    level: Option<u8>,
    /// Skip histogram equalization
    #[arg(long)]
    no_equalize: bool,
    /// Write a JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Write the binary foreground mask to this PNG
    #[arg(long)]
    save_mask: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThresholdArg {
    Otsu,
    Fixed,
}

impl RunArgs {
    /// Load the config file if any, then apply command line overrides.
    fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)
                .wrap_err_with(|| format!("Failed to load config {}", path.display()))?,
            None => RunConfig::default(),
        };

        if self.input.is_some() {
            config.input = self.input;
        }
        if self.output_dir.is_some() {
            config.output_dir = self.output_dir;
        }
        if self.report.is_some() {
            config.report = self.report;
        }
        if self.save_mask.is_some() {
            config.save_mask = self.save_mask;
        }

        let segmentation = &mut config.segmentation;
        if let Some(min_distance) = self.min_distance {
            segmentation.min_distance = min_distance;
        }
        match (self.threshold, self.level) {
            (Some(ThresholdArg::Otsu), _) => segmentation.threshold = ThresholdMethod::Otsu,
            (Some(ThresholdArg::Fixed), Some(level)) | (None, Some(level)) => {
                segmentation.threshold = ThresholdMethod::Fixed { level }
            }
            _ => {}
        }
        if self.no_equalize {
            segmentation.equalize = false;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Schema) => {
            println!("{}", RunConfig::schema_json()?);
        }
        None => segment(cli.run.into_config()?)?,
    }

    Ok(())
}

fn segment(config: RunConfig) -> Result<()> {
    let input = config.input_path()?;
    let output_dir = config.output_dir_path()?;

    let pipeline = Pipeline::from_config(&config.segmentation)?;
    info!("{}", pipeline.info());

    let source = FileImageSource::new(input);
    let mut sink = DirectorySink::new(output_dir);
    let (segmentation, report) = pipeline
        .run_detailed(&source, &mut sink)
        .wrap_err_with(|| format!("Failed to segment {}", input.display()))?;

    if let Some(path) = &config.save_mask {
        segmentation.mask.to_gray().save(path)?;
        info!("Mask written to {}", path.display());
    }

    if let Some(path) = &config.report {
        report.save(path)?;
        info!("Report written to {}", path.display());
    }

    info!(
        "✅ {} cells written to {} (overview: {})",
        report.cell_count(),
        output_dir.display(),
        report.overview
    );
    Ok(())
}
