use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use sparkify_etl::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_DB_PATH, DEFAULT_LOG_DATA, DEFAULT_SONG_DATA,
};
use sparkify_etl::pipeline::{
    ingest_all, FileKind, IngestProgress, IngestReport, NoProgress, DEFAULT_EXTENSION,
};
use sparkify_etl::warehouse::{BatchScope, InMemoryWarehouse, Sink, SongLookup, SqliteWarehouse};
use std::path::{Path, PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(about = "Load song metadata and activity logs into a SQLite star schema")]
struct CliArgs {
    /// Path to the SQLite warehouse database file.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Directory holding the song metadata files.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_SONG_DATA)]
    pub song_data: PathBuf,

    /// Directory holding the activity log files.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_LOG_DATA)]
    pub log_data: PathBuf,

    /// Extension of the input files.
    #[clap(long, default_value = DEFAULT_EXTENSION)]
    pub extension: String,

    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Keep going when records are rejected.
    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub continue_on_error: bool,

    /// Run the whole pipeline against an in-memory warehouse.
    #[clap(long)]
    pub dry_run: bool,

    /// Do not draw a progress bar.
    #[clap(long)]
    pub no_progress: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            song_data: self.song_data.clone(),
            log_data: self.log_data.clone(),
            extension: self.extension.clone(),
            continue_on_error: self.continue_on_error,
            dry_run: self.dry_run,
        }
    }
}

struct ProgressBarReporter {
    bar: ProgressBar,
}

impl ProgressBarReporter {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("{msg:>5} files [{bar:40}] {pos}/{len} ({elapsed})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }
}

impl IngestProgress for ProgressBarReporter {
    fn files_found(&self, kind: FileKind, _root: &Path, total: usize) {
        self.bar.reset();
        self.bar.set_length(total as u64);
        self.bar.set_message(kind.to_string());
    }

    fn file_processed(&self, _kind: FileKind, _path: &Path, done: usize, total: usize) {
        self.bar.set_position(done as u64);
        if done == total {
            self.bar.finish();
        }
    }
}

fn run<W>(warehouse: &W, config: &AppConfig, progress: &dyn IngestProgress) -> Result<IngestReport>
where
    W: Sink + SongLookup + BatchScope,
{
    let report = ingest_all(
        warehouse,
        &config.song_data,
        &config.log_data,
        &config.ingest,
        progress,
    )?;
    Ok(report)
}

fn log_summary(report: &IngestReport) {
    info!("");
    info!("Ingestion Summary");
    info!("=================");
    info!("Files processed: {}", report.files);
    info!("Songs: {}", report.songs);
    info!("Artists: {}", report.artists);
    info!("Time rows: {}", report.time_rows);
    info!("Users: {}", report.users);
    info!(
        "Songplays: {} ({} resolved to a song)",
        report.songplays, report.resolved_songplays
    );
    if report.rejected_records > 0 {
        warn!("Rejected records: {}", report.rejected_records);
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Song data: {}", config.song_data.display());
    info!("Log data: {}", config.log_data.display());

    let bar_reporter;
    let progress: &dyn IngestProgress = if cli_args.no_progress {
        &NoProgress
    } else {
        bar_reporter = ProgressBarReporter::new();
        &bar_reporter
    };

    if config.dry_run {
        info!("Dry run: loading into an in-memory warehouse");
        let warehouse = InMemoryWarehouse::new();
        let report = run(&warehouse, &config, progress)?;
        log_summary(&report);
        info!("");
        info!("In-memory warehouse contains:");
        info!("  {} songs", warehouse.songs().len());
        info!("  {} artists", warehouse.artists().len());
        info!("  {} users", warehouse.users().len());
        info!("  {} time rows", warehouse.time_rows().len());
        info!("  {} songplays", warehouse.songplays().len());
        return Ok(());
    }

    info!("Opening SQLite warehouse at {:?}...", config.db_path);
    let warehouse = SqliteWarehouse::new(&config.db_path)?;
    let report = run(&warehouse, &config, progress)?;
    log_summary(&report);

    let counts = warehouse.get_counts()?;
    info!("");
    info!("Database contains:");
    info!("  {} songs", counts.songs);
    info!("  {} artists", counts.artists);
    info!("  {} users", counts.users);
    info!("  {} time rows", counts.time_rows);
    info!("  {} songplays", counts.songplays);

    info!("");
    info!("Ingestion completed successfully!");
    Ok(())
}
