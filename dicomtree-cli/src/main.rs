//! `dicomtree`: browse a DICOM index database from the terminal.

mod error;
mod paths;
mod render;

use std::fs;
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use simplelog::ColorChoice;
use simplelog::CombinedLogger;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::SharedLogger;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use dicomtree_lib::backend::schema;
use dicomtree_lib::backend::SqliteExecutor;
use dicomtree_lib::model::Field;
use dicomtree_lib::query::Direction;
use dicomtree_lib::DicomModel;
use dicomtree_lib::ModelConfig;

use error::CliError;
use render::Walker;

#[derive(Parser, Debug)]
#[command(
    name = "dicomtree",
    version,
    about = "Browse the patients, studies, series and images of a DICOM index database"
)]
struct Cli {
    #[arg(value_name = "DB", help = "Path to the SQLite index database")]
    database: PathBuf,

    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(1..=4),
        help = "Levels to descend (1 = patients, 4 = images)"
    )]
    depth: u8,

    #[arg(long, default_value_t = 50, help = "Maximum rows listed under each parent")]
    limit: usize,

    #[arg(long, value_name = "FIELD", help = "Sort every level by this field (e.g. date, name)")]
    sort: Option<Field>,

    #[arg(long, requires = "sort", help = "Sort in descending order")]
    desc: bool,

    #[arg(long, help = "Rows fetched per page")]
    page_size: Option<usize>,

    #[arg(long, help = "Count rows up front instead of scanning for them")]
    count_rows: bool,

    #[arg(long, help = "Print JSON instead of an outline")]
    json: bool,

    #[arg(short, long, help = "Also log to stderr")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_logging(verbose: bool) -> Result<(), CliError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if let Some(dir) = paths::log_dir() {
        fs::create_dir_all(&dir)?;
        paths::rotate_logs(&dir);
        let file = File::create(paths::log_file(&dir))?;
        loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file));
    }
    if verbose {
        loggers.push(TermLogger::new(
            LevelFilter::Debug,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), CliError> {
    if !cli.database.exists() {
        return Err(CliError::NotFound(cli.database.clone()));
    }

    let executor = SqliteExecutor::open(&cli.database)?.with_row_counts(cli.count_rows);
    let missing = schema::missing_tables(executor.connection())?;
    if !missing.is_empty() {
        log::warn!("{} lacks tables: {}", cli.database.display(), missing.join(", "));
    }

    let mut config = ModelConfig::new();
    if let Some(page_size) = cli.page_size {
        config = config.with_page_size(page_size);
    }
    let model = DicomModel::new(config);
    if let Some(field) = cli.sort {
        model.sort(field, Direction::from_ascending(!cli.desc));
    }
    model.set_backing_store(executor);
    log::info!("browsing {}", cli.database.display());

    let entries = Walker::new(&model)
        .depth(usize::from(cli.depth))
        .limit(cli.limit)
        .walk();

    let mut out = io::stdout().lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &entries)?;
        writeln!(out)?;
    } else {
        render::write_text(&mut out, &entries)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sort_field() {
        let cli = Cli::try_parse_from(["dicomtree", "index.db", "--sort", "subject-id", "--desc"])
            .unwrap();
        assert_eq!(cli.sort, Some(Field::SubjectId));
        assert!(cli.desc);
        assert_eq!(cli.depth, 1);
    }

    #[test]
    fn test_depth_is_bounded() {
        assert!(Cli::try_parse_from(["dicomtree", "index.db", "--depth", "5"]).is_err());
        assert!(Cli::try_parse_from(["dicomtree", "index.db", "--desc"]).is_err());
    }
}
