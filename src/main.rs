//! trim - flatten irregular spreadsheet tables into CSV and splice them on key columns.

use anyhow::Context;
use anyhow::Result;
use clap::ArgAction;
use clap::Parser;
use clap::Subcommand;
use log::info;
use rusty_trim::extract::axis::AxisSpec;
use rusty_trim::extract::enterprise::EnterpriseDirectory;
use rusty_trim::extract::parse_workbook;
use rusty_trim::extract::ParseOptions;
use rusty_trim::info::workbook_info;
use rusty_trim::splice::splice_files;
use rusty_trim::splice::SpliceOptions;
use rusty_trim::spreadsheet::criteria::Criteria;
use rusty_trim::spreadsheet::range::CellRange;
use rusty_trim::spreadsheet::range::ColumnSpan;
use std::path::PathBuf;

/// Spreadsheet table flattening and splicing
#[derive(Parser)]
#[command(name = "trim", version, about = "Flatten multi-header spreadsheet tables into CSV")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sheets of a workbook and their used ranges
    Info {
        /// Workbook path
        file: String,

        /// Print JSON instead of text
        #[arg(short, long)]
        json: bool,
    },

    /// Extract the sheets of a workbook into CSV files
    #[command(disable_help_flag = true)]
    Parse {
        /// Workbook path
        file: String,

        /// Column header range, such as B1:H2
        #[arg(short = 'h', long)]
        haxis: Option<String>,

        /// Row header range, such as A2:B10
        #[arg(short = 'v', long)]
        vaxis: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Collapse every sheet into one row of `<workbook>_merged.csv`
        #[arg(short, long)]
        merge: bool,

        /// Accounting period written in merge mode, such as 2512
        #[arg(short, long)]
        timestamp: Option<String>,

        /// Dataset name written in merge mode
        #[arg(short, long)]
        name: Option<String>,

        /// JSON file mapping full enterprise names to short names and ids
        #[arg(short, long)]
        enterprises: Option<PathBuf>,

        /// Only extract sheets whose name matches this glob (repeatable)
        #[arg(long = "sheet")]
        sheets: Vec<String>,

        /// Print help
        #[arg(long, action = ArgAction::Help)]
        help: Option<bool>,
    },

    /// Join several files on their frozen key columns
    Splice {
        /// CSV files or workbooks
        #[arg(required = true)]
        files: Vec<String>,

        /// Frozen key columns, such as A:D
        #[arg(short, long, default_value = "A:A")]
        range: String,

        /// Columns left out of the output, such as E:E
        #[arg(short, long)]
        skip: Option<String>,

        /// Output file name
        #[arg(short, long, default_value = "merged.csv")]
        output: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Header rows of workbook sources
        #[arg(short = 'H', long, default_value_t = 1)]
        headers: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Info { file, json } => {
            let summary = workbook_info(&file).with_context(|| format!("Failed to read '{file}'"))?;
            if json {
                println!("{}", summary.to_json()?);
            } else {
                print!("{summary}");
            }
        }

        Commands::Parse {
            file,
            haxis,
            vaxis,
            path,
            merge,
            timestamp,
            name,
            enterprises,
            sheets,
            help: _,
        } => {
            let axes = AxisSpec {
                haxis: haxis.as_deref().map(CellRange::try_from).transpose()?,
                vaxis: vaxis.as_deref().map(CellRange::try_from).transpose()?,
            };
            let enterprises = match enterprises {
                Some(path) => {
                    let directory = EnterpriseDirectory::load(&path)
                        .with_context(|| format!("Failed to load enterprises from '{}'", path.display()))?;
                    info!("Loaded {} enterprises from '{}'", directory.len(), path.display());
                    directory
                }
                None => EnterpriseDirectory::default(),
            };
            let options = ParseOptions {
                axes,
                merge,
                period: timestamp,
                dataset: name,
                output_dir: path,
                criteria: Criteria::from_globs(&sheets)?,
            };
            info!("Parsing '{file}'");

            let files = parse_workbook(&file, &options, &enterprises).with_context(|| format!("Failed to parse '{file}'"))?;
            println!("Generated {} files:", files.len());
            for path in files {
                println!("  - {}", path.display());
            }
        }

        Commands::Splice {
            files,
            range,
            skip,
            output,
            path,
            headers,
        } => {
            let options = SpliceOptions {
                frozen: ColumnSpan::try_from(range.as_str())?,
                skip: skip.as_deref().map(ColumnSpan::try_from).transpose()?,
                header_rows: headers,
                output_dir: path,
                output_name: output,
            };
            info!("Splicing {} files on columns {range}", files.len());

            let path = splice_files(&files, &options).context("Failed to splice files")?;
            println!("Generated file: {}", path.display());
        }
    }
    Ok(())
}
