//! tanzil2sql — The converter CLI
//!
//! # Usage
//!
//! ```bash
//! # Create table + insert script in the current directory
//! tanzil2sql convert quran-simple.xml
//!
//! # Both scripts, custom table, into ./out
//! tanzil2sql convert quran-simple.xml --both --table quran -o out
//!
//! # Counts and a preview
//! tanzil2sql inspect quran-simple.xml --limit 10
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use serde::Serialize;
use tanzil2sql::prelude::*;
use tanzil2sql::verse::SurahSummary;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tanzil2sql")]
#[command(version)]
#[command(about = "📖 Convert Tanzil.net Quran XML into SQLite import scripts", long_about = None)]
#[command(after_help = "EXAMPLES:
    tanzil2sql convert quran-simple.xml
    tanzil2sql convert quran-simple.xml --mode add-column-update --text-column text_simple
    tanzil2sql inspect quran-uthmani.xml --format json

Download the XML from https://tanzil.net/download/ (select XML as output file format).")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ./tanzil2sql.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an XML file into an SQLite import script
    Convert {
        /// Tanzil XML file
        xml: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Script to generate
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Generate both scripts
        #[arg(long, conflicts_with = "mode")]
        both: bool,

        /// Table name
        #[arg(long)]
        table: Option<String>,

        /// Surah number column name
        #[arg(long)]
        surah_column: Option<String>,

        /// Aya number column name
        #[arg(long)]
        aya_column: Option<String>,

        /// Text column name
        #[arg(long)]
        text_column: Option<String>,
    },
    /// Show verse counts and a preview without writing anything
    Inspect {
        /// Tanzil XML file
        xml: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Number of preview verses
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// List the Bismillah text variants
    Bismillah,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// CREATE TABLE + INSERT
    #[value(name = "create-table-insert", alias = "insert")]
    CreateTableInsert,
    /// ALTER TABLE ADD COLUMN + UPDATE
    #[value(name = "add-column-update", alias = "update")]
    AddColumnUpdate,
}

impl From<ModeArg> for SaveMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::CreateTableInsert => SaveMode::CreateTableInsert,
            ModeArg::AddColumnUpdate => SaveMode::AddColumnUpdateExistingTable,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Convert {
            xml,
            output,
            mode,
            both,
            table,
            surah_column,
            aya_column,
            text_column,
        } => {
            let overrides = SchemaOverrides {
                table: table.clone(),
                surah_column: surah_column.clone(),
                aya_column: aya_column.clone(),
                text_column: text_column.clone(),
            };
            run_convert(&cli, xml, output.as_deref(), *mode, *both, overrides).await
        }
        Commands::Inspect { xml, format, limit } => run_inspect(xml, *format, *limit).await,
        Commands::Bismillah => {
            show_bismillah();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tanzil2sql=debug" } else { "tanzil2sql=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Schema names given on the command line.
struct SchemaOverrides {
    table: Option<String>,
    surah_column: Option<String>,
    aya_column: Option<String>,
    text_column: Option<String>,
}

impl SchemaOverrides {
    fn apply(self, schema: &mut TableSchema) {
        if let Some(table) = self.table {
            schema.table = table;
        }
        if let Some(col) = self.surah_column {
            schema.surah_column = col;
        }
        if let Some(col) = self.aya_column {
            schema.aya_column = col;
        }
        if let Some(col) = self.text_column {
            schema.text_column = col;
        }
    }
}

/// `--both` wins, then `--mode`, then the configured mode.
fn requested_modes(mode: Option<ModeArg>, both: bool, configured: SaveMode) -> Vec<SaveMode> {
    if both {
        SaveMode::ALL.to_vec()
    } else {
        vec![mode.map(SaveMode::from).unwrap_or(configured)]
    }
}

async fn run_convert(
    cli: &Cli,
    xml: &Path,
    output: Option<&Path>,
    mode: Option<ModeArg>,
    both: bool,
    overrides: SchemaOverrides,
) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    overrides.apply(&mut config.schema);
    config.validate()?;

    let modes = requested_modes(mode, both, config.output.mode);
    let dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output.dir.clone());

    let (session, mut events) = Session::new();

    session.select_file(xml).await?;
    if let Some(name) = session.source_name().await {
        println!("{} {}", "Selected File:".dimmed(), name.cyan());
    }

    println!("{}", "Converting, please wait...".dimmed());
    session
        .convert()
        .await?
        .await
        .context("Conversion task was cancelled")?;

    match events.notices.recv().await {
        Some(Notice::Completed { raw, total }) => {
            println!("{}", "Completed! Total Ayats:".green().bold());
            println!("  Without Bismillah: {}", raw.to_string().cyan());
            println!("  With Bismillah:    {}", total.to_string().cyan());
        }
        Some(Notice::Failed(err)) => return Err(anyhow!("{}", err)),
        other => return Err(anyhow!("Unexpected session event: {:?}", other)),
    }

    for mode in modes {
        let path = session.save(mode, &config.schema, &dir).await?;
        println!("{} Wrote {}", "✓".green(), path.display().to_string().cyan());
    }

    Ok(())
}

#[derive(Serialize)]
struct InspectReport<'a> {
    without_bismillah: usize,
    with_bismillah: usize,
    mismatched_surahs: Vec<SurahSummary>,
    preview: &'a [Verse],
}

async fn run_inspect(xml: &Path, format: OutputFormat, limit: usize) -> anyhow::Result<()> {
    let content = tokio::fs::read(xml)
        .await
        .with_context(|| format!("Failed to read {}", xml.display()))?;
    let corpus = tokio::task::spawn_blocking(move || tanzil2sql::convert(&content)).await??;

    let report = InspectReport {
        without_bismillah: corpus.raw_count(),
        with_bismillah: corpus.len(),
        mismatched_surahs: corpus
            .surah_summary()
            .into_iter()
            .filter(|s| !s.matches())
            .collect(),
        preview: &corpus.verses()[..limit.min(corpus.len())],
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!("{}", "Total Ayats:".white().bold());
            println!("  Without Bismillah: {}", report.without_bismillah.to_string().cyan());
            println!("  With Bismillah:    {}", report.with_bismillah.to_string().cyan());

            if !report.mismatched_surahs.is_empty() {
                println!();
                println!("{}", "⚠ Surahs with unexpected verse counts:".yellow());
                for s in &report.mismatched_surahs {
                    println!("  Surah {:3}: {} (expected {})", s.surah, s.found, s.expected);
                }
            }

            println!();
            println!("{}", "Preview:".white().bold());
            println!("{}", "─".repeat(60).dimmed());
            for verse in report.preview {
                println!("{}", verse);
            }
            if corpus.len() > report.preview.len() {
                println!(
                    "{}",
                    format!("… {} more", corpus.len() - report.preview.len()).dimmed()
                );
            }
        }
    }

    Ok(())
}

fn show_bismillah() {
    println!("{}", "📖 Bismillah Variants".cyan().bold());
    println!();
    println!("{:14} {}", "Name".white().bold(), "Text".white().bold());
    println!("{}", "─".repeat(60).dimmed());

    for variant in BismillahVariant::ALL {
        let marker = if variant == BismillahVariant::Simple {
            " (used as verse 0)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("{:14} {}{}", variant.name().yellow(), variant.text(), marker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_overrides() -> SchemaOverrides {
        SchemaOverrides {
            table: None,
            surah_column: None,
            aya_column: None,
            text_column: None,
        }
    }

    #[test]
    fn test_overrides_replace_only_given_names() {
        let mut schema = Config::from_toml_str("[schema]\ntable = \"quran\"\naya_column = \"ayah\"\n")
            .unwrap()
            .schema;
        SchemaOverrides {
            text_column: Some("text_uthmani".to_string()),
            aya_column: Some("verse".to_string()),
            ..no_overrides()
        }
        .apply(&mut schema);

        assert_eq!(schema.table, "quran");
        assert_eq!(schema.surah_column, "surah_number");
        assert_eq!(schema.aya_column, "verse");
        assert_eq!(schema.text_column, "text_uthmani");
    }

    #[test]
    fn test_no_overrides_keeps_schema() {
        let mut schema = TableSchema::default();
        no_overrides().apply(&mut schema);
        assert_eq!(schema, TableSchema::default());
    }

    #[test]
    fn test_overridden_schema_is_validated() {
        let mut config = Config::default();
        SchemaOverrides {
            table: Some("bad`name".to_string()),
            ..no_overrides()
        }
        .apply(&mut config.schema);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_requested_modes() {
        let configured = SaveMode::AddColumnUpdateExistingTable;
        assert_eq!(requested_modes(None, false, configured), vec![configured]);
        assert_eq!(
            requested_modes(Some(ModeArg::CreateTableInsert), false, configured),
            vec![SaveMode::CreateTableInsert]
        );
        assert_eq!(
            requested_modes(None, true, SaveMode::CreateTableInsert),
            SaveMode::ALL.to_vec()
        );
        assert_eq!(requested_modes(None, true, configured).len(), 2);
    }

    #[test]
    fn test_cli_parses_convert_flags() {
        let cli = Cli::try_parse_from([
            "tanzil2sql",
            "convert",
            "quran.xml",
            "--mode",
            "update",
            "--text-column",
            "text_simple",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert {
                mode, text_column, both, ..
            } => {
                assert!(matches!(mode, Some(ModeArg::AddColumnUpdate)));
                assert_eq!(text_column.as_deref(), Some("text_simple"));
                assert!(!both);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_cli_rejects_both_with_mode() {
        let result = Cli::try_parse_from([
            "tanzil2sql",
            "convert",
            "quran.xml",
            "--both",
            "--mode",
            "insert",
        ]);
        assert!(result.is_err());
    }
}
