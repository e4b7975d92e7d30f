//! CLI for the copybook layout compiler.
//!
//! # Examples
//!
//! ```bash
//! # Show the record layout of a copybook
//! copybook layout CUSTOMER.cpy
//!
//! # Machine-readable layout of a free-format ASCII copybook
//! copybook layout orders.cpy --free --encoding ascii --format json
//!
//! # Compile and report errors only
//! copybook check CUSTOMER.cpy
//!
//! # Write a default configuration file
//! copybook init-config > copybook.toml
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use copybook_core::{CompilerOptions, Encoding, SourceFormat};
use miette::Result;

mod commands;
mod config;
mod output;

use config::Config;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "copybook")]
#[command(author, version, about = "COBOL copybook layout compiler", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: ./copybook.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the offset and size of every field
    Layout {
        /// Input copybook file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        compile: CompileArgs,
    },

    /// Compile a copybook and report errors and warnings
    Check {
        /// Input copybook file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        compile: CompileArgs,
    },

    /// Print a default configuration file
    InitConfig {
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Flags that override the configured compiler options.
#[derive(Args, Debug)]
struct CompileArgs {
    /// Data encoding (ascii, ebcdic)
    #[arg(long, value_name = "ENCODING")]
    encoding: Option<Encoding>,

    /// Treat the source as free format instead of fixed columns
    #[arg(long)]
    free: bool,

    /// Largest accepted PIC repetition count
    #[arg(long, value_name = "N")]
    max_field_length: Option<usize>,

    /// Output format (text, json)
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,
}

impl CompileArgs {
    fn resolve(&self, config: &Config) -> (CompilerOptions, OutputFormat) {
        let mut options = config.compiler.clone();
        if let Some(encoding) = self.encoding {
            options.encoding = encoding;
        }
        if self.free {
            options.source_format = SourceFormat::Free;
        }
        if let Some(max) = self.max_field_length {
            options.max_field_length = max;
        }
        let format = OutputFormat::parse(self.format.as_deref().unwrap_or(&config.output.format));
        (options, format)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing on stderr so stdout stays parseable
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Layout { input, compile } => {
            let config = Config::load(cli.config.as_deref())?;
            let (options, format) = compile.resolve(&config);
            commands::layout::run(input, options, format)
        }
        Commands::Check { input, compile } => {
            let config = Config::load(cli.config.as_deref())?;
            let (options, format) = compile.resolve(&config);
            commands::check::run(input, options, format)
        }
        Commands::InitConfig { output } => match output {
            Some(path) => {
                Config::default().write_to_file(&path)?;
                tracing::info!("Wrote {}", path.display());
                Ok(())
            }
            None => {
                print!("{}", Config::generate_default());
                Ok(())
            }
        },
    }
}
