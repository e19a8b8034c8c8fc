use crate::config::{Config, ConfigLoader, normalize_extensions};
use crate::errors::Result;
use crate::report::ReportFormat;
use crate::rewriter::DecodePolicy;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Strip comments from C sources in place.
///
/// `decomment` walks a directory, finds `.c` and `.h` files and removes every
/// `//` and `/* */` comment, leaving string and character literals alone.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Strip comments from C sources without touching string literals",
    long_about = "decomment - remove // and /* */ comments from C source trees, in place.

String and character literals are never modified, so \"http://...\" survives.
Newlines inside removed comments are kept, so line numbers do not shift.

QUICK EXAMPLES:
  decomment strip src/                      # Strip every .c/.h file under src/
  decomment strip . --dry-run -v            # Show what would change
  decomment strip . --backup                # Keep .bak copies
  decomment restore .                       # Undo a --backup run
  decomment list . -x c,h,inc               # Show which files would be touched"
)]
pub struct Args {
    /// Print debug diagnostics (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// File selection flags shared by `strip` and `list`.
#[derive(ClapArgs, Debug, Clone)]
pub struct SelectArgs {
    /// The directory to process.
    pub dir: PathBuf,

    /// Path to a YAML configuration file. Defaults to `decomment.yaml` in DIR, if present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// A comma-separated list of file extensions to include (default: c,h).
    #[arg(short = 'x', long = "ext", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// A comma-separated list of directory names to skip.
    #[arg(short = 'e', long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Match extensions regardless of case (`.C` counts as `.c`).
    #[arg(long)]
    pub ignore_case: bool,
}

/// The set of available commands for the `decomment` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove comments from every selected file
    ///
    /// EXAMPLES:
    ///   decomment strip .                         # Strip .c/.h files in place
    ///   decomment strip src/ -e build,third_party # Skip some directories
    ///   decomment strip . -f json -o report.json  # Machine-readable report
    ///
    /// Config file format (decomment.yaml):
    ///   extensions: [c, h]
    ///   case_sensitive: true
    ///   exclude: [.git, build]
    ///   decode: preserve   # preserve | replace | skip
    ///   backup: false
    Strip {
        #[command(flatten)]
        select: SelectArgs,

        /// How to treat bytes that are not valid UTF-8.
        #[arg(long, value_enum)]
        decode: Option<DecodePolicy>,

        /// Copy each file to `<file>.bak` before rewriting it.
        #[arg(long)]
        backup: bool,

        /// Report what would change without modifying any files.
        #[arg(long)]
        dry_run: bool,

        /// Stop at the first file that cannot be processed.
        #[arg(long)]
        fail_fast: bool,

        /// The report format.
        #[arg(short = 'f', long = "format", value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,

        /// Write the report to a file instead of standard output.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Hide the progress bar.
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the files `strip` would process
    List {
        #[command(flatten)]
        select: SelectArgs,
    },

    /// Restore files from `.bak` backups (undo a `strip --backup`)
    ///
    /// EXAMPLES:
    ///   decomment restore .                 # Restore all files, delete backups
    ///   decomment restore . --keep-backups  # Restore but keep .bak files
    Restore {
        /// The directory where `strip --backup` was run.
        dir: PathBuf,

        /// Keep the backup files after restoring the original files.
        #[arg(long)]
        keep_backups: bool,
    },
}

impl SelectArgs {
    /// Loads the config file (explicit or discovered) and applies the selection flags on top.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match self.config_path()? {
            Some(path) => {
                tracing::info!(path = %path.display(), "using config file");
                ConfigLoader::load(&path)?
            }
            None => Config::default(),
        };

        let extensions = normalize_extensions(&self.extensions);
        if !extensions.is_empty() {
            config.extensions = extensions;
        }
        if !self.exclude.is_empty() {
            config.exclude = self.exclude.clone();
        }
        if self.ignore_case {
            config.case_sensitive = false;
        }
        config.validate()
    }

    fn config_path(&self) -> Result<Option<PathBuf>> {
        match &self.config {
            Some(path) => ConfigLoader::find_config(path, &self.dir).map(Some),
            None => Ok(ConfigLoader::discover(&self.dir)),
        }
    }
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
