use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use gofiximport::{CacheManager, Config, FixError, Fixer, StalenessCheck};

/// Add missing and remove unused imports in a Go source file.
#[derive(Debug, Parser)]
#[command(name = "gofiximport", version)]
struct Cli {
    /// Go source file to fix
    file: PathBuf,

    /// Write the result back to FILE instead of stdout
    #[arg(short = 'w', long = "write")]
    write: bool,

    /// Rebuild the candidate cache regardless of staleness
    #[arg(short = 'u', long = "update-cache")]
    update_cache: bool,

    /// Search root (repeatable); replaces the GOPATH/GOROOT roots
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Cache file location
    #[arg(long = "cache", value_name = "FILE")]
    cache: Option<PathBuf>,

    /// Only rescan directories modified since the last build
    #[arg(long = "fast-staleness")]
    fast_staleness: bool,

    /// Debug logging to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::from_env();
        if !self.roots.is_empty() {
            config = config.with_search_roots(self.roots.clone());
        }
        if let Some(cache) = &self.cache {
            config = config.with_cache_path(cache.clone());
        }
        if self.fast_staleness {
            config = config.with_staleness(StalenessCheck::DirectoryMtime);
        }
        config
    }
}

fn init_logging(verbose: bool) {
    // stdout carries the rewritten source
    let filter = if verbose {
        EnvFilter::new("gofiximport=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .init();
}

fn run(cli: &Cli) -> gofiximport::Result<()> {
    let config = cli.config();
    let candidates = CacheManager::new(&config).load(cli.update_cache);
    let fixer = Fixer::new(candidates);

    if cli.write {
        fixer.fix_in_place(&cli.file)?;
        return Ok(());
    }

    let fixed = fixer.fix_file(&cli.file)?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(fixed.text.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| FixError::io(Path::new("<stdout>"), e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("gofiximport: {err}");
            ExitCode::FAILURE
        }
    }
}
