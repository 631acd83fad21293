// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use repocache::{MetadataKind, Package, cache};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// Metadata document kinds accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Primary,
    Filelists,
    Other,
}

impl From<Kind> for MetadataKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Primary => MetadataKind::Primary,
            Kind::Filelists => MetadataKind::Filelists,
            Kind::Other => MetadataKind::Other,
        }
    }
}

#[derive(Parser)]
#[command(name = "repocache")]
#[command(author, version, about = "Decode RPM repodata and maintain its SQLite caches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the cache of a primary.xml file
    Primary {
        /// Path to primary.xml (optionally compressed)
        md_path: PathBuf,
        /// Checksum of the metadata, as listed in repomd.xml
        checksum: String,
    },
    /// Update the cache of a filelists.xml file
    Filelists {
        /// Path to filelists.xml (optionally compressed)
        md_path: PathBuf,
        /// Checksum of the metadata, as listed in repomd.xml
        checksum: String,
    },
    /// Update the cache of an other.xml file
    Other {
        /// Path to other.xml (optionally compressed)
        md_path: PathBuf,
        /// Checksum of the metadata, as listed in repomd.xml
        checksum: String,
    },
    /// Update all caches of a repository
    Update {
        /// Repository root (the directory containing repodata/)
        repo_root: PathBuf,
    },
    /// Print the packages of a metadata file
    Dump {
        /// Document kind
        #[arg(value_enum)]
        kind: Kind,
        /// Path to the metadata file (optionally compressed)
        md_path: PathBuf,
        /// Print one JSON object per package instead of NEVRAs
        #[arg(long)]
        json: bool,
    },
}

fn dump_package(out: &mut impl Write, pkg: &Package, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, &pkg.view())?;
        writeln!(out)
    } else {
        writeln!(out, "{}", pkg.nevra())
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so dumped records stay clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Primary { md_path, checksum } => {
            let db_path = cache::update_primary(&md_path, &checksum)?;
            println!("{}", db_path.display());
            Ok(())
        }
        Commands::Filelists { md_path, checksum } => {
            let db_path = cache::update_filelists(&md_path, &checksum)?;
            println!("{}", db_path.display());
            Ok(())
        }
        Commands::Other { md_path, checksum } => {
            let db_path = cache::update_other(&md_path, &checksum)?;
            println!("{}", db_path.display());
            Ok(())
        }
        Commands::Update { repo_root } => {
            info!("Updating caches of {}", repo_root.display());
            for (kind, db_path) in cache::update_repository(&repo_root)? {
                println!("{}: {}", kind, db_path.display());
            }
            Ok(())
        }
        Commands::Dump { kind, md_path, json } => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let mut write_error: Option<io::Error> = None;

            let summary = repocache::decode_file(kind.into(), &md_path, |pkg| {
                if write_error.is_none() {
                    if let Err(e) = dump_package(&mut out, pkg, json) {
                        write_error = Some(e);
                    }
                }
            })?;

            if let Some(e) = write_error {
                return Err(e.into());
            }
            out.flush()?;

            info!("Decoded {} packages", summary.packages);
            if summary.incomplete {
                return Err(anyhow::anyhow!(
                    "{} ends inside a package; the last package was dropped",
                    md_path.display()
                ));
            }
            Ok(())
        }
    }
}
