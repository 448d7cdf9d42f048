//! kindelabra - Kindle collection manager

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use kindelabra::collections::{DEFAULT_LOCALE, backup_file_name_now};
use kindelabra::device::{self, DEFAULT_DEVICE_ROOT};
use kindelabra::{
    AddOutcome, CollectionStore, DeviceFileIndex, Error, Result, ScanConfig, identify_file,
};

#[derive(Parser)]
#[command(name = "kindelabra")]
#[command(version, about = "Kindle collection manager", long_about = None)]
#[command(after_help = "EXAMPLES:
    kindelabra list /media/KINDLE                     Show collections
    kindelabra create /media/KINDLE Sci-Fi            New collection
    kindelabra add /media/KINDLE Sci-Fi /media/KINDLE/documents/*.azw
    kindelabra identify book.mobi                     Show book identity")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Mount point the Kindle uses for its own paths
    #[arg(long, global = true, default_value = DEFAULT_DEVICE_ROOT)]
    device_root: String,

    /// Only index files with this extension (repeatable)
    #[arg(long = "ext", global = true, value_name = "EXT")]
    extensions: Vec<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Show the identity of ebook files
    Identify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show every collection and the books it holds
    List { device: PathBuf },
    /// Find books whose title or path matches a pattern
    Search { device: PathBuf, pattern: String },
    /// Create an empty collection
    Create {
        device: PathBuf,
        name: String,
        #[arg(long, default_value = DEFAULT_LOCALE)]
        locale: String,
    },
    /// Delete a collection
    Delete { device: PathBuf, name: String },
    /// Rename a collection
    Rename {
        device: PathBuf,
        old: String,
        new: String,
    },
    /// Add books to a collection
    Add {
        device: PathBuf,
        name: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove books from a collection
    Remove {
        device: PathBuf,
        name: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = ScanConfig::default().with_device_root(&cli.device_root);
    if !cli.extensions.is_empty() {
        config = config.with_extensions(&cli.extensions);
    }

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command, config: &ScanConfig) -> Result<()> {
    match command {
        Command::Identify { files } => {
            for file in files {
                let device_path = config
                    .device_path(&file)
                    .unwrap_or_else(|| file.to_string_lossy().into_owned());
                let identity = identify_file(&file, &device_path);
                println!("File: {}", file.display());
                println!("Path: {}", identity.path);
                println!("Hash: {}", identity.content_hash);
                if let Some(title) = &identity.title {
                    println!("Title: {title}");
                }
                if let Some(asin) = identity.asin() {
                    println!("ASIN: {asin}");
                }
                if let Some(book_type) = &identity.book_type {
                    println!("Type: {book_type}");
                }
                println!();
            }
            Ok(())
        }
        Command::List { device } => {
            let store = load_store(&device)?;
            let index = scan(&device, config)?;
            for name in store.names() {
                println!("{name}");
                for row in store.resolve(name, &index)? {
                    let marker = if row.is_stale() { " (not on device)" } else { "" };
                    println!("  {}{marker}", row.label());
                }
            }
            Ok(())
        }
        Command::Search { device, pattern } => {
            let index = scan(&device, config)?;
            let store = load_store(&device)?;
            for identity in index.search_title(&pattern)? {
                let cols = store.collections_containing(identity);
                if cols.is_empty() {
                    println!("{}\t{}", identity.label(), identity.path);
                } else {
                    println!("{}\t{}\t[{}]", identity.label(), identity.path, cols.join(", "));
                }
            }
            Ok(())
        }
        Command::Create {
            device,
            name,
            locale,
        } => edit_store(&device, |store| store.create(&name, &locale)),
        Command::Delete { device, name } => edit_store(&device, |store| {
            store.delete(&name)?;
            Ok(())
        }),
        Command::Rename { device, old, new } => {
            edit_store(&device, |store| store.rename(&old, &new))
        }
        Command::Add {
            device,
            name,
            files,
        } => edit_store(&device, |store| {
            for file in &files {
                let device_path = require_device_path(config, &device, file)?;
                let identity = identify_file(file, &device_path);
                if store.add(&name, &identity)? == AddOutcome::AlreadyPresent {
                    eprintln!("{} is already in collection {name}", identity.label());
                }
            }
            Ok(())
        }),
        Command::Remove {
            device,
            name,
            files,
        } => edit_store(&device, |store| {
            for file in &files {
                let device_path = require_device_path(config, &device, file)?;
                let identity = identify_file(file, &device_path);
                store.remove_identity(&name, &identity)?;
            }
            Ok(())
        }),
    }
}

/// Device path of `file`, which must lie in a content directory of the
/// device mounted at `device`. Both are canonicalized so relative and
/// symlinked arguments map the same way the scan does.
fn require_device_path(config: &ScanConfig, device: &Path, file: &Path) -> Result<String> {
    let mount = device.canonicalize()?;
    let file = file.canonicalize()?;
    config.device_path_under(&mount, &file).ok_or_else(|| {
        Error::NotFound(format!(
            "{} is not under a content directory of {}",
            file.display(),
            mount.display()
        ))
    })
}

fn check_device(device: &Path) -> Result<()> {
    if device::is_connected(device) {
        Ok(())
    } else {
        Err(Error::NotFound(format!(
            "no Kindle file structure at {}",
            device.display()
        )))
    }
}

fn load_store(device: &Path) -> Result<CollectionStore> {
    check_device(device)?;
    let path = device::collections_path(device);
    if !path.exists() {
        tracing::info!(path = %path.display(), "no collections database yet");
        return Ok(CollectionStore::new());
    }
    CollectionStore::load(File::open(&path)?)
}

/// Load, apply `edit`, then replace the database, keeping the old one as a
/// timestamped backup. Nothing is written when `edit` fails.
fn edit_store<F>(device: &Path, edit: F) -> Result<()>
where
    F: FnOnce(&mut CollectionStore) -> Result<()>,
{
    let mut store = load_store(device)?;
    edit(&mut store)?;

    let path = device::collections_path(device);
    if let Some(backup) = replace_with_backup(&path, |writer| store.save(writer))? {
        tracing::info!(backup = %backup.display(), "previous collections backed up");
    }
    eprintln!("Collections saved to {}", path.display());
    Ok(())
}

/// Write a new `path` through a temporary file next to it, then move the
/// current file to its backup name and the temporary file into place.
///
/// If `write` fails the current file is untouched; if the final rename fails
/// the backup is moved back.
fn replace_with_backup<F>(path: &Path, write: F) -> Result<Option<PathBuf>>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = path
        .parent()
        .ok_or_else(|| Error::NotFound(format!("parent directory of {}", path.display())))?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }

    let backup = if path.exists() {
        let backup = path.with_file_name(backup_file_name_now());
        fs::rename(path, &backup)?;
        Some(backup)
    } else {
        None
    };

    if let Err(err) = tmp.persist(path) {
        if let Some(backup) = &backup {
            fs::rename(backup, path)?;
        }
        return Err(err.error.into());
    }
    Ok(backup)
}

/// Full rescan of the device's content directories. Unreadable entries are
/// logged and skipped.
fn scan(device: &Path, config: &ScanConfig) -> Result<DeviceFileIndex> {
    let mut files = Vec::new();
    for root in &config.content_roots {
        let dir = device.join(root);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "skipping unreadable entry"),
            }
        }
    }
    tracing::info!(count = files.len(), "scanning device files");
    let index = DeviceFileIndex::build_under(config, device, files);
    if !index.collisions().is_empty() {
        tracing::warn!(count = index.collisions().len(), "duplicate device paths");
    }
    Ok(index)
}
