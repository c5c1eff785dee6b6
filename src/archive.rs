/// Archive export
///
/// Packs every processed output into one zip. Entries carry a fixed
/// prefix so they cannot be confused with the originals when the
/// archive is unpacked next to them. Export never touches job state
/// and can run as often as the user likes.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Prefix for every entry in the exported archive
const ENTRY_PREFIX: &str = "processed-";

/// Default name offered in the save dialog
pub const DEFAULT_ARCHIVE_NAME: &str = "processed-folder.zip";

/// One processed image headed for the archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Original filename the entry name derives from
    pub filename: String,
    pub bytes: Arc<Vec<u8>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("could not write archive: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not build archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Write all entries into a zip at `destination`.
/// Returns the number of entries written.
pub async fn write_archive(
    entries: Vec<ArchiveEntry>,
    destination: PathBuf,
) -> Result<usize, String> {
    // Spawn blocking task for the compression work
    tokio::task::spawn_blocking(move || {
        write_archive_blocking(&entries, &destination).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Blocking implementation of the archive write
fn write_archive_blocking(
    entries: &[ArchiveEntry],
    destination: &Path,
) -> Result<usize, ArchiveError> {
    let file = File::create(destination)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used_names = HashSet::new();
    for entry in entries {
        let name = unique_entry_name(&mut used_names, &entry.filename);
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&entry.bytes)?;
    }

    zip.finish()?;
    println!(
        "📦 Wrote {} entr{} to {}",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" },
        destination.display()
    );

    Ok(entries.len())
}

/// Prefix the filename, disambiguating duplicates with a numeric
/// suffix before the extension. A zip cannot hold two entries under
/// one name, and the same file can be in the list twice.
fn unique_entry_name(used: &mut HashSet<String>, filename: &str) -> String {
    let base = format!("{}{}", ENTRY_PREFIX, filename);
    if used.insert(base.clone()) {
        return base;
    }

    let (stem, extension) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (filename, None),
    };

    for n in 2.. {
        let candidate = match extension {
            Some(ext) => format!("{}{}-{}.{}", ENTRY_PREFIX, stem, n, ext),
            None => format!("{}{}-{}", ENTRY_PREFIX, filename, n),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
    }

    unreachable!("suffix search is unbounded")
}
