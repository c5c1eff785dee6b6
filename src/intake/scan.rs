/// Folder scanning and image filtering
///
/// Walks the selected folder recursively and accepts files by image
/// extension (the desktop analog of MIME-type filtering). Each
/// accepted file gets its thumbnail decoded right here, so anything
/// the scan returns is guaranteed previewable.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::thumbnail::{self, Thumbnail};

/// Supported image file extensions (lowercase)
const IMAGE_EXTENSIONS: [&str; 8] = [
    "jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff", "gif",
];

/// One accepted image, ready to become a job
#[derive(Debug, Clone)]
pub struct ScannedImage {
    pub filename: String,
    pub path: PathBuf,
    pub thumbnail: Thumbnail,
}

/// Scan a folder for images, decoding thumbnails as we go.
/// Runs on a blocking thread to keep the UI responsive.
pub async fn scan_folder(folder: PathBuf) -> Result<Vec<ScannedImage>, String> {
    tokio::task::spawn_blocking(move || Ok(scan_folder_blocking(&folder)))
        .await
        .map_err(|e| format!("Task join error: {}", e))?
}

/// Blocking implementation of the folder scan
fn scan_folder_blocking(folder: &Path) -> Vec<ScannedImage> {
    println!("🔍 Scanning folder: {}", folder.display());

    let mut accepted = Vec::new();

    // Walk the directory tree recursively, in a stable order
    for entry in WalkDir::new(folder)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if !has_image_extension(path) {
            continue;
        }

        let filename = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        // A file matched by extension can still be undecodable; skip
        // it so every job in the list has a working preview
        match thumbnail::generate_thumbnail(path) {
            Ok(thumbnail) => accepted.push(ScannedImage {
                filename,
                path: path.to_path_buf(),
                thumbnail,
            }),
            Err(err) => eprintln!("⚠️  Skipping {}: {}", filename, err),
        }
    }

    println!("✅ Scan found {} image(s)", accepted.len());

    accepted
}

/// Check whether a path carries one of the accepted image extensions
fn has_image_extension(path: &Path) -> bool {
    match path.extension() {
        Some(extension) => {
            let ext = extension.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::fs;

    fn write_png(path: &Path) {
        RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]))
            .save(path)
            .unwrap();
    }

    #[tokio::test]
    async fn test_scan_accepts_only_decodable_images() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"));
        write_png(&dir.path().join("b.PNG")); // extension match is case-insensitive
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        fs::write(dir.path().join("corrupt.jpg"), b"not an image").unwrap();

        let images = scan_folder(dir.path().to_path_buf()).await.unwrap();
        let names: Vec<&str> = images.iter().map(|img| img.filename.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.PNG"]);
    }

    #[tokio::test]
    async fn test_scan_recurses_into_subfolders() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("shoot").join("day2");
        fs::create_dir_all(&nested).unwrap();
        write_png(&nested.join("deep.png"));

        let images = scan_folder(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].filename, "deep.png");
        assert!(images[0].path.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_scan_of_imageless_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), b"# nothing here").unwrap();

        let images = scan_folder(dir.path().to_path_buf()).await.unwrap();
        assert!(images.is_empty());
    }

    #[test]
    fn test_extension_filter() {
        assert!(has_image_extension(Path::new("/x/photo.JPeG")));
        assert!(has_image_extension(Path::new("/x/photo.webp")));
        assert!(!has_image_extension(Path::new("/x/clip.mp4")));
        assert!(!has_image_extension(Path::new("/x/noext")));
    }
}
