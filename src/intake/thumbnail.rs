/// Thumbnail generation for the job grid
///
/// Previews live in memory for the session; nothing is cached to
/// disk. The RGBA payload feeds the image widget directly.

use image::imageops::FilterType;
use std::path::Path;

/// Size of generated thumbnails (longest edge)
const THUMBNAIL_SIZE: u32 = 256;

/// Decoded preview pixels, ready for a display handle
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decode an image file and downscale it to thumbnail size.
/// Aspect ratio is preserved; images already small enough keep their
/// dimensions.
pub fn generate_thumbnail(path: &Path) -> Result<Thumbnail, String> {
    let img = image::open(path)
        .map_err(|e| format!("failed to decode {}: {}", path.display(), e))?;

    // resize() would also scale small images up; leave those alone
    let thumbnail = if img.width() > THUMBNAIL_SIZE || img.height() > THUMBNAIL_SIZE {
        img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
    } else {
        img
    };
    let rgba = thumbnail.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(Thumbnail {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}
