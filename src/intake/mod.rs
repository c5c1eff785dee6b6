/// Folder intake module
///
/// This module handles:
/// - Scanning a selected folder for image files (scan.rs)
/// - Decoding preview thumbnails for the grid (thumbnail.rs)

pub mod scan;
pub mod thumbnail;
