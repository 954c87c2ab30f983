//! Image classification and dimension probing.

use std::path::Path;

/// Extensions treated as images, lower-case.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"];

/// Whether the extension classifies this path as an image.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Read the pixel dimensions from the image header.
///
/// Decodes only the header, not the pixel data.
pub fn probe_dimensions(path: &Path) -> image::ImageResult<(u32, u32)> {
    image::image_dimensions(path)
}
