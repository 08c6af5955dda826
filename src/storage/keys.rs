//! Object key layout
//!
//! These paths are shared with the site that serves the gallery, so the format
//! must not change.

use crate::ingest::ImageExtension;

/// `images/raw/gallery/upload<id>/photo<index>.<ext>`
pub fn original_key(upload_id: u64, index: usize, ext: ImageExtension) -> String {
    format!("images/raw/gallery/upload{}/{}", upload_id, photo_file_name(index, ext))
}

/// `images/gallery/upload<id>/photo<index>/<file>`
pub fn rendition_key(upload_id: u64, index: usize, rendition_file_name: &str) -> String {
    format!("images/gallery/upload{}/photo{}/{}", upload_id, index, rendition_file_name)
}

/// `images/raw/gallery/<date>/photo<index>.<ext>`
pub fn dated_original_key(date: &str, index: usize, ext: ImageExtension) -> String {
    format!("images/raw/gallery/{}/{}", date, photo_file_name(index, ext))
}

/// `photo<index>.<ext>`
pub fn photo_file_name(index: usize, ext: ImageExtension) -> String {
    format!("photo{}.{}", index, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(original_key(7, 0, ImageExtension::Jpg), "images/raw/gallery/upload7/photo0.jpg");
        assert_eq!(original_key(12, 3, ImageExtension::Png), "images/raw/gallery/upload12/photo3.png");
        assert_eq!(rendition_key(7, 2, "500w.jpg"), "images/gallery/upload7/photo2/500w.jpg");
        assert_eq!(
            dated_original_key("2024-05-01", 4, ImageExtension::Jpg),
            "images/raw/gallery/2024-05-01/photo4.jpg"
        );
    }

    #[test]
    fn test_keys_are_deterministic() {
        assert_eq!(original_key(3, 1, ImageExtension::Png), original_key(3, 1, ImageExtension::Png));
        assert_ne!(original_key(3, 1, ImageExtension::Png), original_key(4, 1, ImageExtension::Png));
    }
}
