//! Per-photo checks run before any processing

use crate::error::ErrorKind;
use crate::ingest::ImageExtension;

/// Reject empty photos and anything that is not exactly `image/jpeg` or `image/png`
pub fn validate(size: u64, content_type: &str) -> Result<(), ErrorKind> {
    if size == 0 {
        return Err(ErrorKind::EmptyPhoto);
    }
    if ImageExtension::from_content_type(content_type).is_none() {
        return Err(ErrorKind::UnsupportedType);
    }
    Ok(())
}
