use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::Result;
use crate::naming::parse_exif_date;

/// Pixel dimensions read from the image header.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    Ok(image::image_dimensions(path)?)
}

/// Pixel dimensions, or `(0, 0)` when the image cannot be decoded.
pub fn dimensions_or_zero(path: &Path) -> (u32, u32) {
    match read_dimensions(path) {
        Ok(dims) => dims,
        Err(error) => {
            log::warn!("cannot read dimensions of {}: {}", path.display(), error);
            (0, 0)
        }
    }
}

/// Capture date (`YYYY-MM-DD`) from the EXIF DateTimeOriginal tag, if present.
pub fn capture_date(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let field = exif
        .get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)
        .or_else(|| exif.get_field(exif::Tag::DateTimeDigitized, exif::In::PRIMARY))?;
    parse_exif_date(&field.display_value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_dimensions_png() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.png");
        image::RgbImage::new(12, 7).save(&path).unwrap();
        assert_eq!(read_dimensions(&path).unwrap(), (12, 7));
    }

    #[test]
    fn test_read_dimensions_jpeg() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.jpg");
        image::RgbImage::from_fn(20, 10, |x, _| image::Rgb([(x * 10) as u8, 0, 0]))
            .save(&path)
            .unwrap();
        assert_eq!(read_dimensions(&path).unwrap(), (20, 10));
    }

    #[test]
    fn test_dimensions_or_zero_on_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();
        assert_eq!(dimensions_or_zero(&path), (0, 0));
    }

    #[test]
    fn test_capture_date_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plain.png");
        image::RgbImage::new(4, 4).save(&path).unwrap();
        assert_eq!(capture_date(&path), None);
        assert_eq!(capture_date(&tmp.path().join("missing.jpg")), None);
    }
}
