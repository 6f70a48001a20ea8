use crate::metadata::types::Ifd;
use image::{ColorType, ImageDecoder, ImageReader};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageProbe {
    pub width: u32,
    pub height: u32,
    pub ifd: Ifd,
}

/// Reads the header of a raster image. Pixel data is never decoded.
pub fn probe(path: &Path) -> Option<ImageProbe> {
    let reader = ImageReader::open(path).ok()?.with_guessed_format().ok()?;
    let format = reader.format();
    let mut decoder = reader.into_decoder().ok()?;

    let (width, height) = decoder.dimensions();
    let color_type = decoder.color_type();
    let channels = color_type.channel_count().max(1) as u16;
    let bit_depth = color_type.bits_per_pixel() / channels;
    let orientation = decoder
        .orientation()
        .ok()
        .map(orientation_label)
        .filter(|label| !label.is_empty());
    let exif_bytes = decoder.exif_metadata().ok().flatten().map(|raw| raw.len());

    Some(ImageProbe {
        width,
        height,
        ifd: Ifd {
            format: format.map(|fmt| format!("{fmt:?}")),
            color_model: color_type_label(color_type),
            bit_depth,
            orientation,
            exif_bytes,
        },
    })
}

fn color_type_label(color_type: ColorType) -> String {
    match color_type {
        ColorType::L8 | ColorType::L16 => "Grayscale".to_string(),
        ColorType::La8 | ColorType::La16 => "Grayscale + alpha".to_string(),
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB".to_string(),
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA".to_string(),
        _ => format!("{color_type:?}"),
    }
}

fn orientation_label(orientation: image::metadata::Orientation) -> String {
    use image::metadata::Orientation;
    match orientation {
        Orientation::NoTransforms => String::new(),
        Orientation::Rotate90 => "Rotate 90".to_string(),
        Orientation::Rotate180 => "Rotate 180".to_string(),
        Orientation::Rotate270 => "Rotate 270".to_string(),
        Orientation::FlipHorizontal => "Flip horizontal".to_string(),
        Orientation::FlipVertical => "Flip vertical".to_string(),
        Orientation::Rotate90FlipH => "Rotate 90 + flip horizontal".to_string(),
        Orientation::Rotate270FlipH => "Rotate 270 + flip horizontal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::time::{Duration, SystemTime};

    fn uniq_path(label: &str, ext: &str) -> std::path::PathBuf {
        let ts = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        env::temp_dir().join(format!("metabox-image-{label}-{ts}.{ext}"))
    }

    #[test]
    fn reads_png_header() {
        let path = uniq_path("png", "png");
        image::RgbImage::new(7, 3).save(&path).unwrap();

        let probe = probe(&path).unwrap();
        assert_eq!((probe.width, probe.height), (7, 3));
        assert_eq!(probe.ifd.color_model, "RGB");
        assert_eq!(probe.ifd.bit_depth, 8);
        assert_eq!(probe.ifd.format.as_deref(), Some("Png"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn garbage_is_not_an_image() {
        let path = uniq_path("garbage", "png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(probe(&path).is_none());
        let _ = std::fs::remove_file(&path);
    }
}
