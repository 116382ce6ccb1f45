use crate::strip::types::{
    ControlLine, StripError, StripReaderConfig, StripReading, StripRegion,
};
use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, Luma};
use tracing::{debug, warn};

/// Reads the T/C intensity ratio off a horizontally photographed strip.
/// The test line is expected in the left half, the control line in the right.
#[derive(Debug, Clone, Default)]
pub struct StripReader {
    config: StripReaderConfig,
}

impl StripReader {
    pub fn new(config: StripReaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StripReaderConfig {
        &self.config
    }

    /// Decode JPEG/PNG bytes and analyze them.
    pub fn analyze(&self, image_bytes: &[u8]) -> Result<StripReading, StripError> {
        let format = image::guess_format(image_bytes)?;
        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
            return Err(StripError::UnsupportedFormat(format));
        }
        let img = image::load_from_memory_with_format(image_bytes, format)?;
        self.analyze_image(&img)
    }

    pub fn analyze_image(&self, img: &DynamicImage) -> Result<StripReading, StripError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(StripError::DegenerateImage { width, height });
        }
        Ok(self.analyze_luma(&bt601_luma(img)))
    }

    fn analyze_luma(&self, luma: &GrayImage) -> StripReading {
        let w = luma.width();
        let mid = w / 2;
        // Past half the width both regions are empty anyway.
        let fraction = self.config.margin_fraction.clamp(0.0, 0.5);
        let margin = (w as f64 * fraction).round() as u32;

        let test = column_profile(luma, margin, mid.saturating_sub(margin));
        let control = column_profile(luma, mid.saturating_add(margin), w.saturating_sub(margin));

        let test_peak = test.peak();
        let control_peak = control.peak();

        let (denominator, control_state) = if control_peak < self.config.control_floor {
            warn!(
                control_peak,
                floor = self.config.control_floor,
                "Control line unreadable, using fallback denominator"
            );
            (self.config.control_fallback, ControlLine::Unreadable)
        } else {
            (control_peak, ControlLine::Detected)
        };

        let ratio = test_peak / denominator;
        let level = self.config.thresholds.classify(ratio);

        debug!(
            width = w,
            height = luma.height(),
            test_peak,
            control_peak,
            ratio,
            level = %level,
            "Strip analyzed"
        );

        StripReading {
            ratio,
            level,
            control: control_state,
            test_peak,
            control_peak,
        }
    }
}

/// BT.601 luma (0.299 R + 0.587 G + 0.114 B), rounded, rather than the
/// Rec. 709 weights of `to_luma8`. Ratios for coloured lines depend on it.
fn bt601_luma(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
        Luma([((weighted + 500) / 1000) as u8])
    })
}

/// Per-column mean of inverted luminance over `[start, end)`.
/// Dark ink becomes high intensity. An inverted range yields an empty region.
fn column_profile(luma: &GrayImage, start: u32, end: u32) -> StripRegion {
    let height = luma.height() as f64;
    let profile = (start..end.max(start))
        .map(|x| {
            let sum: u32 = (0..luma.height())
                .map(|y| 255 - luma.get_pixel(x, y)[0] as u32)
                .sum();
            sum as f64 / height
        })
        .collect();

    StripRegion { start, end, profile }
}
