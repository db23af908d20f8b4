//! Encoding parameters.
//!
//! [`Quality`] is the normalized fidelity knob shared by the preview
//! controller, the encoders and the cache. It is always inside `[0.0, 1.0]`:
//! every constructor clamps, so an encoder never has to validate it.
//!
//! ## Slider polarity
//!
//! The UI slider is a **compression percent**: 0% keeps maximal fidelity,
//! 100% compresses as hard as the codec allows. The mapping lives in exactly
//! one place, [`Quality::from_compression_percent`], and its inverse
//! [`Quality::compression_percent`] drives labels such as `Compressed (40%)`.

/// Normalized lossy-encoding fidelity: 1.0 = best quality, 0.0 = smallest output.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    pub const MIN: Quality = Quality(0.0);
    pub const MAX: Quality = Quality(1.0);

    /// Clamp `value` into `[0.0, 1.0]`. NaN is treated as 0.0.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Map a slider position in `[0, 100]` to a quality: `1 - percent / 100`.
    ///
    /// Out-of-range slider values are clamped to the slider's bounds first.
    pub fn from_compression_percent(percent: f64) -> Self {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        Self::new((1.0 - percent / 100.0) as f32)
    }

    /// Slider position (0–100) that maps back to this quality.
    pub fn compression_percent(self) -> u8 {
        ((1.0 - self.0) * 100.0).round() as u8
    }

    /// Codec quality in `1..=100`, the scale libjpeg-style encoders take.
    pub fn codec_value(self) -> u8 {
        1 + (self.0 * 99.0).round() as u8
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(-0.5).value(), 0.0);
        assert_eq!(Quality::new(0.25).value(), 0.25);
        assert_eq!(Quality::new(7.0).value(), 1.0);
    }

    #[test]
    fn nan_quality_is_minimum() {
        assert_eq!(Quality::new(f32::NAN), Quality::MIN);
        assert_eq!(Quality::from_compression_percent(f64::NAN), Quality::MAX);
    }

    #[test]
    fn quality_default_is_maximum() {
        assert_eq!(Quality::default(), Quality::MAX);
    }

    #[test]
    fn higher_compression_means_lower_quality() {
        assert_eq!(Quality::from_compression_percent(0.0), Quality::MAX);
        assert_eq!(Quality::from_compression_percent(100.0), Quality::MIN);
        assert_eq!(Quality::from_compression_percent(25.0).value(), 0.75);
        assert!(
            Quality::from_compression_percent(60.0) < Quality::from_compression_percent(40.0)
        );
    }

    #[test]
    fn slider_values_outside_range_are_clamped() {
        assert_eq!(Quality::from_compression_percent(-20.0), Quality::MAX);
        assert_eq!(Quality::from_compression_percent(180.0), Quality::MIN);
    }

    #[test]
    fn compression_percent_round_trips_slider_positions() {
        for percent in [0u8, 1, 33, 40, 50, 99, 100] {
            let quality = Quality::from_compression_percent(percent as f64);
            assert_eq!(quality.compression_percent(), percent);
        }
    }

    #[test]
    fn codec_value_covers_codec_range() {
        assert_eq!(Quality::MIN.codec_value(), 1);
        assert_eq!(Quality::MAX.codec_value(), 100);
        assert_eq!(Quality::new(0.5).codec_value(), 51);
    }
}
