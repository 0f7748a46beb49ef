//! turns a raw block of 16-bit samples into a frame the estimators can use
//!
//! Steps: normalize to [-1, 1], optional band-pass (when the acquisition
//! path delivers unfiltered wideband audio), mean removal, Hann window.
//! Mean removal must happen before the autocorrelation sees the frame: a DC
//! offset biases the zero-lag and every other lag upward.
use super::band_filter::BandPassFilter;
use super::window::HannWindow;

const SAMPLE_SCALE: f64 = 1.0 / (i16::MAX as f64);

pub struct FramePreprocessor {
    window: HannWindow,
    band_filter: Option<BandPassFilter>,
}

impl FramePreprocessor {
    pub fn build(block_size: usize, band_filter: Option<BandPassFilter>) -> FramePreprocessor {
        FramePreprocessor {
            window: HannWindow::build(block_size),
            band_filter,
        }
    }

    /// Caller guarantees a non-empty, full-size block; short reads are
    /// handled upstream by skipping the pipeline cycle entirely.
    pub fn process(&mut self, block: &[i16]) -> Vec<f64> {
        let mut frame: Vec<f64> = block.iter().map(|s| *s as f64 * SAMPLE_SCALE).collect();
        if let Some(filter) = &mut self.band_filter {
            // filter state carries across blocks
            filter.process(&mut frame);
        }
        let mean = frame.iter().sum::<f64>() / frame.len() as f64;
        for sample in frame.iter_mut() {
            *sample -= mean;
        }
        self.window.apply(&mut frame);
        frame
    }

    pub fn has_band_filter(&self) -> bool {
        self.band_filter.is_some()
    }

    /// Swap the optional band-pass stage (enable, disable, or retune).
    /// Installing a fresh filter also clears its state.
    pub fn set_band_filter(&mut self, band_filter: Option<BandPassFilter>) -> () {
        self.band_filter = band_filter;
    }
}

#[cfg(test)]
mod test_preprocessor {
    use super::*;

    #[test]
    fn removes_dc_and_normalizes() {
        let mut prep = FramePreprocessor::build(1024, None);
        // constant positive offset plus a small wiggle
        let block: Vec<i16> = (0..1024)
            .map(|i| 8000 + if i % 2 == 0 { 100 } else { -100 })
            .collect();
        let frame = prep.process(&block);
        assert_eq!(frame.len(), 1024);
        let mean: f64 = frame.iter().sum::<f64>() / frame.len() as f64;
        assert!(mean.abs() < 1e-6);
        for v in &frame {
            assert!(v.abs() <= 1.0);
        }
    }

    #[test]
    fn windows_the_edges() {
        let mut prep = FramePreprocessor::build(256, None);
        let block: Vec<i16> = (0..256)
            .map(|i| (f64::sin(i as f64 * 0.3) * 20_000.0) as i16)
            .collect();
        let frame = prep.process(&block);
        assert_eq!(frame[0], 0.0);
        assert_eq!(frame[255], 0.0);
    }

    #[test]
    fn band_filter_is_applied_when_present() {
        let sample_rate = 44_100.0;
        let filter = BandPassFilter::build(150.0, 900.0, sample_rate);
        let mut filtered = FramePreprocessor::build(4096, Some(filter));
        let mut plain = FramePreprocessor::build(4096, None);
        // 8 kHz is far outside the band
        let block: Vec<i16> = (0..4096)
            .map(|i| (f64::sin(i as f64 * 2.0 * std::f64::consts::PI * 8_000.0 / sample_rate) * 20_000.0) as i16)
            .collect();
        let quiet: f64 = filtered.process(&block).iter().map(|v| v * v).sum();
        let loud: f64 = plain.process(&block).iter().map(|v| v * v).sum();
        println!("filtered energy: {} plain energy: {}", quiet, loud);
        assert!(quiet < loud / 100.0);
    }
}
