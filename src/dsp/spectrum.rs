//! spectral estimator: magnitude spectrum with exponential smoothing
//!
//! Runs a real-input FFT over each windowed frame, smooths the magnitudes
//! across frames, and picks the strongest local maxima.  The smoothed
//! magnitude array is the one piece of persistent state here; it is zeroed
//! at startup and again whenever the detection band is reconfigured.
use log::warn;
use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

use super::peak_detector::PeakDetector;
use super::peaks::find_local_maxima;

/// floor applied to magnitudes so dB conversion is always defined
pub const MAG_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct SpectralPeak {
    pub frequency: f64,
    pub magnitude: f64,
}

pub struct SpectralEstimator {
    size: usize,
    sample_rate: f64,
    alpha: f64,
    peak_floor: f64,
    max_peaks: usize,
    plan: Arc<dyn RealToComplex<f64>>,
    input_buf: Vec<f64>,
    spectrum_buf: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    smoothed: Vec<f64>,
    display_ceiling: PeakDetector<f64>,
}

impl SpectralEstimator {
    pub fn build(
        size: usize,
        sample_rate: f64,
        alpha: f64,
        peak_floor: f64,
        max_peaks: usize,
    ) -> SpectralEstimator {
        let mut planner = RealFftPlanner::<f64>::new();
        let plan = planner.plan_fft_forward(size);
        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();
        let bins = spectrum_buf.len();
        let frame_rate = sample_rate / size as f64;
        SpectralEstimator {
            size,
            sample_rate,
            alpha,
            peak_floor,
            max_peaks,
            plan,
            input_buf,
            spectrum_buf,
            scratch,
            smoothed: vec![0.0; bins],
            display_ceiling: PeakDetector::build(0.1, 5.0, frame_rate),
        }
    }

    /// Fold one windowed frame into the smoothed spectrum.
    pub fn update(&mut self, frame: &[f64]) -> () {
        if frame.len() != self.size {
            warn!(
                "spectral estimator got {} samples, expected {}",
                frame.len(),
                self.size
            );
            return;
        }
        self.input_buf.copy_from_slice(frame);
        if self
            .plan
            .process_with_scratch(&mut self.input_buf, &mut self.spectrum_buf, &mut self.scratch)
            .is_err()
        {
            warn!("fft failed, skipping spectral update");
            return;
        }
        let scale = 1.0 / self.size as f64;
        let mut ceiling = -120.0;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(self.spectrum_buf.iter()) {
            let magnitude = (bin.norm() * scale).max(MAG_FLOOR);
            *smoothed = (1.0 - self.alpha) * *smoothed + self.alpha * magnitude;
            let db = 20.0 * f64::log10(smoothed.max(MAG_FLOOR));
            if db > ceiling {
                ceiling = db;
            }
        }
        self.display_ceiling.get(ceiling);
    }

    /// Strongest local maxima of the smoothed spectrum, amplitude floor
    /// applied, strongest first.
    pub fn peaks(&self) -> Vec<SpectralPeak> {
        let mut indexes = find_local_maxima(&self.smoothed, self.peak_floor);
        indexes.sort_by(|a, b| {
            self.smoothed[*b]
                .partial_cmp(&self.smoothed[*a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        indexes.truncate(self.max_peaks);
        indexes
            .iter()
            .map(|i| SpectralPeak {
                frequency: self.bin_frequency(*i),
                magnitude: self.smoothed[*i],
            })
            .collect()
    }

    pub fn bin_width(&self) -> f64 {
        self.sample_rate / self.size as f64
    }

    pub fn bin_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.bin_width()
    }

    pub fn smoothed(&self) -> &[f64] {
        &self.smoothed
    }

    /// smoothed spectrum in dB for the presentation layer
    pub fn smoothed_db(&self) -> Vec<f64> {
        self.smoothed
            .iter()
            .map(|m| 20.0 * f64::log10(m.max(MAG_FLOOR)))
            .collect()
    }

    /// tracked dB ceiling of the plot, rides up fast and decays slowly
    pub fn get_display_ceiling(&self) -> f64 {
        self.display_ceiling.get_last_output()
    }

    /// Zero the smoothing state.  Required on any band reconfiguration so
    /// stale magnitudes don't leak across the change.
    pub fn reset(&mut self) -> () {
        for v in self.smoothed.iter_mut() {
            *v = 0.0;
        }
    }
}
