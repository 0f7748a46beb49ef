//! tracks peak and average power of the incoming frames
//!
//! The raw per-frame power also drives the autocorrelation energy gate:
//! below the configured floor the frame is treated as silence and no
//! candidates are produced.
use crate::dsp::get_frame_power_in_db;

use super::{peak_detector::PeakDetector, smoothing_filter::SmoothingFilter};

pub struct PowerMeter {
    peak: PeakDetector<f64>,
    avg: SmoothingFilter<f64>,
    last_power: f64,
    last_peak: f64,
    last_avg: f64,
}

impl PowerMeter {
    /// `frame_rate` is how many frames per second this meter will see
    pub fn build(frame_rate: f64) -> PowerMeter {
        PowerMeter {
            peak: PeakDetector::build(0.1, 2.5, frame_rate),
            avg: SmoothingFilter::build(0.5, frame_rate),
            last_power: 0.0,
            last_peak: -60.0,
            last_avg: -60.0,
        }
    }
    pub fn get_peak(&self) -> f64 {
        self.last_peak
    }
    pub fn get_avg(&self) -> f64 {
        self.last_avg
    }
    /// linear mean power of the most recent frame
    pub fn get_last_power(&self) -> f64 {
        self.last_power
    }
    pub fn add_frame(&mut self, frame: &[f64]) -> f64 {
        self.last_power = if frame.is_empty() {
            0.0
        } else {
            frame.iter().map(|v| v * v).sum::<f64>() / frame.len() as f64
        };
        let db = get_frame_power_in_db(frame);
        self.last_peak = self.peak.get(db);
        self.last_avg = self.avg.get(db);
        self.last_power
    }
}
