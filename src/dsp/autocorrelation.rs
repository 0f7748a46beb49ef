//! autocorrelation estimator: periodicity candidates in a lag window
//!
//! The linear autocorrelation is computed by zero-padding the frame to twice
//! its length and going through the frequency domain (forward FFT, power
//! spectrum, inverse FFT).  Only lags inside the window derived from the
//! detection band are searched; candidates get sub-sample lag refinement by
//! parabolic interpolation before conversion to frequency.
use log::{trace, warn};
use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use simple_error::bail;
use std::sync::Arc;

use super::peaks::{find_local_maxima, parabolic_offset};
use crate::common::box_error::BoxError;

#[derive(Debug, Clone, Copy)]
pub struct FrequencyCandidate {
    pub frequency: f64,
    /// normalized correlation at the peak, 1.0 for the strongest lag
    pub strength: f64,
    pub lag: f64,
}

pub struct AutocorrelationEstimator {
    size: usize,
    sample_rate: f64,
    min_lag: usize,
    max_lag: usize,
    max_candidates: usize,
    power_floor: f64,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
    input_buf: Vec<f64>,
    freq_buf: Vec<Complex<f64>>,
    scratch_fwd: Vec<Complex<f64>>,
    scratch_inv: Vec<Complex<f64>>,
    ac_buf: Vec<f64>,
}

impl AutocorrelationEstimator {
    pub fn build(
        size: usize,
        sample_rate: f64,
        freq_min: f64,
        freq_max: f64,
        max_candidates: usize,
        power_floor: f64,
    ) -> Result<AutocorrelationEstimator, BoxError> {
        let padded = size * 2;
        let mut planner = RealFftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(padded);
        let inverse = planner.plan_fft_inverse(padded);
        let input_buf = forward.make_input_vec();
        let freq_buf = forward.make_output_vec();
        let scratch_fwd = forward.make_scratch_vec();
        let scratch_inv = inverse.make_scratch_vec();
        let ac_buf = inverse.make_output_vec();
        let mut estimator = AutocorrelationEstimator {
            size,
            sample_rate,
            min_lag: 0,
            max_lag: 0,
            max_candidates,
            power_floor,
            forward,
            inverse,
            input_buf,
            freq_buf,
            scratch_fwd,
            scratch_inv,
            ac_buf,
        };
        estimator.set_band(freq_min, freq_max)?;
        Ok(estimator)
    }

    /// Re-derive the lag window from a new detection band.  Fails rather
    /// than leaving the estimator with a degenerate window.
    pub fn set_band(&mut self, freq_min: f64, freq_max: f64) -> Result<(), BoxError> {
        if freq_min <= 0.0 || freq_max <= 0.0 || freq_min >= freq_max {
            bail!("invalid detection band [{}, {}] Hz", freq_min, freq_max);
        }
        let min_lag = (self.sample_rate / freq_max) as usize;
        let max_lag = (self.sample_rate / freq_min) as usize;
        if min_lag < 1 {
            bail!("band top {} Hz is above the lag resolution", freq_max);
        }
        if max_lag >= self.size {
            bail!(
                "band bottom {} Hz needs lag {} but the block only holds {}",
                freq_min,
                max_lag,
                self.size
            );
        }
        if min_lag >= max_lag {
            bail!("degenerate lag window [{}, {}]", min_lag, max_lag);
        }
        self.min_lag = min_lag;
        self.max_lag = max_lag;
        Ok(())
    }

    pub fn get_min_lag(&self) -> usize {
        self.min_lag
    }
    pub fn get_max_lag(&self) -> usize {
        self.max_lag
    }

    /// Candidates ranked by correlation strength, strongest first.  An
    /// empty result is the normal "no signal" outcome, never an error.
    pub fn detect(&mut self, frame: &[f64]) -> Vec<FrequencyCandidate> {
        if frame.len() != self.size {
            warn!(
                "autocorrelation got {} samples, expected {}",
                frame.len(),
                self.size
            );
            return vec![];
        }
        let power = frame.iter().map(|v| v * v).sum::<f64>() / frame.len() as f64;
        if power < self.power_floor {
            trace!("frame power {} below floor, gating detection", power);
            return vec![];
        }

        // zero-padded forward FFT; the pad keeps the correlation linear
        // instead of circular
        self.input_buf[..self.size].copy_from_slice(frame);
        for v in self.input_buf[self.size..].iter_mut() {
            *v = 0.0;
        }
        if self
            .forward
            .process_with_scratch(&mut self.input_buf, &mut self.freq_buf, &mut self.scratch_fwd)
            .is_err()
        {
            warn!("fft failed, skipping autocorrelation");
            return vec![];
        }
        for bin in self.freq_buf.iter_mut() {
            *bin = Complex::new(bin.norm_sqr(), 0.0);
        }
        if self
            .inverse
            .process_with_scratch(&mut self.freq_buf, &mut self.ac_buf, &mut self.scratch_inv)
            .is_err()
        {
            warn!("inverse fft failed, skipping autocorrelation");
            return vec![];
        }

        // non-negative-lag half, short periods excluded
        for v in self.ac_buf[..self.min_lag].iter_mut() {
            *v = 0.0;
        }
        let window = &self.ac_buf[self.min_lag..=self.max_lag];
        let max = window.iter().cloned().fold(f64::MIN, f64::max);
        if max <= 0.0 {
            // silence or a degenerate signal, a valid "no signal" outcome
            return vec![];
        }
        let normalized: Vec<f64> = window.iter().map(|v| v / max).collect();

        let mut maxima = find_local_maxima(&normalized, 0.0);
        if maxima.is_empty() {
            // monotonic window: fall back to the raw argmax, which may sit
            // on the window edge and then skips interpolation
            let mut best = 0;
            for (i, v) in normalized.iter().enumerate() {
                if *v > normalized[best] {
                    best = i;
                }
            }
            maxima.push(best);
        }
        maxima.sort_by(|a, b| {
            normalized[*b]
                .partial_cmp(&normalized[*a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        maxima.truncate(self.max_candidates);

        let mut candidates: Vec<FrequencyCandidate> = vec![];
        for p in maxima {
            let offset = if p > 0 && p + 1 < normalized.len() {
                parabolic_offset(normalized[p - 1], normalized[p], normalized[p + 1])
            } else {
                0.0
            };
            let lag = (self.min_lag + p) as f64 + offset;
            if lag <= 0.0 {
                // undefined frequency, drop this peak
                continue;
            }
            candidates.push(FrequencyCandidate {
                frequency: self.sample_rate / lag,
                strength: normalized[p],
                lag,
            });
        }
        candidates
    }
}
