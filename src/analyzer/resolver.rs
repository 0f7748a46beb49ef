//! fundamental resolver: turns raw candidates into a stable readout
//!
//! Two states: EMPTY (nothing worth showing) and HOLDING (a recent estimate
//! is on display, possibly stale).  Every cycle the resolver cross-checks
//! the autocorrelation candidates against the spectral peaks, runs the
//! debounce and band gates, and median-filters what survives.  A held
//! estimate that stops being refreshed decays back to EMPTY after the hold
//! timeout.
//!
//! The cross-check is what keeps octave errors out: autocorrelation alone
//! will happily lock onto a sub- or super-harmonic lag when a harmonic is
//! stronger than the fundamental, but such a lag has no matching spectral
//! peak and gets discarded.
//!
//! All timing comes in as explicit microsecond timestamps so the gates can
//! be driven with simulated time in tests.
use log::{debug, trace, warn};
use serde::Serialize;
use std::collections::VecDeque;

use crate::common::stream_time_stat::MicroTimer;
use crate::dsp::autocorrelation::FrequencyCandidate;
use crate::dsp::spectrum::SpectralPeak;
use crate::tension::TensionModel;

const NEWTONS_PER_KGF: f64 = 9.80665;

/// the current readout: empty, or a frequency with its tension
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct StabilizedEstimate {
    pub frequency: Option<f64>,
    pub tension: Option<f64>,
    #[serde(skip)]
    pub last_update: u128,
    #[serde(skip)]
    pub last_seen: u128,
}

impl StabilizedEstimate {
    pub fn is_empty(&self) -> bool {
        self.frequency.is_none()
    }
    /// tension in kilograms-force, the unit spoke tension meters print
    pub fn kgf(&self) -> Option<f64> {
        self.tension.map(|t| t / NEWTONS_PER_KGF)
    }
}

pub struct FundamentalResolver {
    freq_min: f64,
    freq_max: f64,
    match_tolerance: f64,
    peak_floor: f64,
    min_freq_change: f64,
    capacity: usize,
    history: VecDeque<f64>,
    update_timer: MicroTimer,
    hold_timer: MicroTimer,
    held: StabilizedEstimate,
}

impl FundamentalResolver {
    pub fn build(
        freq_min: f64,
        freq_max: f64,
        match_tolerance: f64,
        peak_floor: f64,
        min_freq_change: f64,
        min_update_interval_ms: u64,
        hold_duration_ms: u64,
        capacity: usize,
        now: u128,
    ) -> FundamentalResolver {
        FundamentalResolver {
            freq_min,
            freq_max,
            match_tolerance,
            peak_floor,
            min_freq_change,
            capacity,
            history: VecDeque::with_capacity(capacity),
            update_timer: MicroTimer::build(now, min_update_interval_ms as u128 * 1000),
            hold_timer: MicroTimer::build(now, hold_duration_ms as u128 * 1000),
            held: StabilizedEstimate::default(),
        }
    }

    /// Run one resolution cycle.  Returns the current readout, which is
    /// also what [`FundamentalResolver::held`] reports until the next cycle.
    pub fn resolve(
        &mut self,
        candidates: &[FrequencyCandidate],
        peaks: &[SpectralPeak],
        model: &TensionModel,
        now: u128,
    ) -> StabilizedEstimate {
        if let Some(freq) = self.select_candidate(candidates, peaks) {
            let update_allowed = self.update_timer.expired(now);
            let freq_diff_ok = match self.held.frequency {
                None => true,
                Some(f) => (freq - f).abs() > self.min_freq_change,
            };
            if update_allowed && freq_diff_ok {
                if self.freq_min < freq && freq < self.freq_max {
                    self.accept(freq, model, now);
                } else {
                    trace!("candidate {} Hz outside band, discarded", freq);
                }
            }
        }

        // hold timeout runs regardless of what happened above
        if !self.held.is_empty() && self.hold_timer.expired(now) {
            debug!(
                "estimate held {} ms without refresh, going empty",
                self.hold_timer.since(now) / 1000
            );
            self.held = StabilizedEstimate::default();
            self.history.clear();
        }
        self.held
    }

    /// current readout without running a cycle
    pub fn held(&self) -> StabilizedEstimate {
        self.held
    }

    pub fn set_band(&mut self, freq_min: f64, freq_max: f64) -> () {
        self.freq_min = freq_min;
        self.freq_max = freq_max;
    }

    /// First autocorrelation candidate that an independent spectral peak
    /// agrees with.  Candidates come in ranked by strength, so the first
    /// match is the best one.
    fn select_candidate(
        &self,
        candidates: &[FrequencyCandidate],
        peaks: &[SpectralPeak],
    ) -> Option<f64> {
        for candidate in candidates {
            let confirmed = peaks.iter().any(|peak| {
                peak.magnitude > self.peak_floor
                    && (peak.frequency - candidate.frequency).abs() <= self.match_tolerance
            });
            if confirmed {
                return Some(candidate.frequency);
            }
            trace!(
                "candidate {} Hz has no spectral confirmation",
                candidate.frequency
            );
        }
        None
    }

    fn accept(&mut self, freq: f64, model: &TensionModel, now: u128) -> () {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(freq);
        let median = median_of(&self.history);
        match model.tension(median) {
            Ok(tension) => {
                self.held = StabilizedEstimate {
                    frequency: Some(median),
                    tension: Some(tension),
                    last_update: now,
                    last_seen: now,
                };
                self.update_timer.reset(now);
                self.hold_timer.reset(now);
                debug!("accepted {} Hz, median {} Hz, {} N", freq, median, tension);
            }
            Err(e) => {
                // can't happen for an in-band frequency, but don't hold a
                // readout we couldn't map
                warn!("tension mapping failed for {} Hz: {}", median, e);
            }
        }
    }
}

fn median_of(history: &VecDeque<f64>) -> f64 {
    let mut sorted: Vec<f64> = history.iter().cloned().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}
