//! the TensionEngine aggregates the whole pipeline into one structure
//!
//! The streaming loop calls [`TensionEngine::process`] once per rolling
//! block and reads the stabilized estimate back.  Configuration changes
//! arrive as [`ParamMessage`]s; a band or wire change re-derives the lag
//! window, resets the smoothed spectrum, and rebuilds the optional
//! band-pass stage so no stale state leaks across the change.
use log::{info, warn};
use serde_json::json;

use super::param_message::{AnalyzerParam, ParamMessage};
use super::resolver::{FundamentalResolver, StabilizedEstimate};
use super::settings::AnalyzerSettings;
use crate::common::box_error::BoxError;
use crate::dsp::autocorrelation::AutocorrelationEstimator;
use crate::dsp::band_filter::BandPassFilter;
use crate::dsp::power_meter::PowerMeter;
use crate::dsp::preprocessor::FramePreprocessor;
use crate::dsp::spectrum::SpectralEstimator;
use crate::tension::TensionModel;

pub struct TensionEngine {
    settings: AnalyzerSettings,
    model: TensionModel,
    preprocessor: FramePreprocessor,
    spectral: SpectralEstimator,
    autocorr: AutocorrelationEstimator,
    resolver: FundamentalResolver,
    power: PowerMeter,
    freq_min: f64,
    freq_max: f64,
    running: bool,
}

impl TensionEngine {
    pub fn build(settings: AnalyzerSettings, now: u128) -> Result<TensionEngine, BoxError> {
        settings.validate()?;
        let model = TensionModel::build(settings.wire)?;
        let (freq_min, freq_max) = settings.freq_band(&model)?;
        let sample_rate = settings.sample_rate as f64;

        let band_filter = if settings.band_pass_enabled {
            Some(BandPassFilter::build(freq_min, freq_max, sample_rate))
        } else {
            None
        };
        let preprocessor = FramePreprocessor::build(settings.block_size, band_filter);
        let spectral = SpectralEstimator::build(
            settings.block_size,
            sample_rate,
            settings.alpha,
            settings.spectral_peak_floor,
            settings.max_spectral_peaks,
        );
        let autocorr = AutocorrelationEstimator::build(
            settings.block_size,
            sample_rate,
            freq_min,
            freq_max,
            settings.max_candidates,
            settings.frame_power_floor,
        )?;
        let resolver = FundamentalResolver::build(
            freq_min,
            freq_max,
            settings.match_tolerance,
            settings.spectral_peak_floor,
            settings.min_freq_change,
            settings.min_update_interval_ms,
            settings.hold_duration_ms,
            settings.history_capacity,
            now,
        );
        let power = PowerMeter::build(settings.frame_rate());
        info!(
            "engine up: {} Hz blocks of {}, band {:.1}..{:.1} Hz",
            settings.sample_rate, settings.block_size, freq_min, freq_max
        );
        Ok(TensionEngine {
            settings,
            model,
            preprocessor,
            spectral,
            autocorr,
            resolver,
            power,
            freq_min,
            freq_max,
            running: true,
        })
    }

    /// Run one pipeline pass over a full block.  Short blocks are a "no new
    /// data" cycle and leave all state untouched.
    pub fn process(&mut self, block: &[i16], now: u128) -> StabilizedEstimate {
        if block.len() != self.settings.block_size {
            warn!(
                "skipping block of {} samples, expected {}",
                block.len(),
                self.settings.block_size
            );
            return self.resolver.held();
        }
        let frame = self.preprocessor.process(block);
        self.power.add_frame(&frame);
        self.spectral.update(&frame);
        let peaks = self.spectral.peaks();
        let candidates = self.autocorr.detect(&frame);
        self.resolver.resolve(&candidates, &peaks, &self.model, now)
    }

    pub fn readout(&self) -> StabilizedEstimate {
        self.resolver.held()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn get_band(&self) -> (f64, f64) {
        (self.freq_min, self.freq_max)
    }

    pub fn get_settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// spectrum view for the presentation layer
    pub fn spectrum_db(&self) -> Vec<f64> {
        self.spectral.smoothed_db()
    }

    pub fn handle_param(&mut self, msg: &ParamMessage) -> Result<(), BoxError> {
        match msg.param {
            AnalyzerParam::SetWireLength => {
                self.model.set_length(msg.fvalue_1)?;
                self.settings.wire.length = msg.fvalue_1;
                self.apply_band()?;
            }
            AnalyzerParam::SetTensionBand => {
                if msg.fvalue_1 <= 0.0 || msg.fvalue_1 >= msg.fvalue_2 {
                    simple_error::bail!(
                        "bad tension band [{}, {}]",
                        msg.fvalue_1,
                        msg.fvalue_2
                    );
                }
                self.settings.tension_min = msg.fvalue_1;
                self.settings.tension_max = msg.fvalue_2;
                self.apply_band()?;
            }
            AnalyzerParam::SetFrequencyBand => {
                // keep the tension range canonical: convert the edges back
                // through the model so a later wire change re-derives them
                self.settings.tension_min = self.model.tension(msg.fvalue_1)?;
                self.settings.tension_max = self.model.tension(msg.fvalue_2)?;
                self.apply_band()?;
            }
            AnalyzerParam::SetBandPass => {
                self.settings.band_pass_enabled = msg.fvalue_1 != 0.0;
                self.refresh_band_filter();
            }
            AnalyzerParam::Shutdown => {
                info!("engine shutdown requested");
                self.running = false;
            }
        }
        Ok(())
    }

    /// Re-derive everything that depends on the detection band.  The
    /// smoothed spectrum is reset so magnitudes from the old band don't
    /// leak into the new one.
    fn apply_band(&mut self) -> Result<(), BoxError> {
        let (freq_min, freq_max) = self.settings.freq_band(&self.model)?;
        self.autocorr.set_band(freq_min, freq_max)?;
        self.freq_min = freq_min;
        self.freq_max = freq_max;
        self.resolver.set_band(freq_min, freq_max);
        self.spectral.reset();
        self.refresh_band_filter();
        info!("detection band now {:.1}..{:.1} Hz", freq_min, freq_max);
        Ok(())
    }

    fn refresh_band_filter(&mut self) -> () {
        let filter = if self.settings.band_pass_enabled {
            Some(BandPassFilter::build(
                self.freq_min,
                self.freq_max,
                self.settings.sample_rate as f64,
            ))
        } else {
            None
        };
        self.preprocessor.set_band_filter(filter);
    }

    /// status message for the presentation sink
    pub fn status_json(&self) -> serde_json::Value {
        let readout = self.readout();
        json!({
            "readout": {
                "frequency": readout.frequency,
                "tension": readout.tension,
                "kgf": readout.kgf(),
            },
            "power": {
                "peak": self.power.get_peak(),
                "avg": self.power.get_avg(),
            },
            "spectrum": {
                "bin_width": self.spectral.bin_width(),
                "ceiling": self.spectral.get_display_ceiling(),
                "db": self.spectrum_db(),
            },
        })
    }
}
