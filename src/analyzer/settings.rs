//! validated analyzer configuration
//!
//! Everything tunable about the pipeline lives here: stream geometry,
//! detection band (expressed as a tension range and converted through the
//! wire model), smoothing, debounce timing, and the wire itself.  Values
//! come from compiled-in defaults overridden by a settings.json file; all
//! of it is validated before streaming starts so a bad band or geometry is
//! a startup failure, not a runtime surprise.
use simple_error::bail;

use crate::common::box_error::BoxError;
use crate::common::config::Config;
use crate::tension::{TensionModel, WireParams};

#[derive(Debug, Clone, Copy)]
pub struct AnalyzerSettings {
    pub sample_rate: u32,
    pub block_size: usize,
    /// fraction of each block shared with the previous one, 0.75 means the
    /// window advances a quarter block per hop
    pub overlap: f64,
    /// exponential smoothing factor for the spectrum
    pub alpha: f64,
    pub spectral_peak_floor: f64,
    pub max_spectral_peaks: usize,
    pub max_candidates: usize,
    pub frame_power_floor: f64,
    /// agreement tolerance between the two estimators, Hz
    pub match_tolerance: f64,
    pub min_update_interval_ms: u64,
    pub min_freq_change: f64,
    pub hold_duration_ms: u64,
    pub history_capacity: usize,
    /// detection band expressed as spoke tensions, Newtons
    pub tension_min: f64,
    pub tension_max: f64,
    pub wire: WireParams,
    pub band_pass_enabled: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> AnalyzerSettings {
        AnalyzerSettings {
            sample_rate: 44_100,
            block_size: 4096,
            overlap: 0.75,
            alpha: 0.5,
            spectral_peak_floor: 0.005,
            max_spectral_peaks: 5,
            max_candidates: 3,
            frame_power_floor: 1e-6,
            match_tolerance: 8.0,
            min_update_interval_ms: 300,
            min_freq_change: 5.0,
            hold_duration_ms: 1000,
            history_capacity: 3,
            tension_min: 100.0,
            tension_max: 3000.0,
            wire: WireParams::default(),
            band_pass_enabled: false,
        }
    }
}

impl AnalyzerSettings {
    /// Build settings from a config file, falling back to the defaults for
    /// any key the file doesn't override.
    pub fn from_config(config: &Config) -> Result<AnalyzerSettings, BoxError> {
        let defaults = AnalyzerSettings::default();
        let settings = AnalyzerSettings {
            sample_rate: config.get_u32_value("sample_rate", Some(defaults.sample_rate))?,
            block_size: config.get_u32_value("block_size", Some(defaults.block_size as u32))? as usize,
            overlap: config.get_f64_value("overlap", Some(defaults.overlap))?,
            alpha: config.get_f64_value("alpha", Some(defaults.alpha))?,
            spectral_peak_floor: config
                .get_f64_value("spectral_peak_floor", Some(defaults.spectral_peak_floor))?,
            max_spectral_peaks: config
                .get_u32_value("max_spectral_peaks", Some(defaults.max_spectral_peaks as u32))?
                as usize,
            max_candidates: config
                .get_u32_value("max_candidates", Some(defaults.max_candidates as u32))?
                as usize,
            frame_power_floor: config
                .get_f64_value("frame_power_floor", Some(defaults.frame_power_floor))?,
            match_tolerance: config.get_f64_value("match_tolerance", Some(defaults.match_tolerance))?,
            min_update_interval_ms: config
                .get_u32_value("min_update_interval_ms", Some(defaults.min_update_interval_ms as u32))?
                as u64,
            min_freq_change: config.get_f64_value("min_freq_change", Some(defaults.min_freq_change))?,
            hold_duration_ms: config
                .get_u32_value("hold_duration_ms", Some(defaults.hold_duration_ms as u32))?
                as u64,
            history_capacity: config
                .get_u32_value("history_capacity", Some(defaults.history_capacity as u32))?
                as usize,
            tension_min: config.get_f64_value("tension_min", Some(defaults.tension_min))?,
            tension_max: config.get_f64_value("tension_max", Some(defaults.tension_max))?,
            wire: WireParams {
                density: config.get_f64_value("wire_density", Some(defaults.wire.density))?,
                diameter: config.get_f64_value("wire_diameter", Some(defaults.wire.diameter))?,
                length: config.get_f64_value("wire_length", Some(defaults.wire.length))?,
            },
            band_pass_enabled: config
                .get_bool_value("band_pass_enabled", Some(defaults.band_pass_enabled))?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject anything that would put the pipeline in a degenerate state.
    /// Called before streaming starts; the lag window gets its own check
    /// when the autocorrelation estimator derives it.
    pub fn validate(&self) -> Result<(), BoxError> {
        if self.sample_rate == 0 {
            bail!("sample_rate must be positive");
        }
        if self.block_size < 16 {
            bail!("block_size {} is too small to analyze", self.block_size);
        }
        if !(0.0..1.0).contains(&self.overlap) {
            bail!("overlap {} must be in [0, 1)", self.overlap);
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            bail!("alpha {} must be in (0, 1]", self.alpha);
        }
        if self.history_capacity < 1 {
            bail!("history_capacity must be at least 1");
        }
        if self.tension_min <= 0.0 || self.tension_max <= 0.0 || self.tension_min >= self.tension_max
        {
            bail!(
                "tension band [{}, {}] N must be positive and ordered",
                self.tension_min,
                self.tension_max
            );
        }
        if self.match_tolerance <= 0.0 {
            bail!("match_tolerance must be positive");
        }
        if self.min_freq_change < 0.0 {
            bail!("min_freq_change must not be negative");
        }
        self.wire.validate()?;
        Ok(())
    }

    /// samples the rolling window advances per pipeline pass
    pub fn hop_size(&self) -> usize {
        let hop = (self.block_size as f64 * (1.0 - self.overlap)) as usize;
        hop.max(1)
    }

    /// nominal pipeline passes per second
    pub fn frame_rate(&self) -> f64 {
        self.sample_rate as f64 / self.hop_size() as f64
    }

    /// detection band in Hz, derived from the tension band through the wire
    pub fn freq_band(&self, model: &TensionModel) -> Result<(f64, f64), BoxError> {
        let freq_min = model.frequency(self.tension_min)?;
        let freq_max = model.frequency(self.tension_max)?;
        Ok((freq_min, freq_max))
    }
}

#[cfg(test)]
mod test_settings {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = AnalyzerSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.hop_size(), 1024);
        assert!((settings.frame_rate() - 43.066).abs() < 0.01);
    }

    #[test]
    fn band_comes_from_tension_range() {
        let settings = AnalyzerSettings::default();
        let model = TensionModel::build(settings.wire).unwrap();
        let (freq_min, freq_max) = settings.freq_band(&model).unwrap();
        // 100 N .. 3000 N on the default spoke
        assert!((freq_min - 157.7).abs() < 0.1);
        assert!((freq_max - 863.7).abs() < 0.1);
        assert!(freq_min < freq_max);
    }

    #[test]
    fn rejects_bad_settings() {
        let mut settings = AnalyzerSettings::default();
        settings.tension_min = 3000.0;
        settings.tension_max = 100.0;
        assert!(settings.validate().is_err());

        let mut settings = AnalyzerSettings::default();
        settings.alpha = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = AnalyzerSettings::default();
        settings.overlap = 1.0;
        assert!(settings.validate().is_err());

        let mut settings = AnalyzerSettings::default();
        settings.wire.length = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn from_config_overrides_defaults() {
        let mut config =
            Config::build("no_such_settings_file.json".to_string(), json::object! {}).unwrap();
        config.set_value("wire_length", 0.185).unwrap();
        config.set_value("hold_duration_ms", 2000).unwrap();
        let settings = AnalyzerSettings::from_config(&config).unwrap();
        assert_eq!(settings.wire.length, 0.185);
        assert_eq!(settings.hold_duration_ms, 2000);
        // untouched keys keep their defaults
        assert_eq!(settings.sample_rate, 44_100);
    }

    #[test]
    fn zero_overlap_means_full_hop() {
        let mut settings = AnalyzerSettings::default();
        settings.overlap = 0.0;
        assert_eq!(settings.hop_size(), settings.block_size);
    }
}
