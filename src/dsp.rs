//! DSP building blocks for the detection pipeline: filters, window, power
//! tracking, and the two fundamental-frequency estimators.

pub mod autocorrelation;
pub mod band_filter;
pub mod biquad;
pub mod peak_detector;
pub mod peaks;
pub mod power_meter;
pub mod preprocessor;
pub mod smoothing_filter;
pub mod spectrum;
pub mod window;

use num::{Float, FromPrimitive};

/// one-pole coefficient for a time constant at a given update rate
pub fn get_coef<T: Float + FromPrimitive>(time_const: T, rate: T) -> T {
    let one = T::from_f64(1.0).unwrap();
    one - T::exp(-one / (time_const * rate))
}

/// mean power of a frame expressed in dB (floored so log is defined)
pub fn get_frame_power_in_db(frame: &[f64]) -> f64 {
    if frame.is_empty() {
        return -60.0;
    }
    let power = frame.iter().map(|v| v * v).sum::<f64>() / frame.len() as f64;
    10.0 * f64::log10(power.max(1e-12))
}

#[cfg(test)]
mod test_dsp_helpers {
    use super::*;

    #[test]
    fn coef_is_between_zero_and_one() {
        let coef: f64 = get_coef(0.1, 10.766);
        assert!(coef > 0.0 && coef < 1.0);
    }

    #[test]
    fn frame_power() {
        let frame = vec![1.0; 64];
        assert!((get_frame_power_in_db(&frame) - 0.0).abs() < 1e-9);
        let silence = vec![0.0; 64];
        assert!(get_frame_power_in_db(&silence) < -119.0);
    }
}
