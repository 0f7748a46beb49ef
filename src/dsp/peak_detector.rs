//! envelope tracker with separate attack and release time constants
//!
//! The spectrum display uses one of these to ride the dB ceiling of the
//! plot: fast attack when a pluck arrives, slow release as it decays.
use num::{Float, FromPrimitive, Zero};
use std::fmt::{self, Display};

use crate::dsp::get_coef;

pub struct PeakDetector<T = f64> {
    attack_coef: T,
    release_coef: T,
    peak_detector: T,
    last_output: T,
}

impl<T: Float + FromPrimitive> PeakDetector<T> {
    pub fn build(attack: T, release: T, rate: T) -> PeakDetector<T> {
        PeakDetector {
            attack_coef: get_coef(attack, rate),
            release_coef: get_coef(release, rate),
            peak_detector: Zero::zero(),
            last_output: Zero::zero(),
        }
    }

    pub fn init(&mut self, attack: T, release: T, rate: T) -> () {
        self.attack_coef = get_coef(attack, rate);
        self.release_coef = get_coef(release, rate);
    }

    pub fn get(&mut self, input: T) -> T {
        let one = T::from_f64(1.0).unwrap();
        if self.peak_detector < input {
            self.peak_detector = input * self.attack_coef + (one - self.attack_coef) * self.last_output;
        } else {
            self.peak_detector = input * self.release_coef + (one - self.release_coef) * self.last_output;
        }
        self.last_output = self.peak_detector;
        self.peak_detector
    }

    pub fn get_last_output(&self) -> T {
        self.last_output
    }
}

impl<T: Float + FromPrimitive + Display> Display for PeakDetector<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ attack: {}, release: {}, peak: {} }}",
            self.attack_coef, self.release_coef, self.peak_detector
        )
    }
}

#[cfg(test)]
mod test_peak_detector {
    use super::*;

    #[test]
    fn get_value() {
        let mut detector: PeakDetector<f64> = PeakDetector::build(0.1, 2.5, 10.766);
        assert_eq!(detector.get(0.0), 0.0);
        let samps = vec![0.2, 0.2, 0.4, 0.5, 0.6];
        for v in samps {
            detector.get(v);
        }
        assert!(detector.get(0.6) > 0.0);
    }

    #[test]
    fn decays_after_peak() {
        let mut detector: PeakDetector<f64> = PeakDetector::build(0.01, 1.0, 10.766);
        for _ in 0..20 {
            detector.get(1.0);
        }
        let at_peak = detector.get_last_output();
        for _ in 0..20 {
            detector.get(0.0);
        }
        assert!(detector.get_last_output() < at_peak);
    }
}
