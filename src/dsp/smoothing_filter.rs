//! one-pole smoothing used to settle readout values between frames
use num::{Float, FromPrimitive, Zero};
use std::fmt::{self, Display};

use crate::dsp::get_coef;

pub struct SmoothingFilter<T = f64> {
    coef: T,
    last_output: T,
}

impl<T: Float + FromPrimitive> SmoothingFilter<T> {
    pub fn build(time_const: T, rate: T) -> SmoothingFilter<T> {
        SmoothingFilter {
            coef: get_coef(time_const, rate),
            last_output: Zero::zero(),
        }
    }

    pub fn get(&mut self, input: T) -> T {
        let one = T::from_i32(1).unwrap();
        self.last_output = input * self.coef + (one - self.coef) * self.last_output;
        self.last_output
    }
    pub fn get_last_output(&self) -> T {
        self.last_output
    }
}

impl<T: Float + FromPrimitive + Display> Display for SmoothingFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ coef: {}, last_output: {} }}",
            self.coef, self.last_output
        )
    }
}

#[cfg(test)]
mod test_smoothing_filter {
    use super::*;

    #[test]
    fn get_value() {
        // block cadence of the analyzer: 44100 / 4096
        let mut filter = SmoothingFilter::build(0.5, 10.766);
        assert_eq!(filter.get(0.0), 0.0);
        let samps = vec![420.0, 430.0, 440.0, 440.0, 440.0];
        let mut out = 0.0;
        for v in samps {
            out = filter.get(v);
        }
        // should be pulled toward the input but still settling
        assert!(out > 0.0);
        assert!(out < 440.0);
    }
}
