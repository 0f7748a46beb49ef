//! taut-wire physics: frequency to tension and back
//!
//! A spoke is modeled as a uniform wire fixed at both ends vibrating in its
//! fundamental mode.  With linear mass density `mu = rho * pi * (d/2)^2`:
//!
//! ```text
//! tension(f)   = 4 * L^2 * f^2 * mu
//! frequency(T) = sqrt(T / mu) / (2 * L)
//! ```
//!
//! The two mappings are exact inverses.  Inputs outside the physical domain
//! (zero or negative) are rejected explicitly instead of silently producing
//! NaN.
use std::error::Error;
use std::f64::consts::PI;
use std::fmt;

#[derive(Debug)]
pub enum TensionError {
    InvalidInput { name: &'static str, value: f64 },
    InvalidParams { name: &'static str, value: f64 },
}

impl fmt::Display for TensionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TensionError::InvalidInput { name, value } => {
                write!(f, "{} must be positive, got {}", name, value)
            }
            TensionError::InvalidParams { name, value } => {
                write!(f, "wire {} must be positive, got {}", name, value)
            }
        }
    }
}

impl Error for TensionError {}

/// physical description of the wire under test
#[derive(Debug, Clone, Copy)]
pub struct WireParams {
    /// material density in kg/m^3
    pub density: f64,
    /// wire diameter in meters
    pub diameter: f64,
    /// vibrating length in meters
    pub length: f64,
}

impl Default for WireParams {
    // a 2mm steel spoke, 20cm between crossing and nipple
    fn default() -> WireParams {
        WireParams {
            density: 8000.0,
            diameter: 0.002,
            length: 0.20,
        }
    }
}

impl WireParams {
    pub fn validate(&self) -> Result<(), TensionError> {
        if self.density <= 0.0 {
            return Err(TensionError::InvalidParams { name: "density", value: self.density });
        }
        if self.diameter <= 0.0 {
            return Err(TensionError::InvalidParams { name: "diameter", value: self.diameter });
        }
        if self.length <= 0.0 {
            return Err(TensionError::InvalidParams { name: "length", value: self.length });
        }
        Ok(())
    }
}

pub struct TensionModel {
    params: WireParams,
    mu: f64,
}

impl TensionModel {
    pub fn build(params: WireParams) -> Result<TensionModel, TensionError> {
        params.validate()?;
        Ok(TensionModel {
            params,
            mu: params.density * PI * (params.diameter / 2.0) * (params.diameter / 2.0),
        })
    }

    /// linear mass density in kg/m
    pub fn linear_density(&self) -> f64 {
        self.mu
    }

    pub fn get_params(&self) -> WireParams {
        self.params
    }

    /// Tension in Newtons for a fundamental at `frequency` Hz.
    pub fn tension(&self, frequency: f64) -> Result<f64, TensionError> {
        if frequency <= 0.0 {
            return Err(TensionError::InvalidInput { name: "frequency", value: frequency });
        }
        let length = self.params.length;
        Ok(4.0 * length * length * frequency * frequency * self.mu)
    }

    /// Fundamental frequency in Hz for a wire under `tension` Newtons.
    pub fn frequency(&self, tension: f64) -> Result<f64, TensionError> {
        if tension <= 0.0 {
            return Err(TensionError::InvalidInput { name: "tension", value: tension });
        }
        Ok(f64::sqrt(tension / self.mu) / (2.0 * self.params.length))
    }

    /// Only the length is adjustable at runtime; the wheel stays laced with
    /// the same spokes.
    pub fn set_length(&mut self, length: f64) -> Result<(), TensionError> {
        if length <= 0.0 {
            return Err(TensionError::InvalidParams { name: "length", value: length });
        }
        self.params.length = length;
        Ok(())
    }
}

#[cfg(test)]
mod test_tension {
    use super::*;

    fn steel_spoke() -> TensionModel {
        TensionModel::build(WireParams::default()).unwrap()
    }

    #[test]
    fn linear_density_of_a_2mm_spoke() {
        let model = steel_spoke();
        // 8000 * pi * 0.001^2
        assert!((model.linear_density() - 0.0251327).abs() < 1e-6);
    }

    #[test]
    fn known_values() {
        let model = steel_spoke();
        // 100 N on the default spoke rings near 157.7 Hz
        assert!((model.frequency(100.0).unwrap() - 157.696).abs() < 0.01);
        // a 440 Hz fundamental means roughly 778.5 N
        assert!((model.tension(440.0).unwrap() - 778.5).abs() < 0.1);
    }

    #[test]
    fn round_trip_is_exact_to_float_tolerance() {
        let model = steel_spoke();
        for f in [160.0, 250.0, 440.0, 863.0] {
            let back = model.frequency(model.tension(f).unwrap()).unwrap();
            assert!((back - f).abs() / f < 1e-6);
        }
        for t in [100.0, 980.0, 1275.0, 3000.0] {
            let back = model.tension(model.frequency(t).unwrap()).unwrap();
            assert!((back - t).abs() / t < 1e-6);
        }
    }

    #[test]
    fn rejects_out_of_domain_inputs() {
        let model = steel_spoke();
        assert!(model.tension(0.0).is_err());
        assert!(model.tension(-440.0).is_err());
        assert!(model.frequency(-1.0).is_err());
        let msg = model.frequency(0.0).err().unwrap().to_string();
        assert!(msg.contains("tension"));
    }

    #[test]
    fn rejects_bad_params() {
        let mut params = WireParams::default();
        params.diameter = 0.0;
        assert!(TensionModel::build(params).is_err());
        let mut model = steel_spoke();
        assert!(model.set_length(-0.2).is_err());
        assert!(model.set_length(0.185).is_ok());
        assert_eq!(model.get_params().length, 0.185);
    }

    #[test]
    fn longer_wire_needs_more_tension_for_same_pitch() {
        let mut model = steel_spoke();
        let short = model.tension(440.0).unwrap();
        model.set_length(0.25).unwrap();
        let long = model.tension(440.0).unwrap();
        assert!(long > short);
    }
}
