//! symmetric Hann window, precomputed once per block size
pub struct HannWindow {
    coefficients: Vec<f64>,
}

impl HannWindow {
    pub fn build(size: usize) -> HannWindow {
        let denom = (size as f64 - 1.0).max(1.0);
        HannWindow {
            coefficients: (0..size)
                .map(|i| 0.5 * (1.0 - f64::cos(2.0 * std::f64::consts::PI * i as f64 / denom)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn apply(&self, frame: &mut [f64]) -> () {
        for (sample, coef) in frame.iter_mut().zip(self.coefficients.iter()) {
            *sample *= coef;
        }
    }
}

#[cfg(test)]
mod test_window {
    use super::*;

    #[test]
    fn is_symmetric_and_zero_at_edges() {
        let window = HannWindow::build(64);
        let mut frame = vec![1.0; 64];
        window.apply(&mut frame);
        assert_eq!(frame[0], 0.0);
        assert_eq!(frame[63], 0.0);
        for i in 0..32 {
            assert!((frame[i] - frame[63 - i]).abs() < 1e-12);
        }
        // peak in the middle
        assert!(frame[31] > 0.99);
    }
}
