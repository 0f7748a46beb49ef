//! IIR filter sections used by the band-pass preprocessor stage
//!
//! Second-order sections use the audio EQ cookbook coefficients; the
//! first-order variants exist so an odd-order Butterworth cascade can be
//! assembled from whole sections.

#[derive(Copy, Clone, Debug)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    LowPassFirstOrder,
    HighPassFirstOrder,
}

pub struct BiQuadFilter {
    pub filter_type: FilterType,
    pub sample_rate: f64,
    pub cutoff_freq: f64,
    pub q: f64,
    // coeffs used to run the filter
    a0: f64,
    a1: f64,
    a2: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    // Intermediate values used to calc coeffs
    omega: f64,
    cos_omega: f64,
    sin_omega: f64,
    alpha: f64,
    // Values for previous inputs/outputs used to calculate current output
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiQuadFilter {
    pub fn new() -> BiQuadFilter {
        BiQuadFilter {
            filter_type: FilterType::LowPass,
            sample_rate: 44_100.0,
            cutoff_freq: 1.0,
            q: 0.707,
            a0: 0.0,
            a1: 0.0,
            a2: 0.0,
            b0: 0.0,
            b1: 0.0,
            b2: 0.0,
            omega: 0.0,
            cos_omega: 0.0,
            sin_omega: 0.0,
            alpha: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn init(&mut self, filter_type: FilterType, cutoff: f64, q: f64, sample_rate: f64) -> () {
        self.sample_rate = sample_rate;
        self.filter_type = filter_type;
        self.cutoff_freq = cutoff;
        self.q = q;
        self.reset();
        match self.filter_type {
            FilterType::LowPass => {
                self.calc_intermediate(self.q);
                self.b0 = (1.0 - self.cos_omega) / 2.0;
                self.b1 = 1.0 - self.cos_omega;
                self.b2 = (1.0 - self.cos_omega) / 2.0;
                self.a0 = 1.0 + self.alpha;
                self.a1 = -2.0 * self.cos_omega;
                self.a2 = 1.0 - self.alpha;
            }
            FilterType::HighPass => {
                self.calc_intermediate(self.q);
                self.b0 = (1.0 + self.cos_omega) / 2.0;
                self.b1 = -1.0 * (1.0 + self.cos_omega);
                self.b2 = (1.0 + self.cos_omega) / 2.0;
                self.a0 = 1.0 + self.alpha;
                self.a1 = -2.0 * self.cos_omega;
                self.a2 = 1.0 - self.alpha;
            }
            FilterType::BandPass => {
                self.calc_intermediate(self.q);
                self.b0 = self.alpha;
                self.b1 = 0.0;
                self.b2 = -1.0 * self.alpha;
                self.a0 = 1.0 + self.alpha;
                self.a1 = -2.0 * self.cos_omega;
                self.a2 = 1.0 - self.alpha;
            }
            FilterType::LowPassFirstOrder => {
                // bilinear transform of 1/(s+1)
                let k = f64::tan(std::f64::consts::PI * self.cutoff_freq / self.sample_rate);
                self.b0 = k;
                self.b1 = k;
                self.b2 = 0.0;
                self.a0 = 1.0 + k;
                self.a1 = k - 1.0;
                self.a2 = 0.0;
            }
            FilterType::HighPassFirstOrder => {
                let k = f64::tan(std::f64::consts::PI * self.cutoff_freq / self.sample_rate);
                self.b0 = 1.0;
                self.b1 = -1.0;
                self.b2 = 0.0;
                self.a0 = 1.0 + k;
                self.a1 = k - 1.0;
                self.a2 = 0.0;
            }
        }
        self.normalize_coeffs();
    }

    /// clear the delay line without touching the coefficients
    pub fn reset(&mut self) -> () {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    fn calc_intermediate(&mut self, q: f64) {
        self.omega = 2.0 * std::f64::consts::PI * (self.cutoff_freq / self.sample_rate);
        self.cos_omega = f64::cos(self.omega);
        self.sin_omega = f64::sin(self.omega);
        self.alpha = self.sin_omega / (2.0 * q);
    }

    fn normalize_coeffs(&mut self) -> () {
        self.b2 /= self.a0;
        self.b1 /= self.a0;
        self.b0 /= self.a0;
        self.a2 /= self.a0;
        self.a1 /= self.a0;
        self.a0 = 1.0;
    }

    pub fn get_sample(&mut self, input: f64) -> f64 {
        let value = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = value;
        value
    }
}

#[cfg(test)]
mod test_biquad {
    use super::*;

    #[test]
    fn can_build() {
        let filter = BiQuadFilter::new();
        assert_eq!(filter.sample_rate, 44_100.0);
    }

    #[test]
    fn can_init() {
        let mut filter = BiQuadFilter::new();
        filter.init(FilterType::LowPass, 400.0, 0.707, 44_100.0);
        filter.init(FilterType::HighPass, 400.0, 0.707, 44_100.0);
        filter.init(FilterType::BandPass, 400.0, 0.707, 44_100.0);
        filter.init(FilterType::LowPassFirstOrder, 400.0, 0.707, 44_100.0);
        filter.init(FilterType::HighPassFirstOrder, 400.0, 0.707, 44_100.0);
        assert_eq!(filter.cutoff_freq, 400.0);
    }

    #[test]
    fn low_pass_passes_dc() {
        let mut filter = BiQuadFilter::new();
        filter.init(FilterType::LowPass, 400.0, 0.707, 44_100.0);
        let mut value = 0.0;
        for _ in 0..8000 {
            value = filter.get_sample(1.0);
        }
        // unity gain at DC once settled
        assert!((value - 1.0).abs() < 1e-3);
    }

    #[test]
    fn high_pass_blocks_dc() {
        let mut filter = BiQuadFilter::new();
        filter.init(FilterType::HighPassFirstOrder, 200.0, 0.707, 44_100.0);
        let mut value = 1.0;
        for _ in 0..8000 {
            value = filter.get_sample(1.0);
        }
        assert!(value.abs() < 1e-3);
    }

    #[test]
    fn reset_clears_state() {
        let mut filter = BiQuadFilter::new();
        filter.init(FilterType::LowPass, 400.0, 0.707, 44_100.0);
        for _ in 0..100 {
            filter.get_sample(1.0);
        }
        filter.reset();
        assert_eq!(filter.x1, 0.0);
        assert_eq!(filter.y1, 0.0);
    }
}
