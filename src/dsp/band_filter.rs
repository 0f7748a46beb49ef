//! band-pass preprocessing stage for wideband acquisition paths
//!
//! Order-5 Butterworth edges built as whole filter sections: one first-order
//! section plus two biquads per edge, with the standard Butterworth pole Q
//! values.  The delay-line state persists across blocks; resetting it every
//! call would reintroduce a transient at each block boundary, so the caller
//! only clears state when the band itself changes.
use super::biquad::{BiQuadFilter, FilterType};

// pole-pair Q values of a 5th-order Butterworth prototype
const SECTION_Q: [f64; 2] = [0.618_033_988_75, 1.618_033_988_75];

pub struct BandPassFilter {
    pub low_cut: f64,
    pub high_cut: f64,
    pub sample_rate: f64,
    sections: [BiQuadFilter; 6],
}

impl BandPassFilter {
    pub fn build(low_cut: f64, high_cut: f64, sample_rate: f64) -> BandPassFilter {
        let mut filter = BandPassFilter {
            low_cut,
            high_cut,
            sample_rate,
            sections: [
                BiQuadFilter::new(),
                BiQuadFilter::new(),
                BiQuadFilter::new(),
                BiQuadFilter::new(),
                BiQuadFilter::new(),
                BiQuadFilter::new(),
            ],
        };
        filter.init(low_cut, high_cut);
        filter
    }

    /// Re-derive all sections for a new band.  This also clears the delay
    /// lines, which is what the pipeline wants on reconfiguration.
    pub fn init(&mut self, low_cut: f64, high_cut: f64) -> () {
        self.low_cut = low_cut;
        self.high_cut = high_cut;
        let rate = self.sample_rate;
        self.sections[0].init(FilterType::HighPassFirstOrder, low_cut, 0.707, rate);
        self.sections[1].init(FilterType::HighPass, low_cut, SECTION_Q[0], rate);
        self.sections[2].init(FilterType::HighPass, low_cut, SECTION_Q[1], rate);
        self.sections[3].init(FilterType::LowPassFirstOrder, high_cut, 0.707, rate);
        self.sections[4].init(FilterType::LowPass, high_cut, SECTION_Q[0], rate);
        self.sections[5].init(FilterType::LowPass, high_cut, SECTION_Q[1], rate);
    }

    pub fn get_sample(&mut self, input: f64) -> f64 {
        let mut value = input;
        for section in &mut self.sections {
            value = section.get_sample(value);
        }
        value
    }

    pub fn process(&mut self, frame: &mut [f64]) -> () {
        for sample in frame.iter_mut() {
            *sample = self.get_sample(*sample);
        }
    }
}
