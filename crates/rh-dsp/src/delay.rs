//! Fixed delay line

use rh_core::Sample;

use crate::{MonoProcessor, Processor};

/// Integer-sample delay with a zero-filled head
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<Sample>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples],
            write_pos: 0,
        }
    }

    /// Delay of `ms` milliseconds, rounded to whole samples
    pub fn from_ms(ms: f64, sample_rate: f64) -> Self {
        let samples = (ms * 0.001 * sample_rate).round().max(0.0) as usize;
        Self::new(samples)
    }

    pub fn delay_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Delay a whole buffer into a new vector
    pub fn delay(&mut self, input: &[Sample]) -> Vec<Sample> {
        input.iter().map(|&x| self.process_sample(x)).collect()
    }
}

impl Processor for DelayLine {
    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    fn latency(&self) -> usize {
        self.buffer.len()
    }
}

impl MonoProcessor for DelayLine {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        if self.buffer.is_empty() {
            return input;
        }
        let output = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = input;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_by_whole_samples() {
        let mut delay = DelayLine::new(3);
        let out = delay.delay(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_from_ms_rounds() {
        assert_eq!(DelayLine::from_ms(10.0, 44100.0).delay_samples(), 441);
        assert_eq!(DelayLine::from_ms(10.0, 96000.0).delay_samples(), 960);
        assert_eq!(DelayLine::from_ms(10.0, 48000.0).latency(), 480);
    }

    #[test]
    fn test_zero_delay_passes_through() {
        let mut delay = DelayLine::new(0);
        assert_eq!(delay.delay(&[0.5, -0.5]), vec![0.5, -0.5]);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut delay = DelayLine::new(2);
        delay.delay(&[1.0, 1.0]);
        delay.reset();
        assert_eq!(delay.delay(&[0.0, 0.0]), vec![0.0, 0.0]);
    }
}
