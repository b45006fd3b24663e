//! Variable fractional delay line
//!
//! Used for distance rendering (propagation delay, Doppler), wave-field
//! synthesis driving delays and any other delay that changes continuously
//! while a source moves.

use super::sinc::SincKernel;
use crate::error::{ConfigError, ConfigResult};
use crate::types::Sample;

/// Circular buffer read at arbitrary non-integer delays
///
/// `pos` always points at the most recently written sample. A read at
/// delay `d` reconstructs the signal at `pos - d` from `2*order+1` taps
/// weighted by the sinc kernel. With `order == 0` reads fall back to the
/// nearest lower integer delay.
///
/// Delays are bounded by `capacity - 1`. Reads beyond that are clamped
/// to the maximum delay, which is lossy: callers must size the line for the
/// largest distance they render (see [`FractionalDelayLine::validate_delay`]).
#[derive(Debug, Clone)]
pub struct FractionalDelayLine {
    buffer: Vec<Sample>,
    pos: usize,
    /// Largest supported delay in samples
    max_delay: usize,
    /// Conversion factor from distance to samples (fs / c)
    dist2sample: f32,
    /// `None` for nearest-sample reads
    sinc: Option<SincKernel>,
}

impl FractionalDelayLine {
    /// Create a delay line holding `capacity` samples of history
    ///
    /// Supported delays are `0..=capacity-1`. The buffer is padded by the
    /// kernel order so interpolation taps at the maximum delay stay valid.
    pub fn new(capacity: usize, sinc_order: u32, oversampling: u32) -> ConfigResult<Self> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let sinc = match sinc_order {
            0 => None,
            order => Some(SincKernel::new(order, oversampling)?),
        };
        let len = capacity + sinc_order as usize;
        Ok(Self {
            buffer: vec![0.0; len],
            pos: 0,
            max_delay: capacity - 1,
            dist2sample: 1.0,
            sinc,
        })
    }

    /// Create a delay line addressed in metres rather than samples
    ///
    /// `max_distance` is converted to the required capacity with `fs / c`.
    pub fn for_distance(
        max_distance: f64,
        sample_rate: f64,
        speed_of_sound: f64,
        sinc_order: u32,
        oversampling: u32,
    ) -> ConfigResult<Self> {
        if !(speed_of_sound > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "speed_of_sound",
                reason: format!("must be positive, got {}", speed_of_sound),
            });
        }
        let dist2sample = sample_rate / speed_of_sound;
        let capacity = (max_distance.max(0.0) * dist2sample).ceil() as usize + 2;
        let mut line = Self::new(capacity, sinc_order, oversampling)?;
        line.dist2sample = dist2sample as f32;
        Ok(line)
    }

    /// Number of samples of history (`max_delay + 1`)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_delay + 1
    }

    /// Largest delay in samples that reads without clamping
    #[inline]
    pub fn max_delay(&self) -> usize {
        self.max_delay
    }

    /// Factor converting a distance in metres to a delay in samples
    #[inline]
    pub fn dist2sample(&self) -> f32 {
        self.dist2sample
    }

    pub fn kernel(&self) -> Option<&SincKernel> {
        self.sinc.as_ref()
    }

    /// Check that a delay in samples is within range
    pub fn validate_delay(&self, delay: f64) -> ConfigResult<()> {
        if delay < 0.0 || delay > self.max_delay as f64 {
            return Err(ConfigError::DelayOutOfRange {
                requested: delay,
                max: self.max_delay,
            });
        }
        Ok(())
    }

    /// Write one sample and advance
    #[inline]
    pub fn push(&mut self, x: Sample) {
        self.pos += 1;
        if self.pos >= self.buffer.len() {
            self.pos = 0;
        }
        self.buffer[self.pos] = x;
    }

    /// Sample at an integer delay (clamped to the buffer)
    #[inline]
    pub fn get(&self, delay: usize) -> Sample {
        let len = self.buffer.len();
        let delay = delay.min(len - 1);
        let mut idx = self.pos + len - delay;
        if idx >= len {
            idx -= len;
        }
        self.buffer[idx]
    }

    /// Read the signal `delay` samples in the past
    ///
    /// Delays outside `0..=max_delay` are clamped.
    ///
    /// The interpolated value is divided by the sum of the tap weights. A
    /// truncated kernel does not sum to one at fractional offsets, so without
    /// this a constant input would read back with a gain ripple that follows
    /// the fractional part of the delay. At integer
    /// delays the weights are exactly `1, 0, 0, ...` and the division is a
    /// no-op.
    #[inline]
    pub fn read(&self, delay: f32) -> Sample {
        let delay = delay.clamp(0.0, self.max_delay as f32);
        let Some(sinc) = &self.sinc else {
            return self.get(delay as usize);
        };
        let integer = delay.round();
        let sub = delay - integer;
        let integer = integer as i64;
        let order = sinc.order() as i64;
        let mut acc = 0.0f32;
        let mut wsum = 0.0f32;
        for tap in -order..=order {
            let w = sinc.value(tap as f32 - sub);
            acc += w * self.get((integer + tap).max(0) as usize);
            wsum += w;
        }
        if wsum > 0.0 {
            acc / wsum
        } else {
            acc
        }
    }

    /// Read at a distance in metres
    #[inline]
    pub fn read_dist(&self, distance: f32) -> Sample {
        self.read(distance * self.dist2sample)
    }

    /// Push `x`, then read at `distance` (metres, or samples when created
    /// with [`FractionalDelayLine::new`])
    ///
    /// A distance of zero returns `x` itself.
    #[inline]
    pub fn get_dist_push(&mut self, distance: f32, x: Sample) -> Sample {
        self.push(x);
        self.read_dist(distance)
    }

    /// Push a whole block
    pub fn push_block(&mut self, block: &[Sample]) {
        for &x in block {
            self.push(x);
        }
    }

    /// Clear history
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

/// Fixed integer delay, processed in place
///
/// Used for per-speaker delay compensation. A delay of zero is a
/// pass-through.
#[derive(Debug, Clone)]
pub struct StaticDelay {
    buffer: Vec<Sample>,
    pos: usize,
}

impl StaticDelay {
    pub fn new(delay: usize) -> Self {
        Self {
            buffer: vec![0.0; delay],
            pos: 0,
        }
    }

    /// Delay in samples
    #[inline]
    pub fn delay(&self) -> usize {
        self.buffer.len()
    }

    /// Delay one sample
    #[inline]
    pub fn process_sample(&mut self, x: Sample) -> Sample {
        if self.buffer.is_empty() {
            return x;
        }
        let out = self.buffer[self.pos];
        self.buffer[self.pos] = x;
        self.pos += 1;
        if self.pos >= self.buffer.len() {
            self.pos = 0;
        }
        out
    }

    /// Delay a block in place
    pub fn process(&mut self, block: &mut [Sample]) {
        if self.buffer.is_empty() {
            return;
        }
        for x in block.iter_mut() {
            *x = self.process_sample(*x);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            FractionalDelayLine::new(0, 4, 64).unwrap_err(),
            ConfigError::ZeroCapacity
        );
    }

    #[test]
    fn test_integer_delay_impulse() {
        let mut d = FractionalDelayLine::new(10, 0, 1).unwrap();
        d.push(1.0);
        assert_eq!(d.read(0.0), 1.0);
        d.push(0.0);
        d.push(0.0);
        assert_eq!(d.read(2.0), 1.0);
        assert_eq!(d.read(1.0), 0.0);
    }

    #[test]
    fn test_sinc_integer_delay_is_exact() {
        let mut d = FractionalDelayLine::new(64, 8, 64).unwrap();
        for k in 0..40 {
            d.push(k as f32);
        }
        // newest is 39
        assert_eq!(d.read(0.0), 39.0);
        assert_eq!(d.read(5.0), 34.0);
    }

    #[test]
    fn test_constant_signal_any_fractional_delay() {
        let mut d = FractionalDelayLine::new(100, 5, 64).unwrap();
        for _ in 0..200 {
            d.push(0.75);
        }
        for i in 0..=99 {
            let delay = i as f32 + 0.37;
            let v = d.read(delay.min(99.0));
            assert!((v - 0.75).abs() < 1e-4, "delay {} read {}", delay, v);
        }
    }

    #[test]
    fn test_fractional_delay_interpolates_ramp() {
        let mut d = FractionalDelayLine::new(128, 16, 256).unwrap();
        for k in 0..128 {
            d.push((k as f32 * 0.05).sin());
        }
        // newest index 127, read 30.5 samples back (all taps causal)
        let expected = ((127.0 - 30.5) * 0.05f32).sin();
        assert!((d.read(30.5) - expected).abs() < 5e-3);
    }

    #[test]
    fn test_sine_at_fractional_delays() {
        let mut d = FractionalDelayLine::new(64, 8, 64).unwrap();
        let signal = |k: usize| (0.3 * k as f32).sin();
        for k in 0..200 {
            d.push(signal(k));
            if k < 80 {
                continue;
            }
            for delay in [0.25f32, 0.5, 3.5, 10.25, 20.5, 30.75] {
                let expected = (0.3 * (k as f32 - delay)).sin();
                let got = d.read(delay);
                assert!(
                    (got - expected).abs() < 5e-3,
                    "k={} delay={} got {} want {}",
                    k,
                    delay,
                    got,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_zero_order_reads_nearest_sample() {
        let mut d = FractionalDelayLine::new(8, 0, 0).unwrap();
        assert!(d.kernel().is_none());
        for k in 0..8 {
            d.push(k as f32);
        }
        assert_eq!(d.read(2.7), 5.0);
        assert_eq!(d.kernel().map(SincKernel::order), None);
        let interpolating = FractionalDelayLine::new(8, 2, 16).unwrap();
        assert_eq!(interpolating.kernel().map(SincKernel::order), Some(2));
    }

    #[test]
    fn test_missing_oversampling_rejected() {
        assert!(FractionalDelayLine::new(8, 4, 0).is_err());
    }

    #[test]
    fn test_read_clamps_beyond_max() {
        let mut d = FractionalDelayLine::new(4, 0, 1).unwrap();
        for k in 1..=4 {
            d.push(k as f32);
        }
        assert_eq!(d.read(3.0), 1.0);
        assert_eq!(d.read(10.0), 1.0);
        assert!(d.validate_delay(3.0).is_ok());
        assert!(d.validate_delay(4.0).is_err());
    }

    #[test]
    fn test_get_dist_push_zero_distance_is_transparent() {
        let mut d = FractionalDelayLine::for_distance(10.0, 48000.0, 340.0, 4, 64).unwrap();
        assert!(d.max_delay() as f32 >= 10.0 * d.dist2sample());
        assert_eq!(d.get_dist_push(0.0, 0.5), 0.5);
        assert_eq!(d.get_dist_push(0.0, -0.25), -0.25);
    }

    #[test]
    fn test_static_delay() {
        let mut d = StaticDelay::new(2);
        let mut block = [1.0, 2.0, 3.0, 4.0];
        d.process(&mut block);
        assert_eq!(block, [0.0, 0.0, 1.0, 2.0]);

        let mut passthrough = StaticDelay::new(0);
        assert_eq!(passthrough.process_sample(5.0), 5.0);
    }
}
