//! Signal processing primitives shared by the renderers
//!
//! - [`SincKernel`]: oversampled sinc lookup table
//! - [`FractionalDelayLine`]: circular buffer read at non-integer delays
//! - [`StaticDelay`]: integer delay for per-speaker compensation

mod delay;
mod sinc;

pub use delay::{FractionalDelayLine, StaticDelay};
pub use sinc::SincKernel;

/// Flush a subnormal value to zero
///
/// Feedback state (one-pole smoothers) decays into the subnormal range on
/// silence, where many CPUs take a slow path for every operation.
#[inline]
pub fn flush_denormal(x: f64) -> f64 {
    if x.is_subnormal() {
        0.0
    } else {
        x
    }
}

/// Single-precision variant of [`flush_denormal`]
#[inline]
pub fn flush_denormal_f32(x: f32) -> f32 {
    if x.is_subnormal() {
        0.0
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-310), 0.0);
        assert_eq!(flush_denormal(1e-300), 1e-300);
        assert_eq!(flush_denormal_f32(1e-40), 0.0);
        assert_eq!(flush_denormal_f32(0.5), 0.5);
    }
}
