//! Oversampled sinc interpolation kernel

use std::f64::consts::PI;

use crate::error::{ConfigError, ConfigResult};

/// Precomputed Hann-windowed `sin(pi x)/(pi x)` table
///
/// The table holds `order * oversampling + 1` points, `oversampling` points
/// per unit interval, covering offsets `0..=order`. The window
/// `0.5 + 0.5 cos(pi x / (order + 1))` tapers the kernel towards its edge
/// and the last point is forced to zero. Points at integer offsets are
/// exactly zero (apart from the origin), so a delay line read at an integer
/// delay passes the stored sample through unchanged.
#[derive(Debug, Clone)]
pub struct SincKernel {
    order: u32,
    oversampling: u32,
    table: Vec<f32>,
}

impl SincKernel {
    /// Build the kernel
    ///
    /// Both `order` and `oversampling` must be positive. Delay lines without
    /// interpolation carry no kernel at all.
    pub fn new(order: u32, oversampling: u32) -> ConfigResult<Self> {
        if order == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "sinc_order",
                reason: "a sinc kernel needs at least one tap per side".to_string(),
            });
        }
        if oversampling == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "oversampling",
                reason: "must be positive".to_string(),
            });
        }
        let n = (order * oversampling + 1) as usize;
        let width = (order + 1) as f64;
        let mut table = vec![0.0f32; n];
        table[0] = 1.0;
        for (k, value) in table.iter_mut().enumerate().take(n.saturating_sub(1)).skip(1) {
            if k % oversampling as usize == 0 {
                continue;
            }
            let offset = k as f64 / oversampling as f64;
            let x = PI * offset;
            let window = 0.5 + 0.5 * (PI * offset / width).cos();
            *value = (window * x.sin() / x) as f32;
        }
        table[n - 1] = 0.0;
        Ok(Self {
            order,
            oversampling,
            table,
        })
    }

    /// Number of taps on each side of the interpolation point
    #[inline]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[inline]
    pub fn oversampling(&self) -> u32 {
        self.oversampling
    }

    /// Raw table
    pub fn table(&self) -> &[f32] {
        &self.table
    }

    /// Kernel value at offset `x` (even function)
    ///
    /// Linearly interpolates between table points; offsets beyond `order`
    /// are zero.
    #[inline]
    pub fn value(&self, x: f32) -> f32 {
        let idx = x.abs() * self.oversampling as f32;
        let last = self.table.len() - 1;
        if idx >= last as f32 {
            return 0.0;
        }
        let i = idx as usize;
        let frac = idx - i as f32;
        if frac == 0.0 {
            return self.table[i];
        }
        self.table[i] + frac * (self.table[i + 1] - self.table[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windowed_sinc(x: f32, order: u32) -> f32 {
        let xf = std::f32::consts::PI * x;
        let window = 0.5 + 0.5 * (std::f32::consts::PI * x / (order + 1) as f32).cos();
        window * xf.sin() / xf
    }

    #[test]
    fn test_table_layout() {
        let k = SincKernel::new(4, 8).unwrap();
        assert_eq!(k.table().len(), 33);
        assert_eq!(k.table()[0], 1.0);
        assert_eq!(k.table()[32], 0.0);
    }

    #[test]
    fn test_passes_through_integers() {
        let k = SincKernel::new(6, 64).unwrap();
        assert_eq!(k.value(0.0), 1.0);
        for i in 1..10 {
            assert!(k.value(i as f32).abs() < 1e-7, "value({}) = {}", i, k.value(i as f32));
            assert!(k.value(-(i as f32)).abs() < 1e-7);
        }
    }

    #[test]
    fn test_even_and_close_to_windowed_sinc() {
        let k = SincKernel::new(4, 256).unwrap();
        for &x in &[0.25f32, 0.5, 1.3, 2.75] {
            assert_eq!(k.value(x), k.value(-x));
            let exact = windowed_sinc(x, 4);
            assert!((k.value(x) - exact).abs() < 1e-4, "x={} got {} want {}", x, k.value(x), exact);
        }
    }

    #[test]
    fn test_window_tapers_towards_edge() {
        let k = SincKernel::new(8, 64).unwrap();
        let xf = std::f32::consts::PI * 7.5;
        let bare = xf.sin() / xf;
        assert!(k.value(7.5).abs() < 0.1 * bare.abs());
        assert!((k.value(0.5) - windowed_sinc(0.5, 8)).abs() < 1e-5);
    }

    #[test]
    fn test_zero_order_rejected() {
        assert!(matches!(
            SincKernel::new(0, 64),
            Err(ConfigError::InvalidParameter { name: "sinc_order", .. })
        ));
        assert!(matches!(
            SincKernel::new(4, 0),
            Err(ConfigError::InvalidParameter { name: "oversampling", .. })
        ));
    }
}
