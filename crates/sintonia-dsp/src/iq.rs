//! Interleaved signed 16-bit complex sample (Q15).
//!
//! SDR front-ends deliver complex baseband as interleaved `i16` I/Q pairs
//! (the CS16 wire format). [`IqSample`] keeps that representation through
//! the decimation chain so the integer halfband stages work on the native
//! sample type; conversion to float happens once, at the discriminator.

/// One complex baseband sample in Q15 fixed point.
///
/// `re` is the in-phase (I) component, `im` the quadrature (Q) component.
/// Full scale is ±32768, i.e. the value `32768 * x` represents the real
/// number `x` in [-1, 1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IqSample {
    /// In-phase component.
    pub re: i16,
    /// Quadrature component.
    pub im: i16,
}

impl IqSample {
    /// Create a sample from raw Q15 components.
    #[inline]
    pub const fn new(re: i16, im: i16) -> Self {
        Self { re, im }
    }

    /// Q15 complex multiply: `(self * rhs) >> 15`, saturating.
    ///
    /// Products are accumulated in 64 bits; the `-32768 * -32768` corner
    /// would overflow a 32-bit accumulator.
    #[inline]
    pub fn mul(self, rhs: IqSample) -> IqSample {
        let ar = i64::from(self.re);
        let ai = i64::from(self.im);
        let br = i64::from(rhs.re);
        let bi = i64::from(rhs.im);
        let re = (ar * br - ai * bi) >> 15;
        let im = (ar * bi + ai * br) >> 15;
        IqSample {
            re: re.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16,
            im: im.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16,
        }
    }

    /// Complex conjugate.
    #[inline]
    pub fn conj(self) -> IqSample {
        IqSample {
            re: self.re,
            im: self.im.saturating_neg(),
        }
    }

    /// Halve both components (one bit of headroom).
    #[inline]
    pub fn halve(self) -> IqSample {
        IqSample {
            re: self.re / 2,
            im: self.im / 2,
        }
    }

    /// Convert to float components scaled to [-1, 1).
    #[inline]
    pub fn to_f32(self) -> (f32, f32) {
        (f32::from(self.re) / 32768.0, f32::from(self.im) / 32768.0)
    }

    /// Build a sample from float components in [-1, 1], saturating.
    #[inline]
    pub fn from_f32(re: f32, im: f32) -> IqSample {
        IqSample {
            re: (re * 32768.0) as i16,
            im: (im * 32768.0) as i16,
        }
    }
}
