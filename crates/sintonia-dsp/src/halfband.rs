//! Halfband FIR decimators.
//!
//! A halfband low-pass is symmetric about Fs/4 and has every second
//! coefficient equal to zero, except the centre tap which is exactly 0.5.
//! That structure halves the multiply count and makes the filter a natural
//! ×2 decimator: the operator consumes two input samples and produces one.
//!
//! Only the `M` unique side coefficients are stored (the shipped chain uses
//! M = 4); the zero interstitials and the 0.5 centre are implicit. The full
//! impulse response spans `N = 4·M - 1` samples, and the dot product folds
//! the symmetric pairs:
//!
//! ```text
//! y = ( Σ_{i even, i < N/2} (win[i] + win[N-1-i]) · tap[i/2]  +  win[N/2] ) / 2
//! ```
//!
//! Taps are stored time-reversed at construction so the fold walks the
//! window forward. History lives in a fixed window that compacts in place
//! when the cursor reaches the end; there is no per-sample allocation and
//! no output glitch at the boundary.

use crate::iq::IqSample;

/// History window capacity, in samples.
const WINDOW_SIZE: usize = 1024;

/// Maximum number of unique side coefficients.
const MAX_UNIQUE_TAPS: usize = 8;

/// Halfband decimator over real `f32` samples.
///
/// # Invariants
///
/// - The window cursor stays in `[span - 1, WINDOW_SIZE]`; on reaching the
///   end, the last `span - 1` samples are copied to the front.
/// - Output for constant input `c` settles to `c · (2·Σtaps + 1) / 2 ≈ c`
///   (the taps satisfy the halfband normalisation).
#[derive(Debug, Clone)]
pub struct HalfbandFir {
    /// Unique side coefficients, time-reversed.
    taps: [f32; MAX_UNIQUE_TAPS],
    /// Full impulse-response span: `4 * ntaps - 1`.
    span: usize,
    window: [f32; WINDOW_SIZE],
    idx: usize,
}

impl HalfbandFir {
    /// Create a halfband decimator from its unique side coefficients,
    /// given outermost-last (the order a filter design tool emits them).
    ///
    /// # Panics
    ///
    /// Panics if `taps` is empty or holds more than 8 coefficients.
    pub fn new(taps: &[f32]) -> Self {
        assert!(
            !taps.is_empty() && taps.len() <= MAX_UNIQUE_TAPS,
            "halfband needs 1..=8 unique taps"
        );
        let mut reversed = [0.0; MAX_UNIQUE_TAPS];
        for (i, slot) in reversed[..taps.len()].iter_mut().enumerate() {
            *slot = taps[taps.len() - 1 - i];
        }
        let span = 4 * taps.len() - 1;
        Self {
            taps: reversed,
            span,
            window: [0.0; WINDOW_SIZE],
            idx: span - 1,
        }
    }

    /// Rewind the window cursor and clear the carried history.
    pub fn reset(&mut self) {
        let span = self.span;
        self.window[..span - 1].fill(0.0);
        self.idx = span - 1;
    }

    #[inline]
    fn push(&mut self, x: f32) {
        if self.idx == WINDOW_SIZE {
            let keep = self.span - 1;
            self.window.copy_within(self.idx - keep..self.idx, 0);
            self.idx = keep;
        }
        self.window[self.idx] = x;
        self.idx += 1;
    }

    #[inline]
    fn dot(&self) -> f32 {
        let span = self.span;
        let win = &self.window[self.idx - span..self.idx];
        let mut sum = 0.0;
        let mut i = 0;
        while i < span / 2 {
            sum += (win[i] + win[span - 1 - i]) * self.taps[i / 2];
            i += 2;
        }
        (sum + win[span / 2]) / 2.0
    }

    /// Consume two input samples, produce one output sample.
    #[inline]
    pub fn execute_halfband(&mut self, x: &[f32; 2]) -> f32 {
        self.push(x[0]);
        let y = self.dot();
        self.push(x[1]);
        y
    }
}

/// Halfband decimator over integer-complex [`IqSample`] pairs.
///
/// Same structure as [`HalfbandFir`], applied independently to the I and Q
/// components with float accumulation and saturating conversion back to Q15.
#[derive(Debug, Clone)]
pub struct HalfbandIq {
    taps: [f32; MAX_UNIQUE_TAPS],
    span: usize,
    window: [IqSample; WINDOW_SIZE],
    idx: usize,
}

impl HalfbandIq {
    /// Create a halfband decimator from its unique side coefficients.
    ///
    /// # Panics
    ///
    /// Panics if `taps` is empty or holds more than 8 coefficients.
    pub fn new(taps: &[f32]) -> Self {
        assert!(
            !taps.is_empty() && taps.len() <= MAX_UNIQUE_TAPS,
            "halfband needs 1..=8 unique taps"
        );
        let mut reversed = [0.0; MAX_UNIQUE_TAPS];
        for (i, slot) in reversed[..taps.len()].iter_mut().enumerate() {
            *slot = taps[taps.len() - 1 - i];
        }
        let span = 4 * taps.len() - 1;
        Self {
            taps: reversed,
            span,
            window: [IqSample::default(); WINDOW_SIZE],
            idx: span - 1,
        }
    }

    /// Rewind the window cursor and clear the carried history.
    pub fn reset(&mut self) {
        let span = self.span;
        self.window[..span - 1].fill(IqSample::default());
        self.idx = span - 1;
    }

    #[inline]
    fn push(&mut self, x: IqSample) {
        if self.idx == WINDOW_SIZE {
            let keep = self.span - 1;
            self.window.copy_within(self.idx - keep..self.idx, 0);
            self.idx = keep;
        }
        self.window[self.idx] = x;
        self.idx += 1;
    }

    #[inline]
    fn dot(&self) -> IqSample {
        let span = self.span;
        let win = &self.window[self.idx - span..self.idx];
        let mut re = 0.0f32;
        let mut im = 0.0f32;
        let mut i = 0;
        while i < span / 2 {
            let tap = self.taps[i / 2];
            re += (f32::from(win[i].re) + f32::from(win[span - 1 - i].re)) * tap;
            im += (f32::from(win[i].im) + f32::from(win[span - 1 - i].im)) * tap;
            i += 2;
        }
        re = (re + f32::from(win[span / 2].re)) / 2.0;
        im = (im + f32::from(win[span / 2].im)) / 2.0;
        IqSample::new(re as i16, im as i16)
    }

    /// Consume two input samples, produce one output sample.
    #[inline]
    pub fn execute_halfband(&mut self, x: &[IqSample; 2]) -> IqSample {
        self.push(x[0]);
        let y = self.dot();
        self.push(x[1]);
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taps::DECIM_TAPS;

    #[test]
    fn constant_input_passes_at_unity() {
        let mut hb = HalfbandFir::new(&DECIM_TAPS);
        let mut y = 0.0;
        for _ in 0..64 {
            y = hb.execute_halfband(&[0.75, 0.75]);
        }
        // DC gain is (2 * sum(taps) + 1) / 2, which the design normalises to 1.
        assert!((y - 0.75).abs() < 1e-3, "settled output {y}");
    }

    #[test]
    fn window_compaction_is_glitch_free() {
        // Run a slow sine far past the window boundary and check that the
        // output never jumps by more than the input slope allows.
        let mut hb = HalfbandFir::new(&DECIM_TAPS);
        let mut prev: Option<f32> = None;
        for n in 0..(WINDOW_SIZE * 3) {
            let t0 = (n * 2) as f32 * 0.01;
            let t1 = (n * 2 + 1) as f32 * 0.01;
            let y = hb.execute_halfband(&[libm::sinf(t0), libm::sinf(t1)]);
            if let Some(p) = prev {
                assert!((y - p).abs() < 0.05, "glitch at n = {n}");
            }
            prev = Some(y);
        }
    }

    #[test]
    fn matches_direct_convolution() {
        // Reference: explicit 15-tap halfband impulse response.
        let m = DECIM_TAPS.len();
        let span = 4 * m - 1;
        let mut h = vec![0.0f32; span];
        for (i, &t) in DECIM_TAPS.iter().enumerate() {
            // Outermost coefficient is the last of DECIM_TAPS.
            h[2 * (m - 1 - i)] = t;
            h[span - 1 - 2 * (m - 1 - i)] = t;
        }
        h[span / 2] = 1.0;

        let input: Vec<f32> = (0..200).map(|n| libm::sinf(n as f32 * 0.3)).collect();
        let mut hb = HalfbandFir::new(&DECIM_TAPS);
        for (k, pair) in input.chunks_exact(2).enumerate() {
            let y = hb.execute_halfband(&[pair[0], pair[1]]);
            // Window after the first push ends at sample index 2k.
            let newest = 2 * k;
            let mut reference = 0.0;
            for (j, &c) in h.iter().enumerate() {
                let idx = newest as isize - (span - 1 - j) as isize;
                if idx >= 0 {
                    reference += input[idx as usize] * c;
                }
            }
            reference /= 2.0;
            assert!(
                (y - reference).abs() < 1e-4,
                "output {k}: got {y}, reference {reference}"
            );
        }
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut hb = HalfbandFir::new(&DECIM_TAPS);
        for _ in 0..100 {
            hb.execute_halfband(&[1.0, -1.0]);
        }
        hb.reset();
        let mut fresh = HalfbandFir::new(&DECIM_TAPS);
        for _ in 0..10 {
            let a = hb.execute_halfband(&[0.5, 0.5]);
            let b = fresh.execute_halfband(&[0.5, 0.5]);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn iq_constant_input_passes_at_unity() {
        let mut hb = HalfbandIq::new(&DECIM_TAPS);
        let x = IqSample::new(8000, -8000);
        let mut y = IqSample::default();
        for _ in 0..64 {
            y = hb.execute_halfband(&[x, x]);
        }
        assert!((i32::from(y.re) - 8000).abs() <= 16, "re = {}", y.re);
        assert!((i32::from(y.im) + 8000).abs() <= 16, "im = {}", y.im);
    }

    #[test]
    fn iq_zero_input_stays_zero_across_boundary() {
        let mut hb = HalfbandIq::new(&DECIM_TAPS);
        for _ in 0..(WINDOW_SIZE * 2) {
            let y = hb.execute_halfband(&[IqSample::default(), IqSample::default()]);
            assert_eq!(y, IqSample::default());
        }
    }
}
