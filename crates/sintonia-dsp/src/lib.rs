//! Sintonia DSP - scalar primitives for the FM receiver signal path
//!
//! This crate provides the per-sample building blocks the baseband pipeline
//! is assembled from, designed for streaming operation with zero allocation
//! per sample.
//!
//! # Primitives
//!
//! - [`IqSample`] - interleaved signed 16-bit complex sample (Q15)
//! - [`HalfbandFir`] / [`HalfbandIq`] - symmetric halfband low-pass for
//!   ×2 decimation, on real floats and on integer-complex pairs
//! - [`Iir`] - direct-form-I cascade with a scalar gain divisor
//! - [`Goertzel`] - single-bin tone power estimator
//! - [`FmDemod`] - second-order PLL phase/frequency discriminator
//! - [`taps`] - the fixed filter parameterisations of the receive chain
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded receivers. Disable the
//! default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sintonia-dsp = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: no allocations in the sample path; filter state
//!   lives in fixed-size windows that compact in place
//! - **No dependencies on std**: pure `no_std` with `libm` for math
//! - **Streaming**: every operator keeps its own history and can be fed
//!   arbitrary block sizes

#![cfg_attr(not(feature = "std"), no_std)]

pub mod goertzel;
pub mod halfband;
pub mod iir;
pub mod iq;
pub mod pll;
pub mod taps;

pub use goertzel::Goertzel;
pub use halfband::{HalfbandFir, HalfbandIq};
pub use iir::{Iir, IirTaps};
pub use iq::IqSample;
pub use pll::FmDemod;
