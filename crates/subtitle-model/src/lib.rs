//! burnsub Subtitle Model
//!
//! The subset of Advanced SubStation Alpha (`.ass`) handling the renderer
//! needs before it can hand a script to the encoder:
//! - **Document:** header sections plus the `[Events]` block, parsed and
//!   serialized losslessly enough for libass
//! - **Styles:** font-size override for a named style
//! - **Right-to-left:** detection and directional-mark wrapping of captions

pub mod document;
pub mod rtl;

pub use document::*;
