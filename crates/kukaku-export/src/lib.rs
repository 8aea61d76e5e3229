//! kukaku-export: pure serializers for segmentation output (sans-IO).
//!
//! Turns a [`Segmentation`](kukaku_pipeline::Segmentation) into
//! something a human can look at: a colorized raster
//! ([`colorize`], [`dual_tone`]) or portable anymap text
//! ([`pgm::encode_p2`], [`pgm::encode_p3`]). Everything returns
//! in-memory values; writing files stays with the caller.

pub mod color;
pub mod pgm;

pub use color::{ExportError, colorize, dual_tone};
