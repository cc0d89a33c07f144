//! Integration tests for pixkern crates.
//!
//! This crate contains end-to-end tests that drive the kernels through
//! their public APIs, across crate boundaries and sample formats.

#[cfg(test)]
mod color;
#[cfg(test)]
mod histogram;
#[cfg(test)]
mod resample;
