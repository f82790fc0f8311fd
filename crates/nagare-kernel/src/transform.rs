//! The external kernel contract (spec.md §4.6/§6): `process_f32_batch(name, Float32,
//! params) -> Float32`. The core never inspects a kernel's internals; it only ever sees
//! this trait's boundary.

use crate::error::Result;
use std::collections::BTreeMap;

pub trait KernelTransform: Send + Sync {
    /// Transforms `input` in place of allocating a fresh output where possible — "zero-copy
    /// where possible" per spec.md §4.6; the reference implementation below allocates
    /// because its transforms are not length-preserving in general, but an in-process SIMD
    /// kernel could overwrite `input` directly and return a view.
    fn process_f32_batch(&self, name: &str, input: &[f32], params: &BTreeMap<String, f64>) -> Result<Vec<f32>>;

    fn supports(&self, name: &str) -> bool;
}
