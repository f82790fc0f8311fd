//! A pure-Rust reference kernel set: `scale`, `clip`, `normalize`. Exists so pipelines built
//! without a real native/WASM kernel still have something to bind against, and so the
//! fusion invariants (determinism, fusion-invariance) are testable without an external
//! dependency.

use crate::error::{KernelError, Result};
use crate::transform::KernelTransform;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceKernel;

const KNOWN: &[&str] = &["scale", "clip", "normalize"];

impl KernelTransform for ReferenceKernel {
    fn process_f32_batch(&self, name: &str, input: &[f32], params: &BTreeMap<String, f64>) -> Result<Vec<f32>> {
        match name {
            "scale" => {
                let factor = param(params, name, "factor")? as f32;
                Ok(input.iter().map(|x| x * factor).collect())
            }
            "clip" => {
                let min = param(params, name, "min")? as f32;
                let max = param(params, name, "max")? as f32;
                Ok(input.iter().map(|x| x.clamp(min, max)).collect())
            }
            "normalize" => {
                let (min, max) = input
                    .iter()
                    .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
                let range = (max - min).max(f32::EPSILON);
                Ok(input.iter().map(|x| (x - min) / range).collect())
            }
            _ => Err(KernelError::NotLoaded(name.to_string())),
        }
    }

    fn supports(&self, name: &str) -> bool {
        KNOWN.contains(&name)
    }
}

fn param(params: &BTreeMap<String, f64>, kernel: &str, key: &str) -> Result<f64> {
    params.get(key).copied().ok_or_else(|| KernelError::MissingParam {
        name: kernel.to_string(),
        param: key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_multiplies_every_element() {
        let kernel = ReferenceKernel;
        let mut params = BTreeMap::new();
        params.insert("factor".to_string(), 2.0);
        let out = kernel.process_f32_batch("scale", &[1.0, 2.0, 3.0], &params).unwrap();
        assert_eq!(out, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn clip_bounds_values() {
        let kernel = ReferenceKernel;
        let mut params = BTreeMap::new();
        params.insert("min".to_string(), 0.0);
        params.insert("max".to_string(), 1.0);
        let out = kernel.process_f32_batch("clip", &[-1.0, 0.5, 2.0], &params).unwrap();
        assert_eq!(out, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn normalize_maps_to_unit_range() {
        let kernel = ReferenceKernel;
        let out = kernel.process_f32_batch("normalize", &[0.0, 5.0, 10.0], &BTreeMap::new()).unwrap();
        assert_eq!(out, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn unknown_kernel_is_not_loaded() {
        let kernel = ReferenceKernel;
        assert!(kernel.process_f32_batch("does-not-exist", &[], &BTreeMap::new()).is_err());
    }

    #[test]
    fn missing_param_is_reported() {
        let kernel = ReferenceKernel;
        let err = kernel.process_f32_batch("scale", &[1.0], &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, KernelError::MissingParam { .. }));
    }
}
