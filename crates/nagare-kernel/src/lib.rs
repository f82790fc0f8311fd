//! External numeric-kernel contract (spec.md §4.6) plus a pure-Rust reference
//! implementation, wired into `nagare-core`'s process-wide kernel registry so
//! `Stream::wasm("scale", ..)` resolves without any native/WASM dependency.

pub mod error;
pub mod reference;
pub mod transform;

pub use error::{KernelError, Result};
pub use reference::ReferenceKernel;
pub use transform::KernelTransform;

use std::collections::BTreeMap;

/// Registers the reference kernels' scalar (`f64 -> f64`) forms into `nagare-core`'s
/// process-wide registry, so `Op::Wasm` stages inside a fused per-item pipeline can resolve
/// `"scale"` and `"clip"` (the per-item fusion path works over single `f64` values, unlike
/// [`ReferenceKernel::process_f32_batch`], which operates over a whole batch at once).
pub fn install() {
    nagare_core::kernel_registry::register::<f64, f64>("scale", |x, params| {
        let factor = params.get("factor").copied().unwrap_or(1.0);
        Ok(x * factor)
    });
    nagare_core::kernel_registry::register::<f64, f64>("clip", |x, params| {
        let min = params.get("min").copied().unwrap_or(f64::NEG_INFINITY);
        let max = params.get("max").copied().unwrap_or(f64::INFINITY);
        Ok(x.clamp(min, max))
    });
    tracing::info!("nagare reference kernels installed: scale, clip");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_makes_scale_resolvable_by_core() {
        install();
        assert!(nagare_core::kernel_registry::is_registered("scale"));
        let out: f64 = nagare_core::kernel_registry::invoke("scale", &3.0, &{
            let mut p = BTreeMap::new();
            p.insert("factor".to_string(), 2.0);
            p
        })
        .unwrap();
        assert_eq!(out, 6.0);
    }

    #[test]
    fn wasm_op_resolves_after_install() {
        use nagare_core::Stream;
        install();
        let mut params = BTreeMap::new();
        params.insert("factor".to_string(), 10.0);
        let s = Stream::from_array(vec![1.0_f64, 2.0]).wasm("scale", params).unwrap();
        let out = futures::executor::block_on(nagare_core::finalizers::to_array(s)).unwrap();
        assert_eq!(out, vec![10.0, 20.0]);
    }
}
