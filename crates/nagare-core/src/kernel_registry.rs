//! Process-wide registry used to resolve `Op::Wasm { kernel, .. }` tags to an actual
//! callable. The core never links against any concrete kernel implementation — it only
//! defines the contract (spec.md §4.6) and the lookup table. `nagare-kernel` populates this
//! registry from its reference implementation; nothing in `nagare-core` depends on
//! `nagare-kernel` (the dependency points the other way).
//!
//! Type-erased via `Any` because the registry is shared across every `T` a pipeline might
//! use; a lookup with a mismatched `T` is a programmer error surfaced as `KernelFault`
//! rather than a panic.

use crate::error::NagareError;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

type ErasedKernelFn =
    Arc<dyn Fn(&dyn Any, &BTreeMap<String, f64>) -> Result<Box<dyn Any + Send>, NagareError> + Send + Sync>;

struct Entry {
    input_type: TypeId,
    output_type: TypeId,
    f: ErasedKernelFn,
}

static REGISTRY: OnceLock<RwLock<HashMap<String, Entry>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, Entry>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers a kernel under `name`. A later registration with the same name replaces the
/// earlier one, matching the teacher's `with_*` override convention rather than erroring.
pub fn register<T, R>(
    name: impl Into<String>,
    f: impl Fn(&T, &BTreeMap<String, f64>) -> Result<R, NagareError> + Send + Sync + 'static,
) where
    T: 'static,
    R: 'static + Send,
{
    let entry = Entry {
        input_type: TypeId::of::<T>(),
        output_type: TypeId::of::<R>(),
        f: Arc::new(move |any_input: &dyn Any, params: &BTreeMap<String, f64>| {
            let input = any_input
                .downcast_ref::<T>()
                .ok_or_else(|| NagareError::KernelFault("kernel input type mismatch".into()))?;
            let out = f(input, params)?;
            Ok(Box::new(out) as Box<dyn Any + Send>)
        }),
    };
    registry().write().insert(name.into(), entry);
}

/// Invokes the kernel registered under `name` with `input` and `params`, downcasting the
/// result to `R`.
pub fn invoke<T, R>(name: &str, input: &T, params: &BTreeMap<String, f64>) -> Result<R, NagareError>
where
    T: 'static,
    R: 'static,
{
    let guard = registry().read();
    let entry = guard
        .get(name)
        .ok_or_else(|| NagareError::KernelFault(format!("kernel '{name}' not registered")))?;
    if entry.input_type != TypeId::of::<T>() || entry.output_type != TypeId::of::<R>() {
        return Err(NagareError::KernelFault(format!(
            "kernel '{name}' registered with a different type signature"
        )));
    }
    let boxed = (entry.f)(input, params)?;
    match boxed.downcast::<R>() {
        Ok(r) => Ok(*r),
        Err(_) => Err(NagareError::KernelFault(format!(
            "kernel '{name}' returned an unexpected type"
        ))),
    }
}

/// Whether any kernel is registered under `name`, regardless of type signature.
pub fn is_registered(name: &str) -> bool {
    registry().read().contains_key(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_invoke_round_trips() {
        register::<f64, f64>("double", |x, _params| Ok(x * 2.0));
        let out: f64 = invoke("double", &21.0, &BTreeMap::new()).unwrap();
        assert_eq!(out, 42.0);
    }

    #[test]
    fn invoke_missing_kernel_is_a_kernel_fault() {
        let err = invoke::<f64, f64>("does-not-exist", &1.0, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, NagareError::KernelFault(_)));
    }
}
