//! Global functions available to every script.
use std::cmp::Ordering;

use glam::Vec3;
use rand::RngCore;

use crate::error::{Error, Result};
use crate::script::scope::ScopeStack;
use crate::value::{Callable, Plane, Value, ValueKind};

pub const BUILTIN_NAMES: &[&str] = &[
    "print", "type", "Integer", "Float", "String", "Boolean", "Vector3", "Plane", "abs", "min",
    "max", "sqrt", "random",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Uniform float in `[0, 1)`.
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

fn conversion(kind: ValueKind) -> Callable {
    Callable::native(kind.name(), Some(1), move |_, args| args[0].convert_to(kind))
}

fn float_arg(args: &[Value], i: usize) -> Result<f32> {
    args[i].as_float()
}

pub(crate) fn install(scopes: &mut ScopeStack) {
    let mut define = |callable: Callable| {
        let name = callable.name().to_owned();
        scopes.declare_global(&name, Value::Callable(callable));
    };

    define(Callable::native("print", None, |env, args| {
        let line = args
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        env.write_output(&line);
        Ok(Value::Null)
    }));

    define(Callable::native("type", Some(1), |_, args| {
        Ok(Value::from(args[0].type_name()))
    }));

    for kind in [
        ValueKind::Integer,
        ValueKind::Float,
        ValueKind::String,
        ValueKind::Boolean,
    ] {
        define(conversion(kind));
    }

    define(Callable::native("Vector3", Some(3), |_, args| {
        Ok(Value::Vector3(Vec3::new(
            float_arg(args, 0)?,
            float_arg(args, 1)?,
            float_arg(args, 2)?,
        )))
    }));

    define(Callable::native("Plane", Some(6), |_, args| {
        let point = Vec3::new(float_arg(args, 0)?, float_arg(args, 1)?, float_arg(args, 2)?);
        let normal = Vec3::new(float_arg(args, 3)?, float_arg(args, 4)?, float_arg(args, 5)?);
        Ok(Value::Plane(Plane::from_point_normal(point, normal)))
    }));

    define(Callable::native("abs", Some(1), |_, args| match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(i.wrapping_abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(Error::TypeMismatch {
            expected: "Float",
            found: other.type_name(),
        }),
    }));

    define(Callable::native("min", Some(2), |_, args| pick(args, Ordering::is_le)));
    define(Callable::native("max", Some(2), |_, args| pick(args, Ordering::is_ge)));

    define(Callable::native("sqrt", Some(1), |_, args| {
        let x = float_arg(args, 0)?;
        if x < 0.0 {
            return Err(Error::Evaluation(format!("sqrt of negative value {:.6}", x)));
        }
        Ok(Value::Float(x.sqrt()))
    }));

    define(Callable::native("random", Some(2), |env, args| {
        let lo = float_arg(args, 0)?;
        let hi = float_arg(args, 1)?;
        Ok(Value::Float(lo + (hi - lo) * rand01(env.rng())))
    }));
}

/// Returns whichever argument satisfies `keep_first`, preserving integer kind
/// when both arguments are integers.
fn pick(args: &[Value], keep_first: fn(Ordering) -> bool) -> Result<Value> {
    match (&args[0], &args[1]) {
        (Value::Integer(a), Value::Integer(b)) => {
            Ok(Value::Integer(if keep_first(a.cmp(b)) { *a } else { *b }))
        }
        (a, b) => {
            let (a, b) = (a.as_float()?, b.as_float()?);
            let first = a.partial_cmp(&b).is_some_and(keep_first);
            Ok(Value::Float(if first { a } else { b }))
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn installs_every_listed_builtin() {
        let mut scopes = ScopeStack::new();
        install(&mut scopes);
        for name in BUILTIN_NAMES {
            assert!(
                matches!(scopes.lookup(name), Some(Value::Callable(_))),
                "missing builtin {name}"
            );
        }
    }

    #[test]
    fn rand01_stays_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let v = rand01(&mut rng);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn pick_preserves_integers() {
        let v = pick(&[Value::Integer(3), Value::Integer(5)], Ordering::is_le).expect("ints");
        assert_eq!(v, Value::Integer(3));
        let v = pick(&[Value::Integer(3), Value::Float(1.5)], Ordering::is_le).expect("mixed");
        assert_eq!(v, Value::Float(1.5));
    }

    #[test]
    fn min_and_max_compare_large_integers_exactly() {
        let (a, b) = (Value::Integer(16_777_217), Value::Integer(16_777_216));
        let max = pick(&[a.clone(), b.clone()], Ordering::is_ge).expect("max");
        assert_eq!(max, Value::Integer(16_777_217));
        let min = pick(&[a, b], Ordering::is_le).expect("min");
        assert_eq!(min, Value::Integer(16_777_216));
    }
}
