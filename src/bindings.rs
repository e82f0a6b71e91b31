use crate::ast::Function;

/// A provider of named functions and constants for bulk registration.
///
/// Usually generated with [`#[bindings]`](macro@crate::bindings) on an inherent
/// `impl` block, but nothing stops a hand-written implementation:
///
/// ```
/// use mathexpr_rs::{Bindings, EvaluationEngine, Function};
///
/// struct Physics;
///
/// impl Bindings for Physics {
///     fn functions(&self) -> Vec<(&'static str, Function)> {
///         vec![("kinetic", Function::binary(|m, v| 0.5 * m * v * v))]
///     }
///
///     fn constants(&self) -> Vec<(&'static str, f64)> {
///         vec![("g", 9.81)]
///     }
/// }
///
/// let mut engine = EvaluationEngine::new();
/// engine.bind(&Physics);
/// assert_eq!(engine.evaluate("kinetic(2, g)", &()).unwrap(), 9.81 * 9.81);
/// ```
pub trait Bindings {
    fn functions(&self) -> Vec<(&'static str, Function)>;

    fn constants(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }
}

impl<B: Bindings + ?Sized> Bindings for &B {
    fn functions(&self) -> Vec<(&'static str, Function)> {
        (**self).functions()
    }

    fn constants(&self) -> Vec<(&'static str, f64)> {
        (**self).constants()
    }
}

/// Applies `rename` to every name a provider exports.
pub(crate) fn renamed<B, R>(provider: &B, rename: R) -> (Vec<(String, Function)>, Vec<(String, f64)>)
where
    B: Bindings + ?Sized,
    R: Fn(&str) -> String,
{
    let functions = provider
        .functions()
        .into_iter()
        .map(|(name, function)| (rename(name), function))
        .collect();
    let constants = provider
        .constants()
        .into_iter()
        .map(|(name, value)| (rename(name), value))
        .collect();
    (functions, constants)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Finance;

    impl Bindings for Finance {
        fn functions(&self) -> Vec<(&'static str, Function)> {
            vec![
                ("compound", Function::ternary(|p, r, n| p * (1.0 + r).powf(n))),
                ("spread", Function::binary(|bid, ask| ask - bid)),
            ]
        }

        fn constants(&self) -> Vec<(&'static str, f64)> {
            vec![("DAYS", 365.0)]
        }
    }

    #[test]
    fn test_renamed_applies_to_everything() {
        let (functions, constants) = renamed(&Finance, |name| format!("fin_{}", name.to_lowercase()));
        let names = functions.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["fin_compound", "fin_spread"]);
        assert_eq!(constants, vec![("fin_days".to_string(), 365.0)]);
    }

    #[test]
    fn test_default_constants_are_empty() {
        struct OnlyFunctions;
        impl Bindings for OnlyFunctions {
            fn functions(&self) -> Vec<(&'static str, Function)> {
                vec![("one", Function::nullary(|| 1.0))]
            }
        }
        fn count<B: Bindings>(provider: B) -> usize {
            provider.functions().len() + provider.constants().len()
        }

        assert!(OnlyFunctions.constants().is_empty());
        assert_eq!(count(&OnlyFunctions), 1);
    }
}
