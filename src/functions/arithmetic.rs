use crate::ast::{Environment, Function};

pub fn register(environment: &mut Environment) {
    environment.set_function("abs", Function::unary(f64::abs));
    environment.set_function("floor", Function::unary(f64::floor));
    environment.set_function("ceiling", Function::unary(f64::ceil));
    environment.set_function("round", Function::unary(round));
    environment.set_function("sqrt", Function::unary(f64::sqrt));
    environment.set_function("cbrt", Function::unary(f64::cbrt));
    environment.set_function("log", Function::unary(f64::ln));
    environment.set_function("min", Function::binary(f64::min));
    environment.set_function("max", Function::binary(f64::max));
    environment.set_function("clamp", Function::ternary(clamp));
}

/// Rounds half-way cases to the nearest even integer.
pub fn round(x: f64) -> f64 {
    x.round_ties_even()
}

/// Unlike [`f64::clamp`], an inverted range does not panic: the upper bound wins.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round(0.5), 0.0);
        assert_eq!(round(1.5), 2.0);
        assert_eq!(round(2.5), 2.0);
        assert_eq!(round(-2.5), -2.0);
        assert_eq!(round(2.6), 3.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(11.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp(5.0, 10.0, 0.0), 0.0);
    }

    #[test]
    fn test_registered_names() {
        let mut environment = Environment::new();
        register(&mut environment);

        let log = environment.function("log").unwrap();
        assert!((log.call("log", &[std::f64::consts::E]).unwrap() - 1.0).abs() < 1e-15);
        let ceiling = environment.function("ceiling").unwrap();
        assert_eq!(ceiling.call("ceiling", &[1.2]).unwrap(), 2.0);
        assert_eq!(environment.function("max").unwrap().arity(), 2);
        assert_eq!(environment.function("clamp").unwrap().arity(), 3);
    }
}
