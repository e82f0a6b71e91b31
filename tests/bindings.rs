use mathexpr_rs::{bindings, Bindings, Error, EvaluationEngine};

struct Geometry;

#[bindings]
impl Geometry {
    pub const TAU: f64 = std::f64::consts::TAU;
    pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

    const HIDDEN: f64 = 1.0;

    pub fn unit() -> f64 {
        Self::HIDDEN
    }

    pub fn double(x: f64) -> f64 {
        x * 2.0
    }

    pub fn hypot(a: f64, b: f64) -> f64 {
        a.hypot(b)
    }

    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    pub fn quad(a: f64, b: f64, c: f64, x: f64) -> f64 {
        a * x * x + b * x + c
    }

    pub fn describe(x: f64) -> String {
        format!("{x}")
    }

    pub fn count(n: usize) -> f64 {
        n as f64
    }

    fn private_helper(x: f64) -> f64 {
        x
    }

    pub fn instance(&self, x: f64) -> f64 {
        Self::private_helper(x)
    }
}

#[test]
fn test_exports_only_numeric_public_items() {
    let mut names = Geometry
        .functions()
        .into_iter()
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
    names.sort_unstable();
    assert_eq!(names, ["double", "hypot", "lerp", "quad", "unit"]);

    let constants = Geometry.constants();
    assert_eq!(
        constants,
        vec![
            ("TAU", std::f64::consts::TAU),
            ("GOLDEN_RATIO", 1.618_033_988_749_895)
        ]
    );
}

#[test]
fn test_arity_follows_parameter_count() {
    for (name, function) in Geometry.functions() {
        let expected = match name {
            "unit" => 0,
            "double" => 1,
            "hypot" => 2,
            "lerp" => 3,
            "quad" => 4,
            other => panic!("unexpected export {other}"),
        };
        assert_eq!(function.arity(), expected, "{name}");
    }
}

#[test]
fn test_impl_block_is_kept() {
    assert_eq!(Geometry::describe(1.5), "1.5");
    assert_eq!(Geometry::count(3), 3.0);
    assert_eq!(Geometry.instance(4.0), 4.0);
}

#[test]
fn test_bound_functions_evaluate_and_compile() {
    let mut engine = EvaluationEngine::new();
    engine.bind(&Geometry);

    assert_eq!(engine.evaluate("hypot(3, 4) + unit()", &()).unwrap(), 6.0);
    assert_eq!(engine.evaluate("quad(1, 2, 3, x)", &[("x", 2.0)]).unwrap(), 11.0);
    assert_eq!(
        engine.evaluate("lerp(0, 10)", &()).unwrap_err(),
        Error::ArityMismatch {
            name: "lerp".to_string(),
            expected: 3,
            actual: 2
        }
    );

    let compiled = engine.compile("double(r) * TAU").unwrap();
    assert_eq!(compiled.parameters(), ["r"]);
    assert_eq!(compiled.invoke(&[1.0]).unwrap(), 2.0 * std::f64::consts::TAU);
}

#[test]
fn test_bind_with_prefix() {
    let mut engine = EvaluationEngine::new();
    engine.bind_with(&Geometry, |name| {
        format!("geo{}", name.to_lowercase().replace('_', ""))
    });

    assert_eq!(engine.constant("geotau"), Some(std::f64::consts::TAU));
    assert_eq!(engine.constant("TAU"), None);
    assert_eq!(
        engine.evaluate("geodouble(geogoldenratio)", &()).unwrap(),
        2.0 * 1.618_033_988_749_895
    );
    assert_eq!(engine.evaluate("geolerp(2, 4, 0.5)", &()).unwrap(), 3.0);
}
