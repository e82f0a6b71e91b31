use log::debug;
use mathexpr_rs::bytecode::BytecodeCompiler;
use mathexpr_rs::{bindings, EngineOptions, EvaluationEngine};

struct Orbit;

#[bindings]
impl Orbit {
    pub const G: f64 = 6.674_30e-11;

    pub fn velocity(mass: f64, radius: f64) -> f64 {
        (Self::G * mass / radius).sqrt()
    }

    pub fn period(mass: f64, radius: f64) -> f64 {
        std::f64::consts::TAU * radius / Self::velocity(mass, radius)
    }
}

fn main() {
    pretty_env_logger::init();

    let mut engine = EvaluationEngine::with_options(EngineOptions {
        optimize: true,
        ..EngineOptions::default()
    });
    engine.add_default_functions();
    engine.add_default_constants();
    engine.bind(&Orbit);

    let expression = "period(mass, (6371 + altitude) * 1000) / (60 * 60)";
    let ast = engine.parse(expression).expect("Failed to parse");
    println!("parsed: {}", ast);
    println!("free variables: {:?}", ast.free_variables());

    let program = BytecodeCompiler::new(engine.environment())
        .compile(&ast)
        .expect("Failed to lower");
    for instruction in &program.code {
        debug!("{}", instruction);
    }

    let compiled = engine.compile_expression(&ast).expect("Failed to compile");
    for altitude in [400.0, 2000.0, 35786.0] {
        let vars = [("mass", 5.972e24), ("altitude", altitude)];
        let evaluated = engine.evaluate_expression(&ast, &vars).unwrap();
        let native = compiled.invoke_with(&vars).unwrap();
        println!(
            "altitude {:>7} km: {:.3} h (compiled {:.3} h)",
            altitude, evaluated, native
        );
    }
}
