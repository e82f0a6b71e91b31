use mathexpr_rs::EvaluationEngine;
use rayon::prelude::*;
use std::time::Instant;

fn main() {
    pretty_env_logger::init();

    let mut engine = EvaluationEngine::new();
    engine.add_default_functions();
    engine.add_default_constants();

    let expression = "sin(rad(angle)) * amplitude + offset";
    let function = engine
        .compile_typed::<3>(expression)
        .expect("Failed to compile");
    println!("{} over {:?}", expression, function.parameters());

    let inputs = (0..1_000_000)
        .map(|i| [(i % 360) as f64, 2.0, (i % 7) as f64])
        .collect::<Vec<_>>();

    let start = Instant::now();
    let compiled_sum = inputs
        .par_iter()
        .map(|args| function.call(*args))
        .sum::<f64>();
    println!("compiled: {} in {:?}", compiled_sum, start.elapsed());

    let ast = engine.parse(expression).expect("Failed to parse");
    let start = Instant::now();
    let evaluated_sum = inputs
        .par_iter()
        .map(|[angle, amplitude, offset]| {
            let vars = [("angle", *angle), ("amplitude", *amplitude), ("offset", *offset)];
            engine.evaluate_expression(&ast, &vars).unwrap_or(f64::NAN)
        })
        .sum::<f64>();
    println!("evaluated: {} in {:?}", evaluated_sum, start.elapsed());
}
