use mathexpr_rs::EvaluationEngine;
use std::collections::HashMap;

fn main() {
    pretty_env_logger::init();

    let mut engine = EvaluationEngine::new();
    engine.add_default_functions();
    engine.add_default_constants();

    let expression = "price * (1 + rate) ^ years - fee";
    let context: HashMap<String, f64> = [
        ("price".to_string(), 120.0),
        ("rate".to_string(), 0.05),
        ("years".to_string(), 3.0),
        ("fee".to_string(), 2.5),
    ]
    .into_iter()
    .collect();

    match engine.evaluate(expression, &context) {
        Ok(result) => println!("{} = {}", expression, result),
        Err(err) => println!("Error: {}", err),
    }

    for broken in ["(1 + 2", "1.2.3 * x", "sin(1, 2)", "unknown + 1"] {
        match engine.evaluate(broken, &context) {
            Ok(result) => println!("{} = {}", broken, result),
            Err(err) => println!("{}: {}", broken, err),
        }
    }
}
