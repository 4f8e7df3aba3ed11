use bigcalc_rs::{Evaluator, RoundingMode};
use log::debug;

fn main() {
    pretty_env_logger::init();

    let mut evaluator = Evaluator::new(8, RoundingMode::HalfUp);
    for expr in [
        "(2-1)*3+(4*(6-1)*7-(9)+8)",
        "2+-11",
        "1/3",
        "2^10",
        "a=b=5",
    ] {
        match evaluator.evaluate(expr) {
            Ok(value) => println!("{expr} = {value}"),
            Err(err) => println!("{expr} failed: {err}"),
        }
    }
    debug!("variables afterwards: {:?}", evaluator.vars());
}
