use bigcalc_rs::{BigDecimal, Evaluator, RoundingMode};

fn main() {
    pretty_env_logger::init();

    let mut session = Evaluator::new(2, RoundingMode::HalfUp);
    session.set_var("rate", BigDecimal::from(3));
    session.evaluate("base=100").unwrap();

    // `interest` becomes callable with inferred parameters (base, rate)
    let definition = session.parse("interest=base*rate/100").unwrap();
    println!(
        "defined {} with parameters {:?}",
        definition.source, definition.params
    );

    println!(
        "interest(200, 5) = {}",
        session.evaluate("interest(200,5)").unwrap()
    );
    println!(
        "balance = {}",
        session.evaluate("balance=base+interest(base,rate)").unwrap()
    );

    println!("session variables:");
    for (name, value) in session.vars() {
        println!("  {name} = {value}");
    }
}
