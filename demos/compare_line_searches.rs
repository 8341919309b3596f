//! Example: comparing step policies and line searches
//!
//! Minimizes the textbook quadratic f(x1, x2) = 3x1² + x1x2 + 2x2² and the
//! quartic valley from the same start with every configuration the engine
//! supports, then prints the path of the optimal-step run.
//!
//! Run with: cargo run --example compare_line_searches --features test-utils

use descentopt::core::test_functions::{quartic_valley, textbook_quadratic, QuarticValley};
use descentopt::prelude::*;

fn configurations() -> Vec<(&'static str, DescentConfig<f64>)> {
    vec![
        ("constant step 0.5", DescentConfig::new().with_constant_step(0.5)),
        ("golden section", DescentConfig::new()),
        (
            "DSK-Powell",
            DescentConfig::new().with_one_dim_method(OneDimMethod::QuadraticInterpolation),
        ),
        ("damped 0.5", DescentConfig::new().with_damping(0.5)),
        ("momentum 0.3", DescentConfig::new().with_momentum(0.3)),
        ("adaptive ratio", DescentConfig::new().with_adaptive_ratio()),
        (
            "position criterion",
            DescentConfig::new().with_criterion(ConvergenceCriterion::PositionAndValue),
        ),
    ]
}

fn report<C: CostFunction<f64>>(title: &str, cost: &C, start: &DVector<f64>) {
    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
    println!(
        "{:<20} {:>10} {:>14} {:>14} {:>10}",
        "configuration", "iterations", "f(x)", "|grad f|", "converged"
    );

    for (name, config) in configurations() {
        match minimize(cost, start.clone(), config) {
            Ok(result) => println!(
                "{:<20} {:>10} {:>14.6e} {:>14.6e} {:>10}",
                name, result.iterations, result.value, result.gradient_norm, result.converged
            ),
            Err(error) => println!("{:<20} failed: {}", name, error),
        }
    }
    println!();
}

fn main() -> Result<()> {
    let textbook = textbook_quadratic::<f64>();
    let start = DVector::from_vec(vec![6.0, 4.0]);
    report("Textbook quadratic from (6, 4)", &textbook, &start);

    let valley = quartic_valley();
    report(
        "Quartic valley from (-1.2, 0)",
        &valley,
        &QuarticValley::start_point::<f64>(),
    );

    let result = minimize(&textbook, start, DescentConfig::new())?;
    println!("Optimal-step path on the textbook quadratic:");
    for record in result.history.iter() {
        println!(
            "  k = {:>2}  x = ({:>10.6}, {:>10.6})  f = {:.6e}",
            record.index, record.position[0], record.position[1], record.value
        );
    }
    println!("Finished in {:?}", result.duration);

    Ok(())
}
