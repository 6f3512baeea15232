//! Delegated order-total calculator.
//!
//! Usage: `price-calculator <price,qty> [<price,qty> ...]`
//!
//! Prints the total to two places. Links the service's own pricing rule, so
//! its answers match the in-process fallback.

use std::process::ExitCode;

use storefront_pricing::pricing::wire;
use storefront_pricing::{compute_total, PricingPolicy};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let items = match args.iter().map(|arg| wire::decode_item(arg)).collect::<Result<Vec<_>, _>>() {
        Ok(items) => items,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("Usage: price-calculator <price1,qty1> <price2,qty2> ...");
            return ExitCode::FAILURE;
        }
    };
    let breakdown = compute_total(&items, &PricingPolicy::STANDARD);
    println!("{}", wire::format_total(breakdown.total));
    ExitCode::SUCCESS
}
