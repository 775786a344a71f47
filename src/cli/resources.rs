use anyhow::Result;

use cecog::resources::{ResourceLocator, RESOURCE_ENV};

/// Print the resource search path and the directory in use
pub fn run() -> Result<()> {
    let locator = ResourceLocator::from_env();

    println!("Resource search path (override with ${}):", RESOURCE_ENV);
    for candidate in locator.candidates() {
        let marker = if candidate.is_dir() { "found" } else { "missing" };
        println!("  [{:>7}] {}", marker, candidate.display());
    }
    println!();

    match locator.resource_dir() {
        Ok(dir) => println!("Using: {}", dir.display()),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
