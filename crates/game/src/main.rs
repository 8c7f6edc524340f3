//! Headless scenario runner: loads a JSON map plus creature placements, compiles the creature
//! definitions, and ticks the simulation until one side is eliminated or the tick budget runs out.

use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    let Some(wiring) = app::build_app() else {
        return ExitCode::FAILURE;
    };
    app::run(wiring)
}
