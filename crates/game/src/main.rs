use std::process::ExitCode;

use tracing::{error, info};

mod app;

fn main() -> ExitCode {
    app::bootstrap::init_tracing();
    info!("=== Grove Startup ===");

    match app::bootstrap::build_app() {
        Ok(wiring) => app::loop_runner::run(wiring),
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
