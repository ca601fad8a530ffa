//! Custom game launcher.
//!
//! Run from the game directory:
//!
//! ```bash
//! JAVA_HOME=/path/to/jdk \
//! VOIDLOADER_JVM_OPTS="-Xmx4G -Djava.class.path=libraries/all.jar" \
//!   voidloader-launch --username Player --version 1.20.1
//! ```
//!
//! Every argument is handed to the game's `main` unchanged.

use std::process::ExitCode;

use voidloader::config::LauncherConfig;
use voidloader::launcher::jvm::{JvmInvoker, JvmOptions, JvmSearch};
use voidloader::launcher::launch;
use voidloader::telemetry;

fn main() -> ExitCode {
    let config = LauncherConfig::from_env();
    telemetry::init(&config.log_filter);

    let base_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!(error = %e, "cannot determine the working directory");
            return ExitCode::FAILURE;
        }
    };

    let options = match JvmOptions::default().options(&config.jvm_options) {
        Ok(options) => options,
        Err(e) => {
            tracing::error!(error = %e, "invalid JVM option");
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let mut invoker = JvmInvoker::new(options, JvmSearch::from_config(&config));
    match launch(&base_dir, &config, args, &mut invoker) {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
