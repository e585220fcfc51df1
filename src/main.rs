use clap::Parser;
use sessiontap::base::logging::enable_logging;
use sessiontap::base::runtime::{ctrl_c, single_thread_runtime, until_interrupted, SHUTDOWN_GRACE};
use sessiontap::cli::{run, Cli};
use std::process::ExitCode;
use time::UtcOffset;

fn main() -> ExitCode {
    let cli = Cli::parse();
    enable_logging(cli.log_level);

    // Read while still single-threaded; `time` refuses once threads exist.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let runtime = match single_thread_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: cannot start the async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(until_interrupted(run(cli, offset), ctrl_c()));
    // Let interrupted cookie reads drop their temporary snapshots.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
