use clap::Parser;
use ksdown_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible.
    if cli.log_stderr {
        logging::init_logging_stderr();
    } else if let Err(err) = logging::init_logging() {
        eprintln!("ksdown: file logging unavailable ({:#}), logging to stderr", err);
        logging::init_logging_stderr();
    }

    // Exit from inside the runtime so lingering blocking workers are not awaited.
    match cli.run().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("ksdown error: {:#}", err);
            std::process::exit(1);
        }
    }
}
