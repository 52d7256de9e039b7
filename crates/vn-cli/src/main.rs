use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Diagnostics go to stderr; stdout carries the agent protocol.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    std::process::exit(vn_cli::run_cli_from_args(std::env::args_os()));
}
