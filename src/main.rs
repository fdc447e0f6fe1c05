//! rdmd harness CLI entry point

fn main() {
    // Structured logging on stderr so stdout stays clean for the reporter; defaults to info
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    rdmd_harness::cli::run();
}
