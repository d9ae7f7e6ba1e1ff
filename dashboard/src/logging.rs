//! Tracing initialization
//!
//! Logs go to stderr so CLI subcommands can print clean JSON on stdout.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGET: &str = "fleet_dashboard";

/// Map `-v` repetitions to a level for this crate
fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing/logging
///
/// - Environment-based filtering via RUST_LOG, with this crate at `info`
///   unless raised by `-v` (debug) or `-vv` (trace)
/// - `LOG_FORMAT=json` for structured JSON output
pub fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let directive = format!("{}={}", CRATE_TARGET, level_for(verbose));
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
