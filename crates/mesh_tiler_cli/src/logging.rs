//! Console logging for the CLI.
//!
//! Level defaults to `info` and can be overridden with `RUST_LOG`, e.g.
//! `RUST_LOG=mesh_tiler=debug` to see cache hits and tool invocations.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Call once, before the run starts.
pub fn init_logging() {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	let stderr_layer = tracing_subscriber::fmt::layer()
		.with_writer(std::io::stderr)
		.with_thread_names(true)
		.with_span_events(FmtSpan::CLOSE);

	tracing_subscriber::registry()
		.with(env_filter)
		.with(stderr_layer)
		.init();
}
