use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "enzolearn=info,tower_http=info";
const DEBUG_FILTER: &str = "enzolearn=debug,tower_http=debug";

/// Installs the global tracing subscriber
///
/// `RUST_LOG` wins over the built-in filter. With a log directory, output
/// goes to daily-rolling JSON files and the returned guard must be held for
/// the life of the process; otherwise it is human-readable on stdout.
pub fn init_tracing(log_dir: Option<&Path>, debug: bool) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| if debug { DEBUG_FILTER } else { DEFAULT_FILTER }.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "enzolearn.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
            Some(guard)
        }
        None => {
            registry.with(tracing_subscriber::fmt::layer()).init();
            None
        }
    }
}
