use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber: human readable output on stderr, filtered to `level`.
pub fn init(level: LevelFilter) -> Result<(), TryInitError> {
    registry::Registry::default()
        .with(level)
        .with(tracing_subscriber::fmt::Layer::default().with_writer(std::io::stderr))
        .try_init()
}
