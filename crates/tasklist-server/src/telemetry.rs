//! Tracing subscriber initialization for the server binary.

pub fn init_telemetry() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tasklist=info".into()))
        .with(fmt::layer())
        .init();
}
