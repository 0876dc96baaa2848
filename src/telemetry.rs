use tracing::{subscriber::set_global_default, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry};

/// Compose the subscriber: env filter, then bunyan JSON formatted output to `sink`.
///
/// `RUST_LOG` wins over `env_filter` when set.
pub fn build_telemetry<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let formatting_layer = BunyanFormattingLayer::new(name, sink);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Register telemetry as global default to process span data.
///
/// It should only be called once
pub fn register_telemetry(subscriber: impl Subscriber + Send + Sync) {
    set_global_default(subscriber).expect("failed to set subscriber");
}
