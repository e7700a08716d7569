/// PHP-FPM Monitor: discovers containers that expose a PHP-FPM status
/// endpoint via Docker labels, scrapes each endpoint once per cycle, and
/// emits the parsed pool metrics as line protocol.
///
/// This library provides the discovery filter, the status-report parser, the
/// one-shot HTTP plumbing, and the collection loop that ties them together.
pub mod collector;
pub mod config;
pub mod container;
pub mod discovery;
pub mod docker;
pub mod error;
pub mod http;
pub mod metrics;
pub mod status;

/// Runs the collector.
///
/// Loads configuration from the environment, connects the Docker Engine
/// client, and drives collection cycles on a fixed interval forever. A failed
/// cycle is logged and the loop waits for the next tick; only a configuration
/// or endpoint setup problem ends the process.
///
/// # Errors
///
/// Possible errors include:
/// - A malformed `CONTAINER_LABEL_ENABLE` value.
/// - A timeout variable that does not parse as whole seconds.
/// - A `DOCKER_ENDPOINT` with an unsupported scheme.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env()?;
    let docker = docker::Client::new(config.docker_endpoint())?;
    let discoverer =
        discovery::Discoverer::new(docker, config.policy().clone(), config.docker_timeout());
    let collector = collector::Collector::new(discoverer, config.fetch_timeout());
    let mut accumulator = metrics::LineProtocol::new(std::io::stdout());

    let mut interval = tokio::time::interval(config.collect_interval());
    loop {
        interval.tick().await;
        log::trace!("Starting collection cycle");
        if let Err(err) = collector.collect(&mut accumulator).await {
            log::error!("collection cycle failed: {err}");
        }
    }
}
