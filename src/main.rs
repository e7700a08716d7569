/// Entry point for the PHP-FPM monitor.
///
/// This binary discovers containers exposing a PHP-FPM status endpoint
/// through Docker labels, scrapes each endpoint on a fixed interval, and
/// writes the parsed pool metrics to stdout as InfluxDB line protocol.
///
/// # Errors
///
/// Returns an error if initialization fails (e.g., a malformed enable label
/// or an unsupported Docker endpoint scheme).
///
/// # Examples
///
/// ```bash
/// CONTAINER_LABEL_ENABLE=METRICS_ENABLED=yes cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    phpfpm_monitor::run().await
}
