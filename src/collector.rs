//! The collection orchestrator: one `collect()` call is one cycle over the
//! discovered targets.

use std::collections::HashMap;
use std::time::Duration;

use crate::discovery::{self, ContainerTarget, Discoverer, Inventory};
use crate::error::ResultOkLogExt;
use crate::http;
use crate::metrics::Accumulator;
use crate::status::StatusReport;

/// The measurement name every emitted record carries.
pub const MEASUREMENT: &str = "phpfpm_docker";

pub struct Collector<I> {
    discoverer: Discoverer<I>,
    fetch_timeout: Duration,
}

impl<I: Inventory> Collector<I> {
    pub fn new(discoverer: Discoverer<I>, fetch_timeout: Duration) -> Self {
        Self {
            discoverer,
            fetch_timeout,
        }
    }

    /// Runs one collection cycle: discover targets, fetch and parse each
    /// status endpoint, and emit one record per pool into `accumulator`.
    ///
    /// A failed fetch or an unreadable body drops that one target; the cycle
    /// continues over the rest.
    ///
    /// # Errors
    ///
    /// Only a failed discovery pass fails the cycle.
    pub async fn collect<A: Accumulator>(&self, accumulator: &mut A) -> discovery::Result<()> {
        let targets = self.discoverer.discover().await?;

        for target in &targets {
            let body = match http::fetch_status(target.endpoint(), self.fetch_timeout).await {
                Ok(body) => body,
                Err(err) => {
                    log::warn!("skipping target `{}`: {}", target.endpoint(), err);
                    continue;
                }
            };

            let mut reader = body.as_ref();
            let Some(report) = StatusReport::from_reader(&mut reader)
                .ok_log("failed to read status report")
            else {
                continue;
            };

            emit(accumulator, target, &report);
        }

        Ok(())
    }
}

/// Emits one record per pool. Tags start from `pool` and `url`; the target's
/// own tags are applied after and win key collisions.
fn emit<A: Accumulator>(accumulator: &mut A, target: &ContainerTarget, report: &StatusReport) {
    for (pool, metrics) in report.pools() {
        let mut tags = HashMap::with_capacity(target.tags().len() + 2);
        tags.insert("pool".to_owned(), pool.to_owned());
        tags.insert("url".to_owned(), target.endpoint().to_owned());
        for (key, value) in target.tags() {
            tags.insert(key.clone(), value.clone());
        }

        let fields = metrics
            .iter()
            .map(|(metric, value)| (metric.field_name().to_owned(), *value))
            .collect();

        accumulator.add_fields(MEASUREMENT, fields, tags);
    }
}
