//! Parsing of the plaintext status report exposed by a PHP process manager.
//!
//! The report is line oriented. Each significant line is a single
//! `key: value` pair; keys and values are whitespace-trimmed. A `pool` line
//! names the pool that subsequent metric lines belong to. Everything else is
//! either one of the known numeric metrics or ignored.
//!
//! The format is loose and the parser is deliberately tolerant: lines that do
//! not split into exactly two colon-delimited parts are skipped whole (the
//! status page contains timestamp lines with embedded colons), unknown keys
//! are skipped, and a value that fails integer parsing drops only that one
//! metric. Only I/O errors from the underlying reader fail a parse.
//!
//! # Examples
//!
//! ```
//! use phpfpm_monitor::status::{PoolMetric, StatusReport};
//!
//! let data = "\
//! pool: www
//! process manager: dynamic
//! accepted conn: 42
//! ";
//! let report = StatusReport::from_reader(&mut data.as_bytes()).unwrap();
//! assert_eq!(report.get("www").unwrap()[&PoolMetric::AcceptedConn], 42);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;

/// The key that opens a new pool section in the status report.
const POOL_MARKER: &str = "pool";

/// The numeric metrics a pool status report can carry.
///
/// Every variant maps one wire key (the `key` part of a status line) to one
/// emitted field name. Keys outside this set are not metrics and are never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PoolMetric {
    StartSince,
    AcceptedConn,
    ListenQueue,
    MaxListenQueue,
    ListenQueueLen,
    IdleProcesses,
    ActiveProcesses,
    TotalProcesses,
    MaxActiveProcesses,
    MaxChildrenReached,
    SlowRequests,
}

impl PoolMetric {
    pub const ALL: [PoolMetric; 11] = [
        PoolMetric::StartSince,
        PoolMetric::AcceptedConn,
        PoolMetric::ListenQueue,
        PoolMetric::MaxListenQueue,
        PoolMetric::ListenQueueLen,
        PoolMetric::IdleProcesses,
        PoolMetric::ActiveProcesses,
        PoolMetric::TotalProcesses,
        PoolMetric::MaxActiveProcesses,
        PoolMetric::MaxChildrenReached,
        PoolMetric::SlowRequests,
    ];

    /// Resolves a trimmed status-line key to the matching metric, if any.
    pub fn from_key(key: &str) -> Option<Self> {
        let metric = match key {
            "start since" => PoolMetric::StartSince,
            "accepted conn" => PoolMetric::AcceptedConn,
            "listen queue" => PoolMetric::ListenQueue,
            "max listen queue" => PoolMetric::MaxListenQueue,
            "listen queue len" => PoolMetric::ListenQueueLen,
            "idle processes" => PoolMetric::IdleProcesses,
            "active processes" => PoolMetric::ActiveProcesses,
            "total processes" => PoolMetric::TotalProcesses,
            "max active processes" => PoolMetric::MaxActiveProcesses,
            "max children reached" => PoolMetric::MaxChildrenReached,
            "slow requests" => PoolMetric::SlowRequests,
            _ => return None,
        };

        Some(metric)
    }

    /// The key as it appears on the wire.
    pub fn key(&self) -> &'static str {
        match self {
            PoolMetric::StartSince => "start since",
            PoolMetric::AcceptedConn => "accepted conn",
            PoolMetric::ListenQueue => "listen queue",
            PoolMetric::MaxListenQueue => "max listen queue",
            PoolMetric::ListenQueueLen => "listen queue len",
            PoolMetric::IdleProcesses => "idle processes",
            PoolMetric::ActiveProcesses => "active processes",
            PoolMetric::TotalProcesses => "total processes",
            PoolMetric::MaxActiveProcesses => "max active processes",
            PoolMetric::MaxChildrenReached => "max children reached",
            PoolMetric::SlowRequests => "slow requests",
        }
    }

    /// The field name used at emission time: the wire key with whitespace
    /// replaced by underscores.
    pub fn field_name(&self) -> &'static str {
        match self {
            PoolMetric::StartSince => "start_since",
            PoolMetric::AcceptedConn => "accepted_conn",
            PoolMetric::ListenQueue => "listen_queue",
            PoolMetric::MaxListenQueue => "max_listen_queue",
            PoolMetric::ListenQueueLen => "listen_queue_len",
            PoolMetric::IdleProcesses => "idle_processes",
            PoolMetric::ActiveProcesses => "active_processes",
            PoolMetric::TotalProcesses => "total_processes",
            PoolMetric::MaxActiveProcesses => "max_active_processes",
            PoolMetric::MaxChildrenReached => "max_children_reached",
            PoolMetric::SlowRequests => "slow_requests",
        }
    }
}

/// The metrics parsed for a single pool.
pub type PoolMetrics = HashMap<PoolMetric, i64>;

/// A parsed status report: per-pool metric mappings, keyed by pool name.
///
/// Pools are held in a `BTreeMap` so iteration (and therefore emission order
/// within a collection cycle) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pools: BTreeMap<String, PoolMetrics>,
}

impl StatusReport {
    /// Parses a status report from a buffered reader.
    ///
    /// Metric lines seen before the first `pool:` line have no pool to belong
    /// to and are dropped. A repeated `pool:` line for the same name starts a
    /// fresh metric mapping, replacing whatever was accumulated for that name
    /// earlier in this parse.
    ///
    /// # Errors
    ///
    /// Fails only if reading from `buf` fails. Malformed text never errors;
    /// the worst case is an empty report.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut report = Self::default();
        let mut current_pool: Option<String> = None;

        let mut line = String::new();
        while buf.read_line(&mut line)? != 0 {
            let mut parts = line.splitn(3, ':');
            // exactly one colon, or the line carries no metric
            if let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
                let key = key.trim();
                let value = value.trim();

                if key == POOL_MARKER {
                    report.pools.insert(value.to_owned(), PoolMetrics::default());
                    current_pool = Some(value.to_owned());
                } else if let Some(pool) = current_pool.as_deref() {
                    if let Some(metric) = PoolMetric::from_key(key) {
                        if let Ok(parsed) = value.parse::<i64>() {
                            if let Some(metrics) = report.pools.get_mut(pool) {
                                metrics.insert(metric, parsed);
                            }
                        }
                    }
                }
            }

            line.clear();
        }

        Ok(report)
    }

    /// Returns the metrics for the named pool, if it appeared in the report.
    pub fn get(&self, pool: &str) -> Option<&PoolMetrics> {
        self.pools.get(pool)
    }

    /// Iterates over pools in name order.
    pub fn pools(&self) -> impl Iterator<Item = (&str, &PoolMetrics)> {
        self.pools.iter().map(|(name, metrics)| (name.as_str(), metrics))
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_input() {
        let report = StatusReport::from_reader(&mut "".as_bytes()).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_parse_single_pool() {
        let data = "\
pool: www
process manager: dynamic
accepted conn: 42
foo: bar: baz
";
        let report = StatusReport::from_reader(&mut data.as_bytes()).unwrap();

        assert_eq!(report.len(), 1);
        let metrics = report.get("www").unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[&PoolMetric::AcceptedConn], 42);
    }

    #[test]
    fn test_parse_full_status_page() {
        let data = "\
pool:                 www
process manager:      dynamic
start time:           06/Aug/2026:10:00:00 +0000
start since:          1991
accepted conn:        61712
listen queue:         0
max listen queue:     9
listen queue len:     128
idle processes:       4
active processes:     11
total processes:      15
max active processes: 12
max children reached: 0
slow requests:        3
";
        let report = StatusReport::from_reader(&mut data.as_bytes()).unwrap();

        let metrics = report.get("www").unwrap();
        assert_eq!(metrics.len(), PoolMetric::ALL.len());
        assert_eq!(metrics[&PoolMetric::StartSince], 1991);
        assert_eq!(metrics[&PoolMetric::AcceptedConn], 61_712);
        assert_eq!(metrics[&PoolMetric::ListenQueue], 0);
        assert_eq!(metrics[&PoolMetric::MaxListenQueue], 9);
        assert_eq!(metrics[&PoolMetric::ListenQueueLen], 128);
        assert_eq!(metrics[&PoolMetric::IdleProcesses], 4);
        assert_eq!(metrics[&PoolMetric::ActiveProcesses], 11);
        assert_eq!(metrics[&PoolMetric::TotalProcesses], 15);
        assert_eq!(metrics[&PoolMetric::MaxActiveProcesses], 12);
        assert_eq!(metrics[&PoolMetric::MaxChildrenReached], 0);
        assert_eq!(metrics[&PoolMetric::SlowRequests], 3);
    }

    #[test]
    fn test_parse_multiple_pools() {
        let data = "\
pool: www
accepted conn: 10
pool: api
accepted conn: 20
slow requests: 1
";
        let report = StatusReport::from_reader(&mut data.as_bytes()).unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.get("www").unwrap()[&PoolMetric::AcceptedConn], 10);
        assert_eq!(report.get("api").unwrap()[&PoolMetric::AcceptedConn], 20);
        assert_eq!(report.get("api").unwrap()[&PoolMetric::SlowRequests], 1);
    }

    #[test]
    fn test_parse_metric_before_pool_marker_is_dropped() {
        let data = "\
accepted conn: 42
pool: www
idle processes: 3
";
        let report = StatusReport::from_reader(&mut data.as_bytes()).unwrap();

        let metrics = report.get("www").unwrap();
        assert!(!metrics.contains_key(&PoolMetric::AcceptedConn));
        assert_eq!(metrics[&PoolMetric::IdleProcesses], 3);
    }

    #[test]
    fn test_parse_unparseable_value_is_dropped() {
        let data = "\
pool: www
accepted conn: N/A
slow requests: 7
";
        let report = StatusReport::from_reader(&mut data.as_bytes()).unwrap();

        let metrics = report.get("www").unwrap();
        assert!(!metrics.contains_key(&PoolMetric::AcceptedConn));
        assert_eq!(metrics[&PoolMetric::SlowRequests], 7);
    }

    #[test]
    fn test_parse_repeated_pool_marker_resets_accumulation() {
        let data = "\
pool: www
accepted conn: 10
pool: www
slow requests: 2
";
        let report = StatusReport::from_reader(&mut data.as_bytes()).unwrap();

        let metrics = report.get("www").unwrap();
        assert!(!metrics.contains_key(&PoolMetric::AcceptedConn));
        assert_eq!(metrics[&PoolMetric::SlowRequests], 2);
    }

    #[test]
    fn test_parse_garbage_yields_empty_report() {
        let data = "no colons here\njust noise\n\n";
        let report = StatusReport::from_reader(&mut data.as_bytes()).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let data = "\
pool: www
accepted conn: 42
idle processes: 1
";
        let first = StatusReport::from_reader(&mut data.as_bytes()).unwrap();
        let second = StatusReport::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_metric_keys_roundtrip() {
        for metric in PoolMetric::ALL {
            assert_eq!(PoolMetric::from_key(metric.key()), Some(metric));
            assert!(!metric.field_name().contains(' '));
        }
        assert_eq!(PoolMetric::from_key("process manager"), None);
        assert_eq!(PoolMetric::from_key(POOL_MARKER), None);
    }
}
