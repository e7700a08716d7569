//! The sink side of the pipeline: metric records leave the collector through
//! the [`Accumulator`] trait, one record per pool per cycle.
//!
//! [`LineProtocol`] is the shipped implementation; it renders records as
//! InfluxDB line protocol, one line per record, to any writer.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use crate::error::ResultOkLogExt;

/// Accepts metric records produced by collection cycles.
pub trait Accumulator {
    /// Adds one record: a measurement name, its integer fields, and its tags.
    fn add_fields(
        &mut self,
        measurement: &str,
        fields: HashMap<String, i64>,
        tags: HashMap<String, String>,
    );
}

/// Renders records as InfluxDB line protocol.
///
/// Tags and fields are written in key order so output is deterministic.
/// Records without fields carry no information and are dropped. Write
/// failures are logged, never propagated; a lost line must not end a cycle.
pub struct LineProtocol<W> {
    out: W,
}

impl<W: Write> LineProtocol<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn write_record(
        &mut self,
        measurement: &str,
        fields: &BTreeMap<String, i64>,
        tags: &BTreeMap<String, String>,
    ) -> std::io::Result<()> {
        write!(self.out, "{}", escape(measurement))?;
        for (key, value) in tags {
            write!(self.out, ",{}={}", escape(key), escape(value))?;
        }
        let mut first = true;
        for (key, value) in fields {
            let separator = if first { ' ' } else { ',' };
            write!(self.out, "{}{}={}i", separator, escape(key), value)?;
            first = false;
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> Accumulator for LineProtocol<W> {
    fn add_fields(
        &mut self,
        measurement: &str,
        fields: HashMap<String, i64>,
        tags: HashMap<String, String>,
    ) {
        if fields.is_empty() {
            return;
        }
        let fields: BTreeMap<String, i64> = fields.into_iter().collect();
        let tags: BTreeMap<String, String> = tags.into_iter().collect();

        self.write_record(measurement, &fields, &tags)
            .ok_log("failed to write metric record");
    }
}

/// Escapes the characters line protocol gives meaning to in identifiers and
/// tag values.
fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, ',' | '=' | ' ') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        fields: &[(&str, i64)],
        tags: &[(&str, &str)],
    ) -> (HashMap<String, i64>, HashMap<String, String>) {
        (
            fields.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect(),
            tags.iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        )
    }

    fn render(fields: &[(&str, i64)], tags: &[(&str, &str)]) -> String {
        let mut out = Vec::new();
        let (fields, tags) = record(fields, tags);
        LineProtocol::new(&mut out).add_fields("phpfpm_docker", fields, tags);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_line_protocol_sorts_tags_and_fields() {
        let line = render(
            &[("total_processes", 5), ("accepted_conn", 42)],
            &[("url", "http://10.0.0.5:9000/status"), ("pool", "www")],
        );
        assert_eq!(
            line,
            "phpfpm_docker,pool=www,url=http://10.0.0.5:9000/status accepted_conn=42i,total_processes=5i\n"
        );
    }

    #[test]
    fn test_line_protocol_escapes_reserved_characters() {
        let line = render(&[("accepted_conn", 1)], &[("pool", "www pool,a=b")]);
        assert_eq!(
            line,
            "phpfpm_docker,pool=www\\ pool\\,a\\=b accepted_conn=1i\n"
        );
    }

    #[test]
    fn test_line_protocol_drops_fieldless_records() {
        let line = render(&[], &[("pool", "www")]);
        assert!(line.is_empty());
    }

    #[test]
    fn test_line_protocol_negative_fields() {
        let line = render(&[("listen_queue", -1)], &[]);
        assert_eq!(line, "phpfpm_docker listen_queue=-1i\n");
    }
}
