/// Publishing metric groups to the time-series store
use log::{error, info};

use crate::database::connection::MetricsSink;
use crate::models::{FieldValue, MetricFields, MetricsEvent};
use crate::utils::{format_timestamp, unix_timestamp};

/// Encode an event as one line of InfluxDB line protocol
///
/// Integers carry the `i` suffix so register values land in integer columns.
pub fn to_line_protocol(event: &MetricsEvent) -> String {
    let fields = event
        .fields
        .iter()
        .map(|(key, value)| format!("{}={}", escape(key, &[',', '=', ' ']), format_value(value)))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "{} {} {}",
        escape(&event.name, &[',', ' ']),
        fields,
        event.timestamp
    )
}

fn escape(text: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => v.to_string(),
        FieldValue::Integer(v) => format!("{}i", v),
    }
}

/// Timestamps events and hands them to a sink without ever failing the run
pub struct MetricsPublisher<S: MetricsSink> {
    sink: S,
    verbose: bool,
}

impl<S: MetricsSink> MetricsPublisher<S> {
    pub fn new(sink: S, verbose: bool) -> Self {
        MetricsPublisher { sink, verbose }
    }

    #[cfg(test)]
    pub(crate) fn sink(&self) -> &S {
        &self.sink
    }

    /// Publish one named group of fields
    ///
    /// An empty group is skipped without touching the sink. Write failures are logged
    /// together with the payload and otherwise ignored.
    pub async fn publish(&self, name: &str, fields: MetricFields) {
        if fields.is_empty() {
            info!("Not publishing empty data for: {}", name);
            return;
        }

        let event = MetricsEvent {
            name: name.to_string(),
            timestamp: unix_timestamp(),
            fields,
        };

        if self.verbose {
            info!(
                "Publishing {} to InfluxDB [{}] at {}: {}",
                name,
                self.sink.endpoint(),
                format_timestamp(event.timestamp),
                to_line_protocol(&event)
            );
        }

        if let Err(e) = self.sink.write(&event).await {
            error!("Failed to write to InfluxDB: {}", e);
            error!("  Payload was: {}", to_line_protocol(&event));
        }
    }
}
