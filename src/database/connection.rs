use async_trait::async_trait;
use log::debug;
use url::Url;

use crate::config::InfluxConfig;
use crate::database::operations::to_line_protocol;
use crate::error::ExporterError;
use crate::models::MetricsEvent;

/// Destination for metric events
#[async_trait]
pub trait MetricsSink {
    /// Human-readable target, used in log lines
    fn endpoint(&self) -> String;

    async fn write(&self, event: &MetricsEvent) -> Result<(), ExporterError>;
}

/// Build the InfluxDB 1.x write endpoint with second precision
///
/// Credentials never go into the URL; they travel as Basic auth.
pub fn write_url(config: &InfluxConfig) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("http://{}:{}/write", config.host, config.port))?;
    url.query_pairs_mut()
        .append_pair("db", &config.database)
        .append_pair("precision", "s");
    Ok(url)
}

/// InfluxDB HTTP API client writing line protocol
///
/// An unparsable endpoint is kept as an error and returned from every write, so each
/// group still goes through the publisher's failure logging.
pub struct InfluxClient {
    http: reqwest::Client,
    url: Result<Url, url::ParseError>,
    credentials: Option<(String, Option<String>)>,
    endpoint: String,
}

impl InfluxClient {
    pub fn new(config: &InfluxConfig) -> Self {
        let credentials = match (&config.user, &config.password) {
            (None, None) => None,
            (user, password) => Some((user.clone().unwrap_or_default(), password.clone())),
        };

        InfluxClient {
            http: reqwest::Client::new(),
            url: write_url(config),
            credentials,
            endpoint: format!("{}:{}", config.host, config.port),
        }
    }

    fn request(&self, event: &MetricsEvent) -> Result<reqwest::RequestBuilder, ExporterError> {
        let url = self.url.clone()?;
        let mut request = self.http.post(url).body(to_line_protocol(event));
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }
        Ok(request)
    }
}

#[async_trait]
impl MetricsSink for InfluxClient {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn write(&self, event: &MetricsEvent) -> Result<(), ExporterError> {
        let response = self.request(event)?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExporterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("InfluxDB accepted {} with status {}", event.name, status);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Sink that records events and optionally fails every write
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub fail: bool,
        pub attempts: Mutex<Vec<MetricsEvent>>,
    }

    impl RecordingSink {
        pub fn failing() -> Self {
            RecordingSink {
                fail: true,
                ..Default::default()
            }
        }

        pub fn names(&self) -> Vec<String> {
            self.attempts
                .lock()
                .unwrap()
                .iter()
                .map(|event| event.name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl MetricsSink for RecordingSink {
        fn endpoint(&self) -> String {
            "recording".to_string()
        }

        async fn write(&self, event: &MetricsEvent) -> Result<(), ExporterError> {
            self.attempts.lock().unwrap().push(event.clone());
            if self.fail {
                return Err(ExporterError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(())
        }
    }
}
