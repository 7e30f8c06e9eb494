//! Error taxonomy and the user-facing alert channel.

/// Failures surfaced by the routing engine.
///
/// Only `Configuration` is fatal: it is returned from `RoutingTool::open`.
/// Everything else terminates at a coordinator and is delivered to an
/// [`AlertSink`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    #[error("routing tool misconfigured: {0}")]
    Configuration(String),
    #[error("no route found")]
    ServiceNotFound,
    #[error("avoid area too large or too complex")]
    PolygonTooComplex,
    #[error("service request failed: {0}")]
    Fetch(String),
    #[error("coordinate transformation failed: {0}")]
    Projection(String),
    #[error("geosearch failed: {0}")]
    Geosearch(String),
}

impl RoutingError {
    /// Message shown to the user; internal detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            RoutingError::Configuration(_) => "The routing tool is not configured.",
            RoutingError::ServiceNotFound => "No route could be found between the waypoints.",
            RoutingError::PolygonTooComplex => {
                "An avoid area is too large or too complex. Draw a smaller area."
            }
            RoutingError::Fetch(_) | RoutingError::Projection(_) => {
                "The routing service could not be reached. Please try again."
            }
            RoutingError::Geosearch(_) => "The address lookup failed.",
        }
    }
}

impl From<reqwest::Error> for RoutingError {
    fn from(err: reqwest::Error) -> Self {
        RoutingError::Fetch(err.to_string())
    }
}

impl From<serde_json::Error> for RoutingError {
    fn from(err: serde_json::Error) -> Self {
        RoutingError::Fetch(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertCategory {
    Error,
    Warning,
}

/// A message for the portal's alert channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub category: AlertCategory,
    pub message: String,
}

impl Alert {
    pub fn from_error(err: &RoutingError) -> Self {
        let category = match err {
            RoutingError::ServiceNotFound | RoutingError::PolygonTooComplex => {
                AlertCategory::Warning
            }
            _ => AlertCategory::Error,
        };
        Self {
            category,
            message: err.user_message().to_string(),
        }
    }
}

/// Alerting collaborator (toast/banner UI in the portal).
pub trait AlertSink {
    fn alert(&self, alert: Alert);
}

/// Alert sink that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlerts;

impl AlertSink for LogAlerts {
    fn alert(&self, alert: Alert) {
        tracing::warn!(category = ?alert.category, "{}", alert.message);
    }
}
