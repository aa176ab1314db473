use chrono::{DateTime, FixedOffset};
use std::fmt;
use thiserror::Error;

use super::types::ProblemDetail;

/// What went wrong while talking to the upstream.
#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream: {0}")]
    UpstreamStatus(ProblemDetail),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("contract violation: {0}")]
    ContractViolation(String),
    #[error("freshness header: {0}")]
    FreshnessHeader(String),
    #[error("stale data: generated at {generated_at}, {age_hours}h old")]
    StaleData {
        generated_at: DateTime<FixedOffset>,
        age_hours: i64,
    },
}

/// Upstream resource a request was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Points,
    Forecast,
    ForecastHourly,
    GridData,
    Alerts,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::Points => "points",
            Endpoint::Forecast => "forecast",
            Endpoint::ForecastHourly => "forecast hourly",
            Endpoint::GridData => "grid data",
            Endpoint::Alerts => "alerts",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
#[error("{endpoint}: {kind}")]
pub struct NwsError {
    pub endpoint: Endpoint,
    #[source]
    pub kind: ErrorKind,
}

impl NwsError {
    pub fn new(endpoint: Endpoint, kind: impl Into<ErrorKind>) -> Self {
        Self {
            endpoint,
            kind: kind.into(),
        }
    }

    pub fn contract_violation(endpoint: Endpoint, detail: impl Into<String>) -> Self {
        Self::new(endpoint, ErrorKind::ContractViolation(detail.into()))
    }

    /// HTTP-like status for whoever turns this into a response.
    pub fn status(&self) -> u16 {
        match &self.kind {
            ErrorKind::UpstreamStatus(problem) if (100..=599).contains(&problem.status) => {
                problem.status
            }
            ErrorKind::Transport(_) => 502,
            _ => 500,
        }
    }
}

pub(crate) trait AtEndpoint<T> {
    fn at(self, endpoint: Endpoint) -> Result<T, NwsError>;
}

impl<T, E: Into<ErrorKind>> AtEndpoint<T> for Result<T, E> {
    fn at(self, endpoint: Endpoint) -> Result<T, NwsError> {
        self.map_err(|e| NwsError::new(endpoint, e))
    }
}
