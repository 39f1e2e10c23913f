use crate::domain::model::FetchResponse;
use crate::domain::ports::RetrievalStrategy;
use crate::utils::error::{LookupError, Result};

/// A misconfigured or private sheet answers 200 with an HTML login/error page.
pub fn looks_like_html(body: &str) -> bool {
    let trimmed = body.trim_start().as_bytes();
    ["<!doctype", "<html"].iter().any(|marker| {
        trimmed.len() >= marker.len() && trimmed[..marker.len()].eq_ignore_ascii_case(marker.as_bytes())
    })
}

/// Why a strategy's response was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Status(u16),
    EmptyBody,
    HtmlBody,
}

pub fn check_response(response: &FetchResponse) -> std::result::Result<(), Rejection> {
    if !response.is_success() {
        return Err(Rejection::Status(response.status));
    }
    if response.body.is_empty() {
        return Err(Rejection::EmptyBody);
    }
    if looks_like_html(&response.body) {
        return Err(Rejection::HtmlBody);
    }
    Ok(())
}

/// Tries each strategy once, in order, and returns the first acceptable body.
pub struct Fetcher {
    strategies: Vec<Box<dyn RetrievalStrategy>>,
}

impl Fetcher {
    pub fn new(strategies: Vec<Box<dyn RetrievalStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn fetch(&self) -> Result<String> {
        for (i, strategy) in self.strategies.iter().enumerate() {
            tracing::debug!(
                "Retrieval attempt {}/{} via '{}'",
                i + 1,
                self.strategies.len(),
                strategy.name()
            );

            match strategy.attempt().await {
                Ok(response) => match check_response(&response) {
                    Ok(()) => {
                        tracing::info!(
                            "Retrieved {} bytes via '{}'",
                            response.body.len(),
                            strategy.name()
                        );
                        return Ok(response.body);
                    }
                    Err(rejection) => {
                        tracing::warn!(
                            "Strategy '{}' rejected: {:?}, trying next",
                            strategy.name(),
                            rejection
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!("Strategy '{}' failed: {}, trying next", strategy.name(), e);
                }
            }
        }

        Err(LookupError::RetrievalFailure {
            attempts: self.strategies.len(),
        })
    }
}
