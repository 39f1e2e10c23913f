use crate::domain::model::FetchResponse;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// One way of obtaining the raw CSV text (direct or relayed).
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// `Err` means a transport-level failure; HTTP error statuses come back as `Ok`.
    async fn attempt(&self) -> Result<FetchResponse>;
}

pub trait ConfigProvider: Send + Sync {
    fn export_url(&self) -> String;
    fn relay_templates(&self) -> Vec<String>;
    fn timeout(&self) -> Duration;
}
