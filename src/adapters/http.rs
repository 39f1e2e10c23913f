use crate::domain::model::FetchResponse;
use crate::domain::ports::{ConfigProvider, RetrievalStrategy};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const ALLORIGINS_RELAY: &str = "https://api.allorigins.win/raw?url={url}";
pub const CORSPROXY_RELAY: &str = "https://corsproxy.io/?{url}";

pub fn default_relay_templates() -> Vec<String> {
    vec![ALLORIGINS_RELAY.to_string(), CORSPROXY_RELAY.to_string()]
}

/// Google Sheets CSV export endpoint for one tab.
pub fn sheet_export_url(spreadsheet_id: &str, sheet_gid: &str) -> String {
    format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
        spreadsheet_id, sheet_gid
    )
}

/// Substitute the percent-encoded target into a relay template's `{url}`.
pub fn relay_url(template: &str, target: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    template.replace("{url}", &encoded)
}

/// Client shared by all strategies; the timeout bounds every attempt.
pub fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("sheet-directory/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

async fn get(client: &Client, url: &str) -> Result<FetchResponse> {
    let response = client.get(url).send().await?;
    let status = response.status().as_u16();
    tracing::debug!("GET {} -> {}", url, status);
    let body = response.text().await?;
    Ok(FetchResponse::new(status, body))
}

pub struct DirectStrategy {
    client: Client,
    url: String,
}

impl DirectStrategy {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RetrievalStrategy for DirectStrategy {
    fn name(&self) -> &str {
        "direct"
    }

    async fn attempt(&self) -> Result<FetchResponse> {
        get(&self.client, &self.url).await
    }
}

pub struct RelayStrategy {
    client: Client,
    name: String,
    url: String,
}

impl RelayStrategy {
    pub fn new(client: Client, template: &str, target: &str) -> Self {
        let url = relay_url(template, target);
        let name = url::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(|h| format!("relay:{}", h)))
            .unwrap_or_else(|| "relay".to_string());
        Self { client, name, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RetrievalStrategy for RelayStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self) -> Result<FetchResponse> {
        get(&self.client, &self.url).await
    }
}

/// Direct request first, then one relay per configured template.
pub fn strategies_from_config<C: ConfigProvider>(
    config: &C,
) -> Result<Vec<Box<dyn RetrievalStrategy>>> {
    let client = build_client(config.timeout())?;
    let target = config.export_url();

    let mut strategies: Vec<Box<dyn RetrievalStrategy>> =
        vec![Box::new(DirectStrategy::new(client.clone(), target.clone()))];
    for template in config.relay_templates() {
        strategies.push(Box::new(RelayStrategy::new(client.clone(), &template, &target)));
    }

    Ok(strategies)
}
