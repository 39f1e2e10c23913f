use crate::core::decoder::decode_document;
use crate::core::fetcher::Fetcher;
use crate::domain::model::{FieldSchema, Record};
use crate::utils::error::{LookupError, Result};
use std::sync::atomic::{AtomicBool, Ordering};

/// Fetch, then decode. Holds no session state of its own.
pub struct DirectoryLoader {
    fetcher: Fetcher,
    schema: FieldSchema,
    gate: RefreshGate,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Completed(Result<Vec<Record>>),
    /// Another refresh was still running; nothing was fetched.
    AlreadyInFlight,
}

impl DirectoryLoader {
    pub fn new(fetcher: Fetcher, schema: FieldSchema) -> Self {
        Self {
            fetcher,
            schema,
            gate: RefreshGate::default(),
        }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub async fn load(&self) -> Result<Vec<Record>> {
        tracing::info!("Loading directory...");
        tracing::debug!("Strategies: {:?}", self.fetcher.strategy_names());

        let text = self.fetcher.fetch().await?;
        let records = decode_document(&text, &self.schema);

        if records.is_empty() {
            tracing::warn!("Source retrieved but no row has a '{}'", self.schema.required_key());
            return Err(LookupError::EmptyResultSet);
        }

        tracing::info!("Loaded {} records", records.len());
        Ok(records)
    }

    /// Like [`load`](Self::load), but ignores the call while a previous one
    /// is still outstanding.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = self.gate.try_enter() else {
            tracing::debug!("Refresh already in flight, ignoring");
            return RefreshOutcome::AlreadyInFlight;
        };
        RefreshOutcome::Completed(self.load().await)
    }
}

#[derive(Debug, Default)]
pub struct RefreshGate {
    in_flight: AtomicBool,
}

pub struct RefreshGuard<'a> {
    gate: &'a RefreshGate,
}

impl RefreshGate {
    pub fn try_enter(&self) -> Option<RefreshGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard { gate: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::Release);
    }
}
