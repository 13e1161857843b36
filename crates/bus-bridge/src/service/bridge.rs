//! Bridge registry
//!
//! Builds one [`BridgeProcessor`] per inbound mapping of a [`BridgeConfig`]
//! and looks them up by endpoint URI.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::bridge_processor::BridgeProcessor;
use crate::domain::{BridgeConfig, BridgeSettings};
use crate::error::ConfigError;
use crate::metrics::BridgeMetrics;
use crate::ports::MessageBus;

/// All processors of one bridge, sharing a bus and a metrics collector
pub struct Bridge<B: MessageBus + Clone> {
    settings: BridgeSettings,
    processors: BTreeMap<String, BridgeProcessor<B>>,
    metrics: Arc<BridgeMetrics>,
}

impl<B: MessageBus + Clone> Bridge<B> {
    /// Validate `config` and create a processor for every inbound mapping
    pub fn from_config(bus: B, config: &BridgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let settings = config.settings();
        let metrics = Arc::new(BridgeMetrics::new());
        let mut processors = BTreeMap::new();

        for mapping in &config.inbound {
            let processor = BridgeProcessor::new(bus.clone(), mapping.clone(), &settings)?
                .with_metrics(Arc::clone(&metrics));
            processors.insert(mapping.uri.clone(), processor);
        }

        info!(
            mappings = processors.len(),
            send_timeout_ms = settings.send_timeout_ms(),
            "Bridge started"
        );

        Ok(Self {
            settings,
            processors,
            metrics,
        })
    }

    /// Processor bound to `uri`, if any
    pub fn processor(&self, uri: &str) -> Option<&BridgeProcessor<B>> {
        self.processors.get(uri)
    }

    /// Bound URIs in sorted order
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.processors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn metrics(&self) -> &Arc<BridgeMetrics> {
        &self.metrics
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }
}
