use crate::{MemoryProbe, MemoryResource};
use std::sync::Arc;
use tether_core::{Driver, Error, Result};

/// Driver of resources living in memory.
///
/// Every resource created by the same driver reports to the same
/// [`MemoryProbe`].
#[derive(Clone, Debug, Default)]
pub struct MemoryDriver {
    probe: Arc<MemoryProbe>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> &Arc<MemoryProbe> {
        &self.probe
    }
}

impl Driver for MemoryDriver {
    type Resource = MemoryResource;

    const NAME: &'static str = "memory";

    fn create_resource(&self, connection_string: &str) -> Result<MemoryResource> {
        if self.probe.take_failure(&self.probe.fail_create) {
            let error = Error::msg("Injected failure while creating the resource");
            log::error!("{:#}", error);
            return Err(error);
        }
        let mut database = None;
        let mut data_source = None;
        for pair in connection_string
            .split(';')
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            let Some((key, value)) = pair.split_once('=') else {
                let error = Error::msg(format!(
                    "Expected `key=value` pairs in the connection string, found `{}`",
                    pair
                ));
                log::error!("{:#}", error);
                return Err(error);
            };
            let value = value.trim().to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "db" | "database" => database = Some(value),
                "host" | "server" | "data source" => data_source = Some(value),
                other => log::debug!("Ignoring connection string key `{}`", other),
            }
        }
        self.probe.created.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(MemoryResource::new(
            database.unwrap_or_default(),
            data_source.unwrap_or_else(|| "memory".into()),
            self.probe.clone(),
        ))
    }
}
