//! Table of running hub subscribers, keyed by hub uuid

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use isy_api::CommandSender;
use isy_state::DeviceRegistry;
use soap_client::Credentials;
use tracing::{info, warn};

use crate::callbacks::HostCallbacks;
use crate::clock::{Clock, SystemClock};
use crate::config::{HubConfig, StreamConfig};
use crate::dispatcher::Dispatcher;
use crate::error::{Result, StreamError};
use crate::subscriber::{SessionStatus, Subscriber, SubscriberHandle};
use crate::transport::{Connector, TcpConnector};

struct HubEntry {
    config: Arc<HubConfig>,
    registry: Arc<DeviceRegistry>,
    handle: SubscriberHandle,
}

/// Running subscribers for every started hub
pub struct HubRegistry {
    config: StreamConfig,
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    hubs: DashMap<String, HubEntry>,
}

impl HubRegistry {
    /// Registry that connects over TCP with the system clock
    pub fn new(config: StreamConfig) -> Self {
        Self::with_transport(config, Arc::new(TcpConnector), Arc::new(SystemClock))
    }

    pub fn with_transport(
        config: StreamConfig,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            connector,
            clock,
            hubs: DashMap::new(),
        }
    }

    /// Start a subscriber for `hub`
    pub fn start(
        &self,
        hub: HubConfig,
        registry: Arc<DeviceRegistry>,
        host: Arc<dyn HostCallbacks>,
        commands: Arc<dyn CommandSender>,
    ) -> Result<()> {
        self.config.validate()?;
        hub.validate()?;

        match self.hubs.entry(hub.uuid.clone()) {
            Entry::Occupied(_) => Err(StreamError::HubAlreadyRunning(hub.uuid)),
            Entry::Vacant(slot) => {
                let hub = Arc::new(hub);
                let dispatcher =
                    Dispatcher::new(Arc::clone(&hub), Arc::clone(&registry), host, commands);
                let handle = Subscriber::new(
                    self.config.clone(),
                    dispatcher,
                    Arc::clone(&self.connector),
                    Arc::clone(&self.clock),
                )
                .spawn()?;

                info!(hub = %hub.name, uuid = %hub.uuid, address = %hub.address, "hub started");
                slot.insert(HubEntry {
                    config: hub,
                    registry,
                    handle,
                });
                Ok(())
            }
        }
    }

    /// Stop and forget the subscriber for `uuid`.
    ///
    /// A worker that outlives the shutdown grace stays registered, so the
    /// caller can retry or watch it with [`is_running`](Self::is_running).
    pub fn stop(&self, uuid: &str) -> Result<()> {
        let (key, mut entry) = self
            .hubs
            .remove(uuid)
            .ok_or_else(|| StreamError::HubNotFound(uuid.to_string()))?;
        info!(hub = %entry.config.name, "stopping hub");

        match entry.handle.stop() {
            Err(StreamError::ShutdownTimeout(grace)) => {
                self.hubs.entry(key).or_insert(entry);
                Err(StreamError::ShutdownTimeout(grace))
            }
            result => result,
        }
    }

    /// Stop every hub, returning the first failure
    pub fn stop_all(&self) -> Result<()> {
        let uuids: Vec<String> = self.hubs.iter().map(|entry| entry.key().clone()).collect();
        let mut first_error = None;
        for uuid in uuids {
            if let Err(e) = self.stop(&uuid) {
                warn!(uuid = %uuid, error = %e, "failed to stop hub");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn address_of(&self, uuid: &str) -> Option<String> {
        self.hubs.get(uuid).map(|entry| entry.config.address.clone())
    }

    pub fn credentials_of(&self, uuid: &str) -> Option<Credentials> {
        self.hubs.get(uuid).map(|entry| entry.config.credentials.clone())
    }

    pub fn registry_of(&self, uuid: &str) -> Option<Arc<DeviceRegistry>> {
        self.hubs.get(uuid).map(|entry| Arc::clone(&entry.registry))
    }

    pub fn status_of(&self, uuid: &str) -> Option<SessionStatus> {
        self.hubs.get(uuid).map(|entry| entry.handle.status())
    }

    /// Whether the worker thread for `uuid` is still alive
    pub fn is_running(&self, uuid: &str) -> bool {
        self.hubs
            .get(uuid)
            .is_some_and(|entry| entry.handle.is_running())
    }

    /// Uuids of all started hubs, sorted
    pub fn hub_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.hubs.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }
}
