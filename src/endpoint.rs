//! FTP endpoint: configuration holder and factory for consumers and
//! producers.
//!
//! The endpoint parses its address once, binds the endpoint-level options
//! eagerly, and keeps the `client.*`/`policy.*` maps raw until a build
//! call assembles operations. Builds fail fast: any binder rejection is
//! wrapped in [`StartupError`] and never retried.

use std::sync::Arc;

use tracing::info;

use crate::consumer::{ConsumerConfig, RemoteFileConsumer};
use crate::error::{ConfigError, EndpointRole, StartupError};
use crate::ops::ftp::{ConnectSpec, FtpMetadata, FtpOperations, FtpTransport};
use crate::options::{ClientOptions, EndpointSettings, FtpPolicy};
use crate::producer::{ProducerConfig, RemoteFileProducer};
use crate::sink::DeliverySink;
use crate::uri::EndpointAddress;

pub struct FtpEndpoint<C> {
    address: EndpointAddress,
    settings: EndpointSettings,
    client: Option<C>,
}

impl<C> std::fmt::Debug for FtpEndpoint<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpEndpoint")
            .field("address", &self.address)
            .field("settings", &self.settings)
            .field("client", &self.client.is_some())
            .finish()
    }
}

impl<C: FtpTransport + Default> FtpEndpoint<C> {
    /// Parse an address and bind the endpoint-level options.
    ///
    /// The client and policy option maps stay raw here; they bind when a
    /// consumer or producer is built.
    pub fn from_uri(uri: &str) -> Result<Self, ConfigError> {
        let address = EndpointAddress::parse(uri)?;
        let settings = EndpointSettings::from_map(&address.endpoint_options)?;
        Ok(Self {
            address,
            settings,
            client: None,
        })
    }

    /// Inject a pre-built native client.
    ///
    /// The next build reuses this instance instead of creating one;
    /// option binding still applies to it at connect time. Injecting a
    /// client bypasses instantiation, never configuration. To share a
    /// live connection between a consumer and a producer, inject a handle
    /// type whose clones share state, once per build, and serialize
    /// access yourself.
    pub fn set_client(&mut self, client: C) {
        self.client = Some(client);
    }

    pub fn address(&self) -> &EndpointAddress {
        &self.address
    }

    pub fn settings(&self) -> &EndpointSettings {
        &self.settings
    }

    /// Bind the option maps and assemble operations.
    ///
    /// The policy object is created only when `policy.*` options are
    /// present; default behavior allocates none. Binding runs before the
    /// injected client is consumed, so a rejected map leaves it in place.
    fn create_operations(&mut self) -> Result<FtpOperations<C>, ConfigError> {
        let options = ClientOptions::from_map(&self.address.client_options)?;
        let policy = if self.address.policy_options.is_empty() {
            None
        } else {
            Some(FtpPolicy::from_map(&self.address.policy_options)?)
        };

        let client = self.client.take().unwrap_or_default();
        let spec = ConnectSpec {
            host: self.address.host.clone(),
            port: self.address.port,
            username: self.address.username.clone(),
            password: self.address.password.clone(),
        };
        Ok(FtpOperations::new(client, spec, options, policy))
    }

    fn startup_error(&self, role: EndpointRole, source: ConfigError) -> StartupError {
        StartupError {
            role,
            address: self.address.uri.clone(),
            source,
        }
    }

    /// Build a polling consumer delivering into `sink`.
    pub fn build_consumer(
        &mut self,
        sink: Arc<dyn DeliverySink<FtpMetadata>>,
    ) -> Result<RemoteFileConsumer<FtpOperations<C>>, StartupError> {
        let ops = self
            .create_operations()
            .map_err(|e| self.startup_error(EndpointRole::Consumer, e))?;

        let config = ConsumerConfig {
            directory: self.address.path.clone(),
            hostname: self.address.host.clone(),
            settings: self.settings.clone(),
        };

        info!(address = %self.address.uri, "consumer created");
        Ok(RemoteFileConsumer::new(ops, config, sink))
    }

    /// Build a producer for the outbound path.
    pub fn build_producer(
        &mut self,
    ) -> Result<RemoteFileProducer<FtpOperations<C>>, StartupError> {
        let ops = self
            .create_operations()
            .map_err(|e| self.startup_error(EndpointRole::Producer, e))?;

        let config = ProducerConfig {
            directory: self.address.path.clone(),
            auto_create: self.settings.auto_create,
            keep_alive: self.settings.keep_alive,
        };

        info!(address = %self.address.uri, "producer created");
        Ok(RemoteFileProducer::new(ops, config))
    }
}
