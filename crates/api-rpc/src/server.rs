//! JSON-RPC Server
//!
//! Serves the artist, location and event methods over TCP.

use crate::handler::RpcHandler;
use crate::types::{
    DeleteRequest, GetArtistsRequest, GetEventsRequest, GetLocationsRequest,
    UpsertArtistsRequest, UpsertEventsRequest, UpsertLocationsRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9527;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

/// Register `$method`, parsing params as `$req` and calling `handler.$call`
macro_rules! register {
    ($module:expr, $handler:expr, $method:literal, $req:ty, $call:ident $(,)?) => {{
        let handler = $handler.clone();
        $module
            .register_async_method($method, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: $req = params.parse()?;
                    handler.$call(req).await
                }
            })
            .map_err(|e| e.to_string())?;
    }};
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// All methods, without a transport
    pub fn module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        register!(module, self.handler, "artists.upsert.v1", UpsertArtistsRequest, upsert_artists);
        register!(module, self.handler, "artists.get.v1", GetArtistsRequest, get_artists);
        register!(module, self.handler, "artists.delete.v1", DeleteRequest, delete_artist);

        register!(
            module,
            self.handler,
            "locations.upsert.v1",
            UpsertLocationsRequest,
            upsert_locations,
        );
        register!(module, self.handler, "locations.get.v1", GetLocationsRequest, get_locations);
        register!(module, self.handler, "locations.delete.v1", DeleteRequest, delete_location);

        register!(module, self.handler, "events.upsert.v1", UpsertEventsRequest, upsert_events);
        register!(module, self.handler, "events.get.v1", GetEventsRequest, get_events);
        register!(module, self.handler, "events.delete.v1", DeleteRequest, delete_event);

        let handler = self.handler.clone();
        module
            .register_async_method("health.ready.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.ready().await }
            })
            .map_err(|e| e.to_string())?;

        // Admin APIs
        let handler = self.handler.clone();
        module
            .register_method("admin.metrics.v1", move |_, _, _| {
                Ok::<_, ErrorObjectOwned>(handler.metrics())
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Start the JSON-RPC server, returning its handle and bound address
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.module()?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((handle, local_addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artistdb_core::port::InMemoryMetrics;

    #[test]
    fn test_default_config() {
        let config = RpcServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9527);
    }

    #[test]
    fn test_all_methods_registered() {
        use artistdb_core::domain::{
            Artist, ArtistFilter, Event, EventFilter, Location, LocationFilter,
        };
        use artistdb_core::error::Result;
        use artistdb_core::port::{
            ArtistRepository, EventRepository, HealthCheck, LocationRepository,
        };
        use async_trait::async_trait;

        struct Unused;

        #[async_trait]
        impl ArtistRepository for Unused {
            async fn upsert_artists(&self, _: &[Artist]) -> Result<()> {
                Ok(())
            }
            async fn get_artists(&self, _: &ArtistFilter) -> Result<Vec<Artist>> {
                Ok(vec![])
            }
            async fn delete_artist_by_id(&self, _: &str) -> Result<()> {
                Ok(())
            }
        }

        #[async_trait]
        impl LocationRepository for Unused {
            async fn upsert_locations(&self, _: &[Location]) -> Result<()> {
                Ok(())
            }
            async fn get_locations(&self, _: &LocationFilter) -> Result<Vec<Location>> {
                Ok(vec![])
            }
            async fn delete_location_by_id(&self, _: &str) -> Result<()> {
                Ok(())
            }
        }

        #[async_trait]
        impl EventRepository for Unused {
            async fn upsert_events(&self, _: &[Event]) -> Result<()> {
                Ok(())
            }
            async fn get_events(&self, _: &EventFilter) -> Result<Vec<Event>> {
                Ok(vec![])
            }
            async fn delete_event_by_id(&self, _: &str) -> Result<()> {
                Ok(())
            }
        }

        #[async_trait]
        impl HealthCheck for Unused {
            async fn ready(&self) -> Result<()> {
                Ok(())
            }
        }

        let unused = Arc::new(Unused);
        let server = RpcServer::new(
            RpcServerConfig::default(),
            RpcHandler::new(
                unused.clone(),
                unused.clone(),
                unused.clone(),
                unused,
                Arc::new(InMemoryMetrics::new()),
            ),
        );

        let module = server.module().unwrap();
        let methods: Vec<&str> = module.method_names().collect();
        for method in [
            "artists.upsert.v1",
            "artists.get.v1",
            "artists.delete.v1",
            "locations.upsert.v1",
            "locations.get.v1",
            "locations.delete.v1",
            "events.upsert.v1",
            "events.get.v1",
            "events.delete.v1",
            "health.ready.v1",
            "admin.metrics.v1",
        ] {
            assert!(methods.contains(&method), "{method} not registered");
        }
    }
}
