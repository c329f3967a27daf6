//! RPC Method Handlers
//!
//! Thin layer over the repository ports: convert inputs, call, map errors.

use crate::error::to_rpc_error;
use crate::types::{
    DeleteRequest, DeleteResponse, EventView, GetArtistsRequest, GetArtistsResponse,
    GetEventsRequest, GetEventsResponse, GetLocationsRequest, GetLocationsResponse,
    ReadyResponse, UpsertArtistsRequest, UpsertEventsRequest, UpsertLocationsRequest,
    UpsertResponse,
};
use artistdb_core::application::resolve_event_location;
use artistdb_core::domain::{Artist, Event, Location};
use artistdb_core::port::{
    ArtistRepository, EventRepository, HealthCheck, InMemoryMetrics, LocationRepository,
    MetricsSnapshot,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    artists: Arc<dyn ArtistRepository>,
    locations: Arc<dyn LocationRepository>,
    events: Arc<dyn EventRepository>,
    health: Arc<dyn HealthCheck>,
    metrics: Arc<InMemoryMetrics>,
}

impl RpcHandler {
    pub fn new(
        artists: Arc<dyn ArtistRepository>,
        locations: Arc<dyn LocationRepository>,
        events: Arc<dyn EventRepository>,
        health: Arc<dyn HealthCheck>,
        metrics: Arc<InMemoryMetrics>,
    ) -> Self {
        Self {
            artists,
            locations,
            events,
            health,
            metrics,
        }
    }

    /// artists.upsert.v1
    pub async fn upsert_artists(
        &self,
        params: UpsertArtistsRequest,
    ) -> Result<UpsertResponse, ErrorObjectOwned> {
        let artists: Vec<Artist> = params.artists.into_iter().map(Artist::from).collect();
        let ids = artists.iter().map(|a| a.id.clone()).collect();

        self.artists
            .upsert_artists(&artists)
            .await
            .map_err(to_rpc_error)?;

        Ok(UpsertResponse { ids })
    }

    /// artists.get.v1
    pub async fn get_artists(
        &self,
        params: GetArtistsRequest,
    ) -> Result<GetArtistsResponse, ErrorObjectOwned> {
        let artists = self
            .artists
            .get_artists(&params.by)
            .await
            .map_err(to_rpc_error)?;

        Ok(GetArtistsResponse { artists })
    }

    /// artists.delete.v1
    pub async fn delete_artist(
        &self,
        params: DeleteRequest,
    ) -> Result<DeleteResponse, ErrorObjectOwned> {
        self.artists
            .delete_artist_by_id(&params.id)
            .await
            .map_err(to_rpc_error)?;

        Ok(DeleteResponse {
            id: params.id,
            deleted: true,
        })
    }

    /// locations.upsert.v1
    pub async fn upsert_locations(
        &self,
        params: UpsertLocationsRequest,
    ) -> Result<UpsertResponse, ErrorObjectOwned> {
        let locations: Vec<Location> =
            params.locations.into_iter().map(Location::from).collect();
        let ids = locations.iter().map(|l| l.id.clone()).collect();

        self.locations
            .upsert_locations(&locations)
            .await
            .map_err(to_rpc_error)?;

        Ok(UpsertResponse { ids })
    }

    /// locations.get.v1
    pub async fn get_locations(
        &self,
        params: GetLocationsRequest,
    ) -> Result<GetLocationsResponse, ErrorObjectOwned> {
        let locations = self
            .locations
            .get_locations(&params.by)
            .await
            .map_err(to_rpc_error)?;

        Ok(GetLocationsResponse { locations })
    }

    /// locations.delete.v1
    pub async fn delete_location(
        &self,
        params: DeleteRequest,
    ) -> Result<DeleteResponse, ErrorObjectOwned> {
        self.locations
            .delete_location_by_id(&params.id)
            .await
            .map_err(to_rpc_error)?;

        Ok(DeleteResponse {
            id: params.id,
            deleted: true,
        })
    }

    /// events.upsert.v1
    pub async fn upsert_events(
        &self,
        params: UpsertEventsRequest,
    ) -> Result<UpsertResponse, ErrorObjectOwned> {
        let events: Vec<Event> = params.events.into_iter().map(Event::from).collect();
        let ids = events.iter().map(|e| e.id.clone()).collect();

        self.events
            .upsert_events(&events)
            .await
            .map_err(to_rpc_error)?;

        Ok(UpsertResponse { ids })
    }

    /// events.get.v1 (each event with its resolved location)
    pub async fn get_events(
        &self,
        params: GetEventsRequest,
    ) -> Result<GetEventsResponse, ErrorObjectOwned> {
        let events = self
            .events
            .get_events(&params.by)
            .await
            .map_err(to_rpc_error)?;

        let mut views = Vec::with_capacity(events.len());
        for event in events {
            let location = resolve_event_location(self.locations.as_ref(), &event)
                .await
                .map_err(to_rpc_error)?;
            views.push(EventView { event, location });
        }

        Ok(GetEventsResponse { events: views })
    }

    /// events.delete.v1
    pub async fn delete_event(
        &self,
        params: DeleteRequest,
    ) -> Result<DeleteResponse, ErrorObjectOwned> {
        self.events
            .delete_event_by_id(&params.id)
            .await
            .map_err(to_rpc_error)?;

        Ok(DeleteResponse {
            id: params.id,
            deleted: true,
        })
    }

    /// health.ready.v1
    pub async fn ready(&self) -> Result<ReadyResponse, ErrorObjectOwned> {
        self.health.ready().await.map_err(to_rpc_error)?;
        Ok(ReadyResponse { ready: true })
    }

    /// admin.metrics.v1
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
