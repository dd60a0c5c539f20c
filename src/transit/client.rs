//! Transit API client. Every upstream call goes through the governor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use url::Url;

use crate::config::DEPARTURES_CACHE_TTL;
use crate::error_handling::TransitApiError;
use crate::governor::{ApiGovernor, EndpointKind, Priority};

use super::models::{
    best_station_match, BoundingBox, DeparturesResponse, LocationResult, RadarResponse,
    StationDepartures, Train,
};

/// Client for the live transit API.
///
/// Cheap to clone; clones share the HTTP client, the governor and the caches.
/// Methods return `Ok(None)` when the governor withheld the call for lack of
/// budget; callers retry on their next cycle.
#[derive(Clone)]
pub struct TransitClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Arc<Client>,
    base_url: Url,
    governor: ApiGovernor,
    /// Station ids never change, so lookups are cached for the session.
    station_ids: Mutex<HashMap<String, String>>,
    departures: Mutex<HashMap<String, (Instant, StationDepartures)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// GETs `url` and decodes the JSON body, mapping non-2xx statuses to errors.
async fn get_json<R: DeserializeOwned>(http: Arc<Client>, url: Url) -> Result<R, TransitApiError> {
    let endpoint = url.path().to_string();
    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransitApiError::Status {
            status: status.as_u16(),
            endpoint,
        });
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

impl TransitClient {
    pub fn new(http: Arc<Client>, base_url: Url, governor: ApiGovernor) -> Self {
        TransitClient {
            inner: Arc::new(Inner {
                http,
                base_url,
                governor,
                station_ids: Mutex::new(HashMap::new()),
                departures: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn governor(&self) -> &ApiGovernor {
        &self.inner.governor
    }

    /// Base URL with `segments` appended to its path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransitApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Live train positions inside `bounds` (widened by a margin), or the
    /// default area.
    ///
    /// Runs at low priority, or normal while a line is hovered.
    pub async fn fetch_trains(
        &self,
        bounds: Option<BoundingBox>,
    ) -> Result<Option<Vec<Train>>, TransitApiError> {
        let area = bounds.map(BoundingBox::widened).unwrap_or_default();
        let mut url = self.endpoint(&["radar"])?;
        url.query_pairs_mut()
            .append_pair("north", &area.north.to_string())
            .append_pair("west", &area.west.to_string())
            .append_pair("south", &area.south.to_string())
            .append_pair("east", &area.east.to_string())
            .append_pair("results", "512")
            .append_pair("duration", "30")
            .append_pair("frames", "1");

        let http = Arc::clone(&self.inner.http);
        let priority = self.inner.governor.trains_priority();
        let trains = self
            .inner
            .governor
            .execute_request(
                EndpointKind::Trains,
                move || async move {
                    let radar: RadarResponse = get_json(http, url).await?;
                    Ok::<_, TransitApiError>(radar.into_trains(Utc::now()))
                },
                priority,
            )
            .await?;

        match &trains {
            Some(trains) => log::debug!("Fetched {} train positions", trains.len()),
            None => log::debug!("Train positions withheld by governor ({} priority)", priority),
        }
        Ok(trains)
    }

    /// Resolves a station name to its API id, caching hits for the session.
    pub async fn station_id(&self, station_name: &str) -> Result<Option<String>, TransitApiError> {
        if let Some(id) = lock(&self.inner.station_ids).get(station_name) {
            return Ok(Some(id.clone()));
        }

        let mut url = self.endpoint(&["locations"])?;
        url.query_pairs_mut()
            .append_pair("query", station_name)
            .append_pair("results", "5")
            .append_pair("addresses", "false")
            .append_pair("poi", "false");

        let http = Arc::clone(&self.inner.http);
        let locations = self
            .inner
            .governor
            .execute_request(
                EndpointKind::Locations,
                move || get_json::<Vec<LocationResult>>(http, url),
                Priority::Normal,
            )
            .await?;

        let Some(locations) = locations else {
            return Ok(None);
        };
        match best_station_match(&locations) {
            Some(id) => {
                lock(&self.inner.station_ids).insert(station_name.to_string(), id.clone());
                Ok(Some(id))
            }
            None => {
                log::warn!("No station found for: {}", station_name);
                Ok(None)
            }
        }
    }

    fn cached_departures(&self, station_name: &str) -> Option<StationDepartures> {
        let mut cache = lock(&self.inner.departures);
        match cache.get(station_name) {
            Some((fetched_at, board)) if fetched_at.elapsed() < DEPARTURES_CACHE_TTL => {
                Some(board.clone())
            }
            Some(_) => {
                cache.remove(station_name);
                None
            }
            None => None,
        }
    }

    /// Departure board of a station, cached for a minute.
    ///
    /// High priority when `is_hovered` or the station is the hovered one, so
    /// it is queued rather than dropped under pressure.
    pub async fn fetch_departures(
        &self,
        station_name: &str,
        is_hovered: bool,
    ) -> Result<Option<StationDepartures>, TransitApiError> {
        if let Some(board) = self.cached_departures(station_name) {
            return Ok(Some(board));
        }

        let priority = self
            .inner
            .governor
            .departures_priority(station_name, is_hovered);

        let Some(station_id) = self.station_id(station_name).await? else {
            return Ok(None);
        };

        let mut url = self.endpoint(&["stops", &station_id, "departures"])?;
        url.query_pairs_mut()
            .append_pair("duration", "60")
            .append_pair("results", "30");

        let http = Arc::clone(&self.inner.http);
        let name = station_name.to_string();
        let board = self
            .inner
            .governor
            .execute_request(
                EndpointKind::Departures,
                move || async move {
                    let response: DeparturesResponse = get_json(http, url).await?;
                    Ok::<_, TransitApiError>(StationDepartures::build(
                        station_id,
                        name,
                        response.departures,
                    ))
                },
                priority,
            )
            .await?;

        if let Some(board) = &board {
            lock(&self.inner.departures)
                .insert(station_name.to_string(), (Instant::now(), board.clone()));
        }
        Ok(board)
    }

    /// Whether a fresh departure board for the station is cached.
    pub fn has_cached_departures(&self, station_name: &str) -> bool {
        self.cached_departures(station_name).is_some()
    }

    /// Warms the departures cache for a station in the background.
    ///
    /// The fetch runs as a non-hovered lookup, so at normal priority unless
    /// the station is the hovered one. Returns `false` when the station is
    /// already cached.
    pub fn prefetch_departures(&self, station_name: &str) -> bool {
        if self.has_cached_departures(station_name) {
            return false;
        }
        let client = self.clone();
        let name = station_name.to_string();
        tokio::spawn(async move {
            if let Err(e) = client.fetch_departures(&name, false).await {
                log::debug!("Departures prefetch for {} failed: {}", name, e);
            }
        });
        true
    }
}
