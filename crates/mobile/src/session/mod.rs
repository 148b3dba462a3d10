use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use walkshed_core::analysis::{AnalysisService, GenerativeTextClient, analyze_or_fallback};
use walkshed_core::locate::{GeolocationError, LocateOutcome, LocateTicket};
use walkshed_core::map::MarkerHandle;
use walkshed_core::state::StateError;
use walkshed_core::transit::{Coordinates, StaticStationDirectory, StationIdentifier};
use walkshed_core::{App, WalkshedConfig};

use crate::logging::setup_logging;
use crate::overlay_server::OverlayServer;
use crate::surface::StyleSurface;

mod style;

const STATIONS: &str = include_str!("../../../../assets/stations.json");

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("station directory unavailable: {0}")]
    Directory(String),

    #[error("{0}")]
    OverlayServer(String),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("no location lookup in progress")]
    NoPendingLocate,
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct StationRecord {
    pub id: String,
    pub name: String,
    pub line: String,
    /// `#RRGGBB`
    pub color: String,
    pub latitude: f64,
    pub longitude: f64,
    pub selected: bool,
    /// `None` when the station has no usable position.
    pub marker_id: Option<u64>,
}

/// Options the host passes to its platform location API.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct LocateRequest {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum LocationFailure {
    Unavailable,
    Denied,
    Timeout,
    Failed { message: String },
}

impl From<LocationFailure> for GeolocationError {
    fn from(failure: LocationFailure) -> Self {
        match failure {
            LocationFailure::Unavailable => GeolocationError::Unavailable,
            LocationFailure::Denied => GeolocationError::Denied,
            LocationFailure::Timeout => GeolocationError::Timeout,
            LocationFailure::Failed { message } => GeolocationError::Failed(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct LocateReport {
    pub selected_station_id: Option<String>,
    /// Blocking notice to show the user.
    pub notice: Option<String>,
    pub discarded: bool,
}

impl From<LocateOutcome> for LocateReport {
    fn from(outcome: LocateOutcome) -> Self {
        let notice = outcome.notice().map(str::to_owned);
        match outcome {
            LocateOutcome::Selected(id) => LocateReport {
                selected_station_id: Some(id.as_str().to_owned()),
                notice,
                discarded: false,
            },
            LocateOutcome::Discarded => LocateReport {
                selected_station_id: None,
                notice,
                discarded: true,
            },
            LocateOutcome::NoStation | LocateOutcome::Failed(_) => LocateReport {
                selected_station_id: None,
                notice,
                discarded: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct AnalysisRecord {
    /// Panel is hidden while nothing is selected.
    pub visible: bool,
    pub loading: bool,
    pub summary: Option<String>,
    pub places: Vec<String>,
}

struct Inner {
    app: App<StyleSurface>,
    pending_locate: Option<LocateTicket>,
}

#[derive(uniffi::Object)]
pub struct WalkshedSession {
    inner: Mutex<Inner>,
    analysis: Arc<dyn AnalysisService>,
    style_json: String,
    overlay_server: OverlayServer,
}

impl WalkshedSession {
    fn build(config: WalkshedConfig, stations_json: &str) -> Result<Self, SessionError> {
        let directory = StaticStationDirectory::from_json(stations_json)
            .map_err(|e| SessionError::Directory(e.to_string()))?;

        let (surface, snapshots) = StyleSurface::new(&config.viewport);
        let overlay_server =
            OverlayServer::start(snapshots).map_err(|e| SessionError::OverlayServer(e.to_string()))?;

        let style_json = style::rewrite_style_sources(
            style::BASE_STYLE,
            &overlay_server.base_url(),
            &config.tiles,
            &config.viewport,
        )
        .map_err(|e| SessionError::Config(e.to_string()))?;

        let analysis = Arc::new(GenerativeTextClient::from_config(&config.analysis));
        let app = App::new(Arc::new(directory), surface, config);

        Ok(Self {
            inner: Mutex::new(Inner {
                app,
                pending_locate: None,
            }),
            analysis,
            style_json,
            overlay_server,
        })
    }

    fn parse_config(config_json: Option<String>) -> Result<WalkshedConfig, SessionError> {
        match config_json {
            Some(json) => {
                WalkshedConfig::from_json(&json).map_err(|e| SessionError::Config(e.to_string()))
            }
            None => Ok(WalkshedConfig::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_locate(
        &self,
        result: Result<Coordinates, GeolocationError>,
    ) -> Result<LocateReport, SessionError> {
        let mut inner = self.lock();
        let ticket = inner
            .pending_locate
            .take()
            .ok_or(SessionError::NoPendingLocate)?;

        Ok(inner.app.complete_locate(ticket, result).into())
    }
}

#[uniffi::export]
impl WalkshedSession {
    /// Session over the bundled Taipei Metro directory.
    #[uniffi::constructor]
    pub fn new(config_json: Option<String>) -> Result<Arc<Self>, SessionError> {
        setup_logging();
        Ok(Arc::new(Self::build(Self::parse_config(config_json)?, STATIONS)?))
    }

    #[uniffi::constructor]
    pub fn with_directory(
        stations_json: String,
        config_json: Option<String>,
    ) -> Result<Arc<Self>, SessionError> {
        setup_logging();
        Ok(Arc::new(Self::build(
            Self::parse_config(config_json)?,
            &stations_json,
        )?))
    }

    /// MapLibre style for the host map view.
    pub fn style_json(&self) -> String {
        self.style_json.clone()
    }

    pub fn overlay_base_url(&self) -> String {
        self.overlay_server.base_url()
    }

    pub fn tile_attribution(&self) -> String {
        self.lock().app.config().tiles.attribution.clone()
    }

    pub fn stations(&self) -> Vec<StationRecord> {
        let inner = self.lock();
        let app = &inner.app;

        app.directory()
            .all_stations()
            .iter()
            .map(|station| {
                let coords = station.coords();
                StationRecord {
                    id: station.id().as_str().to_owned(),
                    name: station.name().to_owned(),
                    line: station.line().to_owned(),
                    color: station.color().hex().to_owned(),
                    latitude: coords.lat,
                    longitude: coords.lng,
                    selected: app.state().selection().contains(station.id()),
                    marker_id: app.map().marker_for(station.id()).map(|m| m.0),
                }
            })
            .collect()
    }

    pub fn selected_station_ids(&self) -> Vec<String> {
        self.lock()
            .app
            .state()
            .selection()
            .iter()
            .map(|id| id.as_str().to_owned())
            .collect()
    }

    pub fn is_all_selected(&self) -> bool {
        self.lock().app.is_all_selected()
    }

    pub fn toggle_station(&self, id: String) -> Result<bool, SessionError> {
        Ok(self.lock().app.toggle_station(&StationIdentifier::new(id))?)
    }

    /// Select-all / clear-all button.
    pub fn toggle_all(&self) {
        let mut inner = self.lock();
        if inner.app.is_all_selected() {
            inner.app.clear_all();
        } else {
            inner.app.select_all();
        }
    }

    pub fn select_all(&self) {
        self.lock().app.select_all();
    }

    pub fn clear_all(&self) {
        self.lock().app.clear_all();
    }

    pub fn thresholds(&self) -> Vec<u32> {
        self.lock().app.state().thresholds().as_slice().to_vec()
    }

    pub fn set_threshold(&self, index: u32, minutes: u32) -> Result<(), SessionError> {
        Ok(self.lock().app.set_threshold(index as usize, minutes)?)
    }

    /// `None` when the id is not one of this session's markers.
    pub fn click_marker(&self, marker_id: u64) -> Result<Option<bool>, SessionError> {
        match self.lock().app.click_marker(MarkerHandle(marker_id)) {
            Some(result) => Ok(Some(result?)),
            None => Ok(None),
        }
    }

    pub fn is_locating(&self) -> bool {
        self.lock().app.state().is_locating()
    }

    /// `None` while a lookup is already running.
    pub fn begin_locate(&self) -> Option<LocateRequest> {
        let mut inner = self.lock();
        let ticket = inner.app.begin_locate()?;
        inner.pending_locate = Some(ticket);

        Some(LocateRequest {
            enable_high_accuracy: ticket.options.enable_high_accuracy,
            timeout_ms: ticket.options.timeout.as_millis() as u64,
            maximum_age_ms: ticket.options.maximum_age.as_millis() as u64,
        })
    }

    pub fn complete_locate(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<LocateReport, SessionError> {
        self.finish_locate(Ok(Coordinates::new(latitude, longitude)))
    }

    pub fn fail_locate(&self, failure: LocationFailure) -> Result<LocateReport, SessionError> {
        self.finish_locate(Err(failure.into()))
    }

    pub fn analysis(&self) -> AnalysisRecord {
        let inner = self.lock();
        let panel = inner.app.state().analysis();
        let result = panel.result();

        AnalysisRecord {
            visible: inner.app.analysis_available(),
            loading: panel.is_loading(),
            summary: result.map(|r| r.summary.clone()),
            places: result.map(|r| r.places.clone()).unwrap_or_default(),
        }
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl WalkshedSession {
    /// Request a summary for the current selection. Resolves to the panel
    /// state; a failed request shows the fallback text.
    pub async fn analyze(&self) -> AnalysisRecord {
        let request = self.lock().app.begin_analysis();

        if let Some(request) = request {
            let result = analyze_or_fallback(self.analysis.as_ref(), &request).await;
            self.lock().app.complete_analysis(result);
        }

        self.analysis()
    }
}
