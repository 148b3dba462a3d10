//! Controller tying the directory, the state and the map together.
//!
//! Every action mutates [`AppState`] and then re-renders: markers and layers
//! always, the viewport only when the selection changed.

use std::sync::Arc;

use geojson::FeatureCollection;
use walkshed_transit::spatial::haversine_distance;
use walkshed_transit::{Coordinates, StationDirectory, StationIdentifier, TransitStation};

use crate::analysis::{AnalysisRequest, AnalysisResult, AnalysisService, analyze_or_fallback};
use crate::catchment::{CatchmentLayer, export};
use crate::config::WalkshedConfig;
use crate::locate::{
    GeolocationError, GeolocationProvider, LocateOutcome, LocateTicket, StaleLocatePolicy,
    locate_with,
};
use crate::map::{MapEvent, MapSurface, MapView, MarkerHandle};
use crate::state::{AppState, StateError};

pub struct App<S> {
    directory: Arc<dyn StationDirectory>,
    state: AppState,
    map: MapView<S>,
    layers: Vec<CatchmentLayer>,
    config: WalkshedConfig,
}

impl<S: MapSurface> App<S> {
    pub fn new(directory: Arc<dyn StationDirectory>, surface: S, config: WalkshedConfig) -> Self {
        let state = AppState::seeded(directory.as_ref());
        let map = MapView::new(surface, config.catchment, config.viewport);

        tracing::info!(
            "starting with {} stations, {} selected",
            directory.len(),
            state.selection().len()
        );

        let mut app = Self {
            directory,
            state,
            map,
            layers: Vec::new(),
            config,
        };
        app.refresh(true);
        app
    }

    pub fn directory(&self) -> &Arc<dyn StationDirectory> {
        &self.directory
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn map(&self) -> &MapView<S> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapView<S> {
        &mut self.map
    }

    pub fn config(&self) -> &WalkshedConfig {
        &self.config
    }

    /// Layers from the last render, in draw order.
    pub fn layers(&self) -> &[CatchmentLayer] {
        &self.layers
    }

    pub fn overlay_collection(&self) -> FeatureCollection {
        export::layers_to_collection(&self.layers)
    }

    /// Selected stations in selection order.
    pub fn selected_stations(&self) -> Vec<Arc<dyn TransitStation>> {
        self.state
            .selection()
            .iter()
            .filter_map(|id| self.directory.get_station(id))
            .collect()
    }

    pub fn is_all_selected(&self) -> bool {
        self.state.is_all_selected(self.directory.as_ref())
    }

    pub fn toggle_station(&mut self, id: &StationIdentifier) -> Result<bool, StateError> {
        let selected = self.state.toggle(self.directory.as_ref(), id)?;
        self.refresh(true);
        Ok(selected)
    }

    pub fn select_all(&mut self) {
        self.state.select_all(self.directory.as_ref());
        self.refresh(true);
    }

    pub fn clear_all(&mut self) {
        self.state.clear_all();
        self.refresh(true);
    }

    pub fn set_threshold(&mut self, index: usize, minutes: u32) -> Result<(), StateError> {
        self.state.set_threshold(index, minutes)?;
        self.refresh(false);
        Ok(())
    }

    /// Route a marker click. `None` for handles the map does not know.
    pub fn click_marker(&mut self, marker: MarkerHandle) -> Option<Result<bool, StateError>> {
        match self.map.handle_click(marker)? {
            MapEvent::ToggleStation(id) => Some(self.toggle_station(&id)),
        }
    }

    /// Start a location lookup. `None` while another one is in flight.
    pub fn begin_locate(&mut self) -> Option<LocateTicket> {
        if self.state.is_locating() {
            return None;
        }

        self.state.set_locating(true);
        Some(LocateTicket {
            revision: self.state.selection_revision(),
            options: self.config.locate.options(),
        })
    }

    pub fn complete_locate(
        &mut self,
        ticket: LocateTicket,
        result: Result<Coordinates, GeolocationError>,
    ) -> LocateOutcome {
        self.state.set_locating(false);

        let position = match result {
            Ok(position) => position,
            Err(error) => {
                tracing::warn!("location lookup failed: {error}");
                return LocateOutcome::Failed(error);
            }
        };

        if self.config.locate.stale_policy == StaleLocatePolicy::DiscardIfSelectionChanged
            && ticket.revision != self.state.selection_revision()
        {
            tracing::info!("discarding location fix: selection changed while locating");
            return LocateOutcome::Discarded;
        }

        let Some(nearest) = self.directory.nearest_station(position) else {
            return LocateOutcome::NoStation;
        };

        let id = nearest.id().clone();
        match self.state.replace_selection(self.directory.as_ref(), &id) {
            Ok(()) => {
                tracing::info!(
                    "nearest station is {} ({:.0} m away)",
                    nearest.name(),
                    haversine_distance(position, nearest.coords())
                );
                self.refresh(true);
                LocateOutcome::Selected(id)
            }
            Err(error) => {
                tracing::error!("nearest station not selectable: {error}");
                LocateOutcome::NoStation
            }
        }
    }

    /// Whole locate flow in one call. Returns `None` if already locating.
    pub async fn locate_nearest(
        &mut self,
        provider: &dyn GeolocationProvider,
    ) -> Option<LocateOutcome> {
        let ticket = self.begin_locate()?;
        let result = locate_with(provider, &ticket.options).await;
        Some(self.complete_locate(ticket, result))
    }

    /// Panel is hidden when nothing is selected.
    pub fn analysis_available(&self) -> bool {
        !self.state.selection().is_empty()
    }

    /// Request for the current selection, or `None` when hidden or already loading.
    pub fn begin_analysis(&mut self) -> Option<AnalysisRequest> {
        if !self.analysis_available() {
            return None;
        }

        let stations = self.selected_stations();
        if !self.state.analysis.start() {
            return None;
        }
        Some(AnalysisRequest::new(&stations, self.state.thresholds()))
    }

    pub fn complete_analysis(&mut self, result: AnalysisResult) {
        self.state.analysis.finish(result);
    }

    pub async fn analyze(&mut self, service: &dyn AnalysisService) -> Option<&AnalysisResult> {
        let request = self.begin_analysis()?;
        let result = analyze_or_fallback(service, &request).await;
        self.complete_analysis(result);
        self.state.analysis().result()
    }

    fn refresh(&mut self, selection_changed: bool) {
        let ids = self.state.selection().ids().to_vec();
        self.state.analysis.track_selection(&ids);

        let all = self.directory.all_stations();
        let selected = self.selected_stations();

        self.map.sync_markers(&all);
        self.layers = self.map.render(
            &all,
            self.state.selection(),
            &selected,
            self.state.thresholds().as_slice(),
        );

        if selection_changed {
            self.map.fit_selection(&selected);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;

    use super::*;
    use crate::analysis::AnalysisError;
    use crate::locate::{FAILED_NOTICE, GeolocationOptions, UNSUPPORTED_NOTICE};
    use crate::map::testing::{Call, RecordingSurface};
    use walkshed_transit::{LineColor, StaticStationDirectory, StationImpl};

    fn directory() -> Arc<dyn StationDirectory> {
        let station = |id: &str, name: &str, lat: f64, lng: f64| StationImpl {
            id: StationIdentifier::new(id),
            name: name.into(),
            line: "淡水信義線".into(),
            color: LineColor::Red,
            coords: Coordinates::new(lat, lng),
        };

        Arc::new(
            StaticStationDirectory::from_data(vec![
                station("R10", "台北車站", 25.0478, 121.5170),
                station("R11", "中山", 25.0527, 121.5204),
                station("R05", "大安", 25.0330, 121.5434),
                station("X", "未知", f64::NAN, f64::NAN),
            ])
            .unwrap(),
        )
    }

    fn app() -> App<RecordingSurface> {
        App::new(directory(), RecordingSurface::default(), WalkshedConfig::default())
    }

    fn id(raw: &str) -> StationIdentifier {
        StationIdentifier::new(raw)
    }

    fn overlays(calls: &[Call]) -> usize {
        calls
            .iter()
            .filter(|c| matches!(c, Call::Overlay { .. }))
            .count()
    }

    struct Fixed(Result<Coordinates, GeolocationError>);

    impl GeolocationProvider for Fixed {
        fn current_position<'a>(
            &'a self,
            _options: &'a GeolocationOptions,
        ) -> Pin<Box<dyn Future<Output = Result<Coordinates, GeolocationError>> + Send + 'a>>
        {
            let result = self.0.clone();
            Box::pin(async move { result })
        }
    }

    struct Broken;

    impl AnalysisService for Broken {
        fn analyze<'a>(
            &'a self,
            _request: &'a AnalysisRequest,
        ) -> Pin<Box<dyn Future<Output = Result<AnalysisResult, AnalysisError>> + Send + 'a>>
        {
            Box::pin(async { Err(AnalysisError::MissingCredential) })
        }
    }

    #[test]
    fn startup_renders_seeded_selection() {
        let mut app = app();

        assert_eq!(app.state().selection().ids(), [id("R10")]);
        assert_eq!(app.map().marker_count(), 3);
        assert_eq!(app.layers().len(), 3);

        let calls = app.map_mut().surface_mut().take();
        assert_eq!(overlays(&calls), 3);
        assert!(matches!(calls.last(), Some(Call::FlyTo(_, zoom)) if *zoom == 14.0));
    }

    #[test]
    fn selection_changes_move_viewport_but_thresholds_do_not() {
        let mut app = app();
        app.map_mut().surface_mut().take();

        assert!(app.toggle_station(&id("R11")).unwrap());
        let calls = app.map_mut().surface_mut().take();
        assert!(matches!(calls.last(), Some(Call::Fit(_))));

        app.set_threshold(1, 20).unwrap();
        let calls = app.map_mut().surface_mut().take();
        assert_eq!(overlays(&calls), 3);
        assert!(!calls.iter().any(|c| matches!(c, Call::Fit(_) | Call::FlyTo(..))));
        assert_eq!(app.layers()[0].minutes, 20);

        assert!(app.set_threshold(1, 31).is_err());
        assert_eq!(app.state().thresholds().as_slice(), [2, 20, 8]);
    }

    #[test]
    fn marker_click_toggles_station() {
        let mut app = app();
        let marker = app.map().marker_for(&id("R05")).unwrap();

        assert!(matches!(app.click_marker(marker), Some(Ok(true))));
        assert!(app.state().selection().contains(&id("R05")));
        assert!(matches!(app.click_marker(marker), Some(Ok(false))));
        assert!(app.click_marker(MarkerHandle(404)).is_none());
    }

    #[test]
    fn clear_all_removes_layers_and_hides_analysis() {
        let mut app = app();

        app.select_all();
        assert!(app.is_all_selected());
        assert_eq!(app.selected_stations().len(), 4);

        app.clear_all();
        assert!(app.layers().is_empty());
        assert!(app.overlay_collection().features.is_empty());
        assert!(!app.analysis_available());
        assert!(app.begin_analysis().is_none());
    }

    #[test]
    fn locate_replaces_selection_with_nearest_station() {
        let mut app = app();

        let ticket = app.begin_locate().unwrap();
        assert!(app.state().is_locating());
        assert!(app.begin_locate().is_none());

        let outcome = app.complete_locate(ticket, Ok(Coordinates::new(25.0340, 121.5440)));
        assert_eq!(outcome, LocateOutcome::Selected(id("R05")));
        assert_eq!(app.state().selection().ids(), [id("R05")]);
        assert!(!app.state().is_locating());
    }

    #[test]
    fn locate_failure_reports_notice_and_resets() {
        let mut app = app();

        let ticket = app.begin_locate().unwrap();
        let outcome = app.complete_locate(ticket, Err(GeolocationError::Denied));
        assert_eq!(outcome.notice(), Some(FAILED_NOTICE));
        assert!(!app.state().is_locating());
        assert_eq!(app.state().selection().ids(), [id("R10")]);

        let ticket = app.begin_locate().unwrap();
        let outcome = app.complete_locate(ticket, Err(GeolocationError::Unavailable));
        assert_eq!(outcome.notice(), Some(UNSUPPORTED_NOTICE));
    }

    #[test]
    fn stale_fix_follows_policy() {
        let fix = Coordinates::new(25.0340, 121.5440);

        let mut app = app();
        let ticket = app.begin_locate().unwrap();
        app.toggle_station(&id("R11")).unwrap();
        assert_eq!(
            app.complete_locate(ticket, Ok(fix)),
            LocateOutcome::Selected(id("R05"))
        );

        let mut config = WalkshedConfig::default();
        config.locate.stale_policy = StaleLocatePolicy::DiscardIfSelectionChanged;
        let mut app = App::new(directory(), RecordingSurface::default(), config);

        let ticket = app.begin_locate().unwrap();
        app.toggle_station(&id("R11")).unwrap();
        assert_eq!(app.complete_locate(ticket, Ok(fix)), LocateOutcome::Discarded);
        assert_eq!(app.state().selection().ids(), [id("R10"), id("R11")]);
        assert!(!app.state().is_locating());

        // untouched selection is still replaced
        let ticket = app.begin_locate().unwrap();
        assert_eq!(
            app.complete_locate(ticket, Ok(fix)),
            LocateOutcome::Selected(id("R05"))
        );
    }

    #[tokio::test]
    async fn locate_nearest_runs_the_whole_flow() {
        let mut app = app();

        let outcome = app
            .locate_nearest(&Fixed(Ok(Coordinates::new(25.0530, 121.5200))))
            .await;
        assert_eq!(outcome, Some(LocateOutcome::Selected(id("R11"))));
    }

    #[tokio::test]
    async fn analysis_falls_back_and_resets_on_selection_change() {
        let mut app = app();

        let result = app.analyze(&Broken).await.cloned();
        assert_eq!(result, Some(AnalysisResult::fallback()));
        assert!(!app.state().analysis().is_loading());

        app.set_threshold(0, 3).unwrap();
        assert!(app.state().analysis().result().is_some());

        app.toggle_station(&id("R11")).unwrap();
        assert!(app.state().analysis().result().is_none());
    }

    #[test]
    fn analysis_request_reflects_selection_and_thresholds() {
        let mut app = app();
        app.toggle_station(&id("R11")).unwrap();

        let request = app.begin_analysis().unwrap();
        assert_eq!(request.station_names, ["台北車站", "中山"]);
        assert_eq!(request.max_minutes, 8);
        assert!(app.begin_analysis().is_none());
    }
}
