use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::config::{Config, EstimatorConfig, MapConfig};
use crate::error::{EstimatorError, Result};
use crate::models::estimate::{EnergyEstimate, SiteReport, SiteSnapshot, YieldModel};
use crate::services::energy_estimator;
use crate::services::weather_service::WeatherProvider;

/// Issued when a request starts; later tickets win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

#[derive(Debug, Default)]
struct SiteState {
    model: YieldModel,
    site: Option<SiteReport>,
    snapshot: Option<SiteSnapshot>,
    /// Ticket of the last committed snapshot (0 = none yet)
    applied: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub estimator: Arc<EstimatorConfig>,
    pub map: MapConfig,
    pub weather: Arc<dyn WeatherProvider>,
    site: Arc<RwLock<SiteState>>,
    next_ticket: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: &Config, weather: Arc<dyn WeatherProvider>) -> Self {
        Self {
            estimator: Arc::new(config.estimator.clone()),
            map: config.map.clone(),
            weather,
            site: Arc::new(RwLock::new(SiteState::default())),
            next_ticket: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn begin_request(&self) -> RequestTicket {
        RequestTicket(self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Stores a complete snapshot only for the most recently issued ticket.
    ///
    /// A newer request supersedes this one even if its own lookup failed.
    pub fn commit(&self, ticket: RequestTicket, site: SiteReport, snapshot: SiteSnapshot) -> bool {
        let Ok(mut state) = self.site.write() else {
            return false;
        };
        let latest = self.next_ticket.load(Ordering::SeqCst);
        if ticket.0 != latest || ticket.0 <= state.applied {
            info!(ticket = ticket.0, latest, applied = state.applied, "discarding superseded result");
            return false;
        }
        state.applied = ticket.0;
        state.site = Some(site);
        state.snapshot = Some(snapshot);
        debug!(ticket = ticket.0, panels = site.panel_count, "committed site snapshot");
        true
    }

    pub fn model(&self) -> YieldModel {
        self.site.read().map(|state| state.model).unwrap_or_default()
    }

    /// Switches the model and recomputes from the stored snapshot, if any.
    pub fn set_model(&self, model: YieldModel) -> Option<EnergyEstimate> {
        if let Ok(mut state) = self.site.write() {
            state.model = model;
        }
        self.estimate().ok()
    }

    pub fn site(&self) -> Option<SiteReport> {
        self.site.read().ok().and_then(|state| state.site)
    }

    /// `NotReady` until a complete snapshot has been committed.
    pub fn estimate(&self) -> Result<EnergyEstimate> {
        let (snapshot, model) = {
            let state = self.site.read().map_err(|_| EstimatorError::NotReady)?;
            (state.snapshot.ok_or(EstimatorError::NotReady)?, state.model)
        };
        Ok(energy_estimator::estimate(&self.estimator, &snapshot, model))
    }

    /// Runs the estimator on a snapshot without storing it.
    pub fn estimate_for(&self, snapshot: &SiteSnapshot) -> EnergyEstimate {
        energy_estimator::estimate(&self.estimator, snapshot, self.model())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::models::estimate::WeatherReading;
    use crate::services::weather_service::testing::FakeWeather;

    fn state() -> AppState {
        AppState::new(&Config::default(), Arc::new(FakeWeather::default()))
    }

    fn input(area_m2: f64, cloud_percent: f64) -> (SiteReport, SiteSnapshot) {
        let capacity = energy_estimator::derive_capacity(&EstimatorConfig::default(), area_m2).unwrap();
        let site = SiteReport { area_m2, panel_count: capacity.panel_count, capacity_kw: capacity.capacity_kw };
        (site, SiteSnapshot { capacity, weather: WeatherReading { cloud_percent, air_temp_c: 25.0 } })
    }

    #[test]
    fn not_ready_before_first_commit() {
        let state = state();
        assert!(matches!(state.estimate(), Err(EstimatorError::NotReady)));
        assert_eq!(state.set_model(YieldModel::Advanced), None);
        assert_eq!(state.site(), None);
    }

    #[test]
    fn tickets_are_monotonic() {
        let state = state();
        let first = state.begin_request();
        let second = state.begin_request();
        assert!(second > first);
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let state = state();
        let older = state.begin_request();
        let newer = state.begin_request();

        let (site, snapshot) = input(200.0, 0.0);
        assert!(state.commit(newer, site, snapshot));

        let (stale_site, stale_snapshot) = input(100.0, 50.0);
        assert!(!state.commit(older, stale_site, stale_snapshot));
        assert_eq!(state.site().unwrap().area_m2, 200.0);
    }

    #[test]
    fn newer_request_supersedes_even_without_committing() {
        let state = state();
        let older = state.begin_request();
        // issued, but its lookup never succeeds
        let _newer = state.begin_request();

        let (site, snapshot) = input(100.0, 0.0);
        assert!(!state.commit(older, site, snapshot));
        assert_eq!(state.site(), None);
        assert!(matches!(state.estimate(), Err(EstimatorError::NotReady)));
    }

    #[test]
    fn toggling_model_keeps_site() {
        let state = state();
        let (site, snapshot) = input(100.0, 0.0);
        assert!(state.commit(state.begin_request(), site, snapshot));

        let basic = state.estimate().unwrap();
        let advanced = state.set_model(YieldModel::Advanced).unwrap();
        assert_eq!(state.model(), YieldModel::Advanced);
        assert_abs_diff_eq!(basic.energy.daily_kwh, 81.6, epsilon = 1e-9);
        assert_abs_diff_eq!(advanced.energy.daily_kwh, 85.645056, epsilon = 1e-9);
        assert_eq!(state.site(), Some(site));
    }
}
