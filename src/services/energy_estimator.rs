/// ============================================================
///  Rooftop Energy Yield Estimator
///
///  Pipeline:
///   1. Capacity   – raw roof area → usable area (setback) →
///                   panel count (packing) → nameplate kW
///   2. Daily yield – one of two closed-form models:
///                   basic    : kW × PSH × cloud × 0.85
///                   advanced : kW × PSH × tilt × cloud' × temp × 0.89
///   3. Projection – flat ×30 / ×365, no seasonality
///   4. CO2 offset – energy × grid emission factor
///
///  Everything here is pure; callers own the snapshot lifecycle.
/// ============================================================

use crate::config::EstimatorConfig;
use crate::error::{EstimatorError, Result};
use crate::models::estimate::{
    Capacity, Co2Offset, EnergyEstimate, EnergyYield, SiteSnapshot, YieldModel,
};

// ─── Model constants ─────────────────────────────────────────
const BASIC_SYSTEM_LOSS: f64 = 0.85;
const ADVANCED_SYSTEM_LOSS: f64 = 0.89;
/// Tilt / orientation gain over a horizontal surface
const TILT_GAIN: f64 = 1.12;
/// Share of cloud cover that actually attenuates (diffuse correction)
const CLOUD_ATTENUATION: f64 = 0.75;
/// Operating cell temperature above ambient (°C)
const CELL_TEMP_OFFSET_C: f64 = 30.0;
/// Standard test condition temperature (°C)
const STC_TEMP_C: f64 = 25.0;
/// Power derating per °C above STC
const TEMP_COEFFICIENT: f64 = 0.0035;

const DAYS_PER_MONTH: f64 = 30.0;
const DAYS_PER_YEAR: f64 = 365.0;

// ─── 1. Capacity ─────────────────────────────────────────────

/// Panels that fit on `raw_area_m2` after setback and packing overhead.
pub fn derive_capacity(config: &EstimatorConfig, raw_area_m2: f64) -> Result<Capacity> {
    if !raw_area_m2.is_finite() || raw_area_m2 <= 0.0 {
        return Err(EstimatorError::invalid(format!(
            "area must be a positive number of square meters, got {raw_area_m2}"
        )));
    }
    let usable_area = raw_area_m2 * (1.0 - config.setback_factor);
    let footprint = config.panel_area_m2 * config.packing_factor;
    let panels = (usable_area / footprint).floor();
    if !panels.is_finite() || panels > f64::from(u32::MAX) {
        return Err(EstimatorError::invalid(format!(
            "area of {raw_area_m2} m² exceeds the supported panel count"
        )));
    }
    // Finite and at most u32::MAX here; a validated config also keeps it non-negative.
    Ok(capacity_from_panels(config, panels as u32))
}

pub fn capacity_from_panels(config: &EstimatorConfig, panel_count: u32) -> Capacity {
    Capacity {
        panel_count,
        capacity_kw: nameplate_kw(config, panel_count),
    }
}

#[inline]
fn nameplate_kw(config: &EstimatorConfig, panel_count: u32) -> f64 {
    f64::from(panel_count) * config.panel_power_watts / 1000.0
}

// ─── 2. Daily yield ──────────────────────────────────────────

/// Temperature-independent default model (kWh/day).
pub fn basic_yield(config: &EstimatorConfig, capacity_kw: f64, cloud_percent: f64) -> f64 {
    let cloud_factor = clamp_cloud(config, 1.0 - cloud_percent / 100.0);
    capacity_kw * config.peak_sun_hours * cloud_factor * BASIC_SYSTEM_LOSS
}

/// Model with diffuse-light cloud correction and cell temperature derating (kWh/day).
///
/// Unclamped unless `clamp_factors` is set: the temperature factor exceeds 1 below
/// 25 °C cell temperature and turns negative in extreme heat.
pub fn advanced_yield(
    config: &EstimatorConfig,
    panel_count: u32,
    cloud_percent: f64,
    air_temp_c: f64,
) -> f64 {
    let capacity_kw = nameplate_kw(config, panel_count);
    let cloud_factor = clamp_cloud(config, 1.0 - CLOUD_ATTENUATION * cloud_percent / 100.0);

    let cell_temp_c = air_temp_c + CELL_TEMP_OFFSET_C;
    let mut temp_factor = 1.0 - TEMP_COEFFICIENT * (cell_temp_c - STC_TEMP_C);
    if config.clamp_factors {
        temp_factor = temp_factor.max(0.0);
    }

    capacity_kw * config.peak_sun_hours * TILT_GAIN * cloud_factor * temp_factor * ADVANCED_SYSTEM_LOSS
}

#[inline]
fn clamp_cloud(config: &EstimatorConfig, cloud_factor: f64) -> f64 {
    if config.clamp_factors { cloud_factor.clamp(0.0, 1.0) } else { cloud_factor }
}

// ─── 3. Projection & 4. CO2 ──────────────────────────────────

pub fn project(daily_kwh: f64) -> EnergyYield {
    EnergyYield {
        daily_kwh,
        monthly_kwh: daily_kwh * DAYS_PER_MONTH,
        yearly_kwh: daily_kwh * DAYS_PER_YEAR,
    }
}

/// `None` while there is nothing to offset (non-positive or non-finite yield).
pub fn co2_offset(config: &EstimatorConfig, daily_kwh: f64) -> Option<Co2Offset> {
    if !daily_kwh.is_finite() || daily_kwh <= 0.0 {
        return None;
    }
    let energy = project(daily_kwh);
    Some(Co2Offset {
        daily_kg: energy.daily_kwh * config.grid_co2_factor,
        monthly_kg: energy.monthly_kwh * config.grid_co2_factor,
        yearly_kg: energy.yearly_kwh * config.grid_co2_factor,
    })
}

// ─── Entry point ─────────────────────────────────────────────

pub fn daily_yield(config: &EstimatorConfig, snapshot: &SiteSnapshot, model: YieldModel) -> f64 {
    let SiteSnapshot { capacity, weather } = snapshot;
    match model {
        YieldModel::Basic => basic_yield(config, capacity.capacity_kw, weather.cloud_percent),
        YieldModel::Advanced => {
            advanced_yield(config, capacity.panel_count, weather.cloud_percent, weather.air_temp_c)
        }
    }
}

pub fn estimate(config: &EstimatorConfig, snapshot: &SiteSnapshot, model: YieldModel) -> EnergyEstimate {
    let daily_kwh = daily_yield(config, snapshot, model);
    EnergyEstimate {
        model,
        energy: project(daily_kwh),
        co2: co2_offset(config, daily_kwh),
    }
}
