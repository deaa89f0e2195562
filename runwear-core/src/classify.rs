//! Threshold rules mapping an [`Observation`] to a [`Category`].

use tracing::debug;

use crate::{
    category::Category,
    model::{Exertion, Observation},
};

/// WMO codes for drizzle, rain, snow, showers and thunderstorms.
pub const ADVERSE_WEATHER_CODES: &[i64] =
    &[51, 53, 55, 61, 63, 65, 71, 73, 75, 80, 81, 82, 95, 96, 99];

/// US AQI at or above which running outside is ruled out.
pub const MAX_AQI: f64 = 200.0;
/// Temperatures at or below this are too cold to run outside.
pub const MIN_TEMPERATURE_C: f64 = -20.0;
/// Temperatures above this are too hot to run outside.
pub const MAX_TEMPERATURE_C: f64 = 35.0;
/// Wind above this (km/h) is too strong to run outside.
pub const MAX_WIND_SPEED_KMH: f64 = 50.0;

/// Added body heat from harder effort.
pub const HIGH_EXERTION_BONUS_C: f64 = 5.0;

/// Upper bounds (inclusive) of the temperature bands, coldest first.
const BANDS: &[(f64, Category)] = &[
    (5.0, Category::WinterCold),
    (12.0, Category::WinterMild),
    (20.0, Category::SpringFall),
    (27.0, Category::SummerWarm),
];

pub fn is_adverse_weather(code: i64) -> bool {
    ADVERSE_WEATHER_CODES.contains(&code)
}

/// True when conditions rule out an outdoor run regardless of temperature.
pub fn is_unsafe(obs: &Observation) -> bool {
    let out_of_range = |t: f64| t <= MIN_TEMPERATURE_C || t > MAX_TEMPERATURE_C;

    is_adverse_weather(obs.weather_code)
        || obs.aqi >= MAX_AQI
        || out_of_range(obs.temperature_c)
        || out_of_range(obs.feels_like_c)
        || obs.wind_speed_kmh > MAX_WIND_SPEED_KMH
}

/// Feels-like temperature shifted for effort.
pub fn adjusted_temperature(feels_like_c: f64, exertion: Exertion) -> f64 {
    match exertion {
        Exertion::High => feels_like_c + HIGH_EXERTION_BONUS_C,
        Exertion::Low => feels_like_c,
    }
}

/// Band for an already adjusted temperature.
pub fn band_for(adjusted_c: f64) -> Category {
    BANDS
        .iter()
        .find(|(upper, _)| adjusted_c <= *upper)
        .map(|(_, category)| *category)
        .unwrap_or(Category::SummerHot)
}

pub fn classify(obs: &Observation) -> Category {
    if is_unsafe(obs) {
        debug!(
            weather_code = obs.weather_code,
            aqi = obs.aqi,
            wind = obs.wind_speed_kmh,
            "unsafe conditions, recommending gym"
        );
        return Category::Gym;
    }

    band_for(adjusted_temperature(obs.feels_like_c, obs.exertion))
}
