//! Human-readable names for WMO weather interpretation codes.

const WEATHER_CODES: &[(i64, &str)] = &[
    (0, "Clear"),
    (1, "Mostly Clear"),
    (2, "Partly Cloudy"),
    (3, "Overcast"),
    (45, "Foggy"),
    (48, "Depositing Rime Fog"),
    (51, "Light Drizzle"),
    (53, "Moderate Drizzle"),
    (55, "Dense Drizzle"),
    (61, "Slight Rain"),
    (63, "Moderate Rain"),
    (65, "Heavy Rain"),
    (71, "Slight Snow"),
    (73, "Moderate Snow"),
    (75, "Heavy Snow"),
    (80, "Slight Showers"),
    (81, "Moderate Showers"),
    (82, "Violent Showers"),
    (95, "Thunderstorm"),
    (96, "Thunderstorm with Hail"),
    (99, "Thunderstorm with Heavy Hail"),
];

pub fn describe(code: i64) -> &'static str {
    WEATHER_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}
