use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use runwear_core::{
    Advisor, CityMatch, Config, Coordinates, LocationQuery, ServiceError, Suggestion,
    SuggestionRequest, SuggestionResponse, WeatherReport, plain_description,
};
use std::{fs, io, path::PathBuf};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "runwear", version, about = "What to wear for your run")]
pub struct Cli {
    /// Log provider traffic and fallback decisions.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the text-generation API key used to reword recommendations.
    Configure,

    /// Search for a city by name.
    Search {
        /// City name, or the start of one.
        city: String,
    },

    /// Show current conditions and what to wear at both intensities.
    Weather {
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Recommend clothing for explicit conditions.
    Suggest(SuggestArgs),
}

#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Read the request as JSON from a file, or "-" for stdin.
    #[arg(long, conflicts_with_all = [
        "temperature", "humidity", "wind_speed", "feels_like", "aqi", "weather_code", "intensity",
    ])]
    request: Option<PathBuf>,

    /// Air temperature in °C.
    #[arg(long, allow_negative_numbers = true)]
    temperature: Option<f64>,

    /// Relative humidity in %.
    #[arg(long)]
    humidity: Option<f64>,

    /// Wind speed in km/h.
    #[arg(long)]
    wind_speed: Option<f64>,

    /// Feels-like temperature in °C.
    #[arg(long, allow_negative_numbers = true)]
    feels_like: Option<f64>,

    /// US air quality index.
    #[arg(long)]
    aqi: Option<f64>,

    /// WMO weather code.
    #[arg(long)]
    weather_code: Option<i64>,

    /// low, high or both.
    #[arg(long)]
    intensity: Option<String>,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl SuggestArgs {
    fn to_request(&self) -> anyhow::Result<SuggestionRequest> {
        let Some(path) = &self.request else {
            return Ok(SuggestionRequest {
                temperature: self.temperature,
                humidity: self.humidity,
                wind_speed: self.wind_speed,
                feels_like: self.feels_like,
                aqi: self.aqi,
                weather_code: self.weather_code,
                intensity: self.intensity.clone(),
            });
        };

        let body = if path.as_os_str() == "-" {
            io::read_to_string(io::stdin()).context("Failed to read request from stdin")?
        } else {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read request file: {}", path.display()))?
        };

        serde_json::from_str(&body).context("Request is not valid JSON")
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { city } => {
                let advisor = advisor()?;
                let cities = advisor.search_cities(&city).await.map_err(user_error)?;
                print_cities(&cities);
                Ok(())
            }
            Command::Weather { city, lat, lon, json } => {
                let query = match (city, lat, lon) {
                    (Some(city), _, _) => LocationQuery::City(city),
                    (None, Some(lat), Some(lon)) => LocationQuery::Coordinates(Coordinates::new(lat, lon)),
                    _ => return Err(user_error(ServiceError::MissingLocation)),
                };

                let advisor = advisor()?;
                let report = advisor.weather(&query).await.map_err(user_error)?;
                let suggestions = advisor
                    .suggest(&SuggestionRequest::from_report(&report, "both"))
                    .await
                    .map_err(user_error)?;

                if json {
                    let out = serde_json::json!({ "weather": report, "suggestions": suggestions });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    print_report(&report);
                    print_response(&suggestions);
                }
                Ok(())
            }
            Command::Suggest(args) => {
                let request = args.to_request()?;
                let response = advisor()?.suggest(&request).await.map_err(user_error)?;

                if args.json {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                } else {
                    print_response(&response);
                }
                Ok(())
            }
        }
    }
}

fn advisor() -> anyhow::Result<Advisor> {
    let config = Config::load_with_env()?;
    if !config.is_text_generation_configured() {
        tracing::debug!("no text-generation key configured, using static descriptions");
    }
    Ok(Advisor::from_config(&config))
}

/// Only the static message reaches the terminal; details were already logged.
/// Input mistakes are reported without a status code.
fn user_error(err: ServiceError) -> anyhow::Error {
    if err.is_client_error() {
        anyhow::anyhow!("{}", err.user_message())
    } else {
        anyhow::anyhow!("{} ({})", err.user_message(), err.status())
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenRouter API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    if api_key.trim().is_empty() {
        config.text_generation = None;
    } else {
        config.set_text_generation_key(api_key.trim().to_string());

        let current = config
            .text_generation()
            .map(|tg| tg.model().to_string())
            .unwrap_or_default();
        let model = Text::new("Model:").with_default(&current).prompt()?;

        if let Some(tg) = config.text_generation.as_mut() {
            tg.model = Some(model.trim().to_string()).filter(|m| !m.is_empty());
        }
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_cities(cities: &[CityMatch]) {
    if cities.is_empty() {
        println!("No cities found.");
        return;
    }

    for city in cities {
        println!(
            "{}  ({:.4}, {:.4})",
            city.display_name(),
            city.latitude,
            city.longitude
        );
    }
}

fn print_report(report: &WeatherReport) {
    println!("{}", report.location);
    println!(
        "  {}, {}°C (feels like {}°C)",
        report.weather, report.temperature, report.feels_like
    );
    println!(
        "  humidity {}%, wind {} km/h, AQI {}",
        report.humidity,
        report.wind_speed,
        aqi_label(report.aqi)
    );
    println!();
}

fn aqi_label(aqi: Option<i64>) -> String {
    aqi.map_or_else(|| "n/a".to_string(), |aqi| aqi.to_string())
}

fn print_response(response: &SuggestionResponse) {
    match response {
        SuggestionResponse::Single(suggestion) => print_suggestion(None, suggestion),
        SuggestionResponse::Both { low, high } => {
            print_suggestion(Some("Medium-Low"), low);
            println!();
            print_suggestion(Some("High Intensity"), high);
        }
    }
}

fn print_suggestion(heading: Option<&str>, suggestion: &Suggestion) {
    match heading {
        Some(heading) => println!("{heading}: {}", suggestion.category),
        None => println!("{}", suggestion.category),
    }
    println!("  {}", plain_description(&suggestion.description));
    for item in &suggestion.clothing_items {
        println!("  - {item}");
    }
    println!("  illustration: {}", suggestion.illustration);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn suggest_flags_build_request() {
        let cli = Cli::try_parse_from([
            "runwear", "suggest", "--temperature", "-3", "--humidity", "80", "--wind-speed", "12",
            "--feels-like", "-7", "--aqi", "20", "--weather-code", "3", "--intensity", "both",
        ])
        .expect("valid arguments");

        let Command::Suggest(args) = cli.command else {
            panic!("expected suggest");
        };
        let request = args.to_request().expect("request");
        assert_eq!(request.feels_like, Some(-7.0));
        assert_eq!(request.intensity.as_deref(), Some("both"));
    }

    #[test]
    fn suggest_allows_missing_flags() {
        let cli = Cli::try_parse_from(["runwear", "suggest", "--temperature", "10"]).expect("parses");
        let Command::Suggest(args) = cli.command else {
            panic!("expected suggest");
        };
        let err = args.to_request().expect("request").parse().unwrap_err();
        assert!(matches!(err, ServiceError::MissingFields));
    }

    #[test]
    fn user_errors_hide_status_for_bad_input() {
        assert_eq!(user_error(ServiceError::CityNotFound).to_string(), "City not found");
        assert_eq!(
            user_error(ServiceError::InvalidIntensity("max".into())).to_string(),
            "Invalid intensity"
        );

        let upstream = ServiceError::Upstream {
            message: "Failed to fetch weather data",
            source: anyhow::anyhow!("connection reset"),
        };
        assert_eq!(user_error(upstream).to_string(), "Failed to fetch weather data (500)");
    }

    #[test]
    fn missing_aqi_prints_as_not_available() {
        assert_eq!(aqi_label(Some(42)), "42");
        assert_eq!(aqi_label(None), "n/a");
    }

    #[test]
    fn weather_needs_both_coordinates() {
        assert!(Cli::try_parse_from(["runwear", "weather", "--lat", "40.7"]).is_err());
        assert!(Cli::try_parse_from(["runwear", "weather", "--lat", "40.7", "--lon", "-74.0"]).is_ok());
        assert!(Cli::try_parse_from(["runwear", "weather", "--city", "Oslo", "--lat", "1", "--lon", "2"]).is_err());
    }
}
