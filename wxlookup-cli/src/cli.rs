use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, InquireError, Password, Text};
use tracing::debug;
use wxlookup_core::{
    Config, Coordinates, FixedLocation, LookupState, OpenWeatherClient, WeatherOrchestrator,
    render,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxlookup", version, about = "Current weather and short forecast lookup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional home location.
    Configure,

    /// Show weather for a city.
    Show {
        /// City name, e.g. "London" or "Paris,FR".
        city: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show weather for the current position (flags or configured home).
    Local {
        #[command(flatten)]
        position: PositionArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Look up local weather once, then prompt for cities until an empty line.
    Interactive {
        #[command(flatten)]
        position: PositionArgs,
    },
}

#[derive(Debug, Args)]
pub struct PositionArgs {
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
}

impl PositionArgs {
    fn geolocator(&self, config: &Config) -> FixedLocation {
        let from_flags = self.lat.zip(self.lon).map(|(lat, lon)| Coordinates::new(lat, lon));
        FixedLocation::new(from_flags.or(config.home))
    }
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Print the lookup state as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, output } => {
                let orch = orchestrator_from_config()?.1;
                let state = orch.lookup_by_city(&city).await;
                print_state(&state, &output)
            }
            Command::Local { position, output } => {
                let (config, orch) = orchestrator_from_config()?;
                let state = orch.start(&position.geolocator(&config)).await.unwrap_or_default();
                print_state(&state, &output)
            }
            Command::Interactive { position } => {
                let (config, orch) = orchestrator_from_config()?;
                interactive(&orch, &position.geolocator(&config)).await
            }
        }
    }
}

fn orchestrator_from_config() -> anyhow::Result<(Config, WeatherOrchestrator<OpenWeatherClient>)> {
    let config = Config::load()?;
    let client = OpenWeatherClient::from_config(&config)?;
    Ok((config, WeatherOrchestrator::new(client)))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    let lat = CustomType::<f64>::new("Home latitude (Esc to skip):").prompt_skippable()?;
    let lon = match lat {
        Some(_) => CustomType::<f64>::new("Home longitude:").prompt_skippable()?,
        None => None,
    };
    if let Some((lat, lon)) = lat.zip(lon) {
        config.home = Some(Coordinates::new(lat, lon));
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

async fn interactive(
    orch: &WeatherOrchestrator<OpenWeatherClient>,
    geolocator: &FixedLocation,
) -> anyhow::Result<()> {
    if let Some(state) = orch.start(geolocator).await {
        print!("{}", render::render(&state));
    }

    loop {
        let city = match Text::new("City:").with_placeholder("Enter city name").prompt() {
            Ok(city) => city,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        let city = city.trim();
        if city.is_empty() {
            break;
        }

        debug!(city, "submitting lookup");
        println!();
        print!("{}", render::render(&orch.lookup_by_city(city).await));
    }

    Ok(())
}

fn print_state(state: &LookupState, output: &OutputArgs) -> anyhow::Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(state)?);
    } else {
        print!("{}", render::render(state));
    }

    Ok(())
}
