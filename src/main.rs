use std::error::Error;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use surfrmap::build_app;
use surfrmap::processing::{
    MissingSpeedPolicy, ProcessingOptions, process_gpx_bytes,
    types::{DEFAULT_INDICATOR_LENGTH_KM, DEFAULT_INDICATOR_OFFSET_KM, DEFAULT_SPEED_THRESHOLD_KMH},
};
use surfrmap::templates::render_map_document;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "surfr-map", about = "Draw a GPX track on an interactive map")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Render one GPX file into an HTML map document")]
    Render {
        #[arg(help = "GPX file, ideally named Start-End.gpx")]
        input: PathBuf,
        #[arg(short, long, default_value = "surfr_route_map.html")]
        output: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SPEED_THRESHOLD_KMH, value_parser = speed_threshold)]
        speed_threshold_kmh: f64,
        #[arg(long, default_value_t = DEFAULT_INDICATOR_OFFSET_KM, allow_negative_numbers = true)]
        indicator_offset_km: f64,
        #[arg(long, default_value_t = DEFAULT_INDICATOR_LENGTH_KM)]
        indicator_length_km: f64,
        #[arg(long, value_enum, default_value_t = MissingSpeed::Exclude)]
        missing_speed: MissingSpeed,
    },
    #[command(about = "Serve the upload page and render maps over HTTP")]
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        addr: SocketAddr,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MissingSpeed {
    Exclude,
    Zero,
}

fn speed_threshold(raw: &str) -> Result<f64, String> {
    ProcessingOptions::parse_speed_threshold_kmh(raw)
        .ok_or_else(|| format!("{raw:?} is not a non-negative speed in km/h"))
}

impl From<MissingSpeed> for MissingSpeedPolicy {
    fn from(value: MissingSpeed) -> Self {
        match value {
            MissingSpeed::Exclude => MissingSpeedPolicy::Exclude,
            MissingSpeed::Zero => MissingSpeedPolicy::TreatAsZero,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surfrmap=debug,surfr_map=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match Cli::parse().command {
        Commands::Render {
            input,
            output,
            speed_threshold_kmh,
            indicator_offset_km,
            indicator_length_km,
            missing_speed,
        } => {
            let options = ProcessingOptions {
                speed_threshold_kmh,
                missing_speed: missing_speed.into(),
                indicator_offset_km,
                indicator_length_km,
            };
            render(&input, &output, &options)
        }
        Commands::Serve { addr } => serve(addr).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn render(
    input: &Path,
    output: &Path,
    options: &ProcessingOptions,
) -> Result<(), Box<dyn Error>> {
    let bytes = std::fs::read(input)?;
    let file_name = input.file_name().and_then(|name| name.to_str());

    let processed = process_gpx_bytes(&bytes, file_name, options)?;
    tracing::info!(
        from = %processed.label.from,
        to = %processed.label.to,
        "route endpoints"
    );

    std::fs::write(output, render_map_document(&processed))?;
    tracing::info!("map saved to {}", output.display());
    Ok(())
}

async fn serve(addr: SocketAddr) -> Result<(), Box<dyn Error>> {
    let app = build_app();
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "tests/fixtures/Vilanova-Torredembarra.gpx";

    fn scratch_output() -> PathBuf {
        std::env::temp_dir().join(format!("surfr-map-{}.html", uuid::Uuid::new_v4()))
    }

    #[test]
    fn render_writes_map_document() {
        let output = scratch_output();
        render(Path::new(FIXTURE), &output, &ProcessingOptions::default())
            .expect("render should succeed");

        let html = std::fs::read_to_string(&output).expect("output should be written");
        std::fs::remove_file(&output).ok();

        assert!(html.contains("Route Information"));
        assert!(html.contains("Torredembarra"));
    }

    #[test]
    fn render_fails_for_missing_or_empty_input() {
        let output = scratch_output();
        let options = ProcessingOptions::default();

        assert!(render(Path::new("tests/fixtures/absent.gpx"), &output, &options).is_err());
        assert!(render(Path::new("tests/fixtures/empty.gpx"), &output, &options).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn render_defaults_to_surfr_route_map_html() {
        let cli = Cli::try_parse_from(["surfr-map", "render", FIXTURE]).expect("valid arguments");
        match cli.command {
            Commands::Render {
                output,
                speed_threshold_kmh,
                ..
            } => {
                assert_eq!(output, PathBuf::from("surfr_route_map.html"));
                assert_eq!(speed_threshold_kmh, DEFAULT_SPEED_THRESHOLD_KMH);
            }
            Commands::Serve { .. } => panic!("expected the render command"),
        }
    }

    #[test]
    fn negative_or_nan_threshold_is_rejected() {
        for value in ["-1", "NaN", "fast"] {
            let parsed = Cli::try_parse_from([
                "surfr-map",
                "render",
                FIXTURE,
                "--speed-threshold-kmh",
                value,
            ]);
            assert!(parsed.is_err(), "{value} should be rejected");
        }
        assert!(
            Cli::try_parse_from(["surfr-map", "render", FIXTURE, "--speed-threshold-kmh", "30"])
                .is_ok()
        );
    }
}
