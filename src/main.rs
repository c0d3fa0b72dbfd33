use clap::{Parser, Subcommand};
use dotenv::dotenv;

use tripflow_rs::config::Settings;
use tripflow_rs::server::{serve, AppState};
use tripflow_rs::trip::{PhotoService, TripPlanner, TripRequest, UnsplashSource};

use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plan a trip and print the itinerary as JSON
    Plan {
        /// Destination city
        #[arg(short, long)]
        city: String,

        /// First day of the trip, YYYY-MM-DD
        #[arg(short, long)]
        start_date: String,

        /// Number of days
        #[arg(short, long)]
        days: u32,

        /// Mode of transport
        #[arg(short, long, default_value = "public transit")]
        transportation: String,

        /// Accommodation type
        #[arg(short, long, default_value = "budget hotel")]
        accommodation: String,

        /// Preference tags, e.g. "history", "parks", "food"
        #[arg(short, long)]
        preferences: Vec<String>,
    },
    /// Serve the planning API over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
}

fn end_date(start_date: &str, days: u32) -> String {
    chrono::NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.checked_add_days(chrono::Days::new(days.saturating_sub(1) as u64)))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| start_date.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let settings = Settings::from_env()?;

    match args.command {
        Commands::Plan {
            city,
            start_date,
            days,
            transportation,
            accommodation,
            preferences,
        } => {
            let planner = TripPlanner::from_settings(&settings).await?;

            let request = TripRequest {
                end_date: end_date(&start_date, days),
                city,
                start_date,
                travel_days: days,
                transportation,
                accommodation,
                preferences,
            };

            let plan = planner.plan_trip(&request).await;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Serve { port } => {
            let planner = Arc::new(TripPlanner::from_settings(&settings).await?);

            let photos = settings
                .unsplash_access_key
                .as_ref()
                .map(|key| Arc::new(PhotoService::new(Arc::new(UnsplashSource::new(key.clone())))));
            if photos.is_none() {
                log::warn!("UNSPLASH_ACCESS_KEY not set; photo lookup disabled");
            }

            serve(port, AppState { planner, photos }).await?;
        }
    }

    Ok(())
}
