use chrono::{DateTime, Utc};
use clap::Subcommand;
use gymlog_core::storage::Database;
use gymlog_core::{GeofenceSampler, Point, StaticPosition};

#[derive(Subcommand)]
pub enum TrackAction {
    /// Start location tracking (requires a configured gym)
    Start,
    /// Stop location tracking
    Stop,
    /// Print the current tracker state
    Status,
    /// Record one sampling tick at the given device position
    Tick {
        /// Current latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Current longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Tick time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

pub fn run(action: TrackAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TrackAction::Start => {
            // The CLI has no platform permission dialog; the gym location
            // stands in as the provider for the start-time permission check.
            let gym = db.gym_config()?.ok_or("no gym configured")?;
            let sampler = GeofenceSampler::new(&db, StaticPosition(gym.location()));
            sampler.start_tracking()?;
            println!("tracking started");
        }
        TrackAction::Stop => {
            let gym = db.gym_config()?.ok_or("no gym configured")?;
            let sampler = GeofenceSampler::new(&db, StaticPosition(gym.location()));
            sampler.stop_tracking()?;
            println!("tracking stopped");
        }
        TrackAction::Status => {
            let position = StaticPosition(Point::new(0.0, 0.0));
            let sampler = GeofenceSampler::new(&db, position);
            let state = sampler.state()?;
            println!("{}", serde_json::to_string(&state)?);
        }
        TrackAction::Tick { lat, lon, at } => {
            let position = StaticPosition(Point::new(lat, lon));
            let sampler = GeofenceSampler::new(&db, position);
            let outcome = sampler.record_tick(at.unwrap_or_else(Utc::now));
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }
    Ok(())
}
