use chrono::{NaiveDate, TimeZone, Utc};
use clap::Subcommand;
use gymlog_core::storage::Database;
use gymlog_core::GymConfig;

#[derive(Subcommand)]
pub enum GymAction {
    /// Save the gym name and location
    Set {
        /// Gym name
        name: String,
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Print the gym configuration as JSON
    Show,
    /// Replace the routine rotation list
    Routines {
        /// Routine names in rotation order (empty clears the list)
        names: Vec<String>,
    },
    /// Record a quota payment
    Pay {
        /// Payment date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: GymAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        GymAction::Set { name, lat, lon } => {
            // Preserve payment and rotation state across location edits;
            // only the settings screen fields change here.
            let gym = match db.gym_config()? {
                Some(mut existing) => {
                    existing.name = name;
                    existing.latitude = lat;
                    existing.longitude = lon;
                    existing
                }
                None => GymConfig::new(name, lat, lon),
            };
            db.save_gym_config(&gym)?;
            println!("gym saved: {}", gym.name);
        }
        GymAction::Show => {
            match db.gym_config()? {
                Some(gym) => {
                    println!("{}", serde_json::to_string_pretty(&gym)?);
                    if let Some(routine) = gym.current_routine() {
                        println!("current routine: {routine}");
                    }
                }
                None => println!("no gym configured"),
            }
        }
        GymAction::Routines { names } => {
            let mut gym = db.gym_config()?.ok_or("no gym configured")?;
            gym.routine_names = names;
            db.save_gym_config(&gym)?;
            match gym.current_routine() {
                Some(routine) => println!("routines saved, current: {routine}"),
                None => println!("routines cleared"),
            }
        }
        GymAction::Pay { date } => {
            if db.gym_config()?.is_none() {
                return Err("no gym configured".into());
            }
            let paid_at = match date {
                Some(d) => Utc
                    .from_local_datetime(&d.and_hms_opt(0, 0, 0).ok_or("invalid date")?)
                    .single()
                    .ok_or("invalid date")?,
                None => Utc::now(),
            };
            db.update_payment_date(Some(paid_at))?;
            println!("payment recorded: {}", paid_at.format("%Y-%m-%d"));
        }
    }
    Ok(())
}
