use clap::Subcommand;
use gymlog_core::storage::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the application configuration as JSON
    Show,
    /// Set the tick interval in minutes
    Interval { minutes: u32 },
    /// Set the persistent tracking notification text
    Notification {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let cfg = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        ConfigAction::Interval { minutes } => {
            if minutes == 0 {
                return Err("interval must be at least one minute".into());
            }
            let mut cfg = Config::load()?;
            cfg.tracker.interval_min = minutes;
            cfg.save()?;
            println!("tick interval set to {minutes} min");
        }
        ConfigAction::Notification { title, body } => {
            let mut cfg = Config::load()?;
            if let Some(title) = title {
                cfg.tracker.notification_title = title;
            }
            if let Some(body) = body {
                cfg.tracker.notification_body = body;
            }
            cfg.save()?;
            println!("notification text updated");
        }
    }
    Ok(())
}
