use chrono::Utc;
use gymlog_core::compute_attendance_stats;
use gymlog_core::storage::Database;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let samples = db.all_samples()?;
    let since = db.gym_config()?.and_then(|gym| gym.last_payment_date);

    let stats = compute_attendance_stats(&samples, since, Utc::now());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
