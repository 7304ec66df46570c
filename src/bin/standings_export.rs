use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use torneo::standings::compute_standings;
use torneo::standings_export::export_standings;
use torneo::store::{self, results, venues};

/// Writes a venue's standings to an xlsx workbook, one sheet per group.
#[derive(Debug, Parser)]
#[command(name = "standings_export", version)]
struct ExportArgs {
    /// Venue (subsede) id.
    #[arg(long = "subsede")]
    venue_id: i64,

    #[arg(long, env = "TORNEO_DB", default_value = "torneo.db")]
    db: PathBuf,

    /// Defaults to `posiciones_subsede_<id>.xlsx`.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = ExportArgs::parse();
    let venue_id = args.venue_id;
    let out_path = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("posiciones_subsede_{venue_id}.xlsx")));

    if !args.db.exists() {
        return Err(anyhow!("database {} does not exist", args.db.display()));
    }
    let conn = store::open_db(&args.db)?;
    let venue = venues::get_venue(&conn, venue_id)?
        .ok_or_else(|| anyhow!("venue {venue_id} not found in {}", args.db.display()))?;

    let records = results::load_match_records(&conn, venue_id)?;
    let standings = compute_standings(&records);
    let report = export_standings(&out_path, &standings)?;

    println!("Standings export complete");
    println!("Venue: {} ({})", venue.name, venue.id);
    println!(
        "Fixtures: {} ({} played)",
        records.len(),
        records.iter().filter(|m| m.is_played()).count()
    );
    println!("Groups: {}  Teams: {}", report.groups, report.teams);
    println!("Output: {}", out_path.display());
    Ok(())
}
