//! Backlog sweeper: concedes the oldest newsletter articles in bulk.
//!
//! The combined newsletter backlog (the_decoder, dl_batch, geek_weekly)
//! grows faster than anyone reads it. This marks the oldest hundred read:
//! their URLs land in the read history, so no future scrape can bring
//! them back.
//!
//! Usage: `growthdesk-mark-backlog-read`

use growthdesk::db::DashboardDb;
use growthdesk::services::articles;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let db = DashboardDb::open()?;
    let count = articles::mark_backlog_read(&db, articles::BACKLOG_CHUNK)?;
    println!("Marked {count} articles as read.");
    Ok(())
}
