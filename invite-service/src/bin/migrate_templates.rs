//! Rewrites every legacy fixed-slot invitation card in the table as a
//! free-form template. Safe to run more than once.

use log::{error, info};
use partyplanner_shared::config::AppConfig;
use partyplanner_shared::invite::migrate::migrate_all;
use partyplanner_shared::store::dynamo::DynamoStore;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env(0);
    let store = DynamoStore::new(config.table_name).await;
    match migrate_all(&store).await {
        Ok(report) => {
            info!(
                "Template migration finished: scanned={}, migrated={}, failed={}",
                report.scanned, report.migrated, report.failed
            );
            if report.failed > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Template migration aborted: {}", e);
            std::process::exit(1);
        }
    }
}
