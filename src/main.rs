use caderninho::{
    config::{catalog, database, device},
    core::{
        catalog::seed_catalog,
        clock::{Clock, SystemClock},
        comanda, report,
    },
    errors::Result,
};
use chrono::Duration;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Open the record store and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to open record store: {}", e))?;
    database::create_tables(&db).await?;

    // 4. Seed the catalog on first run
    let catalog = catalog::load_default_catalog()
        .inspect_err(|e| error!("Failed to load catalog: {}", e))?;
    seed_catalog(&db, &catalog).await?;

    // 5. Summarize the register state
    let settings = device::get_device_settings();
    let tabs = comanda::list_tabs_with_totals(&db).await?;
    let open: Vec<_> = tabs.iter().filter(|t| t.comanda.is_open()).collect();
    info!("{} open comanda(s)", open.len());
    for tab in open {
        info!(
            "  #{} opened {} - owes {}",
            tab.comanda.id,
            tab.comanda.opened_at.format("%d/%m %H:%M"),
            report::format_amount(&settings, tab.totals.balance)
        );
    }

    let now = SystemClock.now();
    let today = report::period_report(&db, now - Duration::hours(24), now).await?;
    info!(
        "Last 24h: {} sale(s), consumption {}, received {}",
        today.sales_count,
        report::format_amount(&settings, today.consumption_total),
        report::format_amount(&settings, today.payments_total)
    );

    Ok(())
}
