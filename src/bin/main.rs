use chrono::Local;
use finance_tracker::{
    config::{data_dir_from_env, GatewayConfig},
    export::ExportWindow,
    gateway::AiGateway,
    state::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore},
    FinanceApp,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Finance tracker demo starting");

    let storage: Arc<dyn KeyValueStore> = match data_dir_from_env() {
        Some(dir) => {
            info!(dir = %dir.display(), "Using file storage");
            Arc::new(FileKeyValueStore::open(dir)?)
        }
        None => {
            warn!("TRACKER_DATA_DIR not set, data will not outlive this run");
            Arc::new(InMemoryKeyValueStore::new())
        }
    };

    let gateway = AiGateway::gemini(GatewayConfig::from_env())?;
    let mut app = FinanceApp::open(storage, gateway);

    let today = Local::now().date_naive();
    if app.seed_if_empty(today) {
        info!(records = app.records().len(), "Seeded demo transactions");
    }

    let dashboard = app.dashboard(today);
    let currency = app.preferences().currency;

    println!("\n=== DASHBOARD ===");
    println!("Income:   {}{:.2}", currency.symbol(), dashboard.totals.income);
    println!("Expenses: {}{:.2}", currency.symbol(), dashboard.totals.expenses);
    println!("Balance:  {}{:.2}", currency.symbol(), dashboard.totals.balance);

    println!("\nSpending by category:");
    for entry in &dashboard.expense_breakdown {
        println!("  {:<14} {}{:.2}", entry.category.as_str(), currency.symbol(), entry.amount);
    }

    println!("\nLast 30 days:");
    for point in &dashboard.trend_chart {
        println!("  {:<7} {}{:.2}", point.label, currency.symbol(), point.amount);
    }

    println!("\nRecent transactions:");
    for tx in app.visible_records().iter().take(5) {
        println!("  {}  {:<16} {}", tx.date, tx.description, app.format_amount(tx));
    }

    let csv = app.export_csv(ExportWindow::Last30Days, today)?;
    println!("\nCSV export: {} rows", csv.lines().count().saturating_sub(1));

    if !app.gateway().is_configured() {
        println!("\nSet GEMINI_API_KEY to enable AI summaries.");
        return Ok(());
    }

    println!("\n=== AI SUMMARY ===");
    match app.summarize().await {
        Ok(summary) => println!("{}", summary),
        Err(e) => eprintln!("{}", e.summary_message()),
    }

    Ok(())
}
