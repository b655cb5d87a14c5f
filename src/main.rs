use analytics::{AnalyticsEngine, AnalyticsReport, ReportingWindow};
use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use configuration::{Config, LogLevel};
use database::{connect, run_migrations, DbRepository};
use rust_decimal::Decimal;
use uuid::Uuid;

/// The main entry point for the storefront reseller service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, when there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config().context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    let _guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Migrate => handle_migrate(&config).await,
        Commands::Analytics(args) => handle_analytics(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Storefront backend for resellers: analytics and store settings.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Overrides the configured log level.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Apply pending database migrations.
    Migrate,
    /// Print the analytics report for one reseller.
    Analytics(AnalyticsArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Interface to bind, overriding `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct AnalyticsArgs {
    /// The reseller's user id.
    #[arg(long)]
    reseller: Uuid,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    web_server::run_server(config).await
}

async fn handle_migrate(config: &Config) -> anyhow::Result<()> {
    let db_pool = connect(&config.database).await?;
    run_migrations(&db_pool).await?;
    db_pool.close().await;
    println!("Migrations applied.");
    Ok(())
}

async fn handle_analytics(args: AnalyticsArgs, config: &Config) -> anyhow::Result<()> {
    let db_pool = connect(&config.database).await?;
    let repository = DbRepository::new(db_pool.clone());
    let engine = AnalyticsEngine::new(config.analytics.top_products_limit);
    let window = ReportingWindow::trailing(Utc::now(), config.analytics.window_days)?;

    let report = web_server::report::analytics_report(&repository, &engine, args.reseller, &window)
        .await
        .context("Failed to compute analytics")?;
    db_pool.close().await;

    print_report(&report);
    Ok(())
}

fn pct(value: Decimal) -> String {
    format!("{}%", value.round_dp(2))
}

fn print_report(report: &AnalyticsReport) {
    let current = &report.overview.current_month;
    let growth = &report.overview.growth;

    let mut overview = Table::new();
    overview
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "Current period", "Growth"]);
    overview.add_row(vec![
        Cell::new("Revenue"),
        Cell::new(current.revenue.round_dp(2)),
        Cell::new(pct(growth.revenue)),
    ]);
    overview.add_row(vec![
        Cell::new("Profit"),
        Cell::new(current.profit.round_dp(2)),
        Cell::new(pct(growth.profit)),
    ]);
    overview.add_row(vec![
        Cell::new("Orders"),
        Cell::new(current.orders),
        Cell::new(pct(growth.orders)),
    ]);
    overview.add_row(vec![
        Cell::new("Customers"),
        Cell::new(current.customers),
        Cell::new(pct(growth.customers)),
    ]);
    println!("{overview}");

    let mut daily = Table::new();
    daily
        .load_preset(UTF8_FULL)
        .set_header(vec!["Date", "Revenue", "Profit", "Orders", "Customers"]);
    for point in &report.chart_data {
        daily.add_row(vec![
            Cell::new(point.date),
            Cell::new(point.revenue.round_dp(2)),
            Cell::new(point.profit.round_dp(2)),
            Cell::new(point.orders),
            Cell::new(point.customers),
        ]);
    }
    println!("{daily}");

    let mut products = Table::new();
    products
        .load_preset(UTF8_FULL)
        .set_header(vec!["Product", "Units", "Revenue"]);
    for product in &report.top_products {
        products.add_row(vec![
            Cell::new(&product.title),
            Cell::new(product.total_sales),
            Cell::new(product.revenue.round_dp(2)),
        ]);
    }
    println!("{products}");
}
