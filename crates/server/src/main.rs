//! MarketForge — backtesting and paper trading API for NSE/BSE indices
//!
//! Usage:
//!   marketforge serve --port 5000          — Launch the JSON API server
//!   marketforge backtest --symbol "NIFTY 50" --strategy sma_crossover
//!                                          — Run a single backtest from the CLI

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use engine::{
    execute_paper_trade, BacktestEngine, BacktestResult, PaperOrder, StrategyConfig,
    YahooFinanceClient,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "marketforge")]
#[command(about = "Backtesting and paper trading API for NSE/BSE indices", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
    },
    /// Run a single backtest from the CLI (no web server)
    Backtest {
        /// Index to test, e.g. "NIFTY 50"
        #[arg(long, default_value = "NIFTY 50")]
        symbol: String,
        /// Strategy type: sma_crossover, rsi, macd
        #[arg(long, default_value = "sma_crossover")]
        strategy: String,
        /// Historical range, e.g. 6mo, 1y, 5y
        #[arg(long, default_value = "1y")]
        period: String,
        /// Position size as percent of capital
        #[arg(long, default_value_t = 10.0)]
        position_size: f64,
        /// Starting capital
        #[arg(long, default_value_t = 1_000_000.0)]
        initial_capital: f64,
        /// Optional JSON export path
        #[arg(long)]
        export: Option<String>,
    },
}

#[derive(Clone)]
struct AppState {
    market: Arc<YahooFinanceClient>,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,marketforge=debug")
    } else {
        EnvFilter::new("info,engine=info,marketforge=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(&host, port).await?;
        }
        Commands::Backtest {
            symbol,
            strategy,
            period,
            position_size,
            initial_capital,
            export,
        } => {
            cmd_backtest(
                symbol,
                strategy,
                period,
                position_size,
                initial_capital,
                export,
            )
            .await?;
        }
    }

    Ok(())
}

// ============================================================================
// Serve command — Axum web server
// ============================================================================

async fn cmd_serve(host: &str, port: u16) -> anyhow::Result<()> {
    info!("MarketForge v{} starting...", APP_VERSION);

    let state = AppState {
        market: Arc::new(YahooFinanceClient::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(api_health))
        .route("/market/indices", get(api_indices))
        .route("/market/index/:symbol", get(api_index))
        .route("/market/historical/:symbol", get(api_historical))
        .route("/backtest", post(api_backtest))
        .route("/strategy/validate", post(api_validate_strategy))
        .route("/paper-trade/execute", post(api_paper_trade))
        .with_state(state);

    let app = Router::new().nest("/api", api_routes).layer(cors);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== MarketForge v{} ===", APP_VERSION);
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET  /api/health                    - Health check");
    println!("  GET  /api/market/indices            - Quotes for all indices");
    println!("  GET  /api/market/index/:symbol      - Quote for one index");
    println!("  GET  /api/market/historical/:symbol - Historical bars");
    println!("  POST /api/backtest                  - Run a strategy backtest");
    println!("  POST /api/strategy/validate         - Validate a strategy config");
    println!("  POST /api/paper-trade/execute       - Execute a paper trade");
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// API Handlers — Market data
// ============================================================================

/// GET /api/health
async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": APP_VERSION,
    }))
}

/// GET /api/market/indices — quotes for every cataloged index
async fn api_indices(State(state): State<AppState>) -> Json<serde_json::Value> {
    let quotes = state.market.all_quotes().await;
    Json(serde_json::json!(quotes))
}

/// GET /api/market/index/:symbol — quote for one index
async fn api_index(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.market.quote(&symbol).await {
        Ok(quote) => Ok(Json(serde_json::json!(quote))),
        Err(e) => {
            error!(symbol = %symbol, error = %e, "Quote lookup failed");
            Err((
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "Symbol not found"})),
            ))
        }
    }
}

/// GET /api/market/historical/:symbol?period=1y&interval=1d
async fn api_historical(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let period = params.get("period").cloned().unwrap_or_else(|| "1y".to_string());
    let interval = params
        .get("interval")
        .cloned()
        .unwrap_or_else(|| "1d".to_string());

    let bars = state
        .market
        .history(&symbol, &period, &interval)
        .await
        .map_err(|e| {
            error!(symbol = %symbol, error = %e, "History fetch failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({"error": format!("Market data fetch failed: {e}")})),
            )
        })?;

    if bars.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "No data found"})),
        ));
    }

    Ok(Json(serde_json::json!(bars)))
}

// ============================================================================
// API Handlers — Backtesting
// ============================================================================

/// POST /api/backtest request body
#[derive(Deserialize)]
struct BacktestRequest {
    strategy: serde_json::Value,
    #[serde(default = "default_period")]
    period: String,
}

fn default_period() -> String {
    "1y".to_string()
}

/// POST /api/backtest — run a backtest over fresh historical data
async fn api_backtest(
    State(state): State<AppState>,
    Json(request): Json<BacktestRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    // Strategy problems are data-level errors, reported in the payload
    let config = StrategyConfig::from_json(request.strategy).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": e.to_string()})),
        )
    })?;

    // A failed fetch and an empty series are different failures; neither
    // produces a zero-trade result
    let bars = state
        .market
        .history(&config.symbol, &request.period, "1d")
        .await
        .map_err(|e| {
            error!(symbol = %config.symbol, error = %e, "History fetch failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({"error": format!("Market data fetch failed: {e}")})),
            )
        })?;

    if bars.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "No historical data available"})),
        ));
    }

    info!(
        symbol = %config.symbol,
        period = %request.period,
        bars = bars.len(),
        "Running backtest"
    );

    match BacktestEngine::run_on_bars(&config, &bars) {
        Ok(result) => Ok(Json(serde_json::json!(result))),
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": e.to_string()})),
        )),
    }
}

/// POST /api/strategy/validate — check the required config fields
async fn api_validate_strategy(
    Json(strategy): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    for field in ["name", "type", "symbol", "positionSize", "initialCapital"] {
        if strategy.get(field).is_none() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": format!("Missing required field: {field}")
                })),
            ));
        }
    }

    Ok(Json(serde_json::json!({"valid": true})))
}

// ============================================================================
// API Handlers — Paper trading
// ============================================================================

/// POST /api/paper-trade/execute — fill an order at the current quote
async fn api_paper_trade(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let order: PaperOrder = serde_json::from_value(body).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid order"})),
        )
    })?;

    let quote = state.market.quote(&order.symbol).await.map_err(|e| {
        error!(symbol = %order.symbol, error = %e, "Paper trade quote failed");
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Symbol not found"})),
        )
    })?;

    let execution = execute_paper_trade(&order, &quote, Utc::now());
    Ok(Json(serde_json::json!(execution)))
}

// ============================================================================
// Backtest command — CLI mode (no web server)
// ============================================================================

async fn cmd_backtest(
    symbol: String,
    strategy: String,
    period: String,
    position_size: f64,
    initial_capital: f64,
    export: Option<String>,
) -> anyhow::Result<()> {
    println!("\n=== MarketForge v{} ===", APP_VERSION);

    let config = StrategyConfig::from_json(serde_json::json!({
        "type": strategy,
        "symbol": symbol,
        "positionSize": position_size,
        "initialCapital": initial_capital,
    }))?;

    let market = YahooFinanceClient::new();
    let bars = market.history(&config.symbol, &period, "1d").await?;
    if bars.is_empty() {
        anyhow::bail!("No historical data available for {}", config.symbol);
    }

    let result = BacktestEngine::run_on_bars(&config, &bars)?;

    print_result(&config, &period, &result);

    if let Some(export_path) = export {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&export_path, &json)?;
        println!("\nResult exported to {}", export_path);
    }

    Ok(())
}

fn print_result(config: &StrategyConfig, period: &str, result: &BacktestResult) {
    println!(
        "\nBacktest: {} over {} ({} trades)",
        config.symbol, period, result.total_trades
    );
    println!("  Initial capital: {:>14}", config.initial_capital.round_dp(2));
    println!("  Final capital:   {:>14}", result.final_capital.round_dp(2));
    println!("  Total PnL:       {:>14}", result.total_pnl.round_dp(2));
    println!("  Win rate:        {:>13}%", result.win_rate.round_dp(1));
    println!("  Avg win / loss:  {} / {}", result.avg_win.round_dp(2), result.avg_loss.round_dp(2));
    println!("  Profit factor:   {:>14}", result.profit_factor.round_dp(2));

    if result.trades.is_empty() {
        return;
    }

    println!(
        "\n  {:>3}  {:<12} {:<12} {:>8} {:>12} {:>12} {:>12}",
        "#", "Entry", "Exit", "Qty", "Entry Px", "Exit Px", "PnL"
    );
    println!("  {}", "-".repeat(78));
    for (i, trade) in result.trades.iter().enumerate() {
        println!(
            "  {:>3}  {:<12} {:<12} {:>8} {:>12} {:>12} {:>12}",
            i + 1,
            trade.entry_timestamp.format("%Y-%m-%d"),
            trade.exit_timestamp.format("%Y-%m-%d"),
            trade.quantity,
            trade.entry_price.round_dp(2),
            trade.exit_price.round_dp(2),
            trade.pnl.round_dp(2),
        );
    }
}
