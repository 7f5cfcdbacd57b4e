use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;
use log::info;
use tagdraw::{default_tiers, MemoryWinnerStore};
use tagdraw_server::api::{self, AppState};
use tagdraw_server::config::{Cli, Command, ServerConfig};
use tagdraw_server::pick::{format_rows, pick};
use tagdraw_server::storage::{new_store, Store};
use tagdraw_server::sync::{run_periodic, sync_once, Source};
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = cli.load_config()?;
    let store = new_store(&cfg)?;

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg, store).await,
        Command::Sync => {
            let source = Source::from_config(&cfg)?;
            let report = sync_once(&store, &source).await?;
            println!("fetched {} comments, {} new", report.fetched, report.inserted);
            Ok(())
        }
        Command::Pick { count, tag, json } => {
            let count = count.unwrap_or(cfg.default_count);
            let rows = pick(store.as_ref(), &tag, count, &default_tiers(), &mut rand::thread_rng())?;
            print!("{}", format_rows(&rows, json)?);
            Ok(())
        }
    }
}

async fn serve(cfg: ServerConfig, store: Store) -> Result<(), Box<dyn std::error::Error>> {
    let source = Arc::new(Source::from_config(&cfg)?);
    if source.is_demo() {
        info!("serving demo data");
    }

    let exit_signal = Arc::new(AtomicBool::new(false));
    tokio::spawn(run_periodic(
        store.clone(),
        source.clone(),
        Duration::from_secs(cfg.sync_interval_secs.max(1)),
        exit_signal.clone(),
    ));

    let state = AppState {
        comments: store,
        winners: Arc::new(MemoryWinnerStore::new()),
        source,
        tiers: Arc::new(default_tiers()),
        admin_password: cfg.admin_password.clone(),
    };
    let app = api::router(state).layer(build_cors(&cfg));

    let addr: SocketAddr = cfg.bind.parse()?;
    info!("tagdraw-server on http://{addr}/");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown = async move {
        let _ = tokio::signal::ctrl_c().await;
        exit_signal.store(true, Ordering::Relaxed);
    };
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

fn build_cors(cfg: &ServerConfig) -> CorsLayer {
    let list = cfg.cors_origin_list().iter().filter_map(|s| HeaderValue::from_str(s).ok()).collect::<Vec<_>>();
    if !list.is_empty() {
        return CorsLayer::new().allow_origin(list).allow_methods(tower_http::cors::AllowMethods::any()).allow_headers(Any);
    }
    CorsLayer::new().allow_origin(Any).allow_methods(tower_http::cors::AllowMethods::any()).allow_headers(Any)
}
