//! PAE 菜单服务入口
//!
//! 启动: cargo run --bin pae-menus
//! 配置: config/default.toml，环境变量 PAE__* 覆盖；`--config <path>` 追加一个配置文件

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;

use pae_menus::api::{create_router, AppState};
use pae_menus::config::{load_config, AppConfig};
use pae_menus::core::{Clock, ShutdownManager, SystemClock};
use pae_menus::cycles::MenuCycleService;
use pae_menus::directory::{CoverageDirectory, HttpCoverageDirectory, StaticCoverageDirectory};
use pae_menus::nutrition::NutritionEngine;
use pae_menus::scheduling::SchedulingEngine;
use pae_menus::seed::{apply_seed, read_seed_file};
use pae_menus::store::{DishCatalog, MemoryStore, MenuCycleStore, ScheduleStore};

/// 三个存储角色共用同一个后端实例
struct Stores {
    schedules: Arc<dyn ScheduleStore>,
    cycles: Arc<dyn MenuCycleStore>,
    catalog: Arc<dyn DishCatalog>,
    #[cfg(feature = "async-sqlite")]
    sqlite: Option<Arc<pae_menus::store::SqliteStore>>,
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

async fn build_stores(cfg: &AppConfig) -> anyhow::Result<Stores> {
    #[cfg(feature = "async-sqlite")]
    if let Some(ref path) = cfg.database.path {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
            }
        }
        let store = Arc::new(
            pae_menus::store::SqliteStore::new(path, cfg.database.max_connections)
                .await
                .with_context(|| format!("Failed to open database {}", path.display()))?,
        );
        tracing::info!("Using SQLite store at {}", path.display());
        return Ok(Stores {
            schedules: store.clone(),
            cycles: store.clone(),
            catalog: store.clone(),
            sqlite: Some(store),
        });
    }

    #[cfg(not(feature = "async-sqlite"))]
    if cfg.database.path.is_some() {
        tracing::warn!("database.path is set but the async-sqlite feature is disabled; using in-memory store");
    }

    tracing::info!("Using in-memory store");
    let store = Arc::new(MemoryStore::new());
    Ok(Stores {
        schedules: store.clone(),
        cycles: store.clone(),
        catalog: store,
        #[cfg(feature = "async-sqlite")]
        sqlite: None,
    })
}

fn build_directory(cfg: &AppConfig) -> anyhow::Result<Arc<dyn CoverageDirectory>> {
    match cfg.coverage.base_url {
        Some(ref base_url) => {
            tracing::info!("Coverage directory: {}", base_url);
            let directory = HttpCoverageDirectory::new(
                base_url.clone(),
                cfg.coverage.api_token.clone(),
                cfg.coverage.timeout_secs,
            )
            .context("Failed to create coverage directory client")?;
            Ok(Arc::new(directory))
        }
        None => {
            let directory = StaticCoverageDirectory::from_config(&cfg.coverage.locations);
            tracing::info!("Coverage directory: {} static locations", directory.len());
            Ok(Arc::new(directory))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pae_menus::observability::init();

    let cfg = load_config(config_path_from_args()).context("Failed to load config")?;
    let stores = build_stores(&cfg).await?;
    let directory = build_directory(&cfg)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let timeout = Duration::from_secs(cfg.collaborators.timeout_secs);

    if let Some(ref seed_path) = cfg.seed.file {
        let data = read_seed_file(seed_path)?;
        let report = apply_seed(data, stores.catalog.as_ref(), stores.cycles.as_ref(), Utc::now())
            .await
            .context("Failed to apply seed data")?;
        tracing::info!(
            "Seed applied: {} ingredients, {} dishes, {} cycles created, {} skipped",
            report.ingredients,
            report.dishes,
            report.cycles_created,
            report.cycles_skipped
        );
    }

    let scheduling = Arc::new(SchedulingEngine::new(
        stores.schedules.clone(),
        stores.cycles.clone(),
        stores.catalog.clone(),
        directory,
        clock.clone(),
        timeout,
    ));
    let nutrition = Arc::new(NutritionEngine::new(
        stores.schedules.clone(),
        stores.cycles.clone(),
        stores.catalog.clone(),
        clock.clone(),
        timeout,
        cfg.nutrition.clone(),
    ));
    let cycles = Arc::new(MenuCycleService::new(stores.cycles.clone(), clock, timeout));

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let sweep = if cfg.scheduling.status_sweep_secs > 0 {
        Some(scheduling.clone().spawn_status_sweep(
            Duration::from_secs(cfg.scheduling.status_sweep_secs),
            shutdown.token(),
        ))
    } else {
        None
    };

    let state = Arc::new(AppState {
        scheduling,
        nutrition,
        cycles,
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.bind))?;
    tracing::info!("PAE menus listening on http://{}", cfg.server.bind);

    let mut reasons = shutdown.subscribe();
    let manager = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { manager.wait_for_shutdown().await })
        .await
        .context("Server error")?;
    if let Ok(reason) = reasons.try_recv() {
        tracing::info!(?reason, "Shutting down");
    }

    if let Some(handle) = sweep {
        let _ = handle.await;
    }
    #[cfg(feature = "async-sqlite")]
    if let Some(store) = stores.sqlite {
        store.close().await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
