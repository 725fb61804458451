// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{config_root_dir, load_and_validate, ConfigFile, DEFAULT_CONFIG};
use crate::context::BuildContext;
use crate::dag::{Plan, PlanCatalog, RunSummary};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::AssetdagError;
use crate::exec::RealExecutorBackend;
use crate::server::DevServer;
use crate::types::BuildMode;
use crate::watch::{spawn_watcher, WatchBindings};

/// High-level entry point used by `main.rs`.
///
/// Returns `Ok(false)` when the command ran but some task failed.
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = PathBuf::from(&args.config);

    if let Command::Init { force } = args.command {
        write_default_config(&config_path, force).await?;
        return Ok(true);
    }

    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let root = config_root_dir(&config_path);
    let catalog = PlanCatalog::from_config(&cfg);

    if args.dry_run {
        print_dry_run(&cfg, &catalog, &args.command)?;
        return Ok(true);
    }

    match args.command {
        Command::Init { .. } => Ok(true),
        Command::Clean => {
            let build_dir = root.join(&cfg.paths.build);
            exec::clean_build_dir(&root, &build_dir).await?;
            Ok(true)
        }
        Command::Build { force } => {
            let ctx = BuildContext::from_config(&cfg, &root, force)?;
            let plan = catalog.for_mode(BuildMode::Build)?;
            let summary = run_plan(&ctx, &cfg, plan).await?;
            Ok(summary.succeeded())
        }
        Command::Run { names, force } => {
            if let Some(unknown) = names.iter().find(|n| !catalog.is_known(n)) {
                return Err(AssetdagError::TaskNotFound(unknown.clone()).into());
            }
            let ctx = BuildContext::from_config(&cfg, &root, force)?;
            let plan = catalog.parallel_of(&names)?;
            let summary = run_plan(&ctx, &cfg, plan).await?;
            Ok(summary.succeeded())
        }
        Command::Develop {
            port,
            no_server,
            force,
        } => {
            let ctx = BuildContext::from_config(&cfg, &root, force)?;
            develop(&ctx, &cfg, port, no_server).await?;
            Ok(true)
        }
    }
}

/// Wire a runtime (core, event channel, real executor, reload hub) for `ctx`.
///
/// The returned sender feeds the runtime; the executor holds its own clone.
pub fn runtime_for(
    ctx: &BuildContext,
    cfg: &ConfigFile,
    options: RuntimeOptions,
) -> (Runtime<RealExecutorBackend>, mpsc::Sender<RuntimeEvent>) {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let core = CoreRuntime::new(
        PlanCatalog::from_config(cfg),
        ctx.tasks.reload_tasks().map(str::to_string),
        options,
    );
    let executor = RealExecutorBackend::new(ctx.clone(), rt_tx.clone());
    let runtime = Runtime::new(core, rt_rx, executor).with_reload(ctx.reload.clone());
    (runtime, rt_tx)
}

/// Run `plan` once to completion and return its summary.
pub async fn run_plan(ctx: &BuildContext, cfg: &ConfigFile, plan: Plan) -> Result<RunSummary> {
    let (runtime, rt_tx) = runtime_for(ctx, cfg, RuntimeOptions { exit_when_idle: true });

    rt_tx
        .send(RuntimeEvent::RunRequested {
            plan,
            reason: TriggerReason::Manual,
        })
        .await?;

    runtime
        .run()
        .await?
        .context("runtime exited without finishing a run")
}

/// Initial `develop` run, then dev server + watcher until Ctrl-C.
async fn develop(
    ctx: &BuildContext,
    cfg: &ConfigFile,
    port: Option<u16>,
    no_server: bool,
) -> Result<()> {
    let plan = PlanCatalog::from_config(cfg).for_mode(BuildMode::Develop)?;
    let initial = run_plan(ctx, cfg, plan).await?;
    if !initial.succeeded() {
        warn!(failed = ?initial.failed_tasks(), "initial build had failures; watching anyway");
    }

    let server = if no_server {
        None
    } else {
        let serve_root = match &cfg.server.root {
            Some(dir) => ctx.root().join(dir),
            None => ctx.build_dir().to_path_buf(),
        };
        let port = port.unwrap_or(cfg.server.port);
        Some(DevServer::start(&cfg.server.host, port, serve_root, ctx.reload.clone()).await?)
    };
    if let Some(server) = &server {
        info!("serving on http://{}", server.local_addr());
    }

    let (runtime, rt_tx) = runtime_for(ctx, cfg, RuntimeOptions { exit_when_idle: false });

    let bindings = WatchBindings::compile(&cfg.watch)?;
    let _watcher = spawn_watcher(
        ctx.root(),
        bindings,
        Duration::from_millis(cfg.config.debounce_ms),
        rt_tx.clone(),
    )?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; shutting down");
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }
    drop(rt_tx);

    if let Some(last) = runtime.run().await? {
        debug!(run_id = last.run_id, succeeded = last.succeeded(), "watch session ended");
    }

    if let Some(server) = server {
        server.shutdown().await;
    }
    Ok(())
}

async fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if !force && tokio::fs::try_exists(path).await.unwrap_or(false) {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AssetdagError::path_io(parent, e))?;
    }
    tokio::fs::write(path, DEFAULT_CONFIG)
        .await
        .map_err(|e| AssetdagError::path_io(path, e))?;
    info!(path = ?path, "wrote default configuration");
    Ok(())
}

/// Simple dry-run output: tasks, the plan the command would run, and watch
/// bindings.
fn print_dry_run(cfg: &ConfigFile, catalog: &PlanCatalog, command: &Command) -> Result<()> {
    println!("assetdag dry-run");
    println!("  config.debounce_ms = {}", cfg.config.debounce_ms);
    println!("  paths.build = {}", cfg.paths.build);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      src: {:?}", task.src);
        println!("      dest: {}", task.dest);
        if !task.steps.is_empty() {
            let steps: Vec<&str> = task.steps.iter().map(|s| s.processor.as_str()).collect();
            println!("      steps: {}", steps.join(" -> "));
        }
        if task.reload {
            println!("      reload: true");
        }
        if task.incremental {
            println!("      incremental: true");
        }
    }
    println!();

    let plan = match command {
        Command::Build { .. } => Some(catalog.for_mode(BuildMode::Build)?),
        Command::Develop { .. } => Some(catalog.for_mode(BuildMode::Develop)?),
        Command::Run { names, .. } => Some(catalog.parallel_of(names)?),
        Command::Clean => Some(Plan::task(dag::CLEAN_TASK)),
        Command::Init { .. } => None,
    };
    if let Some(plan) = plan {
        println!("plan: {plan}");
        println!();
    }

    if !cfg.watch.is_empty() {
        println!("watch ({}):", cfg.watch.len());
        for binding in &cfg.watch {
            println!("  - {:?} -> {}", binding.glob, binding.task);
            if !binding.exclude.is_empty() {
                println!("      exclude: {:?}", binding.exclude);
            }
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
