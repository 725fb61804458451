// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::errors::{AssetdagError, Result};
use crate::watch::debounce::Debouncer;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchBindings;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping it stops
/// file watching and ends the trigger loop.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

fn notify_error(err: notify::Error) -> AssetdagError {
    AssetdagError::Other(anyhow::Error::new(err).context("file watcher"))
}

/// Only content-level changes count; access and metadata-only noise from
/// `notify` is ignored.
fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Watch `root` recursively and send a debounced
/// `RuntimeEvent::TaskTriggered` for every binding a change matches.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: WatchBindings,
    debounce: Duration,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    trace!("watch event dropped; trigger loop has ended");
                }
            }
            Err(err) => warn!("file watch error: {err}"),
        },
        Config::default(),
    )
    .map_err(notify_error)?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(notify_error)?;

    info!(root = ?root, bindings = bindings.len(), "file watcher started");

    tokio::spawn(run_trigger_loop(
        root,
        Arc::new(bindings),
        debounce,
        event_rx,
        runtime_tx,
    ));

    Ok(WatcherHandle { _inner: watcher })
}

/// Turn raw filesystem events into debounced task triggers.
///
/// Ends when the event channel closes or the runtime stops listening.
pub async fn run_trigger_loop(
    root: PathBuf,
    bindings: Arc<WatchBindings>,
    window: Duration,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let mut debouncer = Debouncer::new(window);

    loop {
        let deadline = debouncer.next_deadline();

        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else {
                    debug!("watch event channel closed; trigger loop ending");
                    return;
                };
                if !is_relevant(&event.kind) {
                    continue;
                }

                let now = Instant::now();
                for path in &event.paths {
                    let Some(rel) = relative_str(&root, path) else {
                        warn!(path = ?path, root = ?root, "could not relativize changed path");
                        continue;
                    };
                    for idx in bindings.matching(&rel) {
                        trace!(path = %rel, binding = idx, "change matched binding");
                        debouncer.touch(idx, now);
                    }
                }
            }

            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                for idx in debouncer.due(Instant::now()) {
                    let Some(binding) = bindings.get(idx) else {
                        continue;
                    };
                    debug!(task = %binding.task(), "debounce expired -> triggering");

                    let event = RuntimeEvent::TaskTriggered {
                        task: binding.task().to_string(),
                        reason: TriggerReason::FileWatch,
                    };
                    if runtime_tx.send(event).await.is_err() {
                        debug!("runtime channel closed; trigger loop ending");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    use super::*;
    use crate::config::WatchConfig;

    fn bindings() -> Arc<WatchBindings> {
        let cfgs = vec![
            WatchConfig {
                glob: vec!["src/js/**/*.js".into()],
                exclude: vec![],
                task: "js".into(),
            },
            WatchConfig {
                glob: vec!["src/*.html".into()],
                exclude: vec![],
                task: "html".into(),
            },
        ];
        Arc::new(WatchBindings::compile(&cfgs).unwrap())
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from("/project").join(path))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_changes_triggers_once() {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (runtime_tx, mut runtime_rx) = mpsc::channel(8);
        let handle = tokio::spawn(run_trigger_loop(
            PathBuf::from("/project"),
            bindings(),
            Duration::from_millis(100),
            event_rx,
            runtime_tx,
        ));

        for _ in 0..3 {
            event_tx
                .send(event(EventKind::Modify(ModifyKind::Any), "src/js/app.js"))
                .unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        event_tx
            .send(event(EventKind::Access(AccessKind::Any), "src/index.html"))
            .unwrap();

        let first = runtime_rx.recv().await.unwrap();
        assert!(matches!(
            first,
            RuntimeEvent::TaskTriggered { ref task, reason: TriggerReason::FileWatch } if task == "js"
        ));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(runtime_rx.try_recv().is_err());

        drop(event_tx);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unmatched_paths_never_trigger() {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (runtime_tx, mut runtime_rx) = mpsc::channel(8);
        let handle = tokio::spawn(run_trigger_loop(
            PathBuf::from("/project"),
            bindings(),
            Duration::from_millis(100),
            event_rx,
            runtime_tx,
        ));

        event_tx
            .send(event(EventKind::Create(CreateKind::File), "build/index.html"))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(runtime_rx.try_recv().is_err());

        drop(event_tx);
        handle.await.unwrap();
    }
}
