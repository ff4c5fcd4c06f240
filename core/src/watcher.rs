//! Single-shot debriefing watcher.
//!
//! A [`PollWatcher`] rescans the debriefing directory at a fixed interval. The
//! first file that appears or gets a new modification time is run through the
//! pipeline, the callback receives the outcome, and the watcher stops for good.
//! It never re-arms; start a new watcher for the next mission.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::context::{AppConfig, DEFAULT_POLL_INTERVAL_MS};
use crate::debriefing::{MissionInputs, process_debriefing};
use crate::error::{DebriefError, Result};
use crate::reconcile::Reconciliation;

type FsEvents = mpsc::UnboundedReceiver<notify::Result<Event>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    Waiting,
    /// Terminal: this file triggered the callback.
    Found(PathBuf),
    /// Terminal: stopped by the owner before any file changed.
    Stopped,
}

/// What the callback receives once a debriefing has been processed.
#[derive(Debug)]
pub struct DebriefingOutcome {
    pub path: PathBuf,
    pub result: Result<Reconciliation>,
}

pub struct DebriefingWatcher {
    directory: PathBuf,
    poll_interval: Duration,
}

impl DebriefingWatcher {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Watcher on the configured debriefing directory, if one can be determined.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        config
            .debriefing_directory()
            .map(|dir| Self::new(dir).with_poll_interval(config.poll_interval()))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Create the directory if needed, take the initial scan and spawn the watch task.
    ///
    /// Files already present when this returns never trigger the callback
    /// unless they change afterwards. The callback runs on the watch task, at
    /// most once. Dropping the returned handle detaches the watcher; call
    /// [`WatchHandle::stop`] to cancel it.
    pub async fn start<F>(self, inputs: Arc<MissionInputs>, callback: F) -> Result<WatchHandle>
    where
        F: FnOnce(DebriefingOutcome) + Send + 'static,
    {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| DebriefError::io(&self.directory, e))?;

        let (fs_tx, fs_rx) = mpsc::unbounded_channel();
        let config = Config::default().with_poll_interval(self.poll_interval);
        let mut poller = PollWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = fs_tx.send(res);
            },
            config,
        )
        .map_err(|e| DebriefError::watch(&self.directory, e))?;

        // The initial scan happens here, before any event can be emitted.
        poller
            .watch(&self.directory, RecursiveMode::NonRecursive)
            .map_err(|e| DebriefError::watch(&self.directory, e))?;

        tracing::info!(directory = %self.directory.display(), "Waiting for debriefing");

        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(WatchState::Waiting);

        let task = tokio::spawn(wait_for_debriefing(
            poller, fs_rx, inputs, callback, stop_rx, state_tx,
        ));

        Ok(WatchHandle {
            stop: stop_tx,
            state: state_rx,
            task,
        })
    }
}

/// Owner's handle on a running watcher.
pub struct WatchHandle {
    stop: watch::Sender<bool>,
    state: watch::Receiver<WatchState>,
    task: JoinHandle<WatchState>,
}

impl WatchHandle {
    /// Ask the watcher to stop before it picks up another change.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn state(&self) -> WatchState {
        self.state.borrow().clone()
    }

    /// Wait for the watcher to reach a terminal state.
    pub async fn join(self) -> WatchState {
        match self.task.await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, "Debriefing watcher task failed");
                WatchState::Stopped
            }
        }
    }

    pub async fn stop_and_join(self) -> WatchState {
        self.stop();
        self.join().await
    }
}

async fn wait_for_debriefing<F>(
    poller: PollWatcher,
    mut events: FsEvents,
    inputs: Arc<MissionInputs>,
    callback: F,
    mut stop_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<WatchState>,
) -> WatchState
where
    F: FnOnce(DebriefingOutcome) + Send + 'static,
{
    let Some(path) = next_changed_file(&mut events, &mut stop_rx).await else {
        tracing::debug!("Debriefing watcher stopped");
        state_tx.send_replace(WatchState::Stopped);
        return WatchState::Stopped;
    };
    // Single shot: stop scanning before the pipeline runs.
    drop(poller);

    tracing::info!(path = %path.display(), "Debriefing detected");

    let result = process_debriefing(&path, &inputs);
    if let Err(e) = &result {
        tracing::error!(path = %path.display(), error = %e, "Failed to process debriefing");
    }

    let state = WatchState::Found(path.clone());
    state_tx.send_replace(state.clone());
    callback(DebriefingOutcome { path, result });
    state
}

/// Wait for the first created or modified file. `None` once stopped.
///
/// Changes reported by the same scan are resolved to the first file name.
async fn next_changed_file(
    events: &mut FsEvents,
    stop_rx: &mut watch::Receiver<bool>,
) -> Option<PathBuf> {
    let mut owner_attached = true;

    let first = loop {
        if *stop_rx.borrow() {
            return None;
        }

        let received = if owner_attached {
            tokio::select! {
                event = events.recv() => event,
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        // Handle dropped: keep watching, nobody can stop us now.
                        owner_attached = false;
                    }
                    continue;
                }
            }
        } else {
            events.recv().await
        };

        match received? {
            Ok(event) => {
                if let Some(path) = changed_file(&event) {
                    break path;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to scan debriefing directory");
            }
        }
    };

    let mut path = first;
    while let Ok(pending) = events.try_recv() {
        if let Some(other) = pending.ok().as_ref().and_then(changed_file) {
            if other < path {
                path = other;
            }
        }
    }
    Some(path)
}

/// The regular file a create or modify event refers to.
fn changed_file(event: &Event) -> Option<PathBuf> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => {
            event.paths.iter().find(|path| path.is_file()).cloned()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableCatalog;
    use debrief_types::{Faction, FactionForces, Group, MissionSnapshot, SimUnit, UnitType};
    use filetime::FileTime;
    use notify::event::{CreateKind, MetadataKind, ModifyKind, RemoveKind};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const POLL: Duration = Duration::from_millis(10);
    const DEADLINE: Duration = Duration::from_secs(10);

    const DEAD_42: &str = "debriefing = { events = { [1] = { type = \"dead\", initiatorMissionID = \"42\" } } }";

    fn inputs() -> Arc<MissionInputs> {
        let mut russia = FactionForces::new("Russia");
        russia.vehicle_groups.push(Group::new(
            "Armor",
            vec![SimUnit::new(42, "T-55", "Armor-1"), SimUnit::new(43, "T-55", "Armor-2")],
        ));
        let snapshot = MissionSnapshot::new(vec![FactionForces::new("USA"), russia]);
        Arc::new(MissionInputs {
            detailed: snapshot.clone(),
            quick: snapshot,
            player: Faction::new("USA"),
            enemy: Faction::new("Russia"),
            catalog: Arc::new(TableCatalog::builtin()),
        })
    }

    /// Stage a file elsewhere and rename it in, so the watcher never sees it half written.
    fn place(dir: &Path, name: &str, contents: &str, mtime: Option<FileTime>) -> PathBuf {
        let staging = tempfile::tempdir().unwrap();
        let staged = staging.path().join(name);
        fs::write(&staged, contents).unwrap();
        if let Some(mtime) = mtime {
            filetime::set_file_mtime(&staged, mtime).unwrap();
        }
        let target = dir.join(name);
        fs::rename(&staged, &target).unwrap();
        target
    }

    #[test]
    fn test_changed_file_accepts_creates_and_modifies_of_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("a.log");
        fs::write(&log, "").unwrap();

        let created = Event::new(EventKind::Create(CreateKind::Any)).add_path(log.clone());
        let modified = Event::new(EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)))
            .add_path(log.clone());
        assert_eq!(changed_file(&created), Some(log.clone()));
        assert_eq!(changed_file(&modified), Some(log.clone()));

        let removed = Event::new(EventKind::Remove(RemoveKind::Any)).add_path(log);
        assert_eq!(changed_file(&removed), None);

        let directory = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(dir.path().to_path_buf());
        assert_eq!(changed_file(&directory), None);
    }

    #[tokio::test]
    async fn test_rewritten_log_fires_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("a.log");
        fs::write(&log, "events = { }").unwrap();
        filetime::set_file_mtime(&log, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let counter = Arc::clone(&calls);
        let handle = DebriefingWatcher::new(dir.path())
            .with_poll_interval(POLL)
            .start(inputs(), move |outcome| {
                counter.fetch_add(1, Ordering::SeqCst);
                tx.send(outcome).ok();
            })
            .await
            .unwrap();
        assert_eq!(handle.state(), WatchState::Waiting);

        place(dir.path(), "a.log", DEAD_42, Some(FileTime::from_unix_time(1_600_000_001, 0)));

        let state = timeout(DEADLINE, handle.join()).await.unwrap();
        assert_eq!(state, WatchState::Found(log.clone()));

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.path, log);
        let reconciliation = outcome.result.unwrap();
        assert_eq!(
            reconciliation
                .debriefing
                .alive_count(&Faction::new("Russia"), &UnitType::new("T-55")),
            1
        );

        place(dir.path(), "b.log", DEAD_42, None);
        tokio::time::sleep(POLL * 5).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_new_file_is_detected_and_directory_created() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("liberation_debriefings");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = DebriefingWatcher::new(&dir)
            .with_poll_interval(POLL)
            .start(inputs(), move |outcome| {
                tx.send(outcome).ok();
            })
            .await
            .unwrap();
        assert!(dir.is_dir());

        place(&dir, "debrief.log", DEAD_42, None);

        let outcome = timeout(DEADLINE, rx.recv()).await.unwrap().unwrap();
        assert!(outcome.result.is_ok());
        assert_eq!(
            timeout(DEADLINE, handle.join()).await.unwrap(),
            WatchState::Found(dir.join("debrief.log"))
        );
    }

    #[tokio::test]
    async fn test_unparseable_log_is_delivered_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = DebriefingWatcher::new(dir.path())
            .with_poll_interval(POLL)
            .start(inputs(), move |outcome| {
                tx.send(outcome).ok();
            })
            .await
            .unwrap();

        place(dir.path(), "broken.log", "%%% garbage", None);

        let outcome = timeout(DEADLINE, rx.recv()).await.unwrap().unwrap();
        assert!(matches!(outcome.result, Err(DebriefError::Parse(_))));
        assert!(matches!(
            timeout(DEADLINE, handle.join()).await.unwrap(),
            WatchState::Found(_)
        ));
    }

    #[tokio::test]
    async fn test_stop_ends_watch_without_callback() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = DebriefingWatcher::new(dir.path())
            .with_poll_interval(Duration::from_secs(3600))
            .start(inputs(), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        let state = timeout(DEADLINE, handle.stop_and_join()).await.unwrap();
        assert_eq!(state, WatchState::Stopped);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_subdirectories_and_removals_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let old = place(dir.path(), "old.log", DEAD_42, None);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = DebriefingWatcher::new(dir.path())
            .with_poll_interval(POLL)
            .start(inputs(), move |outcome| {
                tx.send(outcome).ok();
            })
            .await
            .unwrap();

        fs::create_dir(dir.path().join("archive")).unwrap();
        fs::remove_file(old).unwrap();
        tokio::time::sleep(POLL * 10).await;
        assert_eq!(handle.state(), WatchState::Waiting);

        let log = place(dir.path(), "debrief.log", DEAD_42, None);
        let outcome = timeout(DEADLINE, rx.recv()).await.unwrap().unwrap();
        assert_eq!(outcome.path, log);
        assert_eq!(timeout(DEADLINE, handle.join()).await.unwrap(), WatchState::Found(log));
    }
}
