//! `ReplayerRunner` implementation: owns the replayer process.
//!
//! # Design
//!
//! - One replayer tracked at a time behind a `tokio::sync::Mutex`, so a
//!   `fast_start` restart is atomic to other callers
//! - The port probe is queried fresh on every guard and recovery check
//! - `stop` never fails; cleanup problems end up in the `StopReport` and the
//!   log
//! - Platform differences are confined to `PlatformCapabilities`

use std::path::Path;
use std::process::ExitStatus;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use replayctl_core::{
    ExitHooks, KillOutcome, LaunchCommand, LaunchOptions, PlatformCapabilities, PortOwnerProbe,
    PortSet, Recovery, ReplayerInfo, ReplayerRunner, ReplayerSettings, ResolvedPaths, ResolvedPid,
    StopReport, SupervisorError, SupervisorState, ensure_ports_unowned, paths::ensure_dir,
    resolve_owner,
};
use tokio::process::Child;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::assets::stage_all;
use crate::command::{build_launch_command, spawn_replayer};
use crate::inspect::describe_pid;
use crate::kill::{DEFAULT_KILL_SIGNAL, kill_owner, wait_ports_released};
use crate::output::{OutputBuffer, spawn_output_readers};
use crate::probe::check_ports_available;
use crate::shutdown::{TERMINATE_GRACE, terminate_child};

/// How long a recovery kill may take to free the ports.
pub const RELEASE_TIMEOUT: Duration = Duration::from_secs(2);

/// How long `stop` waits for the output readers to reach EOF.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

const EXIT_HOOK_NAME: &str = "stop replayer";

/// A spawned replayer and everything needed to stop it.
struct RunningReplayer {
    child: Child,
    pid: Option<u32>,
    command: LaunchCommand,
    log_file: Option<String>,
    started_at: DateTime<Utc>,
    output: Arc<OutputBuffer>,
    readers: Vec<JoinHandle<()>>,
}

impl RunningReplayer {
    fn info(&self, ports: &PortSet) -> ReplayerInfo {
        ReplayerInfo {
            pid: self.pid,
            command: self.command.command.clone(),
            ports: ports.clone(),
            started_at: self.started_at,
        }
    }
}

#[derive(Default)]
struct SupervisorCore {
    running: Option<RunningReplayer>,
    /// Last built command, reused while the options stay the same.
    cached: Option<(LaunchOptions, LaunchCommand)>,
}

/// State shared by every clone of a supervisor and by its exit hook.
struct Shared {
    core: Mutex<SupervisorCore>,
    probe: Arc<dyn PortOwnerProbe>,
    settings: ReplayerSettings,
    ports: PortSet,
    capabilities: PlatformCapabilities,
    assets: Option<ResolvedPaths>,
    grace: Duration,
    release_timeout: Duration,
}

/// Supervises the replayer process.
///
/// Cheap to clone; clones share the tracked process.
#[derive(Clone)]
pub struct ReplayerSupervisor {
    shared: Arc<Shared>,
    hooks: ExitHooks,
}

/// Builder for [`ReplayerSupervisor`].
pub struct SupervisorBuilder {
    settings: ReplayerSettings,
    probe: Arc<dyn PortOwnerProbe>,
    capabilities: PlatformCapabilities,
    hooks: ExitHooks,
    assets: Option<ResolvedPaths>,
    grace: Duration,
    release_timeout: Duration,
}

impl SupervisorBuilder {
    /// Override the detected platform capabilities.
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: PlatformCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Share the program's exit hook registry.
    #[must_use]
    pub fn with_exit_hooks(mut self, hooks: ExitHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Stage the library and report assets from this layout before `start`.
    #[must_use]
    pub fn with_assets(mut self, paths: ResolvedPaths) -> Self {
        self.assets = Some(paths);
        self
    }

    /// Time the replayer gets between SIGTERM and SIGKILL.
    #[must_use]
    pub const fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    #[must_use]
    pub const fn with_release_timeout(mut self, release_timeout: Duration) -> Self {
        self.release_timeout = release_timeout;
        self
    }

    pub fn build(self) -> ReplayerSupervisor {
        let ports = self.settings.port_set();
        ReplayerSupervisor {
            shared: Arc::new(Shared {
                core: Mutex::new(SupervisorCore::default()),
                probe: self.probe,
                settings: self.settings,
                ports,
                capabilities: self.capabilities,
                assets: self.assets,
                grace: self.grace,
                release_timeout: self.release_timeout,
            }),
            hooks: self.hooks,
        }
    }
}

impl ReplayerSupervisor {
    pub fn builder(
        settings: ReplayerSettings,
        probe: Arc<dyn PortOwnerProbe>,
    ) -> SupervisorBuilder {
        SupervisorBuilder {
            settings,
            probe,
            capabilities: PlatformCapabilities::detect(),
            hooks: ExitHooks::new(),
            assets: None,
            grace: TERMINATE_GRACE,
            release_timeout: RELEASE_TIMEOUT,
        }
    }

    /// Supervisor with detected capabilities and its own exit hook registry.
    pub fn new(settings: ReplayerSettings, probe: Arc<dyn PortOwnerProbe>) -> Self {
        Self::builder(settings, probe).build()
    }

    pub fn ports(&self) -> &PortSet {
        &self.shared.ports
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        self.shared.capabilities
    }

    pub const fn exit_hooks(&self) -> &ExitHooks {
        &self.hooks
    }

    /// PID reported by the spawn API for the tracked process.
    pub async fn pid(&self) -> Option<u32> {
        self.shared.core.lock().await.running.as_ref().and_then(|r| r.pid)
    }

    pub async fn info(&self) -> Option<ReplayerInfo> {
        let core = self.shared.core.lock().await;
        core.running.as_ref().map(|r| r.info(&self.shared.ports))
    }

    /// Forget the cached command so the next start rebuilds it.
    pub async fn invalidate_command(&self) {
        self.shared.core.lock().await.cached = None;
    }

    /// Exit status of the tracked process if it has exited on its own.
    pub async fn exit_status(&self) -> Option<ExitStatus> {
        let mut core = self.shared.core.lock().await;
        let running = core.running.as_mut()?;
        match running.child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                debug!(error = %e, "Could not poll replayer status");
                None
            }
        }
    }

    /// Resolve the current owner of the replayer ports.
    pub fn resolve_owner(&self) -> Result<ResolvedPid, SupervisorError> {
        resolve_owner(self.shared.probe.as_ref(), &self.shared.ports)
    }

    fn register_exit_hook(&self) {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        self.hooks.register(EXIT_HOOK_NAME, move || async move {
            if let Some(shared) = shared.upgrade() {
                let report = shared.stop().await;
                debug!(?report, "Exit hook stopped replayer");
            }
        });
    }
}

#[async_trait]
impl ReplayerRunner for ReplayerSupervisor {
    async fn start(&self, options: LaunchOptions) -> Result<ReplayerInfo, SupervisorError> {
        self.shared.prepare_assets()?;
        self.shared.precheck()?;

        let info = self.fast_start(options).await?;
        self.register_exit_hook();
        Ok(info)
    }

    async fn fast_start(&self, options: LaunchOptions) -> Result<ReplayerInfo, SupervisorError> {
        let mut core = self.shared.core.lock().await;

        if let Some(previous) = core.running.take() {
            debug!(pid = ?previous.pid, "Replayer already running, restarting");
            let report = self.shared.stop_running(previous).await;
            debug!(?report, "Previous replayer stopped");
        }

        let cached = core
            .cached
            .as_ref()
            .filter(|(cached_options, _)| *cached_options == options)
            .map(|(_, command)| command.clone());
        let command = if let Some(command) = cached {
            command
        } else {
            let command = build_launch_command(&options, &self.shared.settings)?;
            core.cached = Some((options.clone(), command.clone()));
            command
        };

        let log_file = options.log_file().map(str::to_string);
        if let Some(dir) = log_file.as_deref().and_then(|f| Path::new(f).parent()) {
            ensure_dir(dir).map_err(|e| SupervisorError::asset_missing(dir, e.to_string()))?;
        }

        let mut child = spawn_replayer(&command)?;
        let pid = child.id();
        let output = Arc::new(OutputBuffer::new());
        let readers = spawn_output_readers(&mut child, &output);

        debug!(pid = ?pid, command = %command, "Replayer started");

        let running = RunningReplayer {
            child,
            pid,
            command,
            log_file,
            started_at: Utc::now(),
            output,
            readers,
        };
        let info = running.info(&self.shared.ports);
        core.running = Some(running);
        Ok(info)
    }

    async fn stop(&self) -> StopReport {
        self.shared.stop().await
    }

    async fn state(&self) -> SupervisorState {
        let mut core = self.shared.core.lock().await;
        match core.running.as_mut().map(|r| r.child.try_wait()) {
            Some(Ok(None)) => SupervisorState::Running,
            Some(Err(e)) => {
                debug!(error = %e, "Could not poll replayer status");
                SupervisorState::Running
            }
            // Exited on its own; the handle stays until `stop` reaps its output.
            Some(Ok(Some(_))) | None => SupervisorState::Idle,
        }
    }
}

impl Shared {
    fn prepare_assets(&self) -> Result<(), SupervisorError> {
        if let Some(paths) = &self.assets {
            let needs_library =
                self.settings.library_path.as_deref() == Some(paths.staged_library().as_path());
            stage_all(paths, needs_library)?;
        }

        if let Some(library) = &self.settings.library_path {
            if !library.is_file() {
                return Err(SupervisorError::asset_missing(
                    library,
                    "replayer library not found",
                ));
            }
        }
        Ok(())
    }

    /// Refuse to start while anything holds the replayer ports.
    fn precheck(&self) -> Result<(), SupervisorError> {
        ensure_ports_unowned(self.probe.as_ref(), &self.ports)?;
        check_ports_available(&self.ports)
    }

    async fn stop(&self) -> StopReport {
        let running = self.core.lock().await.running.take();
        match running {
            Some(running) => self.stop_running(running).await,
            None => {
                debug!(error = %SupervisorError::NotRunning, "Nothing to stop");
                StopReport::NotRunning
            }
        }
    }

    async fn stop_running(&self, mut running: RunningReplayer) -> StopReport {
        let pid = running.pid;

        match terminate_child(&mut running.child, self.grace).await {
            Ok(status) => debug!(pid = ?pid, %status, "Replayer terminated"),
            Err(e) => warn!(pid = ?pid, error = %e, "Failed to terminate replayer handle"),
        }

        // A surviving port owner still holds the pipes, so recover before draining.
        let recovery = if self.capabilities.needs_port_based_recovery {
            self.recover_ports().await
        } else {
            Recovery::Skipped
        };

        dump_output(&mut running).await;

        info!(pid = ?pid, ?recovery, "Replayer stopped");
        StopReport::Stopped { pid, recovery }
    }

    /// Kill whatever still owns the ports after the handle is gone.
    async fn recover_ports(&self) -> Recovery {
        let pid = match resolve_owner(self.probe.as_ref(), &self.ports) {
            Ok(ResolvedPid::NoOwner) => return Recovery::PortsClean,
            Ok(ResolvedPid::Single(pid)) => pid,
            Err(e) => {
                warn!(error = %e, "Could not verify replayer ports after stop");
                return Recovery::Failed(e.to_string());
            }
        };

        debug!(owner = %describe_pid(pid), ports = %self.ports, "Replayer port owner survived, killing");
        match kill_owner(pid, DEFAULT_KILL_SIGNAL) {
            KillOutcome::NotFound => Recovery::AlreadyGone { pid },
            KillOutcome::Killed => {
                if !wait_ports_released(self.probe.as_ref(), &self.ports, self.release_timeout).await
                {
                    warn!(pid, ports = %self.ports, "Ports still in use after killing replayer");
                }
                Recovery::Killed { pid }
            }
            KillOutcome::Failed => {
                let error = SupervisorError::RecoveryKillFailed {
                    pid,
                    reason: "signal was rejected".to_string(),
                };
                warn!(error = %error, "Manual intervention may be needed");
                Recovery::Failed(error.to_string())
            }
        }
    }
}

async fn dump_output(running: &mut RunningReplayer) {
    for mut reader in running.readers.drain(..) {
        if timeout(READER_DRAIN_TIMEOUT, &mut reader).await.is_err() {
            debug!("Output reader still busy, dumping what was captured");
            reader.abort();
        }
    }

    if running.output.is_empty() {
        debug!(pid = ?running.pid, "Replayer produced no output");
    }
    for line in running.output.drain() {
        debug!(stream = line.stream.as_str(), "replayer: {}", line.line);
    }
    if let Some(log_file) = &running.log_file {
        debug!(path = %log_file, "Replayer trace log written");
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        // Best effort: the async stop path is not available here.
        let Some(mut running) = self.core.get_mut().running.take() else {
            return;
        };
        if let Err(e) = running.child.start_kill() {
            debug!(pid = ?running.pid, error = %e, "Could not kill replayer on drop");
        }

        if self.capabilities.needs_port_based_recovery {
            if let Ok(ResolvedPid::Single(pid)) = resolve_owner(self.probe.as_ref(), &self.ports) {
                let outcome = kill_owner(pid, DEFAULT_KILL_SIGNAL);
                debug!(pid, ?outcome, "Killed replayer port owner on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::TcpListener;
    use std::sync::Mutex as StdMutex;

    use crate::inspect::is_process_alive;

    /// Probe answering from a fixed table and recording each query.
    struct MockProbe {
        owners: HashMap<u16, Vec<u32>>,
        queried: StdMutex<Vec<u16>>,
    }

    impl MockProbe {
        fn new(owners: &[(u16, u32)]) -> Arc<Self> {
            let mut map: HashMap<u16, Vec<u32>> = HashMap::new();
            for (port, pid) in owners {
                map.entry(*port).or_default().push(*pid);
            }
            Arc::new(Self {
                owners: map,
                queried: StdMutex::new(Vec::new()),
            })
        }

        fn query_count(&self) -> usize {
            self.queried.lock().unwrap().len()
        }
    }

    impl PortOwnerProbe for MockProbe {
        fn listeners(&self, port: u16) -> Result<Vec<u32>, SupervisorError> {
            self.queried.lock().unwrap().push(port);
            Ok(self.owners.get(&port).cloned().unwrap_or_default())
        }
    }

    /// Probe reporting a real process as owner for as long as it lives.
    struct LiveOwnerProbe {
        pid: u32,
    }

    impl PortOwnerProbe for LiveOwnerProbe {
        fn listeners(&self, _port: u16) -> Result<Vec<u32>, SupervisorError> {
            Ok(if is_process_alive(self.pid) {
                vec![self.pid]
            } else {
                Vec::new()
            })
        }
    }

    /// Reports the PID written to a file as owner for as long as it lives.
    struct PidFileOwner {
        path: std::path::PathBuf,
    }

    impl PortOwnerProbe for PidFileOwner {
        fn listeners(&self, _port: u16) -> Result<Vec<u32>, SupervisorError> {
            let pid = std::fs::read_to_string(&self.path)
                .ok()
                .and_then(|raw| raw.trim().parse::<u32>().ok());
            Ok(pid.filter(|pid| is_process_alive(*pid)).into_iter().collect())
        }
    }

    async fn wait_for_pid_file(path: &std::path::Path) -> u32 {
        for _ in 0..100 {
            if let Some(pid) = std::fs::read_to_string(path)
                .ok()
                .and_then(|raw| raw.trim().parse().ok())
            {
                return pid;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("{} was never written", path.display());
    }

    /// Two distinct ports that were free a moment ago.
    fn free_ports() -> (u16, u16) {
        let a = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let b = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        (a.local_addr().unwrap().port(), b.local_addr().unwrap().port())
    }

    fn settings(command: &str) -> ReplayerSettings {
        let (inbound, outbound) = free_ports();
        ReplayerSettings {
            server_command: Some(command.to_string()),
            inbound_port: inbound,
            outbound_port: outbound,
            ..ReplayerSettings::default()
        }
    }

    fn supervisor(settings: ReplayerSettings, probe: Arc<dyn PortOwnerProbe>) -> ReplayerSupervisor {
        ReplayerSupervisor::builder(settings, probe)
            .with_capabilities(PlatformCapabilities::detect().with_port_based_recovery(false))
            .with_grace(Duration::from_secs(2))
            .build()
    }

    #[tokio::test]
    async fn stop_without_start_is_harmless_and_idempotent() {
        let sup = supervisor(settings("sleep 30"), MockProbe::new(&[]));
        assert_eq!(sup.stop().await, StopReport::NotRunning);
        assert_eq!(sup.stop().await, StopReport::NotRunning);
        assert_eq!(sup.state().await, SupervisorState::Idle);
    }

    #[tokio::test]
    async fn occupied_ports_abort_start_without_spawning() {
        let settings = settings("sleep 30");
        let ports = settings.port_set();
        let probe = MockProbe::new(&[(ports.ports()[0], 555), (ports.ports()[1], 555)]);
        let sup = supervisor(settings, probe);

        match sup.start(LaunchOptions::new()).await {
            Err(SupervisorError::PortsOccupied { pid, .. }) => assert_eq!(pid, Some(555)),
            other => panic!("expected PortsOccupied, got {other:?}"),
        }
        assert_eq!(sup.state().await, SupervisorState::Idle);
        assert!(sup.exit_hooks().is_empty());
    }

    #[tokio::test]
    async fn ambiguous_owners_abort_start() {
        let settings = settings("sleep 30");
        let ports = settings.port_set();
        let probe = MockProbe::new(&[(ports.ports()[0], 555), (ports.ports()[1], 777)]);
        let sup = supervisor(settings, probe);

        assert!(matches!(
            sup.start(LaunchOptions::new()).await,
            Err(SupervisorError::AmbiguousOwnership { .. })
        ));
        assert_eq!(sup.state().await, SupervisorState::Idle);
    }

    #[tokio::test]
    async fn missing_library_aborts_start() {
        let mut settings = settings("sleep 30");
        settings.library_path = Some("/nonexistent/libreplayer.so".into());
        let sup = supervisor(settings, MockProbe::new(&[]));

        assert!(matches!(
            sup.start(LaunchOptions::new()).await,
            Err(SupervisorError::AssetMissing { .. })
        ));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn start_then_stop_round_trip() {
        let probe = MockProbe::new(&[]);
        let sup = supervisor(settings("sleep 30"), probe.clone());

        let info = sup.start(LaunchOptions::new()).await.unwrap();
        let pid = info.pid.expect("spawned pid");
        assert_eq!(info.command, "sleep 30");
        assert_eq!(sup.state().await, SupervisorState::Running);
        assert_eq!(sup.pid().await, Some(pid));
        assert_eq!(sup.exit_hooks().len(), 1);
        assert_eq!(probe.query_count(), 2);

        let report = sup.stop().await;
        assert_eq!(
            report,
            StopReport::Stopped {
                pid: Some(pid),
                recovery: Recovery::Skipped
            }
        );
        assert_eq!(sup.state().await, SupervisorState::Idle);
        assert!(sup.info().await.is_none());
        assert_eq!(sup.stop().await, StopReport::NotRunning);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn fast_start_replaces_running_process() {
        let sup = supervisor(settings("sleep 30"), MockProbe::new(&[]));

        let first = sup.fast_start(LaunchOptions::new()).await.unwrap();
        let second = sup.fast_start(LaunchOptions::new()).await.unwrap();

        let (first_pid, second_pid) = (first.pid.unwrap(), second.pid.unwrap());
        assert_ne!(first_pid, second_pid);
        assert!(!is_process_alive(first_pid));
        assert_eq!(sup.pid().await, Some(second_pid));
        // fast_start never registers an exit hook.
        assert!(sup.exit_hooks().is_empty());

        assert!(sup.stop().await.was_running());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn command_is_cached_until_options_change() {
        let sup = supervisor(settings("sleep 30"), MockProbe::new(&[]));
        let options = LaunchOptions::new().with("REPLAYER_LOG_LEVEL", "ERROR");

        sup.fast_start(options.clone()).await.unwrap();
        let cached = sup.shared.core.lock().await.cached.clone();
        sup.fast_start(options).await.unwrap();
        assert_eq!(sup.shared.core.lock().await.cached, cached);

        sup.fast_start(LaunchOptions::new().with("REPLAYER_LOG_LEVEL", "TRACE"))
            .await
            .unwrap();
        let rebuilt = sup.shared.core.lock().await.cached.clone().unwrap();
        assert_eq!(rebuilt.1.env.get("REPLAYER_LOG_LEVEL").unwrap(), "TRACE");

        sup.invalidate_command().await;
        assert!(sup.shared.core.lock().await.cached.is_none());
        sup.stop().await;
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn exit_hook_stops_the_replayer_once() {
        let sup = supervisor(settings("sleep 30"), MockProbe::new(&[]));
        let info = sup.start(LaunchOptions::new()).await.unwrap();

        assert_eq!(sup.exit_hooks().run_all().await, 1);
        assert_eq!(sup.state().await, SupervisorState::Idle);
        assert!(!is_process_alive(info.pid.unwrap()));
        assert_eq!(sup.exit_hooks().run_all().await, 0);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn exited_replayer_reports_status() {
        let sup = supervisor(settings("exit 3"), MockProbe::new(&[]));
        sup.fast_start(LaunchOptions::new()).await.unwrap();

        let mut status = None;
        for _ in 0..50 {
            status = sup.exit_status().await;
            if status.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(status.and_then(|s| s.code()), Some(3));
        assert!(sup.stop().await.was_running());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn recovery_kills_surviving_port_owner() {
        let mut survivor = tokio::process::Command::new("sleep")
            .arg("60")
            .spawn()
            .unwrap();
        let survivor_pid = survivor.id().unwrap();

        let sup = ReplayerSupervisor::builder(
            settings("sleep 30"),
            Arc::new(LiveOwnerProbe { pid: survivor_pid }),
        )
        .with_capabilities(PlatformCapabilities::detect().with_port_based_recovery(true))
        .with_grace(Duration::from_secs(2))
        .build();

        sup.fast_start(LaunchOptions::new()).await.unwrap();
        let report = sup.stop().await;

        match report {
            StopReport::Stopped { recovery, .. } => {
                assert_eq!(recovery, Recovery::Killed { pid: survivor_pid });
            }
            StopReport::NotRunning => panic!("replayer should have been running"),
        }
        let status = survivor.wait().await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn recovery_treats_vanished_owner_as_gone() {
        let settings = settings("sleep 30");
        let ports = settings.port_set();
        let probe = MockProbe::new(&[(ports.ports()[0], 999_999)]);
        let sup = ReplayerSupervisor::builder(settings, probe)
            .with_capabilities(PlatformCapabilities::detect().with_port_based_recovery(true))
            .build();

        sup.fast_start(LaunchOptions::new()).await.unwrap();
        match sup.stop().await {
            StopReport::Stopped { recovery, .. } => {
                assert_eq!(recovery, Recovery::AlreadyGone { pid: 999_999 });
            }
            StopReport::NotRunning => panic!("replayer should have been running"),
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn replayer_that_exited_on_its_own_is_idle() {
        let sup = supervisor(settings("exit 0"), MockProbe::new(&[]));
        sup.fast_start(LaunchOptions::new()).await.unwrap();

        let mut state = SupervisorState::Running;
        for _ in 0..50 {
            state = sup.state().await;
            if state == SupervisorState::Idle {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(state, SupervisorState::Idle);
        // The handle is kept so stop still reaps it.
        assert!(sup.stop().await.was_running());
        assert_eq!(sup.state().await, SupervisorState::Idle);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn trace_log_directory_exists_before_spawn() {
        let temp = tempfile::tempdir().unwrap();
        let log_file = temp.path().join("data").join("logs").join("replayer.log");
        let sup = supervisor(settings("sleep 30"), MockProbe::new(&[]));

        let options = LaunchOptions::new().with(
            replayctl_core::domain::ENV_LOG_FILE,
            log_file.display().to_string(),
        );
        sup.fast_start(options).await.unwrap();

        assert!(log_file.parent().unwrap().is_dir());
        sup.stop().await;
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn start_stages_the_log_directory() {
        let temp = tempfile::tempdir().unwrap();
        let paths = ResolvedPaths::from_roots(temp.path().join("data"), temp.path().join("res"));
        std::fs::create_dir_all(paths.template_static_dir()).unwrap();

        let sup = ReplayerSupervisor::builder(settings("sleep 30"), MockProbe::new(&[]))
            .with_capabilities(PlatformCapabilities::detect().with_port_based_recovery(false))
            .with_assets(paths.clone())
            .build();

        sup.start(LaunchOptions::new()).await.unwrap();
        assert!(paths.log_dir().is_dir());
        assert!(paths.report_static_dir().is_dir());
        sup.stop().await;
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn surviving_owner_is_killed_before_output_is_drained() {
        let temp = tempfile::tempdir().unwrap();
        let pid_file = temp.path().join("survivor.pid");
        // The background sleep keeps the output pipes open after sh exits.
        let command = format!("sleep 60 & echo $! > {}", pid_file.display());
        let sup = ReplayerSupervisor::builder(
            settings(&command),
            Arc::new(PidFileOwner {
                path: pid_file.clone(),
            }),
        )
        .with_capabilities(PlatformCapabilities::detect().with_port_based_recovery(true))
        .with_grace(Duration::from_secs(2))
        .build();

        let info = sup.fast_start(LaunchOptions::new()).await.unwrap();
        let survivor = wait_for_pid_file(&pid_file).await;
        assert_ne!(info.pid, Some(survivor));

        let started = std::time::Instant::now();
        let report = sup.stop().await;
        let elapsed = started.elapsed();

        assert_eq!(
            report,
            StopReport::Stopped {
                pid: info.pid,
                recovery: Recovery::Killed { pid: survivor }
            }
        );
        assert!(!is_process_alive(survivor));
        assert!(
            elapsed < READER_DRAIN_TIMEOUT * 2,
            "stop waited on readers for {elapsed:?}"
        );
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn late_output_does_not_leak_into_the_next_run() {
        let sup = supervisor(
            settings("(sleep 1; echo late-$REPLAYER_RUN) & echo early-$REPLAYER_RUN"),
            MockProbe::new(&[]),
        );

        sup.fast_start(LaunchOptions::new().with("REPLAYER_RUN", "1"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        sup.fast_start(LaunchOptions::new().with("REPLAYER_RUN", "2"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let lines: Vec<String> = {
            let core = sup.shared.core.lock().await;
            let running = core.running.as_ref().unwrap();
            running.output.drain().into_iter().map(|l| l.line).collect()
        };
        assert!(lines.iter().all(|l| l.ends_with("-2")), "{lines:?}");
        sup.stop().await;
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn dropping_the_last_handle_kills_the_replayer() {
        let sup = supervisor(settings("sleep 30"), MockProbe::new(&[]));
        let pid = sup.fast_start(LaunchOptions::new()).await.unwrap().pid.unwrap();
        drop(sup);

        let mut alive = true;
        for _ in 0..50 {
            alive = is_process_alive(pid);
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!alive);
    }
}
