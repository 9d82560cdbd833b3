//! The status monitor engine.
//!
//! One engine thread owns every piece of mutable monitor state and drains a
//! message channel. Timers, the path probe, worker completions, and the
//! public control operations all post messages; nothing mutates state from
//! outside the engine thread. External-process invocations and the public-IP
//! lookup run on worker threads and report back over the same channel.
//!
//! Guards are first-class state: at most one status check, one enforcer
//! probe, and one public-IP fetch are in flight at any time. Overlapping
//! triggers are dropped, not queued, so rapid network flapping cannot fan
//! out external processes.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::parser::parse_status;
use crate::core::public_ip;
use crate::core::scheduler::{self, TaskToken};
use crate::state::{MonitorStatus, StatusSnapshot, VpnState};
use crate::vpn::StatusSource;
use crate::{constants, log_debug, log_info, platform};

/// Why a status check was requested. Carried through to debug logs so
/// dropped and applied checks can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Immediate check at engine start.
    Startup,
    /// The interface-table signature changed.
    PathChange,
    /// Fallback poll timer.
    Poll,
    /// Post-control settle delay elapsed.
    Settle,
    /// The monitored service identity changed.
    ServiceChange,
}

/// Engine timing and behavior knobs, normally derived from `AppConfig`.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Fallback status poll period.
    pub poll_interval: Duration,
    /// Interface-table probe period feeding path-change detection.
    pub path_probe_interval: Duration,
    /// Wait between issuing a control command and re-observing state.
    pub settle_delay: Duration,
    /// Disconnect-enforcer tick period.
    pub guard_tick: Duration,
    /// Minimum interval between public-IP lookups.
    pub public_ip_ttl: Duration,
    /// IP echo endpoints, tried in order. Empty disables the lookup.
    pub public_ip_apis: Vec<String>,
    /// Timeout for each IP echo call, in seconds.
    pub api_timeout_secs: u64,
    /// Whether `disconnect()` arms the enforcer.
    pub enforce_disconnect: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(constants::DEFAULT_STATUS_POLL_SECS),
            path_probe_interval: Duration::from_millis(constants::DEFAULT_PATH_PROBE_MS),
            settle_delay: Duration::from_millis(constants::DEFAULT_SETTLE_DELAY_MS),
            guard_tick: Duration::from_millis(constants::DEFAULT_GUARD_TICK_MS),
            public_ip_ttl: Duration::from_secs(constants::DEFAULT_PUBLIC_IP_TTL_SECS),
            public_ip_apis: constants::DEFAULT_IP_ECHO_APIS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            api_timeout_secs: constants::DEFAULT_API_TIMEOUT_SECS,
            enforce_disconnect: true,
        }
    }
}

#[derive(Debug, Clone)]
enum Msg {
    Check(Trigger),
    CheckDone {
        generation: u64,
        snapshot: StatusSnapshot,
    },
    PathProbe,
    GuardTick,
    GuardDone {
        generation: u64,
        stopped: bool,
    },
    PublicIpDone(Option<String>),
    Connect,
    Disconnect,
    SetService(String),
    Shutdown,
}

/// Handle to a running monitor engine.
///
/// Cheap to share by reference; the engine itself lives on its own thread
/// until [`Monitor::stop`] (or drop) cancels the timers, drains the channel,
/// and joins it. After `stop` returns no further state mutation occurs --
/// results from checks still in flight land on a closed channel.
pub struct Monitor {
    tx: Sender<Msg>,
    tasks: Vec<TaskToken>,
    engine: Option<JoinHandle<()>>,
    shared: Arc<Mutex<MonitorStatus>>,
}

impl Monitor {
    /// Start monitoring `service`, issuing an immediate first check and
    /// arming the fallback poll and path-probe timers.
    #[must_use]
    pub fn start(source: Arc<dyn StatusSource>, service: String, config: MonitorConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Mutex::new(MonitorStatus {
            service: service.clone(),
            ..MonitorStatus::default()
        }));

        let engine = Engine {
            source,
            tx: tx.clone(),
            shared: Arc::clone(&shared),
            service,
            wants_connected: false,
            generation: 0,
            check_in_flight: false,
            guard_in_flight: false,
            public_ip_in_flight: false,
            last_public_fetch: None,
            last_signature: None,
            guard_task: None,
            config: config.clone(),
        };
        let handle = thread::spawn(move || engine.run(&rx));

        let _ = tx.send(Msg::Check(Trigger::Startup));
        let tasks = vec![
            scheduler::spawn_task(
                tx.clone(),
                Msg::Check(Trigger::Poll),
                config.poll_interval,
                true,
            ),
            scheduler::spawn_task(tx.clone(), Msg::PathProbe, config.path_probe_interval, true),
        ];

        Self {
            tx,
            tasks,
            engine: Some(handle),
            shared,
        }
    }

    /// Snapshot of the published state surface.
    #[must_use]
    pub fn status(&self) -> MonitorStatus {
        match self.shared.lock() {
            Ok(status) => status.clone(),
            Err(_) => MonitorStatus::default(),
        }
    }

    /// Start the service and record the user's intent to be connected.
    /// Disarms the disconnect enforcer and schedules a settle re-check.
    pub fn connect(&self) {
        let _ = self.tx.send(Msg::Connect);
    }

    /// Stop the service, record the intent to stay disconnected, and arm
    /// the enforcer against on-demand auto-reconnects.
    pub fn disconnect(&self) {
        let _ = self.tx.send(Msg::Disconnect);
    }

    /// Swap the monitored service identity and re-check immediately.
    /// Results and enforcement probes still in flight for the old identity
    /// are discarded.
    pub fn set_service(&self, name: impl Into<String>) {
        let _ = self.tx.send(Msg::SetService(name.into()));
    }

    /// Stop monitoring: cancel all timers, shut the engine down, join it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        for task in &self.tasks {
            task.cancel();
        }
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(handle) = self.engine.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// All mutable monitor state. Lives on the engine thread; only `shared` is
/// visible outside, and only through cloning reads.
#[allow(clippy::struct_excessive_bools)]
struct Engine {
    source: Arc<dyn StatusSource>,
    config: MonitorConfig,
    tx: Sender<Msg>,
    shared: Arc<Mutex<MonitorStatus>>,
    service: String,
    wants_connected: bool,
    /// Bumped on every identity change; stamped into worker results so
    /// stale completions can be recognized and dropped.
    generation: u64,
    check_in_flight: bool,
    guard_in_flight: bool,
    public_ip_in_flight: bool,
    last_public_fetch: Option<Instant>,
    last_signature: Option<u64>,
    guard_task: Option<TaskToken>,
}

impl Engine {
    fn run(mut self, rx: &Receiver<Msg>) {
        while let Ok(msg) = rx.recv() {
            match msg {
                Msg::Check(trigger) => self.handle_check(trigger),
                Msg::CheckDone {
                    generation,
                    snapshot,
                } => self.handle_check_done(generation, snapshot),
                Msg::PathProbe => self.handle_path_probe(),
                Msg::GuardTick => self.handle_guard_tick(),
                Msg::GuardDone {
                    generation,
                    stopped,
                } => self.handle_guard_done(generation, stopped),
                Msg::PublicIpDone(result) => self.handle_public_ip_done(result),
                Msg::Connect => self.handle_connect(),
                Msg::Disconnect => self.handle_disconnect(),
                Msg::SetService(name) => self.handle_set_service(name),
                Msg::Shutdown => break,
            }
        }
        if let Some(task) = self.guard_task.take() {
            task.cancel();
        }
    }

    // ── Status checks ──────────────────────────────────────────────────

    fn handle_check(&mut self, trigger: Trigger) {
        self.refresh_local_ip();
        self.maybe_fetch_public_ip();

        if self.check_in_flight {
            log_debug!("MONITOR", "check already in flight; dropping {trigger:?}");
            return;
        }
        self.check_in_flight = true;

        let source = Arc::clone(&self.source);
        let service = self.service.clone();
        let generation = self.generation;
        let tx = self.tx.clone();
        thread::spawn(move || {
            let snapshot = parse_status(&source.status_text(&service));
            let _ = tx.send(Msg::CheckDone {
                generation,
                snapshot,
            });
        });
    }

    fn handle_check_done(&mut self, generation: u64, snapshot: StatusSnapshot) {
        if generation != self.generation {
            log_debug!("MONITOR", "discarding status result for a prior service");
            return;
        }
        self.check_in_flight = false;
        self.apply_snapshot(&snapshot);
    }

    /// Publish a parsed snapshot wholesale.
    ///
    /// The tunnel address is published only while `Connected`; whatever the
    /// raw text carried during transitions stays parser-internal.
    fn apply_snapshot(&self, snapshot: &StatusSnapshot) {
        let Ok(mut status) = self.shared.lock() else {
            return;
        };
        let previous = status.state;
        status.state = snapshot.state;
        status.tunnel_ip = if snapshot.state == VpnState::Connected {
            snapshot.tunnel_ip.clone()
        } else {
            None
        };
        status.interface = snapshot.interface.clone();
        status.since = snapshot.since;
        drop(status);

        if previous != snapshot.state {
            log_info!(
                "MONITOR",
                "{}: {previous} -> {}",
                self.service,
                snapshot.state
            );
        }
    }

    // ── Host addresses ─────────────────────────────────────────────────

    fn refresh_local_ip(&self) {
        let resolved = platform::local_ipv4();
        if let Ok(mut status) = self.shared.lock() {
            if status.host.local_ip != resolved {
                log_info!(
                    "NETINFO",
                    "local address is now {}",
                    resolved.as_deref().unwrap_or("absent")
                );
            }
            status.host.local_ip = resolved;
        }
    }

    fn maybe_fetch_public_ip(&mut self) {
        if self.config.public_ip_apis.is_empty() {
            return;
        }
        if !public_ip::should_fetch(
            Instant::now(),
            self.last_public_fetch,
            self.config.public_ip_ttl,
            self.public_ip_in_flight,
        ) {
            return;
        }
        self.public_ip_in_flight = true;

        let apis = self.config.public_ip_apis.clone();
        let timeout = self.config.api_timeout_secs;
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = public_ip::fetch_public_ip(&apis, timeout);
            let _ = tx.send(Msg::PublicIpDone(result));
        });
    }

    fn handle_public_ip_done(&mut self, result: Option<String>) {
        self.public_ip_in_flight = false;
        // Failures change nothing; the cached value stays published.
        if let Some(ip) = result {
            self.last_public_fetch = Some(Instant::now());
            if let Ok(mut status) = self.shared.lock() {
                if status.host.public_ip.as_deref() != Some(ip.as_str()) {
                    log_info!("NETINFO", "public address is now {ip}");
                }
                status.host.public_ip = Some(ip);
            }
        }
    }

    // ── Path-change detection ──────────────────────────────────────────

    fn handle_path_probe(&mut self) {
        let signature = platform::interface_signature();
        let changed = self
            .last_signature
            .is_some_and(|previous| previous != signature);
        self.last_signature = Some(signature);
        if changed {
            log_debug!("MONITOR", "network path changed");
            self.handle_check(Trigger::PathChange);
        }
    }

    // ── Disconnect enforcement ─────────────────────────────────────────

    fn handle_guard_tick(&mut self) {
        if self.wants_connected || self.guard_in_flight {
            return;
        }
        self.guard_in_flight = true;

        let source = Arc::clone(&self.source);
        let service = self.service.clone();
        let generation = self.generation;
        let tx = self.tx.clone();
        thread::spawn(move || {
            // Query directly so the re-stop lands before the next normal
            // parse, not after it.
            let state = parse_status(&source.status_text(&service)).state;
            let stopped = state.is_up_or_coming_up();
            if stopped {
                source.stop(&service);
            }
            let _ = tx.send(Msg::GuardDone {
                generation,
                stopped,
            });
        });
    }

    fn handle_guard_done(&mut self, generation: u64, stopped: bool) {
        if generation != self.generation {
            return;
        }
        self.guard_in_flight = false;
        if stopped {
            log_info!("GUARD", "{}: auto-reconnect re-stopped", self.service);
        }
    }

    fn arm_guard(&mut self) {
        if self.guard_task.is_some() {
            return;
        }
        self.guard_task = Some(scheduler::spawn_task(
            self.tx.clone(),
            Msg::GuardTick,
            self.config.guard_tick,
            true,
        ));
        log_info!("GUARD", "disconnect enforcer armed");
    }

    fn disarm_guard(&mut self) {
        if let Some(task) = self.guard_task.take() {
            task.cancel();
            log_info!("GUARD", "disconnect enforcer disarmed");
        }
    }

    // ── Control operations ─────────────────────────────────────────────

    fn handle_connect(&mut self) {
        self.wants_connected = true;
        if let Ok(mut status) = self.shared.lock() {
            status.wants_connected = true;
        }
        self.disarm_guard();
        log_info!("MONITOR", "connect requested for {}", self.service);

        let source = Arc::clone(&self.source);
        let service = self.service.clone();
        thread::spawn(move || source.start(&service));

        self.schedule_settle_check();
    }

    fn handle_disconnect(&mut self) {
        self.wants_connected = false;
        if let Ok(mut status) = self.shared.lock() {
            status.wants_connected = false;
        }
        log_info!("MONITOR", "disconnect requested for {}", self.service);

        let source = Arc::clone(&self.source);
        let service = self.service.clone();
        thread::spawn(move || source.stop(&service));

        if self.config.enforce_disconnect {
            self.arm_guard();
        }
        self.schedule_settle_check();
    }

    fn handle_set_service(&mut self, name: String) {
        if name != self.service {
            log_info!("MONITOR", "now monitoring {name}");
        }
        self.service.clone_from(&name);
        self.generation += 1;
        // Anything in flight belongs to the old identity now.
        self.check_in_flight = false;
        self.guard_in_flight = false;
        if let Ok(mut status) = self.shared.lock() {
            status.service = name;
        }
        self.handle_check(Trigger::ServiceChange);
    }

    fn schedule_settle_check(&self) {
        // One-shot; no token kept. If the engine is gone by fire time the
        // send lands on a closed channel.
        let _ = scheduler::spawn_task(
            self.tx.clone(),
            Msg::Check(Trigger::Settle),
            self.config.settle_delay,
            false,
        );
    }
}
