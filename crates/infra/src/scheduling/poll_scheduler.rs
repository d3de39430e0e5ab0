//! Polling scheduler
//!
//! Drives the bridge: connects the bus, runs the command listener, and
//! repeats polling cycles until cancelled.
//!
//! A cycle dispatches, in order, one task per parameter batch, a status task
//! and a system task, letting one dispatch through per pacing slot. It then
//! sleeps for whatever is left of the interval and, once a day, dispatches a
//! software task. Tasks run concurrently in a join set and may outlive the
//! cycle that spawned them; shutdown waits for all of them.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tokio_util::sync::CancellationToken;
//! use uplinkbridge_infra::config::ConfigHandle;
//! use uplinkbridge_infra::scheduling::PollScheduler;
//!
//! # async fn example(
//! #     config: Arc<ConfigHandle>,
//! #     api: Arc<dyn uplinkbridge_core::UplinkApi>,
//! #     bus: Arc<dyn uplinkbridge_core::MessageBus>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = PollScheduler::new(config, api, bus)?;
//! let cancel = CancellationToken::new();
//! scheduler.run(cancel.clone()).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uplinkbridge_common::resilience::Pacer;
use uplinkbridge_common::time::{Clock, SystemClock};
use uplinkbridge_core::codec::split_into_batches;
use uplinkbridge_core::{CommandRouter, MessageBus, ScaleTable, Topics, UplinkApi};
use uplinkbridge_domain::constants::{MAX_BATCH_SIZE, PUBLISH_SPACING, RECONNECT_INITIAL_DELAY};
use uplinkbridge_domain::{BridgeConfig, BusError, MqttSettings};

use super::error::{SchedulerError, SchedulerResult};
use super::state::SchedulerState;
use super::tasks::{poll_parameters, poll_software, poll_status, poll_system, CyclePlan, PollContext};
use crate::config::ConfigHandle;

/// Polling scheduler and owner of the listener task
pub struct PollScheduler {
    config: Arc<ConfigHandle>,
    api: Arc<dyn UplinkApi>,
    bus: Arc<dyn MessageBus>,
    router: Arc<CommandRouter>,
    clock: Arc<dyn Clock>,
    spacing: Duration,
    plan: parking_lot::RwLock<Arc<CyclePlan>>,
    mqtt: parking_lot::Mutex<MqttSettings>,
    state: watch::Sender<SchedulerState>,
    running: AtomicBool,
}

impl PollScheduler {
    /// Create a scheduler for the current configuration snapshot
    ///
    /// # Errors
    /// Returns `SchedulerError::Config` if the scaling table is invalid.
    pub fn new(
        config: Arc<ConfigHandle>,
        api: Arc<dyn UplinkApi>,
        bus: Arc<dyn MessageBus>,
    ) -> SchedulerResult<Self> {
        let snapshot = config.snapshot();
        let plan = build_plan(&snapshot)?;
        let (state, _) = watch::channel(SchedulerState::Idle);

        Ok(Self {
            router: Arc::new(CommandRouter::new(Arc::clone(&api))),
            config,
            api,
            bus,
            clock: Arc::new(SystemClock),
            spacing: PUBLISH_SPACING,
            plan: parking_lot::RwLock::new(Arc::new(plan)),
            mqtt: parking_lot::Mutex::new(snapshot.mqtt_settings()),
            state,
            running: AtomicBool::new(false),
        })
    }

    /// Use `clock` for the daily software check
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition
    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Parameter batches of the current plan
    pub fn batches(&self) -> Vec<uplinkbridge_domain::ParameterBatch> {
        self.plan.read().batches.clone()
    }

    /// Run until `cancel` fires
    ///
    /// Returns after the bus is disconnected and the state is `Stopped`.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::AlreadyRunning` if another `run` is active
    /// - `SchedulerError::Bus` if the bus closes while connecting
    #[instrument(skip_all)]
    pub async fn run(&self, cancel: CancellationToken) -> SchedulerResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }
        let result = self.run_inner(&cancel).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_inner(&self, cancel: &CancellationToken) -> SchedulerResult<()> {
        self.transition(SchedulerState::Connecting);
        let connected = tokio::select! {
            () = cancel.cancelled() => None,
            result = self.bus.connect() => Some(result),
        };
        match connected {
            None => {
                self.transition(SchedulerState::Stopped);
                return Ok(());
            }
            Some(Err(err)) => {
                self.transition(SchedulerState::Stopped);
                return Err(err.into());
            }
            Some(Ok(())) => {}
        }

        let pattern = self.plan.read().topics.command_pattern();
        if let Err(err) = self.bus.subscribe(&pattern).await {
            warn!(pattern = %pattern, error = %err, "Command subscription failed");
        }

        let listener_cancel = cancel.child_token();
        let listener = self.spawn_listener(listener_cancel.clone());

        self.transition(SchedulerState::Running);
        let mut tasks = JoinSet::new();
        while !cancel.is_cancelled() {
            self.run_cycle(&mut tasks, cancel).await;
        }

        self.shutdown(tasks, listener, &listener_cancel).await;
        Ok(())
    }

    /// One polling cycle
    #[instrument(skip_all)]
    async fn run_cycle(&self, tasks: &mut JoinSet<()>, cancel: &CancellationToken) {
        let started = Instant::now();
        let started_local = self.clock.now().with_timezone(&Local);
        reap_finished(tasks);

        self.reload_if_changed(cancel).await;

        let interval = self.config.snapshot().interval_duration();
        let ctx = PollContext {
            api: Arc::clone(&self.api),
            bus: Arc::clone(&self.bus),
            plan: Arc::clone(&self.plan.read()),
        };
        let mut pacer = Pacer::new(self.spacing);

        debug!(batches = ctx.plan.batches.len(), "Starting poll cycle");
        for batch in ctx.plan.batches.clone() {
            if !paced(&mut pacer, cancel).await {
                return;
            }
            tasks.spawn(poll_parameters(ctx.clone(), batch));
        }
        if !paced(&mut pacer, cancel).await {
            return;
        }
        tasks.spawn(poll_status(ctx.clone()));
        if !paced(&mut pacer, cancel).await {
            return;
        }
        tasks.spawn(poll_system(ctx.clone()));

        let remainder = interval.saturating_sub(started.elapsed());
        if remainder.is_zero() {
            debug!("Cycle overran its interval");
        }
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(remainder) => {}
        }

        if daily_check_due(started_local, interval) {
            tasks.spawn(poll_software(ctx));
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(self.spacing) => {}
            }
        }
    }

    /// Swap in a changed configuration; reconnect if the broker changed
    async fn reload_if_changed(&self, cancel: &CancellationToken) {
        let snapshot = match self.config.reload_if_changed() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "Configuration reload failed, keeping previous configuration");
                return;
            }
        };

        self.transition(SchedulerState::Reloading);
        match build_plan(&snapshot) {
            Ok(plan) => {
                let previous_pattern = self.plan.read().topics.command_pattern();
                let pattern = plan.topics.command_pattern();
                *self.plan.write() = Arc::new(plan);

                let settings = snapshot.mqtt_settings();
                let changed = {
                    let mut current = self.mqtt.lock();
                    let changed = *current != settings;
                    *current = settings.clone();
                    changed
                };
                if changed {
                    tokio::select! {
                        () = cancel.cancelled() => {}
                        result = self.bus.reconfigure(settings) => {
                            if let Err(err) = result {
                                error!(error = %err, "Broker reconfiguration failed");
                            }
                        }
                    }
                }
                if pattern != previous_pattern {
                    if let Err(err) = self.bus.subscribe(&pattern).await {
                        warn!(pattern = %pattern, error = %err, "Command subscription failed");
                    }
                }
                info!(batches = self.plan.read().batches.len(), "Configuration applied");
            }
            Err(err) => warn!(error = %err, "Reloaded configuration rejected"),
        }
        self.transition(SchedulerState::Running);
    }

    fn spawn_listener(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let bus = Arc::clone(&self.bus);
        let router = Arc::clone(&self.router);

        tokio::spawn(async move {
            debug!("Command listener started");
            loop {
                let received = tokio::select! {
                    () = cancel.cancelled() => break,
                    received = bus.receive() => received,
                };
                match received {
                    Ok(message) => {
                        router.handle(&message.topic, &message.payload).await;
                    }
                    Err(BusError::Closed) => break,
                    Err(err) => {
                        warn!(error = %err, "Receive failed");
                        tokio::time::sleep(RECONNECT_INITIAL_DELAY).await;
                    }
                }
            }
            debug!("Command listener stopped");
        })
    }

    async fn shutdown(
        &self,
        mut tasks: JoinSet<()>,
        listener: JoinHandle<()>,
        listener_cancel: &CancellationToken,
    ) {
        self.transition(SchedulerState::ShuttingDown);
        info!(in_flight = tasks.len(), "Shutting down, waiting for poll tasks");

        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                error!(error = %SchedulerError::from(err), "Poll task failed");
            }
        }

        listener_cancel.cancel();
        if let Err(err) = listener.await {
            error!(error = %SchedulerError::from(err), "Command listener failed");
        }

        if let Err(err) = self.bus.disconnect().await {
            warn!(error = %err, "Disconnect failed");
        }
        self.transition(SchedulerState::Stopped);
    }

    fn transition(&self, next: SchedulerState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "Scheduler state changed");
        }
    }
}

fn build_plan(config: &BridgeConfig) -> SchedulerResult<CyclePlan> {
    Ok(CyclePlan {
        topics: Topics::new(config.topic_prefix.clone()),
        batches: split_into_batches(&config.parameters, MAX_BATCH_SIZE),
        scale: ScaleTable::with_overrides(&config.scale_overrides()?),
    })
}

/// Wait for the next pacing slot; `false` if cancelled first
async fn paced(pacer: &mut Pacer, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = pacer.ready() => true,
    }
}

fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        if let Err(err) = result {
            error!(error = %SchedulerError::from(err), "Poll task failed");
        }
    }
}

/// True during the first two intervals after local midnight
///
/// Cycles repeat every `interval`, so exactly one cycle per day starts inside
/// that window unless cycles overrun.
pub fn daily_check_due(at: DateTime<Local>, interval: Duration) -> bool {
    let since_midnight = Duration::from_secs(u64::from(at.num_seconds_from_midnight()));
    since_midnight < interval.saturating_mul(2)
}
