//! Regulation service: the polling loop that drives the actuator.
//!
//! Each cycle re-reads settings, samples the local sensor, looks up the
//! reference station, evaluates the [`Regulator`] when the actuator is in
//! `Auto`, and publishes a fresh [`StatusSnapshot`]. No per-cycle failure
//! stops the loop; only the stop flag does, checked once per iteration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use humivent_domain::error::SensorError;
use humivent_domain::event::{Event, EventKind};
use humivent_domain::mode::RelayMode;
use humivent_domain::reading::Station;
use humivent_domain::regulation::{RegulationParams, Regulator, RelayCommand, Transition};
use humivent_domain::settings::Settings;
use humivent_domain::status::{Measurements, RegulationStatus, StatusSnapshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use crate::actuator::Actuator;
use crate::ports::{ConfigProvider, SensorReader, StationReader, StatusSink};
use crate::status_board::StatusBoard;

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The local sensor failed; nothing was evaluated or published.
    SensorFailed,
    /// The actuator is not in `Auto`; status published, FSM untouched.
    Overridden(RelayMode),
    /// The FSM was evaluated.
    Evaluated(Vec<Transition>),
}

/// Result of [`RegulationService::run_cycle`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    /// Sleep before the next cycle, from the settings read this cycle.
    pub poll_interval: Duration,
    pub outcome: CycleOutcome,
}

/// Regulation loop over its ports.
pub struct RegulationService<C, S, T, K, A> {
    config: C,
    sensor: S,
    stations: T,
    sink: K,
    actuator: A,
    board: Arc<StatusBoard>,
    regulator: Regulator,
    seen_epoch: Option<u64>,
}

impl<C, S, T, K, A> RegulationService<C, S, T, K, A>
where
    C: ConfigProvider + Send + Sync,
    S: SensorReader + Send + Sync,
    T: StationReader + Send + Sync,
    K: StatusSink,
    A: Actuator,
{
    pub fn new(
        config: C,
        sensor: S,
        stations: T,
        sink: K,
        actuator: A,
        board: Arc<StatusBoard>,
    ) -> Self {
        Self {
            config,
            sensor,
            stations,
            sink,
            actuator,
            board,
            regulator: Regulator::new(),
            seen_epoch: None,
        }
    }

    /// Read-only access to the state machine.
    pub fn regulator(&self) -> &Regulator {
        &self.regulator
    }

    /// Run one regulation cycle.
    pub async fn run_cycle(&mut self) -> Cycle {
        let settings = self.config.get_config().await;
        let outcome = self.evaluate(&settings).await;
        Cycle {
            poll_interval: settings.poll_interval(),
            outcome,
        }
    }

    async fn evaluate(&mut self, settings: &Settings) -> CycleOutcome {
        let reading = match self.sensor.read_sensor().await {
            Ok(reading) => reading,
            Err(err) => {
                self.report_sensor_error(&err);
                return CycleOutcome::SensorFailed;
            }
        };
        let station = self.lookup_station(&settings.api_station_id).await;
        let measurements = match Measurements::new(reading, station) {
            Ok(measurements) => measurements,
            Err(err) => {
                self.report_sensor_error(&SensorError::Unusable(err));
                return CycleOutcome::SensorFailed;
            }
        };

        let epoch = self.actuator.auto_epoch();
        let mode = self.actuator.mode();
        self.track_auto_epoch(epoch);

        let outcome = if mode == RelayMode::Auto {
            let params = settings.regulation_params();
            let now = Instant::now().into_std();
            let transitions = self.regulator.step(now, measurements.diff(), &params);
            for transition in &transitions {
                self.apply(transition, &params);
            }
            CycleOutcome::Evaluated(transitions)
        } else {
            CycleOutcome::Overridden(mode)
        };

        let snapshot = StatusSnapshot::new(
            &measurements,
            RegulationStatus::new(mode, self.regulator.state()),
            self.actuator.is_relay_on(),
        );
        tracing::debug!(
            diff = ?snapshot.difference,
            state = %snapshot.regulation_state,
            relay_on = snapshot.relay_on,
            "status updated"
        );
        let payload = serde_json::to_value(&snapshot).unwrap_or_default();
        self.sink.log(Event::new(EventKind::StatusUpdate, payload));
        self.board.publish(snapshot);
        outcome
    }

    /// Reset the FSM when the actuator re-entered `Auto` since the last
    /// completed read, even if the mode left and came back between polls.
    fn track_auto_epoch(&mut self, epoch: u64) {
        let previous = self.seen_epoch.replace(epoch);
        if previous.is_some_and(|seen| seen != epoch) {
            self.regulator.reset();
            tracing::info!("auto mode re-entered, regulation reset");
            self.sink.log(Event::message(
                EventKind::RegulationReset,
                "Auto mode re-entered, regulation reset to idle.",
            ));
        }
    }

    async fn lookup_station(&self, station_id: &str) -> Option<Station> {
        match self.stations.fetch_stations().await {
            Ok(stations) => {
                let found = stations.into_iter().find(|s| s.station_id == station_id);
                if found.is_none() {
                    tracing::debug!(station = station_id, "reference station not reported");
                }
                found
            }
            Err(err) => {
                tracing::warn!(error = %err, "station data unavailable");
                self.sink
                    .log(Event::message(EventKind::StationUnavailable, err.to_string()));
                None
            }
        }
    }

    fn apply(&self, transition: &Transition, params: &RegulationParams) {
        let kind = transition.event_kind();
        let message = transition.message(params);
        tracing::info!(event = %kind, "{message}");
        self.sink.log(Event::message(kind, message));

        let Some(command) = transition.command() else {
            return;
        };
        let response = match command {
            RelayCommand::TurnOn => self.actuator.turn_on(Duration::ZERO, true),
            RelayCommand::TurnOff => self.actuator.turn_off(Duration::ZERO, true),
        };
        if let Some(refusal) = response.refusal() {
            tracing::warn!(?command, reason = %refusal, "actuator refused regulation command");
            self.sink.log(Event::new(
                EventKind::ActuatorRefused,
                serde_json::json!({
                    "command": format!("{command:?}"),
                    "message": refusal.to_string(),
                }),
            ));
        }
    }

    fn report_sensor_error(&self, err: &SensorError) {
        tracing::warn!(error = %err, "local sensor read failed, skipping cycle");
        self.sink
            .log(Event::message(EventKind::LocalSensorError, err.to_string()));
    }
}

impl<C, S, T, K, A> RegulationService<C, S, T, K, A>
where
    C: ConfigProvider + Send + Sync + 'static,
    S: SensorReader + Send + Sync + 'static,
    T: StationReader + Send + Sync + 'static,
    K: StatusSink + 'static,
    A: Actuator + 'static,
{
    /// Run cycles until `stop` is observed.
    pub async fn run(mut self, stop: Arc<AtomicBool>) {
        tracing::info!("regulation loop started");
        while !stop.load(Ordering::Acquire) {
            let cycle = self.run_cycle().await;
            tokio::time::sleep(cycle.poll_interval).await;
        }
        tracing::info!("regulation loop stopped");
    }

    /// Spawn the loop on the current runtime.
    pub fn spawn(self) -> RegulationHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(self.run(Arc::clone(&stop)));
        RegulationHandle { stop, task }
    }
}

/// Handle to a spawned regulation loop.
///
/// Stopping the loop leaves actuator timers untouched.
pub struct RegulationHandle {
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl RegulationHandle {
    /// Request the loop to exit; it does so before its next cycle.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the loop task panicked.
    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }

    /// [`stop`](Self::stop) then [`join`](Self::join).
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the loop task panicked.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        self.stop();
        self.join().await
    }
}
