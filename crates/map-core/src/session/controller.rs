//! Session controller
//!
//! Owns both button monitors, the sensor, the run log and the canvas, and
//! advances the session one [`tick`](SessionController::tick) at a time. All
//! work for a tick happens synchronously in this order:
//!
//! 1. read the clock once
//! 2. poll both buttons
//! 3. fault detection (sensor, then confirm, then cancel) outside error states,
//!    or reconnect detection inside them
//! 4. state dispatch
//! 5. sampling while a run is in progress
//! 6. render when something changed, every tick while running

use embedded_hal::delay::DelayNs;
use heapless::String;
use log::{error, info, warn};

use super::entry::{DurationBuffer, NameBuffer};
use super::{Peripheral, SessionError, SessionState};
use crate::config::DeviceConfig;
use crate::input::{ButtonMonitor, ButtonState, InputPeripheral, PressClassification};
use crate::sampling::{SampleBuffer, TrendGeometry};
use crate::sensors::LightSensor;
use crate::storage::{RunLog, RunName, RunSummary, SampleRecord};
use crate::time::Clock;
use crate::ui::Canvas;
use crate::ui::screens::{self, LiveView, TREND_AREA};

/// Pause on the "get ready" countdown frame
const COUNTDOWN_PROMPT_MS: u32 = 1500;
/// Pause per countdown dot
const COUNTDOWN_DOT_MS: u32 = 333;
/// Warm-up screen refresh period
const WARM_UP_REFRESH_MS: u64 = 1000;

/// Hardware the controller is built from
pub struct Devices<P, S, L, K, C, D> {
    /// Green button
    pub confirm: P,
    /// Red button
    pub cancel: P,
    pub sensor: S,
    pub log: L,
    pub canvas: K,
    pub clock: C,
    /// Blocking delay for the countdown and notices
    pub delay: D,
}

/// Finite state machine sequencing one instrument's runs
pub struct SessionController<P, S, L, K, C, D> {
    confirm: ButtonMonitor<P>,
    cancel: ButtonMonitor<P>,
    sensor: S,
    log: L,
    canvas: K,
    clock: C,
    delay: D,
    config: DeviceConfig,
    trend_geometry: TrendGeometry,

    state: SessionState,
    /// Clock reading when `state` was entered
    entered_ms: u64,
    name: NameBuffer,
    duration: DurationBuffer,
    /// Scroll steps of the confirm hold in progress
    scroll_steps: u32,
    /// Only present while a run is in progress
    samples: Option<SampleBuffer>,
    run_started_ms: u64,
    run_elapsed_ms: u64,
    /// Samples recorded by the last completed run
    recorded: usize,
    lux: f32,
    trend_slope: f32,
    last_error: Option<SessionError>,
    dirty: bool,
}

impl<P, S, L, K, C, D> SessionController<P, S, L, K, C, D>
where
    P: InputPeripheral,
    S: LightSensor,
    L: RunLog,
    K: Canvas,
    C: Clock,
    D: DelayNs,
{
    pub fn new(devices: Devices<P, S, L, K, C, D>, config: DeviceConfig) -> Self {
        let thresholds = config.thresholds;
        let entered_ms = devices.clock.now_ms();

        info!(
            "Session controller ready (confirm 0x{:02X}, cancel 0x{:02X})",
            devices.confirm.address(),
            devices.cancel.address()
        );

        Self {
            confirm: ButtonMonitor::new(devices.confirm, thresholds),
            cancel: ButtonMonitor::new(devices.cancel, thresholds),
            sensor: devices.sensor,
            log: devices.log,
            canvas: devices.canvas,
            clock: devices.clock,
            delay: devices.delay,
            config,
            trend_geometry: TrendGeometry::from_bounds(TREND_AREA),
            state: SessionState::EnterName,
            entered_ms,
            name: NameBuffer::new(),
            duration: DurationBuffer::new(),
            scroll_steps: 0,
            samples: None,
            run_started_ms: 0,
            run_elapsed_ms: 0,
            recorded: 0,
            lux: 0.0,
            trend_slope: 0.0,
            last_error: None,
            dirty: true,
        }
    }

    /// Advance the session by one polling tick.
    ///
    /// Only drawing can fail; state changes made before a failed draw stand
    /// and the screen is drawn again on the next tick.
    pub fn tick(&mut self) -> Result<SessionState, K::Error> {
        let now = self.clock.now_ms();
        let confirm = self.confirm.poll(now);
        let cancel = self.cancel.poll(now);

        if self.state.is_error() {
            self.try_recover()?;
        } else if let Some(which) = self.detect_fault(confirm, cancel) {
            self.fail(which, now);
        } else {
            self.dispatch(confirm, cancel, now)?;
            if self.state == SessionState::TestInProgress {
                self.advance_run(now);
            }
        }

        self.render()?;
        Ok(self.state)
    }

    /// Show the LED warm-up screen for the configured period.
    ///
    /// Blocks, refreshing once per second. Returns straight away when warm-up
    /// is disabled.
    pub fn warm_up(&mut self) -> Result<(), K::Error> {
        let total = self.config.warm_up_ms as u64;
        if total == 0 {
            return Ok(());
        }

        info!("LED warm-up for {} ms", total);
        let start = self.clock.now_ms();
        let mut full = true;
        loop {
            let elapsed = self.clock.now_ms().saturating_sub(start);
            let lux = self.sensor.read_lux().ok();
            screens::warm_up(&mut self.canvas, elapsed, lux, full)?;
            full = false;

            if elapsed >= total {
                break;
            }
            let pause = (total - elapsed).min(WARM_UP_REFRESH_MS);
            self.delay.delay_ms(pause as u32);
        }

        let now = self.clock.now_ms();
        self.enter(SessionState::EnterName, now);
        Ok(())
    }

    /// Latest trend estimate for the live indicator (positive = rising)
    pub fn set_trend_slope(&mut self, slope: f32) {
        self.trend_slope = slope;
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Finalized run name
    pub fn name(&self) -> RunName {
        self.name.name()
    }

    pub fn name_buffer(&self) -> &NameBuffer {
        &self.name
    }

    pub fn duration(&self) -> &DurationBuffer {
        &self.duration
    }

    /// Samples of the run in progress
    pub fn samples(&self) -> Option<&SampleBuffer> {
        self.samples.as_ref()
    }

    /// Samples recorded by the last completed run
    pub fn recorded_samples(&self) -> usize {
        self.recorded
    }

    pub fn run_elapsed_ms(&self) -> u64 {
        self.run_elapsed_ms
    }

    /// Whole minutes of the current or last run
    pub fn run_minutes(&self) -> u64 {
        self.run_elapsed_ms / 1000 / 60
    }

    /// Seconds past the whole minutes of the current or last run
    pub fn run_seconds(&self) -> u64 {
        (self.run_elapsed_ms / 1000) % 60
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.last_error
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn confirm_button(&self) -> &ButtonState {
        self.confirm.state()
    }

    pub fn cancel_button(&self) -> &ButtonState {
        self.cancel.state()
    }

    pub fn canvas(&self) -> &K {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut K {
        &mut self.canvas
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn enter(&mut self, next: SessionState, now: u64) {
        if next != self.state {
            info!("Session: {} -> {}", self.state, next);
        }
        if self.state == SessionState::TestInProgress && next != SessionState::TestInProgress {
            self.samples = None;
        }
        self.state = next;
        self.entered_ms = now;
        self.scroll_steps = 0;
        self.dirty = true;
    }

    /// Start over from an empty name entry
    fn reset(&mut self, now: u64) {
        self.name.clear();
        self.duration.clear();
        self.samples = None;
        self.run_elapsed_ms = 0;
        self.recorded = 0;
        self.trend_slope = 0.0;
        self.last_error = None;
        self.enter(SessionState::EnterName, now);
    }

    fn detect_fault(
        &mut self,
        confirm: PressClassification,
        cancel: PressClassification,
    ) -> Option<Peripheral> {
        if !self.sensor.is_connected() {
            Some(Peripheral::Sensor)
        } else if confirm == PressClassification::Disconnected {
            Some(Peripheral::ConfirmButton)
        } else if cancel == PressClassification::Disconnected {
            Some(Peripheral::CancelButton)
        } else {
            None
        }
    }

    fn fail(&mut self, which: Peripheral, now: u64) {
        error!("{} disconnected during {}", which, self.state);
        if self.state == SessionState::TestInProgress {
            warn!(
                "Run {} aborted after {} ms",
                self.name.name(),
                self.run_elapsed_ms
            );
        }
        self.last_error = Some(SessionError::PeripheralDisconnected { which });
        self.enter(which.error_state(), now);
    }

    fn log_failed<E: core::fmt::Debug>(&mut self, e: E, now: u64) {
        error!("Run log write failed: {:?}", e);
        self.last_error = Some(SessionError::LogWriteFailed);
        self.enter(SessionState::ErrorLogger, now);
    }

    fn try_recover(&mut self) -> Result<(), K::Error> {
        let state = self.state;
        let restored = match state {
            SessionState::ErrorSensor if self.sensor.is_connected() => Some("Light sensor"),
            SessionState::ErrorButton
                if self.confirm.state().connected && self.cancel.state().connected =>
            {
                Some("Button(s)")
            }
            SessionState::ErrorLogger if self.log.is_available() => Some("Run log"),
            _ => None,
        };
        let Some(what) = restored else {
            return Ok(());
        };

        info!("{} connection re-established, resetting", what);
        screens::reconnect_notice(&mut self.canvas, what)?;
        self.delay.delay_ms(self.config.notice_ms);

        let now = self.clock.now_ms();
        self.reset(now);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Input dispatch
    // ------------------------------------------------------------------------

    fn dispatch(
        &mut self,
        confirm: PressClassification,
        cancel: PressClassification,
        now: u64,
    ) -> Result<(), K::Error> {
        use PressClassification::{Released, StillHeld};

        let confirm = honoured(confirm, self.confirm.state(), self.entered_ms);
        let cancel = honoured(cancel, self.cancel.state(), self.entered_ms);

        match self.state {
            SessionState::EnterName => match (confirm, cancel) {
                (Released(held), _) => {
                    let steps = self.scroll_steps_for(held);
                    self.scroll_steps = 0;
                    if self.name.commit(steps) {
                        info!("Run name: {}", self.name.name());
                        self.enter(SessionState::EnterTime, now);
                    } else {
                        self.dirty = true;
                    }
                }
                (_, Released(_)) => {
                    self.name.retreat();
                    self.dirty = true;
                }
                (StillHeld(held), _) => self.track_scroll(held),
                _ => {}
            },

            SessionState::EnterTime => match (confirm, cancel) {
                (Released(held), _) => {
                    let steps = self.scroll_steps_for(held);
                    self.scroll_steps = 0;
                    if self.duration.commit(steps) {
                        self.finish_time_entry(now);
                    } else {
                        self.dirty = true;
                    }
                }
                (_, Released(_)) => {
                    self.duration.retreat();
                    self.dirty = true;
                }
                (StillHeld(held), _) => self.track_scroll(held),
                _ => {}
            },

            SessionState::TestReady => {
                if let StillHeld(held) = confirm
                    && held >= self.config.thresholds.long_hold_ms
                {
                    self.start_run()?;
                }
            }

            SessionState::TestEnded => {
                if let Released(_) = confirm {
                    self.reset(now);
                }
            }

            SessionState::NameOverwriteConfirm => match (confirm, cancel) {
                (Released(_), _) => {
                    info!("Overwriting run {}", self.name.name());
                    self.last_error = None;
                    self.enter(SessionState::TestReady, now);
                }
                (_, Released(_)) => {
                    self.name.clear();
                    self.duration.clear();
                    self.last_error = None;
                    self.enter(SessionState::EnterName, now);
                }
                _ => {}
            },

            SessionState::TestInProgress
            | SessionState::ErrorLogger
            | SessionState::ErrorSensor
            | SessionState::ErrorButton => {}
        }

        Ok(())
    }

    fn scroll_steps_for(&self, held_ms: u32) -> u32 {
        held_ms / self.config.scroll_step_ms.max(1)
    }

    fn track_scroll(&mut self, held_ms: u32) {
        let steps = self.scroll_steps_for(held_ms);
        if steps != self.scroll_steps {
            self.scroll_steps = steps;
            self.dirty = true;
        }
    }

    fn finish_time_entry(&mut self, now: u64) {
        let name = self.name.name();
        info!(
            "Run time: {}:{:02} ({} ms per sample)",
            self.duration.minutes(),
            self.duration.seconds(),
            self.duration.sample_interval_ms()
        );

        if self.log.contains(&name) {
            warn!("Run {} already logged", name);
            self.last_error = Some(SessionError::NameCollision);
            self.enter(SessionState::NameOverwriteConfirm, now);
        } else {
            self.enter(SessionState::TestReady, now);
        }
    }

    // ------------------------------------------------------------------------
    // Run
    // ------------------------------------------------------------------------

    fn start_run(&mut self) -> Result<(), K::Error> {
        if self.config.countdown {
            self.countdown()?;
        }

        let first = match self.sensor.read_lux() {
            Ok(lux) => lux,
            Err(e) => {
                error!("Light sensor read failed: {:?}", e);
                let now = self.clock.now_ms();
                self.fail(Peripheral::Sensor, now);
                return Ok(());
            }
        };

        let name = self.name.name();
        if let Err(e) = self.log.begin_run(&name) {
            let now = self.clock.now_ms();
            self.log_failed(e, now);
            return Ok(());
        }

        let now = self.clock.now_ms();
        let total_ms = self.duration.total_ms();
        let samples = SampleBuffer::for_run(total_ms, first, self.config.intensity_margin);
        info!(
            "Run {} started: {} ms, {} ms per sample, scale {}",
            name,
            total_ms,
            samples.interval_ms(),
            samples.scale()
        );

        self.samples = Some(samples);
        self.run_started_ms = now;
        self.run_elapsed_ms = 0;
        self.recorded = 0;
        self.lux = first;
        self.enter(SessionState::TestInProgress, now);
        Ok(())
    }

    /// Non-interruptible "3...2...1...GO!" sequence
    fn countdown(&mut self) -> Result<(), K::Error> {
        screens::countdown_prompt(&mut self.canvas)?;
        self.delay.delay_ms(COUNTDOWN_PROMPT_MS);

        let mut progress: String<16> = String::new();
        for digit in ['3', '2', '1'] {
            let _ = progress.push(digit);
            screens::countdown(&mut self.canvas, &progress)?;
            for _ in 0..3 {
                self.delay.delay_ms(COUNTDOWN_DOT_MS);
                let _ = progress.push('.');
                screens::countdown(&mut self.canvas, &progress)?;
            }
        }

        screens::countdown_go(&mut self.canvas)
    }

    fn advance_run(&mut self, now: u64) {
        let elapsed = now.saturating_sub(self.run_started_ms);
        self.run_elapsed_ms = elapsed;

        let lux = match self.sensor.read_lux() {
            Ok(lux) => lux,
            Err(e) => {
                error!("Light sensor read failed: {:?}", e);
                self.fail(Peripheral::Sensor, now);
                return;
            }
        };
        self.lux = lux;

        let Some(samples) = self.samples.as_mut() else {
            return;
        };
        for index in samples.observe(elapsed, lux) {
            let record = SampleRecord {
                index: index as u16,
                intensity: lux,
                timestamp_ms: elapsed,
            };
            if let Err(e) = self.log.record(record) {
                self.log_failed(e, now);
                return;
            }
        }

        if elapsed >= self.duration.total_ms() as u64 {
            self.finish_run(now);
        }
    }

    fn finish_run(&mut self, now: u64) {
        let recorded = self.samples.as_ref().map_or(0, |s| s.len());
        let summary = RunSummary {
            samples: recorded as u16,
            elapsed_ms: self.run_elapsed_ms,
        };
        if let Err(e) = self.log.end_run(summary) {
            self.log_failed(e, now);
            return;
        }

        self.recorded = recorded;
        info!(
            "Run {} ended after {}:{:02} with {} samples",
            self.name.name(),
            self.run_minutes(),
            self.run_seconds(),
            recorded
        );
        self.enter(SessionState::TestEnded, now);
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    fn render(&mut self) -> Result<(), K::Error> {
        let live = self.state == SessionState::TestInProgress;
        if !self.dirty && !live {
            return Ok(());
        }
        let full = self.dirty;

        match self.state {
            SessionState::EnterName => screens::enter_name(
                &mut self.canvas,
                self.name.slots(),
                self.name.cursor(),
                self.name.preview(self.scroll_steps),
            )?,
            SessionState::EnterTime => screens::enter_time(
                &mut self.canvas,
                self.duration.digits(),
                self.duration.cursor(),
                self.duration.preview(self.scroll_steps),
            )?,
            SessionState::TestReady => {
                screens::test_ready(&mut self.canvas, &self.name.name(), self.duration.total_ms())?
            }
            SessionState::TestInProgress => {
                if let Some(samples) = self.samples.as_ref() {
                    let name = self.name.name();
                    let view = LiveView {
                        name: &name,
                        duration_ms: self.duration.total_ms(),
                        elapsed_ms: self.run_elapsed_ms,
                        lux: self.lux,
                        samples,
                        trend: self.trend_geometry.endpoints(self.trend_slope),
                    };
                    screens::live(&mut self.canvas, &view, full)?;
                }
            }
            SessionState::TestEnded => screens::test_ended(
                &mut self.canvas,
                &self.name.name(),
                self.run_elapsed_ms,
                self.recorded,
            )?,
            SessionState::NameOverwriteConfirm => {
                screens::overwrite_confirm(&mut self.canvas, &self.name.name())?
            }
            SessionState::ErrorLogger | SessionState::ErrorSensor | SessionState::ErrorButton => {
                let which = match self.last_error {
                    Some(SessionError::PeripheralDisconnected { which }) => Some(which),
                    _ => None,
                };
                screens::error(&mut self.canvas, self.state, which)?
            }
        }

        self.dirty = false;
        Ok(())
    }
}

/// Drop press events whose press began before the current state was entered
fn honoured(event: PressClassification, button: &ButtonState, entered_ms: u64) -> PressClassification {
    match event {
        PressClassification::StillHeld(_) | PressClassification::Released(_)
            if button.press_started_ms < entered_ms =>
        {
            PressClassification::NoChange
        }
        other => other,
    }
}
