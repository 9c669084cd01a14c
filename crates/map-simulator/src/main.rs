//! Desktop simulator for the magnetophotometer (MAP) session UI.
//!
//! Runs the real map-core session controller against an SDL2 window via
//! `embedded-graphics-simulator`. The buttons are keyboard keys and the light
//! sensor follows a synthetic magnetization curve, so a whole run can be
//! exercised without hardware.
//!
//! # Key bindings
//!
//! | Key             | Action                                 |
//! |-----------------|----------------------------------------|
//! | Space / Enter   | Green (confirm) button, hold to scroll |
//! | Backspace       | Red (cancel) button                    |
//! | S               | Unplug / replug the light sensor       |
//! | G               | Unplug / replug the green button       |
//! | R               | Unplug / replug the red button         |
//! | D               | Stall / resume the storage consumer    |
//! | Q / Esc         | Quit                                   |
//!
//! An optional first argument names a postcard-encoded [`DeviceConfig`].
//! The window is not refreshed while the controller blocks (countdown,
//! reconnect notice, warm-up).

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::{Duration, Instant};

use embassy_sync::channel::Channel;
use embassy_time::Delay;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{debug, info, warn};

use map_core::input::InputPeripheral;
use map_core::sensors::LightSensor;
use map_core::storage::{ChannelRunLog, LogChannel, LogEvent};
use map_core::time::{Clock, EmbassyClock};
use map_core::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, DisplayCanvas, FrameBuffer};
use map_core::{DeviceConfig, Devices, SessionController};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 3;

/// Controller tick period (~30 Hz).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Run log events between the controller and the "storage task".
static LOG_CHANNEL: LogChannel = Channel::new();

// ---------------------------------------------------------------------------
// Simulated peripherals
// ---------------------------------------------------------------------------

/// Keyboard-driven button, shared between the event loop and the controller.
#[derive(Clone)]
struct SimButton {
    address: u8,
    label: &'static str,
    pressed: Rc<Cell<bool>>,
    connected: Rc<Cell<bool>>,
    led: Rc<Cell<u8>>,
}

impl SimButton {
    fn new(address: u8, label: &'static str) -> Self {
        Self {
            address,
            label,
            pressed: Rc::new(Cell::new(false)),
            connected: Rc::new(Cell::new(true)),
            led: Rc::new(Cell::new(0)),
        }
    }

    fn toggle_connected(&self) {
        let connected = !self.connected.get();
        self.connected.set(connected);
        if !connected {
            self.pressed.set(false);
        }
        info!(
            "{} button {}",
            self.label,
            if connected { "plugged in" } else { "unplugged" }
        );
    }
}

impl InputPeripheral for SimButton {
    type Error = Infallible;

    fn address(&self) -> u8 {
        self.address
    }

    fn is_connected(&mut self) -> bool {
        self.connected.get()
    }

    fn is_pressed(&mut self) -> Result<bool, Infallible> {
        Ok(self.pressed.get())
    }

    fn set_led(&mut self, intensity: u8) -> Result<(), Infallible> {
        if self.led.replace(intensity) != intensity {
            debug!("{} LED -> {}", self.label, intensity);
        }
        Ok(())
    }
}

/// Synthetic sensor: a saturating rise toward a plateau with a slow ripple.
#[derive(Clone)]
struct SimSensor {
    started: Instant,
    connected: Rc<Cell<bool>>,
}

impl SimSensor {
    const BASE_LUX: f64 = 800.0;
    const RISE_LUX: f64 = 2400.0;
    const RISE_SECS: f64 = 45.0;

    fn new() -> Self {
        Self {
            started: Instant::now(),
            connected: Rc::new(Cell::new(true)),
        }
    }

    fn lux_at(t: f64) -> f64 {
        Self::BASE_LUX
            + Self::RISE_LUX * (1.0 - (-t / Self::RISE_SECS).exp())
            + 40.0 * (t / 7.0).sin()
    }

    /// Derivative of [`lux_at`](Self::lux_at) in lux per second
    fn slope_at(t: f64) -> f64 {
        Self::RISE_LUX / Self::RISE_SECS * (-t / Self::RISE_SECS).exp()
            + 40.0 / 7.0 * (t / 7.0).cos()
    }

    fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Trend in "plot heights per minute" for the live indicator
    fn trend(&self) -> f32 {
        (Self::slope_at(self.elapsed_secs()) * 60.0 / Self::RISE_LUX) as f32
    }

    fn toggle_connected(&self) {
        let connected = !self.connected.get();
        self.connected.set(connected);
        info!(
            "Light sensor {}",
            if connected { "plugged in" } else { "unplugged" }
        );
    }
}

impl LightSensor for SimSensor {
    type Error = Infallible;

    fn is_connected(&mut self) -> bool {
        self.connected.get()
    }

    fn read_lux(&mut self) -> Result<f32, Infallible> {
        Ok(Self::lux_at(self.elapsed_secs()) as f32)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load the config named on the command line, falling back to defaults.
fn load_config() -> DeviceConfig {
    let Some(path) = std::env::args().nth(1) else {
        return DeviceConfig::default();
    };

    match std::fs::read(&path) {
        Ok(bytes) => match DeviceConfig::from_bytes(&bytes) {
            Ok(config) => {
                info!("Loaded config from {}", path);
                config
            }
            Err(e) => {
                warn!("{}: {}; using defaults", path, e);
                DeviceConfig::default()
            }
        },
        Err(e) => {
            warn!("Cannot read {}: {}; using defaults", path, e);
            DeviceConfig::default()
        }
    }
}

/// Stand-in for the storage task: print whatever the controller logged.
fn drain_log_channel() {
    while let Ok(event) = LOG_CHANNEL.try_receive() {
        match event {
            LogEvent::RunStarted(name) => info!("[storage] {}.txt opened", name),
            LogEvent::Sample(sample) => debug!(
                "[storage] #{:03} {:>8} ms {:.2} lux",
                sample.index, sample.timestamp_ms, sample.intensity
            ),
            LogEvent::RunEnded(summary) => info!(
                "[storage] closed after {} ms, {} samples",
                summary.elapsed_ms, summary.samples
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting MAP simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: Space/Enter=green  Backspace=red  S/G/R=unplug  D=stall storage  Q=quit");

    let config = load_config();

    // SDL2 display and window
    let mut display = SimulatorDisplay::<Rgb565>::new(Size::new(
        DISPLAY_WIDTH_PX as u32,
        DISPLAY_HEIGHT_PX as u32,
    ));
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("MAP Simulator", &output_settings);

    let confirm = SimButton::new(config.confirm_address, "Green");
    let cancel = SimButton::new(config.cancel_address, "Red");
    let sensor = SimSensor::new();

    let mut controller = SessionController::new(
        Devices {
            confirm: confirm.clone(),
            cancel: cancel.clone(),
            sensor: sensor.clone(),
            log: ChannelRunLog::new(&LOG_CHANNEL),
            canvas: DisplayCanvas::new(FrameBuffer::new()),
            clock: EmbassyClock,
            delay: Delay,
        },
        config,
    );

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    let _ = display.clear(Rgb565::BLACK);
    window.update(&display);

    if let Err(e) = controller.warm_up() {
        log::error!("Draw error: {:?}", e);
    }

    let mut storage_stalled = false;
    let mut last_state = controller.state();

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown {
                    keycode, repeat, ..
                } => {
                    if repeat {
                        continue;
                    }
                    match keycode {
                        Keycode::Q | Keycode::Escape => break 'running,
                        Keycode::Space | Keycode::Return => confirm.pressed.set(true),
                        Keycode::Backspace => cancel.pressed.set(true),
                        Keycode::S => sensor.toggle_connected(),
                        Keycode::G => confirm.toggle_connected(),
                        Keycode::R => cancel.toggle_connected(),
                        Keycode::D => {
                            storage_stalled = !storage_stalled;
                            info!(
                                "Storage consumer {}",
                                if storage_stalled { "stalled" } else { "resumed" }
                            );
                        }
                        _ => {}
                    }
                }

                SimulatorEvent::KeyUp { keycode, .. } => match keycode {
                    Keycode::Space | Keycode::Return => confirm.pressed.set(false),
                    Keycode::Backspace => cancel.pressed.set(false),
                    _ => {}
                },

                _ => {}
            }
        }

        // --- Session tick -------------------------------------------------
        controller.set_trend_slope(sensor.trend());
        match controller.tick() {
            Ok(state) if state != last_state => {
                info!("[{} ms] now in {}", EmbassyClock.now_ms(), state);
                last_state = state;
            }
            Ok(_) => {}
            Err(e) => log::error!("Draw error: {:?}", e),
        }

        if !storage_stalled {
            drain_log_channel();
        }

        // --- Render -------------------------------------------------------
        let _ = controller
            .canvas_mut()
            .display_mut()
            .flush(&mut display);
        window.update(&display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}
