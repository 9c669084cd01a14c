//! Test doubles for the collaborators of the session controller.
//!
//! Handles are cheap `Rc` clones sharing one state, so a test keeps a handle
//! to script or inspect a fake after moving another into the controller.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::input::InputPeripheral;
use crate::sensors::LightSensor;
use crate::storage::{RunLog, RunSummary, SampleRecord};
use crate::time::Clock;
use crate::ui::{Canvas, TextSize};

/// Error returned by every fake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeFault;

// ============================================================================
// Time
// ============================================================================

/// Clock that only moves when told to
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

/// Delay that advances a [`ManualClock`] instead of sleeping
#[derive(Debug, Clone)]
pub struct FakeDelay {
    clock: ManualClock,
    pending_ns: u64,
    slept_ms: Rc<Cell<u64>>,
}

impl FakeDelay {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            pending_ns: 0,
            slept_ms: Rc::new(Cell::new(0)),
        }
    }

    /// Total milliseconds "slept" so far
    pub fn slept_ms(&self) -> u64 {
        self.slept_ms.get()
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.clock.advance(ms);
        self.slept_ms.set(self.slept_ms.get() + ms);
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.pending_ns += ns as u64;
        let whole_ms = self.pending_ns / 1_000_000;
        self.pending_ns %= 1_000_000;
        self.sleep_ms(whole_ms);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleep_ms(ms as u64);
    }
}

// ============================================================================
// Peripherals
// ============================================================================

#[derive(Debug)]
struct ButtonInner {
    address: u8,
    connected: bool,
    pressed: bool,
    fail_reads: bool,
    led: u8,
    led_writes: usize,
}

/// Scriptable button
#[derive(Debug, Clone)]
pub struct FakeButton {
    inner: Rc<RefCell<ButtonInner>>,
}

impl FakeButton {
    pub fn new(address: u8) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ButtonInner {
                address,
                connected: true,
                pressed: false,
                fail_reads: false,
                led: 0,
                led_writes: 0,
            })),
        }
    }

    pub fn set_pressed(&self, pressed: bool) {
        self.inner.borrow_mut().pressed = pressed;
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.borrow_mut().connected = connected;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    pub fn led(&self) -> u8 {
        self.inner.borrow().led
    }

    pub fn led_writes(&self) -> usize {
        self.inner.borrow().led_writes
    }
}

impl InputPeripheral for FakeButton {
    type Error = FakeFault;

    fn address(&self) -> u8 {
        self.inner.borrow().address
    }

    fn is_connected(&mut self) -> bool {
        self.inner.borrow().connected
    }

    fn is_pressed(&mut self) -> Result<bool, FakeFault> {
        let inner = self.inner.borrow();
        if inner.fail_reads || !inner.connected {
            return Err(FakeFault);
        }
        Ok(inner.pressed)
    }

    fn set_led(&mut self, intensity: u8) -> Result<(), FakeFault> {
        let mut inner = self.inner.borrow_mut();
        if !inner.connected {
            return Err(FakeFault);
        }
        inner.led = intensity;
        inner.led_writes += 1;
        Ok(())
    }
}

#[derive(Debug)]
struct SensorInner {
    connected: bool,
    lux: f32,
    fail_reads: bool,
}

/// Scriptable light sensor
#[derive(Debug, Clone)]
pub struct FakeSensor {
    inner: Rc<RefCell<SensorInner>>,
}

impl FakeSensor {
    pub fn new(lux: f32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SensorInner {
                connected: true,
                lux,
                fail_reads: false,
            })),
        }
    }

    pub fn set_lux(&self, lux: f32) {
        self.inner.borrow_mut().lux = lux;
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.borrow_mut().connected = connected;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }
}

impl LightSensor for FakeSensor {
    type Error = FakeFault;

    fn is_connected(&mut self) -> bool {
        self.inner.borrow().connected
    }

    fn read_lux(&mut self) -> Result<f32, FakeFault> {
        let inner = self.inner.borrow();
        if inner.fail_reads || !inner.connected {
            return Err(FakeFault);
        }
        Ok(inner.lux)
    }
}

// ============================================================================
// Run log
// ============================================================================

#[derive(Debug, Default)]
struct LogInner {
    unavailable: bool,
    names: Vec<String>,
    started: Vec<String>,
    records: Vec<SampleRecord>,
    summaries: Vec<RunSummary>,
}

/// In-memory run log
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    inner: Rc<RefCell<LogInner>>,
}

impl MemoryLog {
    pub fn with_runs(names: &[&str]) -> Self {
        let log = Self::default();
        log.inner
            .borrow_mut()
            .names
            .extend(names.iter().map(|name| String::from(*name)));
        log
    }

    pub fn set_available(&self, available: bool) {
        self.inner.borrow_mut().unavailable = !available;
    }

    pub fn started(&self) -> Vec<String> {
        self.inner.borrow().started.clone()
    }

    pub fn records(&self) -> Vec<SampleRecord> {
        self.inner.borrow().records.clone()
    }

    pub fn summaries(&self) -> Vec<RunSummary> {
        self.inner.borrow().summaries.clone()
    }

    fn check(&self) -> Result<(), FakeFault> {
        if self.inner.borrow().unavailable {
            Err(FakeFault)
        } else {
            Ok(())
        }
    }
}

impl RunLog for MemoryLog {
    type Error = FakeFault;

    fn is_available(&mut self) -> bool {
        !self.inner.borrow().unavailable
    }

    fn contains(&mut self, name: &str) -> bool {
        self.inner.borrow().names.iter().any(|known| known == name)
    }

    fn begin_run(&mut self, name: &str) -> Result<(), FakeFault> {
        self.check()?;
        let mut inner = self.inner.borrow_mut();
        inner.started.push(String::from(name));
        if !inner.names.iter().any(|known| known == name) {
            inner.names.push(String::from(name));
        }
        Ok(())
    }

    fn record(&mut self, sample: SampleRecord) -> Result<(), FakeFault> {
        self.check()?;
        self.inner.borrow_mut().records.push(sample);
        Ok(())
    }

    fn end_run(&mut self, summary: RunSummary) -> Result<(), FakeFault> {
        self.check()?;
        self.inner.borrow_mut().summaries.push(summary);
        Ok(())
    }
}

// ============================================================================
// Canvas
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgb565),
    Text {
        text: String,
        top_left: Point,
        size: TextSize,
        color: Rgb565,
    },
    FillRect(Rectangle, Rgb565),
    OutlineRect(Rectangle, Rgb565),
    Line(Point, Point, Rgb565),
}

/// Canvas that records draw commands instead of drawing
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop everything recorded so far
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { text, .. } if text == needle))
    }

    pub fn count_clears(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Clear(_)))
            .count()
    }

    pub fn count_lines(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line(..)))
            .count()
    }
}

impl Canvas for RecordingCanvas {
    type Error = FakeFault;

    fn clear(&mut self, color: Rgb565) -> Result<(), FakeFault> {
        self.commands.push(DrawCommand::Clear(color));
        Ok(())
    }

    fn text(
        &mut self,
        text: &str,
        top_left: Point,
        size: TextSize,
        color: Rgb565,
    ) -> Result<(), FakeFault> {
        self.commands.push(DrawCommand::Text {
            text: String::from(text),
            top_left,
            size,
            color,
        });
        Ok(())
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), FakeFault> {
        self.commands.push(DrawCommand::FillRect(area, color));
        Ok(())
    }

    fn outline_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), FakeFault> {
        self.commands.push(DrawCommand::OutlineRect(area, color));
        Ok(())
    }

    fn line(&mut self, start: Point, end: Point, color: Rgb565) -> Result<(), FakeFault> {
        self.commands.push(DrawCommand::Line(start, end, color));
        Ok(())
    }
}

// ============================================================================
// I2C
// ============================================================================

/// Register-file I2C device at one address
#[derive(Debug)]
pub struct FakeI2c {
    address: u8,
    present: bool,
    pointer: u8,
    registers: [u8; 256],
}

impl FakeI2c {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            present: true,
            pointer: 0,
            registers: [0; 256],
        }
    }

    pub fn set_present(&mut self, present: bool) {
        self.present = present;
    }

    pub fn set_register(&mut self, register: u8, value: u8) {
        self.registers[register as usize] = value;
    }

    pub fn register(&self, register: u8) -> u8 {
        self.registers[register as usize]
    }
}

impl ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if !self.present || address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((&register, data)) = bytes.split_first() {
                        self.pointer = register;
                        for (offset, &byte) in data.iter().enumerate() {
                            let index = (register as usize + offset) % self.registers.len();
                            self.registers[index] = byte;
                        }
                    }
                }
                Operation::Read(buffer) => {
                    for (offset, byte) in buffer.iter_mut().enumerate() {
                        let index = (self.pointer as usize + offset) % self.registers.len();
                        *byte = self.registers[index];
                    }
                }
            }
        }
        Ok(())
    }
}
