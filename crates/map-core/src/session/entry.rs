//! Run name and duration entry buffers
//!
//! Both buffers are edited one slot at a time with a scroll-then-commit
//! gesture: holding confirm scrolls the slot under the cursor forward one
//! symbol per scroll step, releasing commits it and advances the cursor.

use crate::config::{DURATION_DIGITS, NAME_CAPACITY, SAMPLE_COUNT};
use crate::storage::RunName;

/// Symbols a name slot scrolls through, in order
pub const NAME_ALPHABET: &[u8] = b"*ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-";

/// Unset slot marker, dropped when the name is finalized
pub const PLACEHOLDER: u8 = b'*';

/// Name used when every slot was left as a placeholder
pub const FALLBACK_NAME: &str = "UNNAMED";

/// Per-digit limits of `MM:SS`; the tens-of-seconds digit stops at 5
const DIGIT_LIMITS: [u8; DURATION_DIGITS] = [10, 10, 6, 10];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameBuffer {
    slots: [u8; NAME_CAPACITY],
    cursor: usize,
}

impl Default for NameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl NameBuffer {
    pub const fn new() -> Self {
        Self {
            slots: [PLACEHOLDER; NAME_CAPACITY],
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= NAME_CAPACITY
    }

    /// Symbol shown under the cursor after scrolling `steps` symbols
    pub fn preview(&self, steps: u32) -> char {
        let Some(&current) = self.slots.get(self.cursor) else {
            return PLACEHOLDER as char;
        };
        let start = NAME_ALPHABET
            .iter()
            .position(|&c| c == current)
            .unwrap_or(0);
        let index = (start + steps as usize) % NAME_ALPHABET.len();
        NAME_ALPHABET[index] as char
    }

    /// Commit the scrolled symbol and advance. Returns `true` once every slot is set.
    pub fn commit(&mut self, steps: u32) -> bool {
        if self.is_complete() {
            return true;
        }
        self.slots[self.cursor] = self.preview(steps) as u8;
        self.cursor += 1;
        self.is_complete()
    }

    /// Step back one slot and reset it to the placeholder
    pub fn retreat(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.slots[self.cursor] = PLACEHOLDER;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Raw slots including placeholders
    pub fn slots(&self) -> &str {
        // Every slot holds an ASCII symbol from NAME_ALPHABET
        core::str::from_utf8(&self.slots).unwrap_or("")
    }

    /// Finalized name: placeholders dropped, [`FALLBACK_NAME`] if nothing is left
    pub fn name(&self) -> RunName {
        let mut name = RunName::new();
        for &c in self.slots.iter().filter(|&&c| c != PLACEHOLDER) {
            // Capacity equals the slot count
            let _ = name.push(c as char);
        }
        if name.is_empty() {
            let _ = name.push_str(FALLBACK_NAME);
        }
        name
    }
}

/// `MM:SS` run duration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DurationBuffer {
    digits: [u8; DURATION_DIGITS],
    cursor: usize,
}

impl DurationBuffer {
    pub const fn new() -> Self {
        Self {
            digits: [0; DURATION_DIGITS],
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= DURATION_DIGITS
    }

    /// Digit shown under the cursor after scrolling `steps`
    pub fn preview(&self, steps: u32) -> u8 {
        let Some(&current) = self.digits.get(self.cursor) else {
            return 0;
        };
        let limit = DIGIT_LIMITS[self.cursor] as u32;
        ((current as u32 + steps) % limit) as u8
    }

    /// Commit the scrolled digit and advance. Returns `true` after the last digit.
    pub fn commit(&mut self, steps: u32) -> bool {
        if self.is_complete() {
            return true;
        }
        self.digits[self.cursor] = self.preview(steps);
        self.cursor += 1;
        self.is_complete()
    }

    /// Step back one digit, keeping its value as the scroll start
    pub fn retreat(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn digits(&self) -> &[u8; DURATION_DIGITS] {
        &self.digits
    }

    pub fn minutes(&self) -> u32 {
        self.digits[0] as u32 * 10 + self.digits[1] as u32
    }

    pub fn seconds(&self) -> u32 {
        self.digits[2] as u32 * 10 + self.digits[3] as u32
    }

    pub fn total_ms(&self) -> u32 {
        (self.minutes() * 60 + self.seconds()) * 1000
    }

    /// Time between recorded samples for this duration
    pub fn sample_interval_ms(&self) -> u32 {
        self.total_ms() / SAMPLE_COUNT as u32
    }
}
