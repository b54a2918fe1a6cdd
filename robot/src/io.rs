/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Operator controllers and digital sensors.
//!
//! Both are simulated: values are latched by whoever drives the simulation
//! (the outer loop, a test) and polled by behaviours without blocking.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Single-threaded shared handle used for subsystems and input sources.
pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

// ── XboxController ────────────────────────────────────────────────────────────

/// Face buttons read by the behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    X,
    Y,
}

impl Button {
    fn index(self) -> usize {
        match self {
            Button::A => 0,
            Button::B => 1,
            Button::X => 2,
            Button::Y => 3,
        }
    }
}

/// Gamepad state with level and rising-edge reads.
///
/// `get_button_pressed` reports whether the button went down since the last
/// time it was asked, then clears the latch.
#[derive(Debug, Default)]
pub struct XboxController {
    port: u8,
    held: [bool; 4],
    pressed: [bool; 4],
    left_x: f64,
    left_y: f64,
    right_x: f64,
    right_y: f64,
    right_trigger: f64,
}

impl XboxController {
    pub fn new(port: u8) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn port(&self) -> u8 {
        self.port
    }

    /// Latch a new button level.  A released → held change arms the
    /// "pressed" edge.
    pub fn set_button(&mut self, button: Button, down: bool) {
        let i = button.index();
        if down && !self.held[i] {
            self.pressed[i] = true;
        }
        self.held[i] = down;
    }

    /// Press and release in one go, as a tap between two polls.
    pub fn tap(&mut self, button: Button) {
        self.set_button(button, true);
        self.set_button(button, false);
    }

    pub fn get_button(&self, button: Button) -> bool {
        self.held[button.index()]
    }

    pub fn get_button_pressed(&mut self, button: Button) -> bool {
        std::mem::take(&mut self.pressed[button.index()])
    }

    /// Stick axes are clamped to `[-1, 1]`.
    pub fn set_left_x(&mut self, value: f64) {
        self.left_x = value.clamp(-1.0, 1.0);
    }

    pub fn left_x(&self) -> f64 {
        self.left_x
    }

    pub fn set_left_y(&mut self, value: f64) {
        self.left_y = value.clamp(-1.0, 1.0);
    }

    pub fn left_y(&self) -> f64 {
        self.left_y
    }

    pub fn set_right_x(&mut self, value: f64) {
        self.right_x = value.clamp(-1.0, 1.0);
    }

    pub fn right_x(&self) -> f64 {
        self.right_x
    }

    pub fn set_right_y(&mut self, value: f64) {
        self.right_y = value.clamp(-1.0, 1.0);
    }

    pub fn right_y(&self) -> f64 {
        self.right_y
    }

    /// Right trigger, clamped to `[0, 1]`.
    pub fn set_right_trigger(&mut self, value: f64) {
        self.right_trigger = value.clamp(0.0, 1.0);
    }

    pub fn right_trigger(&self) -> f64 {
        self.right_trigger
    }
}

// ── DigitalInput ──────────────────────────────────────────────────────────────

/// A boolean sensor on a DIO channel.  Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct DigitalInput {
    channel: u8,
    value: Rc<Cell<bool>>,
}

impl DigitalInput {
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            value: Rc::new(Cell::new(false)),
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn get(&self) -> bool {
        self.value.get()
    }

    pub fn set(&self, value: bool) {
        self.value.set(value);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
