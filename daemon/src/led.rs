//! Notification LED on the RGB expansion.
//!
//! A pulse is two calls from the driver: on, then off. `hold` keeps the LED
//! lit between them; zero gives the shortest visible blink the tool allows.

use std::thread;
use std::time::Duration;

use anyhow::Result;

use btwatch::driver::Notifier;

use crate::command;

pub struct ExpLed {
    cmd: Option<Vec<String>>,
    on_color: String,
    off_color: String,
    hold: Duration,
}

impl ExpLed {
    pub fn new(cmd: Vec<String>, on_color: String, off_color: String, hold: Duration) -> Self {
        Self {
            cmd: Some(cmd),
            on_color,
            off_color,
            hold,
        }
    }

    /// No-op light for boards without an LED.
    pub fn disabled() -> Self {
        Self {
            cmd: None,
            on_color: String::new(),
            off_color: String::new(),
            hold: Duration::ZERO,
        }
    }
}

impl Notifier for ExpLed {
    type Error = anyhow::Error;

    fn set(&mut self, on: bool) -> Result<()> {
        let Some(cmd) = &self.cmd else {
            return Ok(());
        };

        let color = if on { &self.on_color } else { &self.off_color };
        let mut argv = cmd.clone();
        argv.push(color.clone());
        command::run(&argv)?;

        if on && !self.hold.is_zero() {
            thread::sleep(self.hold);
        }
        Ok(())
    }
}
