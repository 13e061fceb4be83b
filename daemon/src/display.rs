//! OLED expansion output.
//!
//! The OLED is driven by a helper script that receives the whole rendered
//! buffer as one argument. Without a display the text goes to the log.

use anyhow::Result;

use btwatch::driver::DisplaySink;

use crate::command;

pub struct OledDisplay {
    write_cmd: Option<Vec<String>>,
}

impl OledDisplay {
    pub fn new(write_cmd: Vec<String>) -> Self {
        Self {
            write_cmd: Some(write_cmd),
        }
    }

    /// Log-only sink for boards without a display.
    pub fn disabled() -> Self {
        Self { write_cmd: None }
    }

    /// One-time display initialization. Failure is logged, not fatal.
    pub fn init(argv: &[String]) {
        command::run_logged("Display init", argv);
    }
}

impl DisplaySink for OledDisplay {
    type Error = anyhow::Error;

    fn show(&mut self, text: &str) -> Result<()> {
        let Some(cmd) = &self.write_cmd else {
            log::info!("Display:\n{}", text);
            return Ok(());
        };

        let mut argv = cmd.clone();
        argv.push(text.to_string());
        let output = command::run(&argv)?;
        log::debug!("==> Output: {}", output.trim_end());
        Ok(())
    }
}
