/// Hardware abstraction for supported boards.
///
/// Each board module defines display geometry and the notification light
/// settings selected at compile time via feature flags.

#[cfg(feature = "board-omega2")]
mod hw {
    pub const DISPLAY_LINES: usize = 8; // 128x64 OLED expansion, 8 text rows
    pub const HCI_DEVICE: &str = "hci0";
    pub const LED_ON_COLOR: &str = "0x0000ff"; // RGB expansion, blue
    pub const LED_OFF_COLOR: &str = "0x000000";
    pub const HAS_DISPLAY: bool = true;
    pub const HAS_LED: bool = true;
    pub const BOARD_NAME: &str = "omega2";
}

#[cfg(not(feature = "board-omega2"))]
mod hw {
    pub const DISPLAY_LINES: usize = 8;
    pub const HCI_DEVICE: &str = "hci0";
    pub const LED_ON_COLOR: &str = "0x0000ff";
    pub const LED_OFF_COLOR: &str = "0x000000";
    pub const HAS_DISPLAY: bool = false;
    pub const HAS_LED: bool = false;
    pub const BOARD_NAME: &str = "generic";
}

pub use hw::*;
