
//! Platform boundary. Pin-mode setup, pull-up configuration and interrupt
//! attach are the platform's job; the driver only needs the operations
//! below.

/// The two bus lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    Clock,
    Data,
}

/// Sampled line level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

/// Open-drain output state. A line is only ever driven low or released
/// to the pull-up; nothing drives it high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Drive {
    Low,
    Release,
}

pub trait BusIO {
    // Methods take `&self`, because pin registers are poked from both
    // the interrupt and the foreground context.

    /// Sample a line.
    fn read(&self, line: Line) -> Level;

    /// Drive a line low or release it to the pull-up.
    fn drive(&self, line: Line, drive: Drive);

    /// Gate delivery of the falling-edge interrupt on CLOCK.
    fn set_clock_interrupt(&self, enabled: bool);

    /// Busy delay. Called from foreground code only.
    fn delay_micros(&self, micros: u32);
}
