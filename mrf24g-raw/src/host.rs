//! Services the controller consumes from the host platform.
use embassy_time::{Duration, Instant};

/// Register level access to the MRF24WG and control over its external interrupt line.
///
/// On real hardware this is the SPI transport of the board. Register IDs are the host register
/// addresses from [regs](crate::regs).
pub trait RegisterBus {
    /// Read an 8-bit register.
    fn read_u8(&mut self, reg: u8) -> u8;
    /// Write an 8-bit register.
    fn write_u8(&mut self, reg: u8, value: u8);
    /// Read a 16-bit register.
    fn read_u16(&mut self, reg: u8) -> u16;
    /// Write a 16-bit register.
    fn write_u16(&mut self, reg: u8, value: u16);
    /// Read `buffer.len()` bytes from a data register.
    fn read_array(&mut self, reg: u8, buffer: &mut [u8]);
    /// Write all of `buffer` to a data register.
    fn write_array(&mut self, reg: u8, buffer: &[u8]);
    /// Mask the external interrupt line.
    ///
    /// Returns whether the line was enabled before.
    fn disable_interrupt(&mut self) -> bool;
    /// Unmask the external interrupt line.
    fn enable_interrupt(&mut self);
}

/// A monotonic time source with a busy delay.
pub trait Clock {
    /// The current time.
    fn now(&self) -> Instant;
    /// Block for the specified duration.
    fn delay(&mut self, duration: Duration);
    /// Time passed since `start`.
    fn elapsed(&self, start: Instant) -> Duration {
        self.now().saturating_duration_since(start)
    }
}

/// [Clock] backed by the embassy time driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyClock;
impl Clock for EmbassyClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
    fn delay(&mut self, duration: Duration) {
        embassy_time::block_for(duration);
    }
}
