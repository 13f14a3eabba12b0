//! # `mrf24g-raw`
//! This is a driver for the RAW (Random Access Window) interface of the Microchip MRF24WG WiFi
//! radio. All data transfer between the host and the chip goes through this interface.
//! ## Hardware overview
//! The host doesn't have direct access to the memory of the chip. Instead there are six RAW
//! windows, which are movable apertures into the chip's memory. Each window has a small set of
//! registers on the host interface: two control registers, an index register, a status register
//! and a data register.
//!
//! ### Moves
//! A window is bound to a region of chip memory by a RAW move. The host writes a control value to
//! the first control register of the window, which names the object on the chip (MAC buffer,
//! management pool, data pool, scratch or stack memory), whether the window is the source or the
//! destination and how many bytes to overlay. Once the chip is done, it raises the move complete
//! interrupt of that window and places the byte count in the second control register.
//! Windows 0 and 1 have their own bits in the 8-bit host interrupt register. Windows 2 through 5
//! have bits in the 16-bit second level interrupt register, which all feed the same summary bit in
//! the first level register. We wait for moves by polling, so a timeout is simply logged.
//!
//! ### Index
//! After a window is mounted, the host sets the index within the window and then streams bytes
//! through the data register. Setting the index past the end of the window is not an error by
//! itself, but the chip will never clear the busy bit in the status register. We take a timeout as
//! the index being out of bounds and warn, when such a window is read or written.
//!
//! ### Pools
//! Tx buffers are allocated from the management and data pools. The chip reports the free bytes
//! of each pool in a FIFO byte count register. Allocation fails, if the pool is too small, in
//! which case the caller should try again later.
//!
//! The window assignment is fixed:
//!
//! | Window | Purpose |
//! | --- | --- |
//! | 0 | Data Rx |
//! | 1 | Data Tx |
//! | 2 | Management Rx |
//! | 3 | Management Tx |
//! | 4 | Scratch |
//! | 5 | Unused |

#![cfg_attr(not(test), no_std)]
pub(crate) mod fmt;

mod control;
mod host;
mod raw;
pub mod regs;

pub use control::{RawMoveControl, RawObject};
pub use host::{Clock, EmbassyClock, RegisterBus};
pub use raw::*;
pub use regs::RawWindow;

#[cfg(not(feature = "critical_section"))]
type DefaultRawMutex = embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(feature = "critical_section")]
type DefaultRawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
