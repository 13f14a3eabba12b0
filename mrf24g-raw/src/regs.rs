//! Host register map of the MRF24WG.
//!
//! Every RAW window has its own set of control, index, status and data registers. Windows 0 and 1
//! signal move completion in the 8-bit `INTR` register, while windows 2 through 5 share a single
//! summary bit in `INTR` and have their own bits in the 16-bit `INTR2` register.
use macro_bits::bit;

/// 8-bit register containing the first level interrupt bits.
pub const INTR: u8 = 0x01;
/// 16-bit register containing the second level interrupt bits.
pub const INTR2: u8 = 0x2d;
/// Free bytes in the data Tx pool (FIFO 0).
pub const WFIFO_BCNT0: u8 = 0x2f;
/// Free bytes in the management Tx pool (FIFO 1).
pub const WFIFO_BCNT1: u8 = 0x31;
/// Only the lower 12 bits of a FIFO byte count register are valid.
pub const FIFO_BCNT_MASK: u16 = 0x0fff;

/// Summary bit in `INTR`, set while any `INTR2` bit is pending.
pub const INTR_INT2: u8 = bit!(0);
pub const INTR_RAW0: u8 = bit!(1);
pub const INTR_RAW1: u8 = bit!(2);

pub const INTR2_RAW2: u16 = bit!(4);
pub const INTR2_RAW3: u16 = bit!(5);
pub const INTR2_RAW4: u16 = bit!(6);
pub const INTR2_RAW5: u16 = bit!(7);
/// All RAW completion bits of `INTR2`.
pub const INTR2_RAW_ALL: u16 = INTR2_RAW2 | INTR2_RAW3 | INTR2_RAW4 | INTR2_RAW5;

/// Set in a window's status register until a set index operation has completed.
pub const RAW_STATUS_BUSY: u16 = bit!(0);

/// One of the six RAW windows.
///
/// The discriminant is the hardware window ID. The assignment of windows to their purpose is
/// fixed by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RawWindow {
    /// Received data frames.
    DataRx = 0,
    /// Data frames to be transmitted.
    DataTx = 1,
    /// Received management messages.
    MgmtRx = 2,
    /// Management messages to be transmitted.
    MgmtTx = 3,
    /// Permanently mounted scratch memory.
    Scratch = 4,
    Unused = 5,
}

/// Where the move complete interrupt of a window is signaled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompletionInterrupt {
    /// A bit in the 8-bit `INTR` register.
    Intr(u8),
    /// A bit in the 16-bit `INTR2` register, summarized by [INTR_INT2].
    Intr2(u16),
}

/// The registers belonging to one RAW window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowRegisters {
    /// Writing a control value here starts a RAW move.
    pub ctrl0: u8,
    /// Holds the byte count of the last RAW move.
    pub ctrl1: u8,
    pub index: u8,
    pub status: u8,
    pub data: u8,
    pub interrupt: CompletionInterrupt,
}

const WINDOW_REGISTERS: [WindowRegisters; RawWindow::COUNT] = [
    WindowRegisters {
        ctrl0: 0x25,
        ctrl1: 0x26,
        index: 0x27,
        status: 0x28,
        data: 0x20,
        interrupt: CompletionInterrupt::Intr(INTR_RAW0),
    },
    WindowRegisters {
        ctrl0: 0x29,
        ctrl1: 0x2a,
        index: 0x2b,
        status: 0x2c,
        data: 0x21,
        interrupt: CompletionInterrupt::Intr(INTR_RAW1),
    },
    WindowRegisters {
        ctrl0: 0x18,
        ctrl1: 0x19,
        index: 0x1a,
        status: 0x1b,
        data: 0x06,
        interrupt: CompletionInterrupt::Intr2(INTR2_RAW2),
    },
    WindowRegisters {
        ctrl0: 0x1c,
        ctrl1: 0x1d,
        index: 0x1e,
        status: 0x1f,
        data: 0x07,
        interrupt: CompletionInterrupt::Intr2(INTR2_RAW3),
    },
    WindowRegisters {
        ctrl0: 0x0a,
        ctrl1: 0x0b,
        index: 0x0c,
        status: 0x0d,
        data: 0x08,
        interrupt: CompletionInterrupt::Intr2(INTR2_RAW4),
    },
    WindowRegisters {
        ctrl0: 0x0e,
        ctrl1: 0x0f,
        index: 0x22,
        status: 0x23,
        data: 0x09,
        interrupt: CompletionInterrupt::Intr2(INTR2_RAW5),
    },
];

impl RawWindow {
    pub const COUNT: usize = 6;
    pub const ALL: [RawWindow; Self::COUNT] = [
        Self::DataRx,
        Self::DataTx,
        Self::MgmtRx,
        Self::MgmtTx,
        Self::Scratch,
        Self::Unused,
    ];

    /// The hardware ID of the window.
    pub const fn id(self) -> u8 {
        self as u8
    }
    /// Returns the register set of this window.
    pub const fn registers(self) -> WindowRegisters {
        WINDOW_REGISTERS[self as usize]
    }
    /// The bit of this window in the out of bounds flag set.
    pub const fn out_of_bounds_mask(self) -> u8 {
        bit!(self as u8)
    }
    /// Check if this is one of the two data windows, whose mount state is tracked.
    pub const fn is_data_window(self) -> bool {
        matches!(self, Self::DataRx | Self::DataTx)
    }
}
