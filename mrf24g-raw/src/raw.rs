use core::{cell::RefCell, fmt};

use embassy_sync::blocking_mutex;
use embassy_time::{Duration, Instant};
use macro_bits::check_bit;

use crate::{
    control::{RawMoveControl, RawObject},
    host::{Clock, EmbassyClock, RegisterBus},
    regs::{
        CompletionInterrupt, RawWindow, FIFO_BCNT_MASK, INTR, INTR2, INTR2_RAW_ALL, INTR_INT2,
        RAW_STATUS_BUSY, WFIFO_BCNT0, WFIFO_BCNT1,
    },
    DefaultRawMutex,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RawError {
    /// The pool doesn't have enough free bytes at the moment. Try again later.
    InsufficientMemory { available: u16, requested: u16 },
    /// The pool reported enough free bytes, but the move didn't overlay any.
    AllocationFailed,
    /// Mount state is only tracked for [RawWindow::DataRx] and [RawWindow::DataTx].
    NotADataWindow,
}
impl fmt::Display for RawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientMemory {
                available,
                requested,
            } => write!(
                f,
                "requested {requested} bytes, but only {available} are available"
            ),
            Self::AllocationFailed => f.write_str("RAW move didn't allocate any bytes"),
            Self::NotADataWindow => f.write_str("window is not a data window"),
        }
    }
}

pub type RawResult<T> = Result<T, RawError>;

/// Whether a data window currently has a buffer mounted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MountState {
    #[default]
    Unmounted,
    Mounted,
}

/// The two pools buffers for transmission are allocated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxPool {
    Data,
    Management,
}
impl TxPool {
    /// The register holding the number of free bytes in this pool.
    pub const fn byte_count_register(self) -> u8 {
        match self {
            Self::Data => WFIFO_BCNT0,
            Self::Management => WFIFO_BCNT1,
        }
    }
}

/// Timing of the polling loops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawConfig {
    /// How long a set index operation may stay busy, before the index is considered out of bounds.
    pub index_timeout: Duration,
    /// How long to wait for the move complete interrupt.
    pub move_timeout: Duration,
    /// Delay between two reads of a status or interrupt register.
    pub poll_interval: Duration,
}
impl Default for RawConfig {
    fn default() -> Self {
        Self {
            index_timeout: Duration::from_millis(5),
            move_timeout: Duration::from_millis(20),
            poll_interval: Duration::from_micros(10),
        }
    }
}

/// A [Raw] controller, that can be shared between contexts.
pub type SharedRaw<B, C = EmbassyClock> =
    blocking_mutex::Mutex<DefaultRawMutex, RefCell<Raw<B, C>>>;

/// Controller for the RAW windows of an MRF24WG.
///
/// This owns the register bus and all driver side state of the windows. Since every operation,
/// that talks to the chip, requires a mutable reference, there can never be more than one RAW
/// move in flight. The completion of moves on windows 2 through 5 is signaled through one shared
/// interrupt bit, so this is required for telling them apart.
pub struct Raw<B, C = EmbassyClock> {
    bus: B,
    clock: C,
    config: RawConfig,
    /// Indexed by the ID of the data window.
    data_window_state: [MountState; 2],
    /// One bit per window, set if the last set index operation timed out.
    index_past_end: u8,
}
impl<B: RegisterBus, C: Clock> Raw<B, C> {
    /// Create a new controller.
    ///
    /// This doesn't touch the hardware. Call [Raw::init] once the chip is out of reset.
    pub fn new(bus: B, clock: C, config: RawConfig) -> Self {
        Self {
            bus,
            clock,
            config,
            data_window_state: [MountState::Unmounted; 2],
            index_past_end: 0,
        }
    }
    /// Bring the windows into their initial state.
    ///
    /// After reset the firmware mounts scratch on [RawWindow::DataTx]. That mount is released and
    /// scratch is permanently mounted on [RawWindow::Scratch] instead, with its index at zero.
    pub fn init(&mut self) {
        trace!("Initializing RAW windows.");
        self.scratch_unmount(RawWindow::DataTx);
        let scratch_size = self.scratch_mount(RawWindow::Scratch);
        debug!("Mounted {} bytes of scratch memory.", scratch_size);
        self.data_window_state = [MountState::Unmounted; 2];
    }
    /// Wrap the controller, so that it can be shared.
    pub fn into_shared(self) -> SharedRaw<B, C> {
        blocking_mutex::Mutex::new(RefCell::new(self))
    }
    /// Returns the register bus and the clock.
    pub fn release(self) -> (B, C) {
        (self.bus, self.clock)
    }
    pub fn config(&self) -> &RawConfig {
        &self.config
    }

    /// Mount scratch memory on the window.
    ///
    /// Returns the size of scratch memory in bytes.
    pub fn scratch_mount(&mut self, window: RawWindow) -> u16 {
        self.raw_move(window, RawObject::ScratchPool, true, 0)
    }
    /// Release the scratch mount of the window.
    ///
    /// Scratch isn't dynamically allocated, so its contents are kept.
    pub fn scratch_unmount(&mut self, window: RawWindow) {
        self.raw_move(window, RawObject::ScratchPool, false, 0);
    }

    /// Returns the mount state of a data window.
    pub fn data_window_state(&self, window: RawWindow) -> RawResult<MountState> {
        if !window.is_data_window() {
            return Err(RawError::NotADataWindow);
        }
        Ok(self.data_window_state[window as usize])
    }
    /// Set the mount state of a data window.
    pub fn set_data_window_state(&mut self, window: RawWindow, state: MountState) -> RawResult<()> {
        if !window.is_data_window() {
            return Err(RawError::NotADataWindow);
        }
        self.data_window_state[window as usize] = state;
        Ok(())
    }
    /// Check if the last set index operation on the window went past its end.
    pub fn is_index_out_of_bounds(&self, window: RawWindow) -> bool {
        check_bit!(self.index_past_end, window.out_of_bounds_mask())
    }
    fn set_index_out_of_bounds(&mut self, window: RawWindow) {
        self.index_past_end |= window.out_of_bounds_mask();
    }
    fn clear_index_out_of_bounds(&mut self, window: RawWindow) {
        self.index_past_end &= !window.out_of_bounds_mask();
    }

    /// Set the index within the window.
    ///
    /// The chip never finishes a set index operation, if the index is past the end of the window.
    /// This isn't an error in itself, as long as nothing is read or written at that index, so on
    /// timeout the window is only flagged as out of bounds.
    pub fn set_index(&mut self, window: RawWindow, index: u16) {
        let registers = window.registers();
        self.bus.write_u16(registers.index, index);

        let start = self.clock.now();
        loop {
            if !check_bit!(self.bus.read_u16(registers.status), RAW_STATUS_BUSY) {
                self.clear_index_out_of_bounds(window);
                break;
            }
            if self.clock.elapsed(start) > self.config.index_timeout {
                self.set_index_out_of_bounds(window);
                warn!("Index {} is out of bounds for {:?}.", index, window);
                break;
            }
            self.clock.delay(self.config.poll_interval);
        }
    }
    /// Warn about accesses, that are known to be invalid. The access still happens.
    fn check_access(&self, window: RawWindow) {
        if self.is_index_out_of_bounds(window) {
            warn!("Accessing {:?} past the end of the window.", window);
        }
        if window.is_data_window()
            && self.data_window_state[window as usize] == MountState::Unmounted
        {
            warn!("Accessing {:?}, while it is unmounted.", window);
        }
    }
    /// Read bytes from the current index of the window.
    pub fn read_bytes(&mut self, window: RawWindow, buffer: &mut [u8]) {
        self.check_access(window);
        self.bus.read_array(window.registers().data, buffer);
    }
    /// Write bytes at the current index of the window.
    pub fn write_bytes(&mut self, window: RawWindow, buffer: &[u8]) {
        self.check_access(window);
        self.bus.write_array(window.registers().data, buffer);
    }
    /// Read `buffer.len()` bytes from a mounted window, starting at `start_index`.
    pub fn read(&mut self, window: RawWindow, start_index: u16, buffer: &mut [u8]) {
        self.set_index(window, start_index);
        self.read_bytes(window, buffer);
    }
    /// Write `buffer` to a mounted window, starting at `start_index`.
    pub fn write(&mut self, window: RawWindow, start_index: u16, buffer: &[u8]) {
        self.set_index(window, start_index);
        self.write_bytes(window, buffer);
    }

    /// Perform a RAW move.
    ///
    /// This is used for allocating Tx buffers, mounting Rx buffers, handing frames to the MAC
    /// and so on. If `window_is_destination` is set, `object` is the source of the move,
    /// otherwise it is the destination. `size` is the number of bytes to overlay, which doesn't
    /// apply to all moves.
    ///
    /// Returns the byte count reported by the chip. This is only meaningful for some moves.
    /// A missing completion interrupt is logged, but not treated as an error.
    pub fn raw_move(
        &mut self,
        window: RawWindow,
        object: RawObject,
        window_is_destination: bool,
        size: u16,
    ) -> u16 {
        let interrupt_was_enabled = self.bus.disable_interrupt();

        if size > RawMoveControl::MAX_SIZE {
            warn!("RAW move size {} doesn't fit into 12 bits.", size);
        }
        let control = RawMoveControl::for_move(object, window_is_destination, size);
        let registers = window.registers();

        // Clear a stale completion interrupt, before starting the move.
        match registers.interrupt {
            CompletionInterrupt::Intr(mask) => self.bus.write_u8(INTR, mask),
            CompletionInterrupt::Intr2(mask) => self.bus.write_u16(INTR2, mask),
        }
        trace!(
            "RAW move on {:?} with control value {:#x}.",
            window,
            control.into_bits()
        );
        self.bus.write_u16(registers.ctrl0, control.into_bits());

        self.bus.enable_interrupt();
        let byte_count = self.wait_for_move_complete(window);
        if !interrupt_was_enabled {
            self.bus.disable_interrupt();
        }
        byte_count
    }
    /// Poll the host interrupt register until the move on the window has completed.
    ///
    /// Returns the byte count of the move.
    fn wait_for_move_complete(&mut self, window: RawWindow) -> u16 {
        let registers = window.registers();
        let (mask, shared) = match registers.interrupt {
            CompletionInterrupt::Intr(mask) => (mask, false),
            CompletionInterrupt::Intr2(_) => (INTR_INT2, true),
        };

        let start: Instant = self.clock.now();
        loop {
            if check_bit!(self.bus.read_u8(INTR), mask) {
                if shared {
                    self.bus.write_u16(INTR2, INTR2_RAW_ALL);
                }
                self.bus.write_u8(INTR, mask);
                break;
            }
            if self.clock.elapsed(start) > self.config.move_timeout {
                warn!("Timeout waiting for RAW move on {:?} to complete.", window);
                break;
            }
            self.clock.delay(self.config.poll_interval);
        }

        self.bus.read_u16(registers.ctrl1)
    }

    /// Returns the number of free bytes in the pool.
    pub fn available_bytes(&mut self, pool: TxPool) -> u16 {
        self.bus.read_u16(pool.byte_count_register()) & FIFO_BCNT_MASK
    }
    /// Allocate a management Tx buffer on [RawWindow::MgmtTx].
    ///
    /// The pool is checked before anything is moved, so a failed allocation never leaves a
    /// partial buffer behind. A buffer allocated earlier stays mounted and owned by the caller.
    pub fn allocate_mgmt_tx_buffer(&mut self, bytes_needed: u16) -> RawResult<()> {
        let available = self.available_bytes(TxPool::Management);
        if available < bytes_needed {
            return Err(RawError::InsufficientMemory {
                available,
                requested: bytes_needed,
            });
        }

        if self.raw_move(RawWindow::MgmtTx, RawObject::MgmtPool, true, bytes_needed) == 0 {
            debug!(
                "Couldn't allocate {} bytes of {} free for management Tx.",
                bytes_needed, available
            );
            return Err(RawError::AllocationFailed);
        }
        self.clear_index_out_of_bounds(RawWindow::MgmtTx);
        Ok(())
    }
    /// Release a received management message.
    pub fn deallocate_mgmt_rx_buffer(&mut self) {
        self.raw_move(RawWindow::MgmtRx, RawObject::MgmtPool, false, 0);
    }
    /// Allocate a data Tx buffer on [RawWindow::DataTx].
    pub fn allocate_data_tx_buffer(&mut self, bytes_needed: u16) -> RawResult<()> {
        let available = self.available_bytes(TxPool::Data);
        if available < bytes_needed {
            return Err(RawError::InsufficientMemory {
                available,
                requested: bytes_needed,
            });
        }

        if self.raw_move(RawWindow::DataTx, RawObject::DataPool, true, bytes_needed) == 0 {
            warn!(
                "Couldn't allocate {} bytes of {} free for data Tx.",
                bytes_needed, available
            );
            return Err(RawError::AllocationFailed);
        }
        self.data_window_state[RawWindow::DataTx as usize] = MountState::Mounted;
        Ok(())
    }
    /// Release the received data frame.
    ///
    /// This is called, once the stack is done with the frame, or if the frame was discarded.
    pub fn deallocate_data_rx_buffer(&mut self) {
        if self.data_window_state[RawWindow::DataRx as usize] == MountState::Unmounted {
            debug!("Deallocating data Rx buffer, while nothing is mounted.");
        }
        self.data_window_state[RawWindow::DataRx as usize] = MountState::Unmounted;
        self.raw_move(RawWindow::DataRx, RawObject::DataPool, false, 0);
    }
    /// Mount the most recently received message on the window.
    ///
    /// Returns the length of the message, which may be a management or data message.
    pub fn mount_rx_buffer(&mut self, window: RawWindow) -> u16 {
        let length = self.raw_move(window, RawObject::Mac, true, 0);
        // We were notified about a received message, so it can't be empty.
        if length == 0 {
            warn!("Mounting Rx message on {:?} returned no bytes.", window);
        }
        if window == RawWindow::DataRx {
            self.data_window_state[RawWindow::DataRx as usize] = MountState::Mounted;
        }
        length
    }
    /// Hand the management message in [RawWindow::MgmtTx] to the MAC.
    ///
    /// The management header must already have been written to the window.
    pub fn send_management_frame(&mut self, length: u16) {
        self.raw_move(RawWindow::MgmtTx, RawObject::Mac, false, length);
    }
    /// Hand the data frame in [RawWindow::DataTx] to the MAC.
    ///
    /// The chip owns the buffer afterwards, so the window is unmounted.
    pub fn send_data_frame(&mut self, length: u16) {
        self.raw_move(RawWindow::DataTx, RawObject::Mac, false, length);
        self.data_window_state[RawWindow::DataTx as usize] = MountState::Unmounted;
    }
}
