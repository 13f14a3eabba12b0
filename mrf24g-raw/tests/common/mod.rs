//! A simulated MRF24WG for driving the RAW controller on the host.
#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use embassy_time::{Duration, Instant};
use mrf24g_raw::{
    regs::{
        CompletionInterrupt, WindowRegisters, INTR, INTR2, INTR2_RAW_ALL, INTR_INT2,
        RAW_STATUS_BUSY, WFIFO_BCNT0, WFIFO_BCNT1,
    },
    Clock, Raw, RawConfig, RawWindow, RegisterBus,
};

pub const WINDOW_MEMORY: usize = 4096;

/// A RAW move, as seen by the chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedMove {
    pub window: RawWindow,
    pub control: u16,
    /// State of the external interrupt line, while the control value was written.
    pub interrupt_enabled: bool,
}

#[derive(Debug)]
pub struct Window {
    /// Number of valid bytes in the window.
    pub length: u16,
    pub index: usize,
    pub busy: bool,
    pub ctrl1: u16,
    pub memory: Vec<u8>,
}
impl Default for Window {
    fn default() -> Self {
        Self {
            length: 0,
            index: 0,
            busy: false,
            ctrl1: 0,
            memory: vec![0; WINDOW_MEMORY],
        }
    }
}

#[derive(Debug)]
pub struct ChipState {
    pub windows: Vec<Window>,
    pub intr: u8,
    pub intr2: u16,
    pub interrupt_enabled: bool,
    /// Raw value of the FIFO byte count registers, upper bits included.
    pub data_pool_free: u16,
    pub mgmt_pool_free: u16,
    /// Length of the next received message.
    pub rx_length: u16,
    pub scratch_size: u16,
    /// If cleared, moves never raise their completion interrupt.
    pub complete_moves: bool,
    /// Overrides the byte count of the next moves.
    pub byte_counts: VecDeque<u16>,
    pub moves: Vec<RecordedMove>,
    pub writes: Vec<(u8, u16)>,
    pub other_registers: HashMap<u8, u16>,
}
impl Default for ChipState {
    fn default() -> Self {
        Self {
            windows: (0..RawWindow::COUNT).map(|_| Window::default()).collect(),
            intr: 0,
            intr2: 0,
            interrupt_enabled: true,
            data_pool_free: 0,
            mgmt_pool_free: 0,
            rx_length: 0,
            scratch_size: 0x0c80,
            complete_moves: true,
            byte_counts: VecDeque::new(),
            moves: Vec::new(),
            writes: Vec::new(),
            other_registers: HashMap::new(),
        }
    }
}
impl ChipState {
    pub fn window(&mut self, window: RawWindow) -> &mut Window {
        &mut self.windows[window as usize]
    }
    /// Executes a move and returns the byte count.
    fn execute_move(&mut self, window: RawWindow, control: u16) -> u16 {
        let to_window = control & 0x8000 != 0;
        let object = (control >> 12) & 0b111;
        let size = control & 0x0fff;
        let byte_count = match (to_window, object) {
            // Allocation from the management or data pool.
            (true, 1) | (true, 2) => {
                let free = if object == 1 {
                    &mut self.mgmt_pool_free
                } else {
                    &mut self.data_pool_free
                };
                if *free & 0x0fff >= size {
                    *free -= size;
                    size
                } else {
                    0
                }
            }
            (true, 0) => self.rx_length,
            (true, 3) => self.scratch_size,
            _ => 0,
        };
        let byte_count = self.byte_counts.pop_front().unwrap_or(byte_count);
        let state = self.window(window);
        state.length = if to_window { byte_count } else { 0 };
        state.index = 0;
        byte_count
    }
}

/// Find the window, that owns the register.
fn window_by(select: impl Fn(WindowRegisters) -> u8, reg: u8) -> Option<RawWindow> {
    RawWindow::ALL
        .into_iter()
        .find(|window| select(window.registers()) == reg)
}

/// Register bus handle of the simulated chip.
#[derive(Clone, Default)]
pub struct MockChip {
    pub state: Rc<RefCell<ChipState>>,
}
impl MockChip {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn moves(&self) -> Vec<RecordedMove> {
        self.state.borrow().moves.clone()
    }
}
impl RegisterBus for MockChip {
    fn read_u8(&mut self, reg: u8) -> u8 {
        let state = self.state.borrow();
        match reg {
            INTR => state.intr | if state.intr2 != 0 { INTR_INT2 } else { 0 },
            _ => state.other_registers.get(&reg).copied().unwrap_or_default() as u8,
        }
    }
    fn write_u8(&mut self, reg: u8, value: u8) {
        let mut state = self.state.borrow_mut();
        state.writes.push((reg, value as u16));
        match reg {
            // Write one to clear.
            INTR => state.intr &= !value,
            _ => {
                state.other_registers.insert(reg, value as u16);
            }
        }
    }
    fn read_u16(&mut self, reg: u8) -> u16 {
        let state = self.state.borrow();
        if reg == INTR2 {
            return state.intr2;
        }
        if reg == WFIFO_BCNT0 {
            return state.data_pool_free;
        }
        if reg == WFIFO_BCNT1 {
            return state.mgmt_pool_free;
        }
        if let Some(window) = window_by(|r| r.status, reg) {
            return if state.windows[window as usize].busy {
                RAW_STATUS_BUSY
            } else {
                0
            };
        }
        if let Some(window) = window_by(|r| r.ctrl1, reg) {
            return state.windows[window as usize].ctrl1;
        }
        state.other_registers.get(&reg).copied().unwrap_or_default()
    }
    fn write_u16(&mut self, reg: u8, value: u16) {
        let mut state = self.state.borrow_mut();
        state.writes.push((reg, value));
        if reg == INTR2 {
            state.intr2 &= !value;
            return;
        }
        if let Some(window) = window_by(|r| r.index, reg) {
            let window = state.window(window);
            // The chip never finishes positioning past the end of the window.
            window.busy = value > window.length;
            window.index = value as usize;
            return;
        }
        if let Some(window) = window_by(|r| r.ctrl0, reg) {
            let interrupt_enabled = state.interrupt_enabled;
            state.moves.push(RecordedMove {
                window,
                control: value,
                interrupt_enabled,
            });
            let byte_count = state.execute_move(window, value);
            state.window(window).ctrl1 = byte_count;
            if state.complete_moves {
                match window.registers().interrupt {
                    CompletionInterrupt::Intr(mask) => state.intr |= mask,
                    CompletionInterrupt::Intr2(mask) => state.intr2 |= mask,
                }
            }
            return;
        }
        state.other_registers.insert(reg, value);
    }
    fn read_array(&mut self, reg: u8, buffer: &mut [u8]) {
        let mut state = self.state.borrow_mut();
        let window = window_by(|r| r.data, reg).expect("not a data register");
        let window = state.window(window);
        let start = window.index;
        buffer.copy_from_slice(&window.memory[start..start + buffer.len()]);
        window.index += buffer.len();
    }
    fn write_array(&mut self, reg: u8, buffer: &[u8]) {
        let mut state = self.state.borrow_mut();
        let window = window_by(|r| r.data, reg).expect("not a data register");
        let window = state.window(window);
        let start = window.index;
        window.memory[start..start + buffer.len()].copy_from_slice(buffer);
        window.index += buffer.len();
    }
    fn disable_interrupt(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        let was_enabled = state.interrupt_enabled;
        state.interrupt_enabled = false;
        was_enabled
    }
    fn enable_interrupt(&mut self) {
        self.state.borrow_mut().interrupt_enabled = true;
    }
}

/// A clock, that only moves when the driver delays.
#[derive(Clone, Default)]
pub struct MockClock {
    pub micros: Rc<Cell<u64>>,
}
impl MockClock {
    pub fn since_start(&self) -> Duration {
        Duration::from_micros(self.micros.get())
    }
}
impl Clock for MockClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.micros.get())
    }
    fn delay(&mut self, duration: Duration) {
        self.micros.set(self.micros.get() + duration.as_micros());
    }
}

pub struct Harness {
    pub chip: MockChip,
    pub clock: MockClock,
    pub raw: Raw<MockChip, MockClock>,
}

/// A controller connected to a fresh simulated chip.
pub fn harness() -> Harness {
    let chip = MockChip::new();
    let clock = MockClock::default();
    let raw = Raw::new(chip.clone(), clock.clone(), RawConfig::default());
    Harness { chip, clock, raw }
}

/// Control value bits for checking recorded moves.
pub const TO_WINDOW: u16 = 0x8000;
pub const MAC: u16 = 0x0000;
pub const MGMT_POOL: u16 = 0x1000;
pub const DATA_POOL: u16 = 0x2000;
pub const SCRATCH_POOL: u16 = 0x3000;

pub fn intr2_cleared(chip: &MockChip) -> bool {
    chip.state
        .borrow()
        .writes
        .iter()
        .any(|&(reg, value)| reg == INTR2 && value == INTR2_RAW_ALL)
}
