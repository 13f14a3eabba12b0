use bitfield_struct::bitfield;
use macro_bits::serializable_enum;

serializable_enum! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    /// The chip side object, that is the source or destination of a RAW move.
    pub enum RawObject: u8 {
        /// The MAC packet buffer.
        Mac => 0x00,
        /// The management frame pool.
        MgmtPool => 0x01,
        /// The data frame pool.
        DataPool => 0x02,
        /// Scratch memory. This is static device RAM, so its contents survive an unmount.
        ScratchPool => 0x03,
        /// Internal stack memory.
        StackMemory => 0x04
    }
}

/// The value written to a window's `CTRL0` register to start a RAW move.
#[bitfield(u16)]
#[derive(PartialEq, Eq, Hash)]
pub struct RawMoveControl {
    /// Number of bytes to overlay. Bits 11:8 hold the high nibble, bits 7:0 the low byte.
    #[bits(12)]
    pub size: u16,
    /// Selector of the [RawObject].
    #[bits(3)]
    pub object: u8,
    /// Set if the window is the destination of the move and the object is the source.
    pub window_is_destination: bool,
}
impl RawMoveControl {
    /// The largest size, that fits into the control value.
    pub const MAX_SIZE: u16 = 0x0fff;

    /// Build the control value for a move.
    ///
    /// Sizes above [Self::MAX_SIZE] are truncated to 12 bits.
    pub const fn for_move(object: RawObject, window_is_destination: bool, size: u16) -> Self {
        Self::new()
            .with_size(size & Self::MAX_SIZE)
            .with_object(object.into_bits() & 0b111)
            .with_window_is_destination(window_is_destination)
    }
}
