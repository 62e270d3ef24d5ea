//! Register access by data-space address
//!
//! Timers and channels are described by plain addresses (see `chip`), so
//! everything above this module goes through [`RegisterBus`]. On the MCU that
//! is [`Mmio`]; on a host it is a [`RegisterFile`].
//!
//! `Mmio` addresses are the same ones `avr_device::atmega32u4` register
//! blocks map (e.g. `TC1.icr1` at 0x86), just reached by number.

use core::cell::Cell;

/// Byte and half-word access to memory-mapped registers.
///
/// Methods take `&self`: hardware registers change underneath us anyway, so
/// every read must really happen and nothing may be cached.
pub trait RegisterBus {
    fn read8(&self, addr: u16) -> u8;
    fn write8(&self, addr: u16, value: u8);
    fn read16(&self, addr: u16) -> u16;
    fn write16(&self, addr: u16, value: u16);

    /// Set bit `bit` of the byte register at `addr`
    #[inline]
    fn set_bit(&self, addr: u16, bit: u8) {
        self.write8(addr, self.read8(addr) | (1 << bit));
    }

    /// Clear bit `bit` of the byte register at `addr`
    #[inline]
    fn clear_bit(&self, addr: u16, bit: u8) {
        self.write8(addr, self.read8(addr) & !(1 << bit));
    }

    /// Replace the bits selected by `mask` with those of `bits`
    #[inline]
    fn modify8(&self, addr: u16, mask: u8, bits: u8) {
        self.write8(addr, (self.read8(addr) & !mask) | (bits & mask));
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &T {
    #[inline]
    fn read8(&self, addr: u16) -> u8 {
        (**self).read8(addr)
    }

    #[inline]
    fn write8(&self, addr: u16, value: u8) {
        (**self).write8(addr, value)
    }

    #[inline]
    fn read16(&self, addr: u16) -> u16 {
        (**self).read16(addr)
    }

    #[inline]
    fn write16(&self, addr: u16, value: u16) {
        (**self).write16(addr, value)
    }
}

/// The real I/O space of the MCU.
#[cfg(target_arch = "avr")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Mmio;

#[cfg(target_arch = "avr")]
impl Mmio {
    pub const fn new() -> Self {
        Mmio
    }
}

#[cfg(target_arch = "avr")]
impl RegisterBus for Mmio {
    #[inline]
    fn read8(&self, addr: u16) -> u8 {
        unsafe { core::ptr::read_volatile(addr as *const u8) }
    }

    #[inline]
    fn write8(&self, addr: u16, value: u8) {
        unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
    }

    // 16-bit timer registers share one TEMP byte: low byte first on read,
    // high byte first on write, and nothing may interleave.
    fn read16(&self, addr: u16) -> u16 {
        avr_device::interrupt::free(|_| unsafe {
            let lo = core::ptr::read_volatile(addr as *const u8);
            let hi = core::ptr::read_volatile((addr + 1) as *const u8);
            u16::from_le_bytes([lo, hi])
        })
    }

    fn write16(&self, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        avr_device::interrupt::free(|_| unsafe {
            core::ptr::write_volatile((addr + 1) as *mut u8, hi);
            core::ptr::write_volatile(addr as *mut u8, lo);
        })
    }
}

/// Size of the simulated register space, enough for the whole extended I/O
/// area of the ATmega32U4 timers and ports.
pub const REGISTER_FILE_SIZE: usize = 0x100;

/// RAM-backed register space with the AVR little-endian layout.
///
/// Counters do not advance on their own; tests move them with
/// [`RegisterFile::write16`] to mimic the hardware.
pub struct RegisterFile {
    cells: [Cell<u8>; REGISTER_FILE_SIZE],
}

impl RegisterFile {
    pub const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const ZERO: Cell<u8> = Cell::new(0);
        Self {
            cells: [ZERO; REGISTER_FILE_SIZE],
        }
    }

    /// Copy of every register, for before/after comparisons
    pub fn snapshot(&self) -> [u8; REGISTER_FILE_SIZE] {
        let mut out = [0u8; REGISTER_FILE_SIZE];
        for (dst, cell) in out.iter_mut().zip(self.cells.iter()) {
            *dst = cell.get();
        }
        out
    }

    fn cell(&self, addr: u16) -> &Cell<u8> {
        &self.cells[usize::from(addr)]
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for RegisterFile {
    fn read8(&self, addr: u16) -> u8 {
        self.cell(addr).get()
    }

    fn write8(&self, addr: u16, value: u8) {
        self.cell(addr).set(value);
    }

    fn read16(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read8(addr), self.read8(addr + 1)])
    }

    fn write16(&self, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write8(addr + 1, hi);
        self.write8(addr, lo);
    }
}
