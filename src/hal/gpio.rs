//! Port pins over the register bus
//!
//! Just enough GPIO for PWM pins: direction and static levels. PINx, DDRx and
//! PORTx sit at consecutive addresses for every port.

use core::convert::Infallible;
use core::marker::PhantomData;

use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};

use super::chip;
use super::register::RegisterBus;

pub trait PinMode {}
pub struct Input;
pub struct Output;
impl PinMode for Input {}
impl PinMode for Output {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    B,
    C,
    D,
    E,
    F,
}

impl Port {
    #[inline]
    const fn pin_reg(self) -> u16 {
        match self {
            Port::B => chip::PINB,
            Port::C => chip::PINC,
            Port::D => chip::PIND,
            Port::E => chip::PINE,
            Port::F => chip::PINF,
        }
    }

    #[inline]
    const fn ddr_reg(self) -> u16 {
        self.pin_reg() + 1
    }

    #[inline]
    const fn port_reg(self) -> u16 {
        self.pin_reg() + 2
    }
}

pub struct Pin<B, MODE> {
    bus: B,
    port: Port,
    bit: u8,
    _mode: PhantomData<MODE>,
}

impl<B: RegisterBus> Pin<B, Input> {
    /// Pin `bit` of `port`, as it comes out of reset
    pub fn new(bus: B, port: Port, bit: u8) -> Self {
        debug_assert!(bit < 8);
        Pin {
            bus,
            port,
            bit,
            _mode: PhantomData,
        }
    }
}

impl<B: RegisterBus, MODE> Pin<B, MODE> {
    #[inline]
    pub fn port(&self) -> Port {
        self.port
    }

    #[inline]
    pub fn bit(&self) -> u8 {
        self.bit
    }

    pub fn into_output(self) -> Pin<B, Output> {
        // Set DDRx bit
        self.bus.set_bit(self.port.ddr_reg(), self.bit);
        Pin {
            bus: self.bus,
            port: self.port,
            bit: self.bit,
            _mode: PhantomData,
        }
    }

    pub fn into_input(self) -> Pin<B, Input> {
        // Clear DDRx bit and disable pull-up
        self.bus.clear_bit(self.port.ddr_reg(), self.bit);
        self.bus.clear_bit(self.port.port_reg(), self.bit);
        Pin {
            bus: self.bus,
            port: self.port,
            bit: self.bit,
            _mode: PhantomData,
        }
    }

    #[inline]
    fn level(&self, reg: u16) -> bool {
        self.bus.read8(reg) & (1 << self.bit) != 0
    }
}

impl<B: RegisterBus> OutputPin for Pin<B, Output> {
    type Error = Infallible;

    #[inline]
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.bus.clear_bit(self.port.port_reg(), self.bit);
        Ok(())
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.bus.set_bit(self.port.port_reg(), self.bit);
        Ok(())
    }
}

impl<B: RegisterBus> StatefulOutputPin for Pin<B, Output> {
    #[inline]
    fn is_set_high(&self) -> Result<bool, Infallible> {
        Ok(self.level(self.port.port_reg()))
    }

    #[inline]
    fn is_set_low(&self) -> Result<bool, Infallible> {
        Ok(!self.level(self.port.port_reg()))
    }
}

impl<B: RegisterBus> ToggleableOutputPin for Pin<B, Output> {
    type Error = Infallible;

    // writing 1 to PINx flips PORTx
    #[inline]
    fn toggle(&mut self) -> Result<(), Infallible> {
        self.bus.write8(self.port.pin_reg(), 1 << self.bit);
        Ok(())
    }
}

impl<B: RegisterBus> InputPin for Pin<B, Input> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.level(self.port.pin_reg()))
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(!self.level(self.port.pin_reg()))
    }
}
