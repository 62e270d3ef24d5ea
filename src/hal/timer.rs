//! Frequency control for the 8 and 16-bit timers
//!
//! Timers run in a phase correct mode with a programmable top, so the output
//! frequency is `clock / (2 * prescaler * top)`. Picking a frequency means
//! picking the smallest prescaler that still lets top fit in the counter,
//! which keeps top (and with it the duty resolution) as large as possible.
//!
//! Nothing is cached: prescaler and top live in the timer registers and are
//! read back from there every time.

use core::marker::PhantomData;

use num_traits::Float;

use super::chip;
use super::prescaler::{PrescalerTable, STANDARD};
use super::register::RegisterBus;
use crate::config;
use crate::error::PwmError;

mod sealed {
    pub trait Sealed {}
}

/// Counter width of a timer and everything that follows from it.
pub trait Width: sealed::Sealed {
    const BITS: u8;
    const MAX_TOP: u32;
    const MIN_FREQUENCY_HZ: u32;
    /// Waveform generation mode set by [`Timer::initialize`]
    const WGM: u8;
    /// Where WGMn3:2 sit in TCCRnB
    const WGM_B_BITS: u8;
    /// Whether a new top pulls a counter that is already past it back down
    const CLAMPS_COUNTER: bool;

    const TCCRA: u16;
    const TCCRB: u16;
    const TCNT: u16;
    const TOP: u16;

    fn read<B: RegisterBus>(bus: &B, addr: u16) -> u16;
    fn write<B: RegisterBus>(bus: &B, addr: u16, value: u16);
}

/// 16-bit timer, top in ICRn
#[derive(Debug, Clone, Copy)]
pub struct Wide;

/// 8-bit timer, top in OCRnA
#[derive(Debug, Clone, Copy)]
pub struct Narrow;

impl sealed::Sealed for Wide {}
impl sealed::Sealed for Narrow {}

impl Width for Wide {
    const BITS: u8 = 16;
    const MAX_TOP: u32 = u16::MAX as u32;
    const MIN_FREQUENCY_HZ: u32 = config::MIN_FREQUENCY_WIDE_HZ;
    // phase and frequency correct, TOP = ICRn
    const WGM: u8 = 8;
    const WGM_B_BITS: u8 = 0b0001_1000;
    const CLAMPS_COUNTER: bool = true;

    const TCCRA: u16 = chip::TCCRA_16;
    const TCCRB: u16 = chip::TCCRB_16;
    const TCNT: u16 = chip::TCNT_16;
    const TOP: u16 = chip::ICR_16;

    #[inline]
    fn read<B: RegisterBus>(bus: &B, addr: u16) -> u16 {
        bus.read16(addr)
    }

    #[inline]
    fn write<B: RegisterBus>(bus: &B, addr: u16, value: u16) {
        bus.write16(addr, value)
    }
}

impl Width for Narrow {
    const BITS: u8 = 8;
    const MAX_TOP: u32 = u8::MAX as u32;
    const MIN_FREQUENCY_HZ: u32 = config::MIN_FREQUENCY_NARROW_HZ;
    // phase correct, TOP = OCRnA
    const WGM: u8 = 5;
    const WGM_B_BITS: u8 = 0b0000_1000;
    // TODO: clamp TCNTn as well once it is confirmed the missing clamp glitches on 8-bit timers
    const CLAMPS_COUNTER: bool = false;

    const TCCRA: u16 = chip::TCCRA_8;
    const TCCRB: u16 = chip::TCCRB_8;
    const TCNT: u16 = chip::TCNT_8;
    const TOP: u16 = chip::OCRA_8;

    #[inline]
    fn read<B: RegisterBus>(bus: &B, addr: u16) -> u16 {
        u16::from(bus.read8(addr))
    }

    #[inline]
    fn write<B: RegisterBus>(bus: &B, addr: u16, value: u16) {
        bus.write8(addr, value as u8)
    }
}

/// The physical timers of the ATmega32U4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerId {
    Timer0,
    Timer1,
    Timer3,
}

/// Prescaler and top chosen for a frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Setting {
    pub selector: u8,
    pub divisor: u16,
    pub top: u16,
}

/// A timer block: where its registers are and how it decodes its prescaler.
#[derive(Debug, Clone, Copy)]
pub struct Timer<W> {
    offset: u16,
    prescalers: PrescalerTable,
    clock_hz: u32,
    overflow_irq: Option<(u16, u8)>,
    _width: PhantomData<W>,
}

/// 8-bit timer 0, also the system timekeeping timer
pub const TIMER0: Timer<Narrow> = Timer::new(chip::TIMER0_OFFSET, STANDARD)
    .with_overflow_interrupt(chip::TIMSK0, chip::TOIE0);

/// 16-bit timer 1
pub const TIMER1: Timer<Wide> = Timer::new(chip::TIMER1_OFFSET, STANDARD);

/// 16-bit timer 3
pub const TIMER3: Timer<Wide> = Timer::new(chip::TIMER3_OFFSET, STANDARD);

impl<W: Width> Timer<W> {
    /// Timer whose registers sit `offset` bytes after the first timer of its
    /// width, clocked from [`config::CPU_FREQ_HZ`].
    pub const fn new(offset: u16, prescalers: PrescalerTable) -> Self {
        Self {
            offset,
            prescalers,
            clock_hz: config::CPU_FREQ_HZ,
            overflow_irq: None,
            _width: PhantomData,
        }
    }

    /// Same timer fed by a different reference clock
    pub const fn with_clock(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    /// Overflow interrupt enable bit to clear when the timer is taken over
    /// for PWM.
    pub const fn with_overflow_interrupt(mut self, mask_reg: u16, bit: u8) -> Self {
        self.overflow_irq = Some((mask_reg, bit));
        self
    }

    #[inline]
    pub const fn offset(&self) -> u16 {
        self.offset
    }

    #[inline]
    pub const fn prescalers(&self) -> PrescalerTable {
        self.prescalers
    }

    #[inline]
    pub const fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    #[inline]
    fn tccra(&self) -> u16 {
        W::TCCRA + self.offset
    }

    #[inline]
    fn tccrb(&self) -> u16 {
        W::TCCRB + self.offset
    }

    #[inline]
    fn tcnt(&self) -> u16 {
        W::TCNT + self.offset
    }

    #[inline]
    fn top_reg(&self) -> u16 {
        W::TOP + self.offset
    }

    /// Inclusive range of frequencies this timer accepts
    pub const fn band(&self) -> (u32, u32) {
        (W::MIN_FREQUENCY_HZ, config::MAX_FREQUENCY_HZ)
    }

    fn check_band(&self, f: u32) -> Result<(), PwmError> {
        let (min, max) = self.band();
        if f < min || f > max {
            #[cfg(feature = "defmt")]
            defmt::warn!("timer@{=u16:#x}: {=u32}Hz outside {=u32}..={=u32}Hz", self.offset, f, min, max);
            return Err(PwmError::FrequencyOutOfRange { requested: f, min, max });
        }
        Ok(())
    }

    fn top_for(&self, f: u32, divisor: u16) -> u64 {
        u64::from(self.clock_hz) / (2 * u64::from(f) * u64::from(divisor))
    }

    /// Prescaler and top that produce `f`, without touching the hardware.
    ///
    /// Starts from the first divisor not below the ideal one and moves up the
    /// table while top still overflows the counter.
    pub fn settings_for(&self, f: u32) -> Result<Setting, PwmError> {
        self.check_band(f)?;
        let unreachable = PwmError::Unreachable { requested: f };

        let ideal = u64::from(self.clock_hz) / (2 * u64::from(f) * u64::from(W::MAX_TOP));
        let mut selector = self.prescalers.first_at_least(ideal).ok_or(unreachable)?;

        loop {
            let divisor = self.prescalers.divisor(selector).ok_or(unreachable)?;
            let top = self.top_for(f, divisor);

            if top <= u64::from(W::MAX_TOP) {
                // a larger divisor only shrinks top further
                if top == 0 {
                    return Err(unreachable);
                }
                return Ok(Setting {
                    selector,
                    divisor,
                    top: top as u16,
                });
            }

            selector = self.prescalers.next(selector).ok_or(unreachable)?;
        }
    }

    /// Output frequency in Hz, 0 while the timer is stopped or has no top.
    pub fn frequency<B: RegisterBus>(&self, bus: &B) -> u32 {
        let top = u64::from(self.top(bus));
        let divisor = u64::from(self.prescaler(bus));
        if top == 0 || divisor == 0 {
            return 0;
        }
        (u64::from(self.clock_hz) / (2 * top * divisor)) as u32
    }

    /// Retune the timer to `f`, choosing prescaler and top.
    ///
    /// Out-of-band requests are rejected before any register is written.
    pub fn set_frequency<B: RegisterBus>(&self, bus: &B, f: u32) -> Result<Setting, PwmError> {
        let setting = self.settings_for(f)?;

        W::write(bus, self.top_reg(), setting.top);
        bus.modify8(self.tccrb(), chip::CS_MASK, setting.selector);
        if W::CLAMPS_COUNTER {
            self.clamp_counter(bus, setting.top);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "timer@{=u16:#x}: {=u32}Hz -> /{=u16} top {=u16}",
            self.offset,
            f,
            setting.divisor,
            setting.top
        );
        Ok(setting)
    }

    /// Retune the timer to `f` keeping the prescaler it already runs with.
    ///
    /// Only top changes, so this fails when the current prescaler cannot
    /// reach `f` within the counter width.
    pub fn set_top_for<B: RegisterBus>(&self, bus: &B, f: u32) -> Result<u16, PwmError> {
        self.check_band(f)?;

        let divisor = self.prescaler(bus);
        if divisor == 0 {
            return Err(PwmError::Unreachable { requested: f });
        }
        let top = self.top_for(f, divisor);
        if top == 0 {
            return Err(PwmError::Unreachable { requested: f });
        }
        if top > u64::from(W::MAX_TOP) {
            return Err(PwmError::TopOutOfRange {
                top: top as u32,
                max: W::MAX_TOP,
            });
        }

        let top = top as u16;
        W::write(bus, self.top_reg(), top);
        if W::CLAMPS_COUNTER {
            self.clamp_counter(bus, top);
        }
        Ok(top)
    }

    // A counter already beyond the new top would run a full overflow cycle
    // before the compare logic catches up.
    fn clamp_counter<B: RegisterBus>(&self, bus: &B, top: u16) {
        if W::read(bus, self.tcnt()) > top {
            W::write(bus, self.tcnt(), top.saturating_sub(1));
        }
    }

    /// Current clock divisor, 0 when stopped or clocked externally
    pub fn prescaler<B: RegisterBus>(&self, bus: &B) -> u16 {
        self.prescalers
            .divisor(self.prescaler_selector(bus))
            .unwrap_or(0)
    }

    /// Raw CSn2:0 value
    pub fn prescaler_selector<B: RegisterBus>(&self, bus: &B) -> u8 {
        bus.read8(self.tccrb()) & chip::CS_MASK
    }

    pub fn set_prescaler<B: RegisterBus, S: Into<u8>>(&self, bus: &B, selector: S) -> Result<(), PwmError> {
        let selector = selector.into();
        if self.prescalers.divisor(selector).is_none() {
            return Err(PwmError::InvalidPrescaler { selector });
        }
        bus.modify8(self.tccrb(), chip::CS_MASK, selector);
        Ok(())
    }

    pub fn top<B: RegisterBus>(&self, bus: &B) -> u16 {
        W::read(bus, self.top_reg())
    }

    pub fn set_top<B: RegisterBus>(&self, bus: &B, top: u16) -> Result<(), PwmError> {
        if u32::from(top) > W::MAX_TOP {
            return Err(PwmError::TopOutOfRange {
                top: u32::from(top),
                max: W::MAX_TOP,
            });
        }
        W::write(bus, self.top_reg(), top);
        Ok(())
    }

    /// Live counter value
    pub fn counter<B: RegisterBus>(&self, bus: &B) -> u16 {
        W::read(bus, self.tcnt())
    }

    /// Effective duty cycle resolution in bits, `log2(top + 1)`
    pub fn resolution<B: RegisterBus>(&self, bus: &B) -> f32 {
        bit_depth(self.top(bus))
    }

    /// Put the timer in its frequency controlled PWM mode and select the
    /// prescaler that can still reach `min_frequency`.
    ///
    /// Top is left alone; follow up with [`Timer::set_frequency`] or
    /// [`Timer::set_top_for`]. On a timer that keeps system time this also
    /// disables its overflow interrupt, which stops the clock.
    pub fn initialize<B: RegisterBus>(&self, bus: &B, min_frequency: u32) -> Result<(), PwmError> {
        let setting = self.settings_for(min_frequency)?;

        bus.modify8(self.tccra(), chip::WGM_A_MASK, W::WGM);
        bus.modify8(self.tccrb(), W::WGM_B_BITS, (W::WGM & 0b1100) << 1);

        // the overflow handler would eat the CPU at high PWM frequencies
        if let Some((mask_reg, bit)) = self.overflow_irq {
            bus.clear_bit(mask_reg, bit);
        }

        bus.modify8(self.tccrb(), chip::CS_MASK, setting.selector);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "timer@{=u16:#x}: {=u8}-bit PWM, min {=u32}Hz, /{=u16}",
            self.offset,
            W::BITS,
            min_frequency,
            setting.divisor
        );
        Ok(())
    }
}

/// `log2(top + 1)`
pub(crate) fn bit_depth(top: u16) -> f32 {
    Float::log2(f32::from(top) + 1.0)
}
