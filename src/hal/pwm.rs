//! PWM channels and duty cycle output
//!
//! Every compare output is described by a [`ChannelDescriptor`]: where its
//! timer keeps top, which compare register sets the duty, and which bit
//! connects the compare unit to the pin. Duty writes scale into the live top
//! of the owning timer, so they stay proportional across frequency changes.

use embedded_hal::digital::v2::OutputPin;

use super::chip;
use super::register::RegisterBus;
use super::timer::{bit_depth, Narrow, Timer, TimerId, Wide, TIMER0, TIMER1, TIMER3};
use crate::config;
use crate::error::PwmError;

/// Compare output a pin is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TimerChannel {
    NotOnTimer = 0,
    Timer0A,
    Timer0B,
    Timer1A,
    Timer1B,
    Timer1C,
    Timer3A,
    Timer3B,
    Timer3C,
}

impl TimerChannel {
    /// Timer that drives this channel
    pub const fn timer(self) -> Option<TimerId> {
        match self {
            TimerChannel::NotOnTimer => None,
            TimerChannel::Timer0A | TimerChannel::Timer0B => Some(TimerId::Timer0),
            TimerChannel::Timer1A | TimerChannel::Timer1B | TimerChannel::Timer1C => {
                Some(TimerId::Timer1)
            }
            TimerChannel::Timer3A | TimerChannel::Timer3B | TimerChannel::Timer3C => {
                Some(TimerId::Timer3)
            }
        }
    }

    #[inline]
    pub fn descriptor(self) -> &'static ChannelDescriptor {
        &CHANNELS[self as usize]
    }
}

/// Registers behind one compare output.
///
/// An all-zero descriptor marks a channel that cannot do PWM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub top_reg: u16,
    pub channel_reg: u16,
    pub connect_reg: u16,
    pub connect_bit: u8,
    pub wide: bool,
}

impl ChannelDescriptor {
    pub const NONE: Self = Self {
        top_reg: 0,
        channel_reg: 0,
        connect_reg: 0,
        connect_bit: 0,
        wide: false,
    };

    const fn narrow(top_reg: u16, channel_reg: u16, connect_reg: u16, connect_bit: u8) -> Self {
        Self { top_reg, channel_reg, connect_reg, connect_bit, wide: false }
    }

    const fn wide(top_reg: u16, channel_reg: u16, connect_reg: u16, connect_bit: u8) -> Self {
        Self { top_reg, channel_reg, connect_reg, connect_bit, wide: true }
    }

    #[inline]
    pub const fn is_usable(&self) -> bool {
        self.channel_reg != 0
    }

    fn live_top<B: RegisterBus>(&self, bus: &B) -> u16 {
        if self.wide {
            bus.read16(self.top_reg)
        } else {
            u16::from(bus.read8(self.top_reg))
        }
    }

    fn write_compare<B: RegisterBus>(&self, bus: &B, value: u16) {
        if self.wide {
            bus.write16(self.channel_reg, value);
        } else {
            bus.write8(self.channel_reg, value as u8);
        }
    }
}

/// Indexed by [`TimerChannel`]
pub static CHANNELS: [ChannelDescriptor; 9] = [
    // NotOnTimer
    ChannelDescriptor::NONE,
    // Timer0A: OCR0A holds top once timer 0 runs frequency controlled
    ChannelDescriptor::NONE,
    ChannelDescriptor::narrow(chip::OCR0A, chip::OCR0B, chip::TCCR0A, chip::COMB1),
    ChannelDescriptor::wide(chip::ICR1, chip::OCR1A, chip::TCCR1A, chip::COMA1),
    ChannelDescriptor::wide(chip::ICR1, chip::OCR1B, chip::TCCR1A, chip::COMB1),
    ChannelDescriptor::wide(chip::ICR1, chip::OCR1C, chip::TCCR1A, chip::COMC1),
    ChannelDescriptor::wide(chip::ICR3, chip::OCR3A, chip::TCCR3A, chip::COMA1),
    ChannelDescriptor::wide(chip::ICR3, chip::OCR3B, chip::TCCR3A, chip::COMB1),
    ChannelDescriptor::wide(chip::ICR3, chip::OCR3C, chip::TCCR3A, chip::COMC1),
];

/// Scale `value` out of `range_max` onto `0..=top`
#[inline]
pub const fn scale_duty(value: u16, range_max: u16, top: u16) -> u16 {
    ((value as u32 * top as u32) / range_max as u32) as u16
}

/// Frequency and duty control for all timers of the chip
pub struct Pwm<B> {
    bus: B,
    timer0: Timer<Narrow>,
    timer1: Timer<Wide>,
    timer3: Timer<Wide>,
}

impl<B: RegisterBus> Pwm<B> {
    pub fn new(bus: B) -> Self {
        Self::with_clock(bus, config::CPU_FREQ_HZ)
    }

    pub fn with_clock(bus: B, clock_hz: u32) -> Self {
        Self {
            bus,
            timer0: TIMER0.with_clock(clock_hz),
            timer1: TIMER1.with_clock(clock_hz),
            timer3: TIMER3.with_clock(clock_hz),
        }
    }

    #[inline]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn free(self) -> B {
        self.bus
    }

    #[inline]
    pub fn timer0(&self) -> &Timer<Narrow> {
        &self.timer0
    }

    #[inline]
    pub fn timer1(&self) -> &Timer<Wide> {
        &self.timer1
    }

    #[inline]
    pub fn timer3(&self) -> &Timer<Wide> {
        &self.timer3
    }

    /// Write an 8-bit duty cycle, 0 and 255 drive the pin statically.
    pub fn write_duty<P: OutputPin>(
        &self,
        pin: &mut P,
        channel: TimerChannel,
        value: u8,
    ) -> Result<(), P::Error> {
        self.write_scaled(pin, channel, u16::from(value), u16::from(u8::MAX))
    }

    /// Write a 16-bit duty cycle, 0 and 65535 drive the pin statically.
    pub fn write_duty_hr<P: OutputPin>(
        &self,
        pin: &mut P,
        channel: TimerChannel,
        value: u16,
    ) -> Result<(), P::Error> {
        self.write_scaled(pin, channel, value, u16::MAX)
    }

    fn write_scaled<P: OutputPin>(
        &self,
        pin: &mut P,
        channel: TimerChannel,
        value: u16,
        range_max: u16,
    ) -> Result<(), P::Error> {
        let td = channel.descriptor();

        // 0% and 100% are not exact through the compare unit
        if value == 0 {
            self.disconnect(td);
            return pin.set_low();
        }
        if value == range_max {
            self.disconnect(td);
            return pin.set_high();
        }

        // pins without a usable compare unit are valid pins, just not PWM ones
        if td.is_usable() {
            self.bus.set_bit(td.connect_reg, td.connect_bit);
            let top = td.live_top(&self.bus);
            td.write_compare(&self.bus, scale_duty(value, range_max, top));
        }
        Ok(())
    }

    // The compare unit overrides the port bit while connected
    fn disconnect(&self, td: &ChannelDescriptor) {
        if td.is_usable() {
            self.bus.clear_bit(td.connect_reg, td.connect_bit);
        }
    }

    /// Duty cycle resolution of a channel in bits, 0 if it cannot do PWM
    pub fn pin_resolution(&self, channel: TimerChannel) -> f32 {
        let td = channel.descriptor();
        if !td.is_usable() {
            return 0.0;
        }
        bit_depth(td.live_top(&self.bus))
    }

    /// Retune whichever timer drives `channel`.
    ///
    /// Every channel of that timer follows. Channels that cannot do PWM,
    /// timer 0 channel A included, are refused without touching any timer.
    pub fn set_pin_frequency(&self, channel: TimerChannel, frequency: u32) -> Result<(), PwmError> {
        if !channel.descriptor().is_usable() {
            return Err(PwmError::NotOnTimer);
        }
        match channel.timer() {
            Some(TimerId::Timer0) => self.timer0.set_frequency(&self.bus, frequency).map(drop),
            Some(TimerId::Timer1) => self.timer1.set_frequency(&self.bus, frequency).map(drop),
            Some(TimerId::Timer3) => self.timer3.set_frequency(&self.bus, frequency).map(drop),
            None => Err(PwmError::NotOnTimer),
        }
    }

    /// Like [`Pwm::set_pin_frequency`] but never touches timer 0.
    pub fn set_pin_frequency_safe(&self, channel: TimerChannel, frequency: u32) -> Result<(), PwmError> {
        match channel.timer() {
            Some(TimerId::Timer0) if channel.descriptor().is_usable() => Err(PwmError::ReservedTimer),
            _ => self.set_pin_frequency(channel, frequency),
        }
    }

    /// Initialize every timer for frequency controlled PWM.
    ///
    /// Timer 0 stops keeping system time.
    pub fn init_timers(&self, min_frequency: u32) -> Result<(), PwmError> {
        self.timer0.initialize(&self.bus, min_frequency)?;
        self.init_timers_safe(min_frequency)
    }

    /// Initialize every timer except timer 0
    pub fn init_timers_safe(&self, min_frequency: u32) -> Result<(), PwmError> {
        self.timer1.initialize(&self.bus, min_frequency)?;
        self.timer3.initialize(&self.bus, min_frequency)
    }

    /// Bind an output pin to its compare channel
    pub fn bind<P: OutputPin>(&self, pin: P, channel: TimerChannel) -> PwmOutput<'_, B, P> {
        PwmOutput {
            pwm: self,
            pin,
            channel,
            duty: 0,
        }
    }
}

/// An output pin driven by its timer channel, as an `embedded_hal::PwmPin`.
///
/// Duty is on the full 16-bit scale whatever the timer width.
pub struct PwmOutput<'a, B, P> {
    pwm: &'a Pwm<B>,
    pin: P,
    channel: TimerChannel,
    duty: u16,
}

impl<'a, B: RegisterBus, P: OutputPin> PwmOutput<'a, B, P> {
    #[inline]
    pub fn channel(&self) -> TimerChannel {
        self.channel
    }

    pub fn set_frequency(&self, frequency: u32) -> Result<(), PwmError> {
        self.pwm.set_pin_frequency(self.channel, frequency)
    }

    pub fn resolution(&self) -> f32 {
        self.pwm.pin_resolution(self.channel)
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<'a, B: RegisterBus, P: OutputPin> embedded_hal::PwmPin for PwmOutput<'a, B, P> {
    type Duty = u16;

    fn disable(&mut self) {
        self.pwm.disconnect(self.channel.descriptor());
        self.pin.set_low().ok();
    }

    fn enable(&mut self) {
        self.pwm.write_duty_hr(&mut self.pin, self.channel, self.duty).ok();
    }

    fn get_duty(&self) -> u16 {
        self.duty
    }

    fn get_max_duty(&self) -> u16 {
        u16::MAX
    }

    fn set_duty(&mut self, duty: u16) {
        self.duty = duty;
        self.pwm.write_duty_hr(&mut self.pin, self.channel, duty).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::register::RegisterFile;
    use core::convert::Infallible;

    const CLOCK: u32 = 16_000_000;

    /// Records the last level, enough for checks inside this module
    #[derive(Default)]
    struct Level(Option<bool>);

    impl OutputPin for Level {
        type Error = Infallible;

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0 = Some(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0 = Some(true);
            Ok(())
        }
    }

    #[test]
    fn table_matches_channel_order() {
        assert_eq!(CHANNELS.len(), TimerChannel::Timer3C as usize + 1);
        assert!(!TimerChannel::NotOnTimer.descriptor().is_usable());
        assert!(!TimerChannel::Timer0A.descriptor().is_usable());
        assert_eq!(TimerChannel::Timer0B.descriptor().channel_reg, chip::OCR0B);
        assert_eq!(TimerChannel::Timer1C.descriptor().channel_reg, chip::OCR1C);
        assert_eq!(TimerChannel::Timer3A.descriptor().top_reg, chip::ICR3);
    }

    #[test]
    fn descriptors_follow_their_timer() {
        for (i, td) in CHANNELS.iter().enumerate().filter(|(_, td)| td.is_usable()) {
            assert_ne!(td.top_reg, 0, "channel {}", i);
            assert_ne!(td.connect_reg, 0, "channel {}", i);
        }
        assert!(TimerChannel::Timer1B.descriptor().wide);
        assert!(!TimerChannel::Timer0B.descriptor().wide);
        assert_eq!(TimerChannel::Timer0B.timer(), Some(TimerId::Timer0));
        assert_eq!(TimerChannel::Timer3C.timer(), Some(TimerId::Timer3));
        assert_eq!(TimerChannel::NotOnTimer.timer(), None);
    }

    #[test]
    fn scaling_is_truncating_and_monotone() {
        assert_eq!(scale_duty(128, 255, 16326), 8195);
        assert_eq!(scale_duty(1, 255, 125), 0);
        assert_eq!(scale_duty(254, 255, 125), 124);
        assert_eq!(scale_duty(65534, 65535, 65535), 65534);

        let mut last = 0;
        for value in 1..u8::MAX {
            let scaled = scale_duty(u16::from(value), 255, 16326);
            assert!(scaled >= last);
            last = scaled;
        }
    }

    #[test]
    fn interior_duty_scales_into_live_top() {
        let regs = RegisterFile::new();
        let pwm = Pwm::with_clock(&regs, CLOCK);
        pwm.set_pin_frequency(TimerChannel::Timer1A, 490).unwrap();

        let mut pin = Level::default();
        pwm.write_duty(&mut pin, TimerChannel::Timer1A, 128).unwrap();

        assert_eq!(pin.0, None);
        assert_eq!(regs.read16(chip::OCR1A), 8195);
        assert_eq!(regs.read8(chip::TCCR1A) & (1 << chip::COMA1), 1 << chip::COMA1);
    }

    #[test]
    fn duty_follows_a_frequency_change() {
        let regs = RegisterFile::new();
        let pwm = Pwm::with_clock(&regs, CLOCK);
        let mut pin = Level::default();

        pwm.set_pin_frequency(TimerChannel::Timer3A, 490).unwrap();
        pwm.write_duty_hr(&mut pin, TimerChannel::Timer3A, 32768).unwrap();
        assert_eq!(regs.read16(chip::OCR3A), 8163);

        pwm.set_pin_frequency(TimerChannel::Timer3A, 20_000).unwrap();
        pwm.write_duty_hr(&mut pin, TimerChannel::Timer3A, 32768).unwrap();
        assert_eq!(regs.read16(chip::OCR3A), 200);
    }

    #[test]
    fn narrow_channel_uses_byte_access() {
        let regs = RegisterFile::new();
        let pwm = Pwm::with_clock(&regs, CLOCK);
        pwm.set_pin_frequency(TimerChannel::Timer0B, 1000).unwrap();
        regs.write8(chip::OCR0B + 1, 0xEE);

        let mut pin = Level::default();
        pwm.write_duty(&mut pin, TimerChannel::Timer0B, 51).unwrap();

        assert_eq!(regs.read8(chip::OCR0B), 25);
        assert_eq!(regs.read8(chip::OCR0B + 1), 0xEE);
        assert_eq!(regs.read8(chip::TCCR0A) & (1 << chip::COMB1), 1 << chip::COMB1);
    }

    #[test]
    fn boundaries_drive_the_pin_and_release_the_compare_unit() {
        let regs = RegisterFile::new();
        let pwm = Pwm::with_clock(&regs, CLOCK);
        let mut pin = Level::default();
        pwm.set_pin_frequency(TimerChannel::Timer1B, 490).unwrap();
        pwm.write_duty(&mut pin, TimerChannel::Timer1B, 100).unwrap();
        let compare = regs.read16(chip::OCR1B);

        pwm.write_duty(&mut pin, TimerChannel::Timer1B, 255).unwrap();
        assert_eq!(pin.0, Some(true));
        assert_eq!(regs.read8(chip::TCCR1A) & (1 << chip::COMB1), 0);
        assert_eq!(regs.read16(chip::OCR1B), compare);

        pwm.write_duty_hr(&mut pin, TimerChannel::Timer1B, 0).unwrap();
        assert_eq!(pin.0, Some(false));
    }

    #[test]
    fn unusable_channel_writes_no_register() {
        let regs = RegisterFile::new();
        let pwm = Pwm::with_clock(&regs, CLOCK);
        pwm.init_timers(490).unwrap();
        pwm.set_pin_frequency(TimerChannel::Timer0B, 490).unwrap();
        let before = regs.snapshot();

        let mut pin = Level::default();
        for channel in [TimerChannel::NotOnTimer, TimerChannel::Timer0A] {
            pwm.write_duty(&mut pin, channel, 0).unwrap();
            pwm.write_duty(&mut pin, channel, 77).unwrap();
            pwm.write_duty_hr(&mut pin, channel, 65535).unwrap();
            assert_eq!(pwm.pin_resolution(channel), 0.0);
        }

        assert_eq!(regs.snapshot(), before);
        assert_eq!(pin.0, Some(true));
    }

    #[test]
    fn pin_resolution_reads_live_top() {
        let regs = RegisterFile::new();
        let pwm = Pwm::with_clock(&regs, CLOCK);

        pwm.timer1().set_top(&regs, 255).unwrap();
        assert!((pwm.pin_resolution(TimerChannel::Timer1C) - 8.0).abs() < 1e-3);

        pwm.timer0().set_top(&regs, 127).unwrap();
        assert!((pwm.pin_resolution(TimerChannel::Timer0B) - 7.0).abs() < 1e-3);
    }

    #[test]
    fn safe_dispatch_spares_timer0() {
        let regs = RegisterFile::new();
        let pwm = Pwm::with_clock(&regs, CLOCK);

        assert_eq!(
            pwm.set_pin_frequency_safe(TimerChannel::Timer0B, 1000),
            Err(PwmError::ReservedTimer)
        );
        assert_eq!(regs.snapshot(), RegisterFile::new().snapshot());

        pwm.set_pin_frequency_safe(TimerChannel::Timer1A, 1000).unwrap();
        assert_eq!(pwm.timer1().frequency(&regs), 1000);
        assert_eq!(
            pwm.set_pin_frequency(TimerChannel::NotOnTimer, 1000),
            Err(PwmError::NotOnTimer)
        );
    }

    #[test]
    fn timer0_channel_a_cannot_retune_timer0() {
        let regs = RegisterFile::new();
        let pwm = Pwm::with_clock(&regs, CLOCK);
        let before = regs.snapshot();

        assert_eq!(
            pwm.set_pin_frequency(TimerChannel::Timer0A, 1000),
            Err(PwmError::NotOnTimer)
        );
        assert_eq!(
            pwm.set_pin_frequency_safe(TimerChannel::Timer0A, 1000),
            Err(PwmError::NotOnTimer)
        );
        assert_eq!(regs.snapshot(), before);
        assert_eq!(regs.read8(chip::OCR0A), 0);
    }

    #[test]
    fn bus_is_shared_and_released() {
        let regs = RegisterFile::new();
        let pwm = Pwm::with_clock(&regs, CLOCK);
        pwm.set_pin_frequency(TimerChannel::Timer3B, 20_000).unwrap();

        assert_eq!(pwm.bus().read16(chip::ICR3), 400);
        let bus = pwm.free();
        assert!(core::ptr::eq(bus, &regs));
    }

    #[test]
    fn pwm_pin_round_trip() {
        use embedded_hal::PwmPin;

        let regs = RegisterFile::new();
        let pwm = Pwm::with_clock(&regs, CLOCK);
        pwm.set_pin_frequency(TimerChannel::Timer1A, 20_000).unwrap();

        let mut out = pwm.bind(Level::default(), TimerChannel::Timer1A);
        assert_eq!(out.channel(), TimerChannel::Timer1A);
        assert_eq!(out.get_max_duty(), u16::MAX);
        let coarse = out.resolution();
        assert!(coarse > 8.6 && coarse < 8.7, "{}", coarse);

        out.set_duty(u16::MAX / 4);
        assert_eq!(out.get_duty(), 16383);
        assert_eq!(regs.read16(chip::OCR1A), 99);

        out.disable();
        assert_eq!(regs.read8(chip::TCCR1A) & (1 << chip::COMA1), 0);
        out.enable();
        assert_eq!(regs.read8(chip::TCCR1A) & (1 << chip::COMA1), 1 << chip::COMA1);

        // duty follows the new top on the next write
        out.set_frequency(490).unwrap();
        assert!(out.resolution() > 13.99);
        out.set_duty(u16::MAX / 4);
        assert_eq!(regs.read16(chip::OCR1A), 4081);
        assert!(out.set_frequency(3_000_000).is_err());

        assert_eq!(out.release().0, Some(false));
    }
}
