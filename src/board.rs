//! Arduino Leonardo pinout
//!
//! Digital pin numbers as printed on the board, mapped to their port bit and
//! compare channel. Pins 6 and 13 sit on timer 4, which is not supported, and
//! report [`TimerChannel::NotOnTimer`].

use crate::hal::gpio::{Input, Pin, Port};
use crate::hal::pwm::TimerChannel;
use crate::hal::register::RegisterBus;

const PINS: [(Port, u8); 14] = [
    (Port::D, 2),
    (Port::D, 3),
    (Port::D, 1),
    (Port::D, 0),
    (Port::D, 4),
    (Port::C, 6),
    (Port::D, 7),
    (Port::E, 6),
    (Port::B, 4),
    (Port::B, 5),
    (Port::B, 6),
    (Port::B, 7),
    (Port::D, 6),
    (Port::C, 7),
];

/// Compare channel behind a digital pin
pub const fn digital_pin_to_timer(pin: u8) -> TimerChannel {
    match pin {
        3 => TimerChannel::Timer0B,
        5 => TimerChannel::Timer3A,
        9 => TimerChannel::Timer1A,
        10 => TimerChannel::Timer1B,
        // shared with OC1C, but timer 0 owns it by default
        11 => TimerChannel::Timer0A,
        _ => TimerChannel::NotOnTimer,
    }
}

/// Port and bit of a digital pin
pub fn digital_pin_to_port(pin: u8) -> Option<(Port, u8)> {
    PINS.get(usize::from(pin)).copied()
}

/// Digital pin `pin` as a GPIO
pub fn pin<B: RegisterBus>(bus: B, pin: u8) -> Option<Pin<B, Input>> {
    let (port, bit) = digital_pin_to_port(pin)?;
    Some(Pin::new(bus, port, bit))
}
