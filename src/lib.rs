//! Frequency controlled hardware PWM for the ATmega32U4 timers
//!
//! Timers 1 and 3 (16-bit) and timer 0 (8-bit) are switched to a PWM mode
//! with a programmable top, which lets each run at a caller chosen frequency.
//! Channels on a timer share its frequency and get their own duty cycle.
//!
//! All register access goes through [`hal::RegisterBus`], so the same code
//! drives the MCU (`Mmio`) and a host-side [`hal::RegisterFile`].
#![cfg_attr(not(test), no_std)]

#[cfg(not(feature = "atmega32u4"))]
compile_error!("enable a chip feature, only `atmega32u4` is supported");

pub mod board;
pub mod config;
pub mod error;
pub mod hal;

pub use error::PwmError;
pub use hal::{Pwm, TimerChannel};
