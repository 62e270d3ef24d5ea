pub mod chip;
pub mod gpio;
pub mod prescaler;
pub mod pwm;
pub mod register;
pub mod timer;

// Re-export commonly used types
pub use gpio::{Input, Output, Pin, Port};
pub use prescaler::{Prescaler, PrescalerAlt, PrescalerTable};
pub use pwm::{ChannelDescriptor, Pwm, PwmOutput, TimerChannel};
#[cfg(target_arch = "avr")]
pub use register::Mmio;
pub use register::{RegisterBus, RegisterFile};
pub use timer::{Narrow, Setting, Timer, TimerId, Wide, TIMER0, TIMER1, TIMER3};
