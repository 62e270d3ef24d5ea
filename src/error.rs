//! Error values reported by the timer and PWM operations

use core::fmt;

/// Reasons a timer reconfiguration was refused.
///
/// Every variant is raised before any register is written, so a failed call
/// leaves the timer exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmError {
    /// Requested frequency lies outside the band the timer width supports
    FrequencyOutOfRange { requested: u32, min: u32, max: u32 },
    /// No prescaler in the timer's table yields a usable top value
    Unreachable { requested: u32 },
    /// Selector is not an index of the timer's prescaler table
    InvalidPrescaler { selector: u8 },
    /// Top value does not fit the timer's counter width
    TopOutOfRange { top: u32, max: u32 },
    /// The pin is not connected to any timer channel
    NotOnTimer,
    /// The pin belongs to the timer that keeps system time
    ReservedTimer,
}

impl fmt::Display for PwmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PwmError::FrequencyOutOfRange { requested, min, max } => {
                write!(f, "{}Hz is outside {}..={}Hz", requested, min, max)
            }
            PwmError::Unreachable { requested } => {
                write!(f, "no prescaler can produce {}Hz", requested)
            }
            PwmError::InvalidPrescaler { selector } => {
                write!(f, "prescaler selector {} not in table", selector)
            }
            PwmError::TopOutOfRange { top, max } => write!(f, "top {} exceeds {}", top, max),
            PwmError::NotOnTimer => f.write_str("pin has no timer channel"),
            PwmError::ReservedTimer => f.write_str("pin is on the timekeeping timer"),
        }
    }
}

impl ufmt::uDisplay for PwmError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        match *self {
            PwmError::FrequencyOutOfRange { requested, min, max } => {
                ufmt::uwrite!(f, "{}Hz is outside {}..={}Hz", requested, min, max)
            }
            PwmError::Unreachable { requested } => {
                ufmt::uwrite!(f, "no prescaler can produce {}Hz", requested)
            }
            PwmError::InvalidPrescaler { selector } => {
                ufmt::uwrite!(f, "prescaler selector {} not in table", selector)
            }
            PwmError::TopOutOfRange { top, max } => ufmt::uwrite!(f, "top {} exceeds {}", top, max),
            PwmError::NotOnTimer => f.write_str("pin has no timer channel"),
            PwmError::ReservedTimer => f.write_str("pin is on the timekeeping timer"),
        }
    }
}
