//! Configuration constants for the PWM timers

/// Reference clock feeding the timer prescalers, in Hz.
///
/// Set at build time through `AVR_CPU_FREQUENCY_HZ` (defaults to 16MHz).
pub const CPU_FREQ_HZ: u32 = parse_hz(env!("AVR_CPU_FREQUENCY_HZ"));

/// Highest frequency any timer will be configured for, regardless of width
pub const MAX_FREQUENCY_HZ: u32 = 2_000_000;

/// Lowest frequency a 16-bit timer accepts
pub const MIN_FREQUENCY_WIDE_HZ: u32 = 1;

/// Lowest frequency an 8-bit timer accepts
pub const MIN_FREQUENCY_NARROW_HZ: u32 = 31;

const fn parse_hz(s: &str) -> u32 {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        panic!("empty clock frequency");
    }

    let mut hz: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        if !digit.is_ascii_digit() {
            panic!("clock frequency must be decimal");
        }
        hz = match hz.checked_mul(10) {
            Some(v) => v,
            None => panic!("clock frequency overflows u32"),
        };
        hz = match hz.checked_add((digit - b'0') as u32) {
            Some(v) => v,
            None => panic!("clock frequency overflows u32"),
        };
        i += 1;
    }
    hz
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_clock() {
        assert_eq!(parse_hz("16000000"), 16_000_000);
        assert_eq!(parse_hz("8000000"), 8_000_000);
        assert_eq!(parse_hz("1"), 1);
    }

    #[test]
    #[should_panic]
    fn rejects_non_digits() {
        parse_hz("16MHz");
    }

    #[test]
    fn band_is_ordered() {
        assert!(MIN_FREQUENCY_WIDE_HZ < MIN_FREQUENCY_NARROW_HZ);
        assert!(MIN_FREQUENCY_NARROW_HZ < MAX_FREQUENCY_HZ);
        assert!(CPU_FREQ_HZ > 0);
    }
}
