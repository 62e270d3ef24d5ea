//! Clock prescaler tables
//!
//! The position of a divisor in its table is the value written to the CSn2:0
//! bits, so the tables double as the decode map. Index 0 is "no clock".

/// Ordered list of clock divisors, indexed by hardware selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrescalerTable {
    divisors: &'static [u16],
}

/// Divisors of timers 0, 1 and 3
pub const STANDARD: PrescalerTable = PrescalerTable::new(&[0, 1, 8, 64, 256, 1024]);

/// Divisors of the asynchronous 8-bit timers, which decode CSn2:0 with two
/// extra steps
pub const ALTERNATE: PrescalerTable = PrescalerTable::new(&[0, 1, 8, 32, 64, 128, 256, 1024]);

impl PrescalerTable {
    pub const fn new(divisors: &'static [u16]) -> Self {
        Self { divisors }
    }

    #[inline]
    pub const fn divisors(&self) -> &'static [u16] {
        self.divisors
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.divisors.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.divisors.is_empty()
    }

    /// Divisor for `selector`, `None` if the table has no such entry
    #[inline]
    pub fn divisor(&self, selector: u8) -> Option<u16> {
        self.divisors.get(usize::from(selector)).copied()
    }

    /// Smallest running divisor `>= ideal`, as a selector.
    ///
    /// Tables are at most eight entries long, a linear scan is all it takes.
    pub fn first_at_least(&self, ideal: u64) -> Option<u8> {
        self.divisors
            .iter()
            .enumerate()
            .skip(1)
            .find(|&(_, &divisor)| u64::from(divisor) >= ideal)
            .map(|(selector, _)| selector as u8)
    }

    /// The selector after `selector`, if the table has one
    #[inline]
    pub fn next(&self, selector: u8) -> Option<u8> {
        let next = selector.checked_add(1)?;
        self.divisor(next).map(|_| next)
    }

    /// Selector of an exact divisor
    pub fn selector_of(&self, divisor: u16) -> Option<u8> {
        self.divisors
            .iter()
            .position(|&d| d == divisor)
            .map(|selector| selector as u8)
    }
}

/// Selectors of the [`STANDARD`] table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Stop = 0,
    Direct = 1,
    Div8 = 2,
    Div64 = 3,
    Div256 = 4,
    Div1024 = 5,
}

/// Selectors of the [`ALTERNATE`] table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PrescalerAlt {
    Stop = 0,
    Direct = 1,
    Div8 = 2,
    Div32 = 3,
    Div64 = 4,
    Div128 = 5,
    Div256 = 6,
    Div1024 = 7,
}

impl From<Prescaler> for u8 {
    fn from(p: Prescaler) -> u8 {
        p as u8
    }
}

impl From<PrescalerAlt> for u8 {
    fn from(p: PrescalerAlt) -> u8 {
        p as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(table: PrescalerTable) {
        let d = table.divisors();
        assert_eq!(d[0], 0, "selector 0 must stop the clock");
        assert!(d.len() <= 8, "CSn2:0 is three bits wide");
        for pair in d[1..].windows(2) {
            assert!(pair[0] < pair[1], "{:?} not ascending", d);
        }
    }

    #[test]
    fn tables_are_strictly_ascending() {
        assert_well_formed(STANDARD);
        assert_well_formed(ALTERNATE);
    }

    #[test]
    fn table_sizes() {
        assert_eq!(STANDARD.len(), 6);
        assert_eq!(ALTERNATE.len(), 8);
        assert!(!STANDARD.is_empty());
        assert!(PrescalerTable::new(&[]).is_empty());
    }

    #[test]
    fn enums_index_their_tables() {
        assert_eq!(STANDARD.divisor(Prescaler::Div64.into()), Some(64));
        assert_eq!(STANDARD.divisor(Prescaler::Div1024.into()), Some(1024));
        assert_eq!(ALTERNATE.divisor(PrescalerAlt::Div32.into()), Some(32));
        assert_eq!(ALTERNATE.divisor(PrescalerAlt::Div1024.into()), Some(1024));
        assert_eq!(STANDARD.divisor(6), None);
    }

    #[test]
    fn search_skips_the_stop_entry() {
        assert_eq!(STANDARD.first_at_least(0), Some(1));
        assert_eq!(STANDARD.first_at_least(1), Some(1));
    }

    #[test]
    fn search_picks_the_smallest_sufficient_divisor() {
        assert_eq!(STANDARD.first_at_least(2), Some(2));
        assert_eq!(STANDARD.first_at_least(8), Some(2));
        assert_eq!(STANDARD.first_at_least(9), Some(3));
        assert_eq!(STANDARD.first_at_least(1024), Some(5));
        assert_eq!(STANDARD.first_at_least(1025), None);

        assert_eq!(ALTERNATE.first_at_least(9), Some(3));
        assert_eq!(ALTERNATE.first_at_least(100), Some(5));
    }

    #[test]
    fn next_stops_at_the_end() {
        assert_eq!(STANDARD.next(4), Some(5));
        assert_eq!(STANDARD.next(5), None);
        assert_eq!(ALTERNATE.next(6), Some(7));
        assert_eq!(ALTERNATE.next(7), None);
        assert_eq!(ALTERNATE.next(u8::MAX), None);
    }

    #[test]
    fn exact_lookup() {
        assert_eq!(STANDARD.selector_of(256), Some(4));
        assert_eq!(STANDARD.selector_of(32), None);
        assert_eq!(ALTERNATE.selector_of(32), Some(3));
    }
}
