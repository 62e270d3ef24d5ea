//! ATmega32U4 register map (data-space addresses)

// 16-bit timers, relative to timer 1
pub const TIMER1_OFFSET: u16 = 0x00;
pub const TIMER3_OFFSET: u16 = 0x10;

pub const TCCRA_16: u16 = 0x80;
pub const TCCRB_16: u16 = 0x81;
pub const TCNT_16: u16 = 0x84;
pub const ICR_16: u16 = 0x86;

// 8-bit timers, relative to timer 0
pub const TIMER0_OFFSET: u16 = 0x00;

pub const TCCRA_8: u16 = 0x44;
pub const TCCRB_8: u16 = 0x45;
pub const TCNT_8: u16 = 0x46;
pub const OCRA_8: u16 = 0x47;

// Absolute addresses used by the channel table
pub const TCCR0A: u16 = 0x44;
pub const OCR0A: u16 = 0x47;
pub const OCR0B: u16 = 0x48;

pub const TCCR1A: u16 = 0x80;
pub const ICR1: u16 = 0x86;
pub const OCR1A: u16 = 0x88;
pub const OCR1B: u16 = 0x8A;
pub const OCR1C: u16 = 0x8C;

pub const TCCR3A: u16 = 0x90;
pub const ICR3: u16 = 0x96;
pub const OCR3A: u16 = 0x98;
pub const OCR3B: u16 = 0x9A;
pub const OCR3C: u16 = 0x9C;

/// Timer 0 interrupt mask, its overflow interrupt drives system time
pub const TIMSK0: u16 = 0x6E;
pub const TOIE0: u8 = 0;

// Compare output mode bits (COMnx1) in TCCRnA
pub const COMA1: u8 = 7;
pub const COMB1: u8 = 5;
pub const COMC1: u8 = 3;

/// Clock select bits CSn2:0 in TCCRnB
pub const CS_MASK: u8 = 0b0000_0111;

/// WGMn1:0 in TCCRnA
pub const WGM_A_MASK: u8 = 0b0000_0011;

// I/O ports: PINx, DDRx, PORTx are consecutive
pub const PINB: u16 = 0x23;
pub const PINC: u16 = 0x26;
pub const PIND: u16 = 0x29;
pub const PINE: u16 = 0x2C;
pub const PINF: u16 = 0x2F;
