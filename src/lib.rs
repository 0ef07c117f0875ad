//! Platform-agnostic driver for the TM1651, a 7-segment LED display controller
//! (up to 4 digits) behind a proprietary two-wire clock/data bus, as found on
//! the Gotek LEDC68 3-digit display board.

#![no_std]

mod constants;

pub use constants::*;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use num_traits::ToPrimitive;

// Half-bit pacing; the chip is certified to 250 kHz, this keeps well under it.
const BIT_DELAY_US: u32 = 5;

const DEC_MAX: [u16; 4] = [9, 99, 999, 9999];
const HEX_MAX: [u16; 4] = [0xF, 0xFF, 0xFFF, 0xFFFF];

pub struct TM1651<CLK, DIO, DELAY, MODE = AutoIncrement> {
    clk: CLK,
    dio: DIO,
    delay: DELAY,
    mode: MODE,
    num_digits: u8,
    brightness: u8,
    digits: [u8; MAX_DIGITS as usize],
    ledc68: bool,
    dp_on: bool,
    nack: bool,
    check_ack: bool,
}

/// Transaction shape used to move segment codes onto the bus, chosen once per
/// driver instance through the last type parameter of [`TM1651`].
pub trait Addressing: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn write_run<CLK, DIO, DELAY, E>(
        tm: &mut TM1651<CLK, DIO, DELAY, Self>,
        start: u8,
        codes: &[u8],
    ) -> Result<(), TM1651Error<E>>
    where
        CLK: OutputPin<Error = E>,
        DIO: InputPin<Error = E> + OutputPin<Error = E>,
        DELAY: DelayNs;
}

/// One address command, then a single burst of consecutive segment codes.
pub struct AutoIncrement;

/// One address command plus one addressed write per digit, optionally routed
/// through a logical-to-physical digit map.
pub struct FixedAddress {
    map: Option<[u8; MAX_DIGITS as usize]>,
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::AutoIncrement {}
    impl Sealed for super::FixedAddress {}
}

impl Addressing for AutoIncrement {
    fn write_run<CLK, DIO, DELAY, E>(
        tm: &mut TM1651<CLK, DIO, DELAY, Self>,
        start: u8,
        codes: &[u8],
    ) -> Result<(), TM1651Error<E>>
    where
        CLK: OutputPin<Error = E>,
        DIO: InputPin<Error = E> + OutputPin<Error = E>,
        DELAY: DelayNs,
    {
        tm.command(cmd::ADDR_AUTO)?;
        tm.bus_start()?;
        tm.push_byte(cmd::ADDR_BASE + start)?;
        for &code in codes {
            tm.push_byte(code)?;
        }
        tm.bus_stop()?;
        tm.finish()
    }
}

impl Addressing for FixedAddress {
    fn write_run<CLK, DIO, DELAY, E>(
        tm: &mut TM1651<CLK, DIO, DELAY, Self>,
        start: u8,
        codes: &[u8],
    ) -> Result<(), TM1651Error<E>>
    where
        CLK: OutputPin<Error = E>,
        DIO: InputPin<Error = E> + OutputPin<Error = E>,
        DELAY: DelayNs,
    {
        for (offset, &code) in codes.iter().enumerate() {
            let logical = start + offset as u8;
            let physical = match tm.mode.map {
                Some(map) => map[logical as usize],
                None => logical,
            };
            tm.command(cmd::ADDR_FIXED)?;
            tm.bus_start()?;
            tm.push_byte(cmd::ADDR_BASE + physical)?;
            tm.push_byte(code)?;
            tm.bus_stop()?;
        }
        tm.finish()
    }
}

impl<CLK, DIO, DELAY> TM1651<CLK, DIO, DELAY, AutoIncrement> {
    /// Driver using auto-increment addressing. `ledc68` marks a Gotek LEDC68
    /// board, whose decimal points hang off a fourth, non-visible digit
    /// address; it only takes effect when [`begin`](Self::begin) configures
    /// exactly 3 digits.
    pub fn new(clk: CLK, dio: DIO, delay: DELAY, ledc68: bool) -> Self {
        Self::build(clk, dio, delay, ledc68, AutoIncrement)
    }
}

impl<CLK, DIO, DELAY> TM1651<CLK, DIO, DELAY, FixedAddress> {
    /// Driver addressing every digit individually instead of bursting runs.
    pub fn fixed_addressing(clk: CLK, dio: DIO, delay: DELAY, ledc68: bool) -> Self {
        Self::build(clk, dio, delay, ledc68, FixedAddress { map: None })
    }

    /// Reroute logical digit indices to the given wire addresses, for boards
    /// that wire the digits out of order.
    pub fn with_digit_map(mut self, map: [u8; MAX_DIGITS as usize]) -> Self {
        self.mode.map = Some(map);
        self
    }
}

impl<CLK, DIO, DELAY, MODE> TM1651<CLK, DIO, DELAY, MODE> {
    fn build(clk: CLK, dio: DIO, delay: DELAY, ledc68: bool, mode: MODE) -> Self {
        Self {
            clk,
            dio,
            delay,
            mode,
            num_digits: 1,
            brightness: INTENSITY_TYP,
            digits: [BLANK; MAX_DIGITS as usize],
            ledc68,
            dp_on: false,
            nack: false,
            check_ack: false,
        }
    }

    /// Report a missed acknowledgement as [`TM1651Error::NoAck`] instead of
    /// ignoring it. Transactions still run to completion either way.
    pub fn with_ack_check(mut self) -> Self {
        self.check_ack = true;
        self
    }

    pub fn destroy(self) -> (CLK, DIO, DELAY) {
        (self.clk, self.dio, self.delay)
    }
}

impl<CLK, DIO, DELAY, E, MODE> TM1651<CLK, DIO, DELAY, MODE>
where
    CLK: OutputPin<Error = E>,
    DIO: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    MODE: Addressing,
{
    /// Set up the display: `num_digits` outside 1-4 falls back to 1, the
    /// LEDC68 flag is dropped unless exactly 3 digits are configured, then the
    /// display is cleared and switched on at the requested brightness.
    pub fn begin(&mut self, num_digits: u8, brightness: u8) -> Result<(), TM1651Error<E>> {
        self.num_digits = if (1..=MAX_DIGITS).contains(&num_digits) {
            num_digits
        } else {
            1
        };
        if self.num_digits != 3 {
            self.ledc68 = false;
        }
        // Both lines idle high.
        self.clk.set_high()?;
        self.dio.set_high()?;
        self.display_clear()?;
        self.display_brightness(brightness)
    }

    /// Turn the display off. The digit registers keep their contents.
    pub fn display_off(&mut self) -> Result<(), TM1651Error<E>> {
        self.command(cmd::DISPLAY_OFF)?;
        self.finish()
    }

    /// Blank every configured digit and switch the decimal points off.
    pub fn display_clear(&mut self) -> Result<(), TM1651Error<E>> {
        let n = self.num_digits as usize;
        self.digits = [BLANK; MAX_DIGITS as usize];
        let codes = [BLANK; MAX_DIGITS as usize];
        MODE::write_run(self, 0, &codes[..n])?;
        self.display_dp(false)
    }

    /// Set the brightness (masked to 0-7) and turn the display on; the chip
    /// has no separate "on" command.
    pub fn display_brightness(&mut self, brightness: u8) -> Result<(), TM1651Error<E>> {
        self.brightness = brightness & INTENSITY_MAX;
        self.command(cmd::DISPLAY_ON + self.brightness)?;
        self.finish()
    }

    /// Put a character on one digit. `digit` past the last configured digit is
    /// clamped to the last one. With `raw` the value is a segment pattern
    /// (masked to 7 bits), otherwise an index into [`CHAR_TABLE`].
    pub fn display_char(&mut self, digit: u8, value: u8, raw: bool) -> Result<(), TM1651Error<E>> {
        let digit = digit.min(self.num_digits - 1);
        let code = if raw {
            value & SEGMENTS_MASK
        } else {
            char_code(value)
        };
        self.digits[digit as usize] = code;
        MODE::write_run(self, digit, &[code])
    }

    /// Show a decimal value 0-99 (saturating) or both nibbles of a hex byte on
    /// a 2-digit field starting at `digit`. Needs at least 2 configured
    /// digits, otherwise does nothing.
    pub fn display_int8(&mut self, digit: u8, value: u8, decimal: bool) -> Result<(), TM1651Error<E>> {
        if self.num_digits < 2 {
            return Ok(());
        }
        let digit = digit.min(self.num_digits - 2);
        let codes = if decimal {
            let value = value.min(99);
            [char_code(value / 10), char_code(value % 10)]
        } else {
            [char_code(value >> 4), char_code(value & 0x0F)]
        };
        self.store(digit, &codes);
        MODE::write_run(self, digit, &codes)
    }

    /// Show a decimal value 0-999 or a hex value 0x000-0xFFF (both saturating)
    /// on a 3-digit field starting at `digit`. Needs at least 3 digits.
    pub fn display_int12(&mut self, digit: u8, value: u16, decimal: bool) -> Result<(), TM1651Error<E>> {
        if self.num_digits < 3 {
            return Ok(());
        }
        let digit = digit.min(self.num_digits - 3);
        let codes = if decimal {
            let value = value.min(999);
            [
                char_code(((value / 100) % 10) as u8),
                char_code(((value / 10) % 10) as u8),
                char_code((value % 10) as u8),
            ]
        } else {
            let value = value.min(0xFFF);
            [
                char_code(((value >> 8) & 0xF) as u8),
                char_code(((value >> 4) & 0xF) as u8),
                char_code((value & 0xF) as u8),
            ]
        };
        self.store(digit, &codes);
        MODE::write_run(self, digit, &codes)
    }

    /// Show a decimal value 0-9999 (saturating) or any hex value on a 4-digit
    /// field starting at `digit`. Needs all 4 digits.
    pub fn display_int16(&mut self, digit: u8, value: u16, decimal: bool) -> Result<(), TM1651Error<E>> {
        if self.num_digits < 4 {
            return Ok(());
        }
        let digit = digit.min(self.num_digits - 4);
        let codes = if decimal {
            let value = value.min(9999);
            [
                char_code(((value / 1000) % 10) as u8),
                char_code(((value / 100) % 10) as u8),
                char_code(((value / 10) % 10) as u8),
                char_code((value % 10) as u8),
            ]
        } else {
            [
                char_code(((value >> 12) & 0xF) as u8),
                char_code(((value >> 8) & 0xF) as u8),
                char_code(((value >> 4) & 0xF) as u8),
                char_code((value & 0xF) as u8),
            ]
        };
        self.store(digit, &codes);
        MODE::write_run(self, digit, &codes)
    }

    /// Right-aligned decimal value across all configured digits, with leading
    /// zeros, saturating at the largest value the digits can show. Negative
    /// values saturate to 0.
    pub fn display_value<T: ToPrimitive>(&mut self, value: T) -> Result<(), TM1651Error<E>> {
        let n = self.num_digits as usize;
        let max = DEC_MAX[n - 1];
        let mut value = value.to_i64().unwrap_or(i64::MAX).clamp(0, max as i64) as u16;
        let mut codes = [BLANK; MAX_DIGITS as usize];
        for slot in codes[..n].iter_mut().rev() {
            *slot = char_code((value % 10) as u8);
            value /= 10;
        }
        self.store(0, &codes[..n]);
        MODE::write_run(self, 0, &codes[..n])
    }

    /// Hexadecimal counterpart of [`display_value`](Self::display_value),
    /// saturating at all digits showing `F`.
    pub fn display_hex_value<T: ToPrimitive>(&mut self, value: T) -> Result<(), TM1651Error<E>> {
        let n = self.num_digits as usize;
        let max = HEX_MAX[n - 1];
        let mut value = value.to_i64().unwrap_or(i64::MAX).clamp(0, max as i64) as u16;
        let mut codes = [BLANK; MAX_DIGITS as usize];
        for slot in codes[..n].iter_mut().rev() {
            *slot = char_code((value & 0xF) as u8);
            value >>= 4;
        }
        self.store(0, &codes[..n]);
        MODE::write_run(self, 0, &codes[..n])
    }

    /// Switch the LEDC68 decimal points on or off.
    ///
    /// The LEDC68 has no per-digit decimal points; segment d of a fourth,
    /// non-visible digit address drives all of them at once. Without that
    /// board (or with a digit count other than 3) this records the state and
    /// touches the bus not at all.
    pub fn display_dp(&mut self, on: bool) -> Result<(), TM1651Error<E>> {
        self.dp_on = on;
        if !self.ledc68 {
            return Ok(());
        }
        let code = if on { DP_ON } else { DP_OFF };
        MODE::write_run(self, LEDC68_DP_ADDR, &[code])
    }

    /// Light every segment (and the LEDC68 decimal points) for a lamp test, or
    /// restore what the digit registers last held.
    pub fn display_test(&mut self, on: bool) -> Result<(), TM1651Error<E>> {
        let n = self.num_digits as usize;
        let codes = if on {
            [SEGMENTS_MASK; MAX_DIGITS as usize]
        } else {
            self.digits
        };
        MODE::write_run(self, 0, &codes[..n])?;
        if self.ledc68 {
            let dp = if on || self.dp_on { DP_ON } else { DP_OFF };
            MODE::write_run(self, LEDC68_DP_ADDR, &[dp])?;
        }
        Ok(())
    }

    fn store(&mut self, start: u8, codes: &[u8]) {
        let start = start as usize;
        self.digits[start..start + codes.len()].copy_from_slice(codes);
    }
}

// Bus primitives. Every command or data run is one start..stop bracket; the
// chip samples DIO on the rising CLK edge, least-significant bit first, and
// acknowledges each byte by pulling DIO low during a ninth clock.
impl<CLK, DIO, DELAY, E, MODE> TM1651<CLK, DIO, DELAY, MODE>
where
    CLK: OutputPin<Error = E>,
    DIO: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
{
    fn command(&mut self, byte: u8) -> Result<(), TM1651Error<E>> {
        self.bus_start()?;
        self.push_byte(byte)?;
        self.bus_stop()
    }

    fn push_byte(&mut self, byte: u8) -> Result<(), TM1651Error<E>> {
        if !self.write_byte(byte)? {
            self.nack = true;
        }
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<bool, TM1651Error<E>> {
        let mut data = byte;
        for _ in 0..8 {
            self.clk.set_low()?;
            self.bit_delay();
            if data & 0x01 != 0 {
                self.dio.set_high()?;
            } else {
                self.dio.set_low()?;
            }
            data >>= 1;
            self.clk.set_high()?;
            self.bit_delay();
        }
        // Ninth clock: release DIO and let the chip pull it low to acknowledge.
        self.clk.set_low()?;
        self.dio.set_high()?;
        self.clk.set_high()?;
        self.bit_delay();
        let acked = self.dio.is_low()?;
        if acked {
            self.dio.set_low()?;
        }
        self.bit_delay();
        Ok(acked)
    }

    // DIO falling while CLK is high.
    fn bus_start(&mut self) -> Result<(), TM1651Error<E>> {
        self.clk.set_high()?;
        self.dio.set_high()?;
        self.dio.set_low()?;
        self.clk.set_low()?;
        self.bit_delay();
        Ok(())
    }

    // DIO rising while CLK is high.
    fn bus_stop(&mut self) -> Result<(), TM1651Error<E>> {
        self.clk.set_low()?;
        self.dio.set_low()?;
        self.clk.set_high()?;
        self.dio.set_high()?;
        self.bit_delay();
        Ok(())
    }

    fn bit_delay(&mut self) {
        self.delay.delay_us(BIT_DELAY_US);
    }

    fn finish(&mut self) -> Result<(), TM1651Error<E>> {
        let missed = core::mem::take(&mut self.nack);
        if self.check_ack && missed {
            Err(TM1651Error::NoAck)
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TM1651Error<E> {
    PinError(E),
    NoAck,
}

impl<E> From<E> for TM1651Error<E> {
    fn from(error: E) -> Self {
        TM1651Error::PinError(error)
    }
}
