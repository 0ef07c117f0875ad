//! Simulated TM1651 bus: two pin mocks over shared state, plus a decoder that
//! reconstructs start/stop-framed transactions from the edges the driver
//! produces. The simulated chip acknowledges every byte unless told not to.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

struct BusState {
    clk: bool,
    dio: bool,
    device_pull: bool,
    respond_ack: bool,
    in_frame: bool,
    expect_ack: bool,
    in_ack: bool,
    bit_idx: u8,
    cur_byte: u8,
    frame: Vec<u8>,
    transactions: Vec<Vec<u8>>,
}

impl BusState {
    fn new() -> Self {
        BusState {
            clk: true,
            dio: true,
            device_pull: false,
            respond_ack: true,
            in_frame: false,
            expect_ack: false,
            in_ack: false,
            bit_idx: 0,
            cur_byte: 0,
            frame: Vec::new(),
            transactions: Vec::new(),
        }
    }

    // Effective line level: open drain, so low wins.
    fn wire_dio(&self) -> bool {
        self.dio && !self.device_pull
    }

    fn write_clk(&mut self, level: bool) {
        if level == self.clk {
            return;
        }
        self.clk = level;
        if level {
            // Rising edge: the chip samples DIO, or answers in the ack slot.
            if !self.in_frame {
                return;
            }
            if self.expect_ack {
                if self.respond_ack {
                    self.device_pull = true;
                }
                self.in_ack = true;
            } else {
                if self.wire_dio() {
                    self.cur_byte |= 1 << self.bit_idx;
                }
                self.bit_idx += 1;
                if self.bit_idx == 8 {
                    self.frame.push(self.cur_byte);
                    self.cur_byte = 0;
                    self.bit_idx = 0;
                    self.expect_ack = true;
                }
            }
        } else if self.in_ack {
            // Falling edge ends the ack slot; the chip releases the line.
            self.device_pull = false;
            self.expect_ack = false;
            self.in_ack = false;
        }
    }

    fn write_dio(&mut self, level: bool) {
        let before = self.wire_dio();
        self.dio = level;
        let after = self.wire_dio();
        if !self.clk || before == after {
            return;
        }
        if !after {
            // DIO falling while CLK high: start condition.
            self.in_frame = true;
            self.bit_idx = 0;
            self.cur_byte = 0;
            self.expect_ack = false;
            self.in_ack = false;
        } else if self.in_frame {
            // DIO rising while CLK high: stop condition.
            self.transactions.push(std::mem::take(&mut self.frame));
            self.in_frame = false;
        }
    }
}

pub struct SimBus {
    state: Rc<RefCell<BusState>>,
}

impl SimBus {
    pub fn new() -> Self {
        SimBus {
            state: Rc::new(RefCell::new(BusState::new())),
        }
    }

    pub fn pins(&self) -> (ClkPin, DioPin) {
        (
            ClkPin(Rc::clone(&self.state)),
            DioPin(Rc::clone(&self.state)),
        )
    }

    /// Everything sent so far, one `Vec<u8>` per start..stop bracket.
    pub fn transactions(&self) -> Vec<Vec<u8>> {
        self.state.borrow().transactions.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().transactions.clear();
    }

    pub fn set_ack_response(&self, respond: bool) {
        self.state.borrow_mut().respond_ack = respond;
    }
}

pub struct ClkPin(Rc<RefCell<BusState>>);
pub struct DioPin(Rc<RefCell<BusState>>);

impl ErrorType for ClkPin {
    type Error = Infallible;
}

impl OutputPin for ClkPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().write_clk(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().write_clk(true);
        Ok(())
    }
}

impl ErrorType for DioPin {
    type Error = Infallible;
}

impl OutputPin for DioPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().write_dio(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().write_dio(true);
        Ok(())
    }
}

impl InputPin for DioPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.borrow().wire_dio())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.borrow().wire_dio())
    }
}

pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
