//! Recording peripherals shared by the unit tests.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use embedded_hal::digital::{self, ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::spi::{self, ErrorType as SpiErrorType, Operation, SpiDevice};

use crate::peripheral::Peripherals;
use crate::spi::BusConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl spi::Error for MockError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

/// Something that happened on a mock line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Set(String, bool),
    Sample(String),
}

#[derive(Debug, Default)]
pub struct Board {
    pub opened: Vec<String>,
    pub closed: Vec<String>,
    pub events: Vec<Event>,
    /// Levels returned by successive input samples; low once exhausted.
    pub input: VecDeque<bool>,
    pub bus_config: Option<BusConfig>,
    pub frames: Vec<[u8; 3]>,
    pub responses: VecDeque<[u8; 3]>,
    pub fail_open: Option<String>,
    pub fail_close: bool,
    pub fail_transfer: bool,
}

impl Board {
    pub fn transfers(&self) -> usize {
        self.frames.len()
    }

    pub fn writes_to(&self, line: &str) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Set(name, level) if name == line => Some(*level),
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct MockPeripherals {
    pub board: Rc<RefCell<Board>>,
}

impl MockPeripherals {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&self, name: &str) -> Result<(), MockError> {
        let mut board = self.board.borrow_mut();
        if board.fail_open.as_deref() == Some(name) {
            return Err(MockError);
        }
        board.opened.push(name.to_string());
        Ok(())
    }

    fn close(&self, name: String) -> Result<(), MockError> {
        let mut board = self.board.borrow_mut();
        board.closed.push(name);
        if board.fail_close {
            Err(MockError)
        } else {
            Ok(())
        }
    }
}

pub struct MockOutput {
    name: String,
    board: Rc<RefCell<Board>>,
}

pub struct MockInput {
    name: String,
    board: Rc<RefCell<Board>>,
}

pub struct MockBus {
    name: String,
    board: Rc<RefCell<Board>>,
}

impl PinErrorType for MockOutput {
    type Error = MockError;
}

impl OutputPin for MockOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let event = Event::Set(self.name.clone(), false);
        self.board.borrow_mut().events.push(event);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let event = Event::Set(self.name.clone(), true);
        self.board.borrow_mut().events.push(event);
        Ok(())
    }
}

impl PinErrorType for MockInput {
    type Error = MockError;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut board = self.board.borrow_mut();
        board.events.push(Event::Sample(self.name.clone()));
        Ok(board.input.pop_front().unwrap_or(false))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl SpiErrorType for MockBus {
    type Error = MockError;
}

impl SpiDevice for MockBus {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        assert_eq!(operations.len(), 1);

        let mut board = self.board.borrow_mut();
        if board.fail_transfer {
            return Err(MockError);
        }

        match &mut operations[0] {
            Operation::TransferInPlace(words) => {
                let frame: [u8; 3] = (&words[..]).try_into().expect("3-byte frame");
                board.frames.push(frame);
                let response = board.responses.pop_front().unwrap_or([0; 3]);
                words.copy_from_slice(&response);
            }
            _ => panic!("Not an expected operation"),
        }

        Ok(())
    }
}

impl Peripherals for MockPeripherals {
    type Error = MockError;
    type Output = MockOutput;
    type Input = MockInput;
    type Bus = MockBus;

    fn open_output(&mut self, name: &str) -> Result<MockOutput, MockError> {
        self.open(name)?;
        Ok(MockOutput {
            name: name.to_string(),
            board: self.board.clone(),
        })
    }

    fn open_input(&mut self, name: &str) -> Result<MockInput, MockError> {
        self.open(name)?;
        Ok(MockInput {
            name: name.to_string(),
            board: self.board.clone(),
        })
    }

    fn open_bus(&mut self, config: &BusConfig) -> Result<MockBus, MockError> {
        self.open(&config.bus)?;
        self.board.borrow_mut().bus_config = Some(config.clone());
        Ok(MockBus {
            name: config.bus.clone(),
            board: self.board.clone(),
        })
    }

    fn close_output(&mut self, line: MockOutput) -> Result<(), MockError> {
        self.close(line.name)
    }

    fn close_input(&mut self, line: MockInput) -> Result<(), MockError> {
        self.close(line.name)
    }

    fn close_bus(&mut self, bus: MockBus) -> Result<(), MockError> {
        self.close(bus.name)
    }
}
