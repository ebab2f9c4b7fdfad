//! Mocked hardware for testing the scanner

use core::convert::Infallible;

use embedded_hal::digital::v2::{OutputPin, StatefulOutputPin};
use embedded_hal::spi::FullDuplex;
use heapless::{Deque, Vec};

use crate::link::ShiftLink;

pub struct MockPin {
    state: bool,
}

impl MockPin {
    pub fn new() -> Self {
        MockPin { state: false }
    }
}

type MockError = &'static str;

impl OutputPin for MockPin {
    type Error = MockError;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state = true;
        Ok(())
    }
}

impl StatefulOutputPin for MockPin {
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.state)
    }

    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.state)
    }
}

/// An SPI peripheral that answers every sent byte with the next scripted one
pub struct MockSpi {
    incoming: Deque<u8, 16>,
    sent: Vec<u8, 16>,
    received: bool,
    stalled: bool,
}

impl MockSpi {
    pub fn with_incoming(bytes: &[u8]) -> Self {
        let mut incoming = Deque::new();
        for byte in bytes {
            incoming.push_back(*byte).unwrap();
        }

        Self {
            incoming,
            sent: Vec::new(),
            received: false,
            stalled: false,
        }
    }

    /// Makes the transmitter report busy on every send
    pub fn stall(&mut self) {
        self.stalled = true;
    }

    pub fn sent(&self) -> &[u8] {
        &self.sent
    }
}

impl FullDuplex<u8> for MockSpi {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if !self.received {
            return Err(nb::Error::WouldBlock);
        }

        self.received = false;
        Ok(self.incoming.pop_front().unwrap_or(0xff))
    }

    fn send(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.stalled {
            return Err(nb::Error::WouldBlock);
        }

        self.sent.push(word).unwrap();
        self.received = true;
        Ok(())
    }
}

/// A link that completes a transfer whenever a scripted sample is queued
pub struct MockLink {
    samples: Deque<u32, 16>,
    pub starts: usize,
    pub last_write: Option<u32>,
    pub broken: bool,
    /// Fails the next completion only
    pub glitch: bool,
}

impl MockLink {
    pub fn new() -> Self {
        Self {
            samples: Deque::new(),
            starts: 0,
            last_write: None,
            broken: false,
            glitch: false,
        }
    }

    pub fn queue(&mut self, sample: u32) {
        self.samples.push_back(sample).unwrap();
    }
}

impl ShiftLink for MockLink {
    type Error = MockError;

    fn start(&mut self, write: u32) -> Result<(), Self::Error> {
        if self.broken {
            return Err("link broken");
        }

        self.starts += 1;
        self.last_write = Some(write);
        Ok(())
    }

    fn complete(&mut self) -> nb::Result<u32, Self::Error> {
        if self.broken {
            return Err(nb::Error::Other("link broken"));
        }
        if self.glitch {
            self.glitch = false;
            return Err(nb::Error::Other("link glitch"));
        }

        self.samples.pop_front().ok_or(nb::Error::WouldBlock)
    }
}
