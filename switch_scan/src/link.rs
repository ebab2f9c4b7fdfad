//! The serial link to the shift register chain.
//!
//! Every transfer is full duplex: the output word (LEDs and the like) is
//! shifted out to the output registers while the switch inputs are shifted
//! in from the input registers.

use embedded_hal::digital::v2::OutputPin;
use embedded_hal::spi::FullDuplex;

/// A shift register chain that is read and written one transfer at a time.
/// Both calls run in interrupt context and must not wait on the bus.
pub trait ShiftLink {
    /// Error raised by the underlying bus
    type Error;

    /// Starts a transfer that shifts out `write`
    fn start(&mut self, write: u32) -> Result<(), Self::Error>;

    /// Polls the transfer, returning the word shifted in once it completed
    fn complete(&mut self) -> nb::Result<u32, Self::Error>;
}

/// Error of a [SpiLink] transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError<E> {
    /// The SPI peripheral reported an error
    Bus(E),
    /// The transmitter was not ready for the next byte
    Busy,
}

/// Drives a shift register chain over an SPI peripheral one byte per
/// interrupt, latching the registers between transfers.
///
/// `BYTES` is the length of the chain and must be 2 or 4. Bytes go out and
/// come back least significant first.
pub struct SpiLink<SPI, LATCH, const BYTES: usize> {
    spi: SPI,

    /// Low while shifting, high between transfers
    latch: LATCH,

    outgoing: [u8; BYTES],
    incoming: [u8; BYTES],

    /// Next byte of the transfer to receive
    index: usize,

    busy: bool,
}

impl<SPI, LATCH, const BYTES: usize> SpiLink<SPI, LATCH, BYTES>
where
    SPI: FullDuplex<u8>,
    LATCH: OutputPin,
{
    /// Creates the link, panicing unless BYTES is 2 or 4
    pub fn new(spi: SPI, mut latch: LATCH) -> Self {
        assert!(
            BYTES == 2 || BYTES == 4,
            "Attempted to drive a shift register chain that is not 2 or 4 bytes"
        );

        latch.set_high().ok();

        Self {
            spi,
            latch,
            outgoing: [0; BYTES],
            incoming: [0; BYTES],
            index: 0,
            busy: false,
        }
    }

    /// True while a transfer is in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Releases the peripheral and the latch pin
    pub fn free(self) -> (SPI, LATCH) {
        (self.spi, self.latch)
    }

    /// Queues one byte, never waiting for the transmitter
    fn send(&mut self, byte: u8) -> Result<(), LinkError<SPI::Error>> {
        match self.spi.send(byte) {
            Ok(()) => Ok(()),
            Err(nb::Error::WouldBlock) => Err(LinkError::Busy),
            Err(nb::Error::Other(error)) => Err(LinkError::Bus(error)),
        }
    }
}

impl<SPI, LATCH, const BYTES: usize> ShiftLink for SpiLink<SPI, LATCH, BYTES>
where
    SPI: FullDuplex<u8>,
    LATCH: OutputPin,
{
    type Error = LinkError<SPI::Error>;

    fn start(&mut self, write: u32) -> Result<(), Self::Error> {
        self.outgoing.copy_from_slice(&write.to_le_bytes()[..BYTES]);
        self.index = 0;

        self.latch.set_low().ok();
        let first = self.outgoing[0];
        self.send(first)?;
        self.busy = true;

        Ok(())
    }

    fn complete(&mut self) -> nb::Result<u32, Self::Error> {
        if !self.busy {
            return Err(nb::Error::WouldBlock);
        }

        self.incoming[self.index] = self.spi.read().map_err(|e| e.map(LinkError::Bus))?;
        self.index += 1;

        if self.index < BYTES {
            let next = self.outgoing[self.index];
            self.send(next).map_err(nb::Error::Other)?;
            return Err(nb::Error::WouldBlock);
        }

        self.busy = false;
        self.latch.set_high().ok();

        let mut word = [0u8; 4];
        word[..BYTES].copy_from_slice(&self.incoming);
        Ok(u32::from_le_bytes(word))
    }
}
