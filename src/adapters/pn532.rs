//! PN532 reader adapter (I²C).
//!
//! Thin [`ReaderPort`] implementation speaking the PN532 host frame format
//! directly over `esp-idf-hal` I²C. Only the three commands the core needs:
//! GetFirmwareVersion (identity/liveness), SAMConfig (bring-up) and
//! InListPassiveTarget (one ISO14443A detection attempt).
//!
//! Frame layout: `00 00 FF LEN LCS TFI DATA.. DCS 00`, TFI `0xD4`
//! host→chip / `0xD5` chip→host. In I²C mode every read is prefixed with a
//! ready-status byte (bit 0 set when a response frame is waiting).

use embedded_hal::delay::DelayNs;
use esp_idf_hal::delay::{Ets, BLOCK};
use esp_idf_hal::i2c::I2cDriver;
use log::{debug, warn};

use crate::app::events::CardUid;
use crate::app::ports::ReaderPort;
use crate::config::UID_MAX_LEN;
use crate::error::ReaderError;
use crate::pins::PN532_I2C_ADDR;

const CMD_GET_FIRMWARE_VERSION: u8 = 0x02;
const CMD_SAM_CONFIGURATION: u8 = 0x14;
const CMD_IN_LIST_PASSIVE_TARGET: u8 = 0x4A;

/// ISO14443A at 106 kbps.
const BRTY_ISO14443A: u8 = 0x00;

/// Poll interval while waiting for the chip to raise its ready bit.
const READY_POLL_MS: u32 = 1;

pub struct Pn532Reader<'d> {
    i2c: I2cDriver<'d>,
}

impl<'d> Pn532Reader<'d> {
    pub fn new(i2c: I2cDriver<'d>) -> Self {
        Self { i2c }
    }

    /// Write one command frame (payload excludes the TFI).
    fn write_frame(&mut self, payload: &[u8]) -> Result<(), ReaderError> {
        let mut frame = heapless::Vec::<u8, 32>::new();
        let len = payload.len() as u8 + 1; // + TFI

        let mut push = |b: u8| frame.push(b).map_err(|_| ReaderError::Detection);
        push(0x00)?; // preamble
        push(0x00)?; // start code
        push(0xFF)?;
        push(len)?;
        push(len.wrapping_neg())?; // length checksum
        push(0xD4)?; // TFI host -> chip

        let mut sum: u8 = 0xD4;
        for &b in payload {
            push(b)?;
            sum = sum.wrapping_add(b);
        }
        push(sum.wrapping_neg())?; // data checksum
        push(0x00)?; // postamble

        self.i2c
            .write(PN532_I2C_ADDR, &frame, BLOCK)
            .map_err(|_| ReaderError::Detection)
    }

    /// Poll the ready bit, then read a response frame into `buf`.
    /// Returns the response payload (TFI stripped) length.
    fn read_frame(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, ReaderError> {
        let mut waited = 0;
        loop {
            let mut status = [0u8; 1];
            self.i2c
                .read(PN532_I2C_ADDR, &mut status, BLOCK)
                .map_err(|_| ReaderError::Detection)?;
            if status[0] & 0x01 != 0 {
                break;
            }
            if waited >= timeout_ms {
                return Err(ReaderError::Timeout);
            }
            Ets.delay_ms(READY_POLL_MS);
            waited += READY_POLL_MS;
        }

        // Status byte + frame in one transaction.
        let mut raw = [0u8; 40];
        self.i2c
            .read(PN532_I2C_ADDR, &mut raw, BLOCK)
            .map_err(|_| ReaderError::Detection)?;

        // raw[0] = ready status, raw[1..] = frame.
        let frame = &raw[1..];
        if frame[0] != 0x00 || frame[1] != 0x00 || frame[2] != 0xFF {
            return Err(ReaderError::Detection);
        }
        let len = frame[3] as usize;
        if len == 0 || frame[4] != frame[3].wrapping_neg() || frame[5] != 0xD5 {
            return Err(ReaderError::Detection);
        }
        let payload_len = len - 1; // minus TFI
        if payload_len > buf.len() || 6 + payload_len > frame.len() {
            return Err(ReaderError::Detection);
        }
        buf[..payload_len].copy_from_slice(&frame[6..6 + payload_len]);
        Ok(payload_len)
    }

    /// Consume the ACK frame that follows every command.
    fn read_ack(&mut self) -> Result<(), ReaderError> {
        let mut raw = [0u8; 7];
        self.i2c
            .read(PN532_I2C_ADDR, &mut raw, BLOCK)
            .map_err(|_| ReaderError::Detection)?;
        // raw[0] = ready status; ACK = 00 00 FF 00 FF 00.
        if raw[1..7] == [0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00] {
            Ok(())
        } else {
            Err(ReaderError::Detection)
        }
    }

    fn command(
        &mut self,
        payload: &[u8],
        response: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, ReaderError> {
        self.write_frame(payload)?;
        Ets.delay_ms(READY_POLL_MS);
        self.read_ack()?;
        self.read_frame(response, timeout_ms)
    }
}

impl ReaderPort for Pn532Reader<'_> {
    fn power_up(&mut self) -> bool {
        // SAMConfig: normal mode, 1 s virtual-card timeout, no IRQ pin.
        let mut response = [0u8; 8];
        match self.command(&[CMD_SAM_CONFIGURATION, 0x01, 0x14, 0x01], &mut response, 100) {
            Ok(_) => {
                debug!("Pn532Reader: SAM configured for ISO14443A");
                true
            }
            Err(e) => {
                warn!("Pn532Reader: SAMConfig failed: {e}");
                false
            }
        }
    }

    fn identity_check(&mut self) -> bool {
        let mut response = [0u8; 8];
        match self.command(&[CMD_GET_FIRMWARE_VERSION], &mut response, 100) {
            // Response: 0x03, IC, Ver, Rev, Support — IC must read 0x32 (PN532).
            Ok(n) if n >= 5 && response[0] == 0x03 && response[1] == 0x32 => {
                debug!(
                    "Pn532Reader: firmware {}.{}",
                    response[2], response[3]
                );
                true
            }
            Ok(_) => {
                warn!("Pn532Reader: implausible firmware response");
                false
            }
            Err(e) => {
                warn!("Pn532Reader: identity check failed: {e}");
                false
            }
        }
    }

    fn detect(&mut self, timeout_ms: u32) -> Result<Option<CardUid>, ReaderError> {
        let mut response = [0u8; 32];
        let n = self.command(
            &[CMD_IN_LIST_PASSIVE_TARGET, 0x01, BRTY_ISO14443A],
            &mut response,
            timeout_ms,
        )?;

        // Response: 0x4B, NbTg, Tg, SENS_RES(2), SEL_RES, UIDLen, UID..
        if n < 2 || response[0] != 0x4B {
            return Err(ReaderError::Detection);
        }
        if response[1] == 0 {
            return Ok(None); // no target in field
        }
        if n < 8 {
            return Err(ReaderError::Detection);
        }
        let uid_len = (response[6] as usize).min(UID_MAX_LEN);
        if 7 + uid_len > n {
            return Err(ReaderError::Detection);
        }
        let uid =
            CardUid::from_slice(&response[7..7 + uid_len]).map_err(|()| ReaderError::Detection)?;
        Ok(Some(uid))
    }
}
