// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! YMODEM-CRC / YMODEM-1K packet receiver.
//!
//! Implements the receiving side only: this bootloader is always the
//! listener, never the sender. Framing, retry policy and timeouts follow the
//! upstream C implementation this protocol was lifted from, including its
//! one documented quirk: a data packet's sequence byte is checked against its
//! own inverse (`seq ^ inv_seq == 0xFF`) but never against the receiver's own
//! running counter, so a sender that replays or skips a sequence number is
//! not caught here.

use crate::crc::crc16;

const SOH: u8 = 0x01;
const STX: u8 = 0x02;
const EOT: u8 = 0x04;
const ACK: u8 = 0x06;
const NAK: u8 = 0x15;
const CAN: u8 = 0x18;
const C: u8 = b'C';

/// Per-byte read timeout.
pub const BYTE_TIMEOUT_MS: u32 = 1000;

/// Number of retries before a receive stage gives up.
pub const MAX_RETRIES: u8 = 10;

/// Maximum data bytes in one packet (YMODEM-1K).
pub const MAX_PACKET_DATA: usize = 1024;

/// Maximum filename length carried in the header packet.
pub const MAX_FILENAME_LEN: usize = 127;

/// Hardware serial transport consumed by the receiver. Implementations own
/// the concrete UART; the core only ever sees bytes and a timeout budget.
pub trait SerialIo {
    /// Blocks for up to `timeout_ms` waiting for one byte.
    fn recv_byte(&mut self, timeout_ms: u32) -> Result<u8, SerialError>;

    /// Sends one byte, blocking until the hardware has accepted it.
    fn send_byte(&mut self, byte: u8) -> Result<(), SerialError>;

    /// Drains any bytes already buffered by the hardware without blocking.
    fn flush_input(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    Timeout,
    Hardware,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YmodemError {
    Timeout,
    Hardware,
    Cancelled,
    CrcMismatch,
    SequenceMismatch,
    PacketFraming,
    CallbackFailed,
}

impl From<SerialError> for YmodemError {
    fn from(e: SerialError) -> Self {
        match e {
            SerialError::Timeout => YmodemError::Timeout,
            SerialError::Hardware => YmodemError::Hardware,
        }
    }
}

/// Where a transfer stands, mirrored from the header packet through to its
/// final outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    ReceivingData,
    Complete,
    Error,
    Cancelled,
}

/// Per-transfer state: the declared filename and size from the header
/// packet, plus the running counters `receive_file` updates as data packets
/// arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: heapless::Vec<u8, MAX_FILENAME_LEN>,
    pub size: u32,
    /// Useful payload bytes delivered to the sink so far (the final block
    /// may carry trailing padding past `size`, which isn't counted here).
    pub received_size: u32,
    pub packet_count: u32,
    /// Consecutive packet errors; reset on every successful packet.
    pub error_count: u8,
    pub state: TransferState,
}

enum PacketEvent {
    Data {
        #[allow(dead_code)]
        seq: u8,
        data: heapless::Vec<u8, MAX_PACKET_DATA>,
    },
    Eot,
    Cancel,
}

fn read_packet<S: SerialIo>(io: &mut S, timeout_ms: u32) -> Result<PacketEvent, YmodemError> {
    let header = io.recv_byte(timeout_ms)?;
    match header {
        EOT => Ok(PacketEvent::Eot),
        CAN => Ok(PacketEvent::Cancel),
        SOH | STX => {
            let size = if header == SOH { 128 } else { MAX_PACKET_DATA };
            let seq = io.recv_byte(timeout_ms)?;
            let inv_seq = io.recv_byte(timeout_ms)?;
            if seq ^ inv_seq != 0xFF {
                return Err(YmodemError::SequenceMismatch);
            }
            let mut data = heapless::Vec::<u8, MAX_PACKET_DATA>::new();
            for _ in 0..size {
                let byte = io.recv_byte(timeout_ms)?;
                data.push(byte).map_err(|_| YmodemError::PacketFraming)?;
            }
            let crc_hi = io.recv_byte(timeout_ms)?;
            let crc_lo = io.recv_byte(timeout_ms)?;
            let received = u16::from_be_bytes([crc_hi, crc_lo]);
            if crc16(&data) != received {
                return Err(YmodemError::CrcMismatch);
            }
            Ok(PacketEvent::Data { seq, data })
        }
        _ => Err(YmodemError::PacketFraming),
    }
}

fn parse_header(data: &[u8]) -> Option<FileInfo> {
    if data[0] == 0 {
        return None;
    }
    let name_end = data.iter().position(|&b| b == 0)?;
    let mut name = heapless::Vec::new();
    name.extend_from_slice(&data[..name_end]).ok()?;

    let rest = &data[name_end + 1..];
    let size_end = rest
        .iter()
        .position(|&b| b == 0 || b == b' ')
        .unwrap_or(rest.len());
    let size_str = core::str::from_utf8(&rest[..size_end]).ok()?;
    let size = size_str.trim().parse::<u32>().ok()?;

    Some(FileInfo {
        name,
        size,
        received_size: 0,
        packet_count: 0,
        error_count: 0,
        state: TransferState::Idle,
    })
}

/// Drives the header and data phases of a YMODEM-CRC transfer.
pub struct YmodemReceiver;

impl YmodemReceiver {
    /// Negotiates CRC mode and receives the header packet, returning the
    /// announced filename and size. Sends `C` up to [`MAX_RETRIES`] times.
    pub fn receive_header<S: SerialIo>(io: &mut S) -> Result<FileInfo, YmodemError> {
        io.flush_input();
        for _ in 0..MAX_RETRIES {
            io.send_byte(C)?;
            match read_packet(io, BYTE_TIMEOUT_MS) {
                Ok(PacketEvent::Data { seq: 0, data }) => match parse_header(&data) {
                    Some(info) => {
                        io.send_byte(ACK)?;
                        return Ok(info);
                    }
                    None => return Err(YmodemError::PacketFraming),
                },
                Ok(PacketEvent::Cancel) => return Err(YmodemError::Cancelled),
                _ => continue,
            }
        }
        Err(YmodemError::Timeout)
    }

    /// Receives data packets until EOT, handing each packet's useful payload
    /// (trimmed to `info.size − info.received_size`) to `sink`. `sink`
    /// returns `false` to abort the transfer (e.g. flash write failed),
    /// which cancels the sender. `info`'s counters are updated in place as
    /// the transfer progresses.
    pub fn receive_file<S: SerialIo>(
        io: &mut S,
        info: &mut FileInfo,
        mut sink: impl FnMut(&[u8]) -> bool,
    ) -> Result<(), YmodemError> {
        info.state = TransferState::ReceivingData;
        loop {
            match read_packet(io, BYTE_TIMEOUT_MS) {
                Ok(PacketEvent::Data { data, .. }) => {
                    info.packet_count += 1;
                    let remaining = info.size.saturating_sub(info.received_size);
                    let take = (data.len() as u32).min(remaining) as usize;
                    let accepted = take == 0 || sink(&data[..take]);
                    if accepted {
                        info.received_size += take as u32;
                        io.send_byte(ACK)?;
                        info.error_count = 0;
                    } else {
                        info.state = TransferState::Error;
                        io.send_byte(CAN)?;
                        io.send_byte(CAN)?;
                        return Err(YmodemError::CallbackFailed);
                    }
                }
                Ok(PacketEvent::Eot) => {
                    io.send_byte(ACK)?;
                    io.send_byte(C)?;
                    return match read_packet(io, BYTE_TIMEOUT_MS) {
                        Ok(PacketEvent::Eot) => {
                            io.send_byte(ACK)?;
                            info.state = TransferState::Complete;
                            Ok(())
                        }
                        _ => {
                            info.state = TransferState::Error;
                            Err(YmodemError::PacketFraming)
                        }
                    };
                }
                Ok(PacketEvent::Cancel) => {
                    info.state = TransferState::Cancelled;
                    return Err(YmodemError::Cancelled);
                }
                Err(_) => {
                    info.error_count = info.error_count.saturating_add(1);
                    if info.error_count >= MAX_RETRIES {
                        info.state = TransferState::Error;
                        io.send_byte(CAN)?;
                        return Err(YmodemError::Timeout);
                    }
                    io.send_byte(NAK)?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    // === fake transport ===

    struct FakeSerial {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl FakeSerial {
        fn new(bytes: &[u8]) -> Self {
            Self {
                rx: bytes.iter().copied().collect(),
                tx: Vec::new(),
            }
        }
    }

    impl SerialIo for FakeSerial {
        fn recv_byte(&mut self, _timeout_ms: u32) -> Result<u8, SerialError> {
            self.rx.pop_front().ok_or(SerialError::Timeout)
        }

        fn send_byte(&mut self, byte: u8) -> Result<(), SerialError> {
            self.tx.push(byte);
            Ok(())
        }

        fn flush_input(&mut self) {
            self.rx.clear();
        }
    }

    fn header_packet(name: &str, size: u32) -> Vec<u8> {
        let mut data = vec![0u8; 128];
        let payload = format!("{}\0{}", name, size);
        data[..payload.len()].copy_from_slice(payload.as_bytes());
        let crc = crc16(&data);
        let mut packet = vec![SOH, 0x00, 0xFF];
        packet.extend_from_slice(&data);
        packet.extend_from_slice(&crc.to_be_bytes());
        packet
    }

    fn data_packet(seq: u8, payload: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; 128];
        data[..payload.len()].copy_from_slice(payload);
        let crc = crc16(&data);
        let mut packet = vec![SOH, seq, !seq];
        packet.extend_from_slice(&data);
        packet.extend_from_slice(&crc.to_be_bytes());
        packet
    }

    fn info_with_size(size: u32) -> FileInfo {
        FileInfo {
            name: heapless::Vec::new(),
            size,
            received_size: 0,
            packet_count: 0,
            error_count: 0,
            state: TransferState::Idle,
        }
    }

    // === receive_header ===

    #[test]
    fn receives_and_parses_header() {
        let bytes = header_packet("firmware.bin", 4096);
        let mut io = FakeSerial::new(&bytes);
        let info = YmodemReceiver::receive_header(&mut io).unwrap();
        assert_eq!(&info.name[..], b"firmware.bin");
        assert_eq!(info.size, 4096);
        assert_eq!(io.tx.last(), Some(&ACK));
    }

    #[test]
    fn retries_on_corrupted_header_then_succeeds() {
        let mut bytes = vec![SOH, 0, 0xFF]; // truncated garbage packet, will time out mid-read
        bytes.extend_from_slice(&header_packet("a.bin", 10));
        let mut io = FakeSerial::new(&bytes);
        let info = YmodemReceiver::receive_header(&mut io).unwrap();
        assert_eq!(info.size, 10);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let io_bytes: Vec<u8> = Vec::new();
        let mut io = FakeSerial::new(&io_bytes);
        let err = YmodemReceiver::receive_header(&mut io).unwrap_err();
        assert_eq!(err, YmodemError::Timeout);
    }

    #[test]
    fn cancel_during_header_aborts_immediately() {
        // CAN is a single-byte control frame; the first CAN byte cancels,
        // it does not wait for a second one.
        let bytes = [CAN];
        let mut io = FakeSerial::new(&bytes);
        let err = YmodemReceiver::receive_header(&mut io).unwrap_err();
        assert_eq!(err, YmodemError::Cancelled);
    }

    // === receive_file ===

    #[test]
    fn receives_single_packet_then_eot() {
        let mut bytes = data_packet(1, b"hello");
        bytes.push(EOT);
        bytes.push(EOT);
        let mut io = FakeSerial::new(&bytes);
        let mut info = info_with_size(5);
        let mut received = Vec::new();
        YmodemReceiver::receive_file(&mut io, &mut info, |chunk| {
            received.extend_from_slice(chunk);
            true
        })
        .unwrap();
        assert_eq!(&received[..], b"hello");
        assert_eq!(info.received_size, 5);
        assert_eq!(info.packet_count, 1);
        assert_eq!(info.state, TransferState::Complete);
    }

    #[test]
    fn first_eot_gets_ack_then_c_not_nak() {
        let mut bytes = data_packet(1, b"hello");
        bytes.push(EOT);
        bytes.push(EOT);
        let mut io = FakeSerial::new(&bytes);
        let mut info = info_with_size(5);
        YmodemReceiver::receive_file(&mut io, &mut info, |_| true).unwrap();
        // ACK for the data packet, then ACK + C for the first EOT, then a
        // final ACK for the second EOT.
        assert_eq!(&io.tx[1..], &[ACK, C, ACK]);
    }

    #[test]
    fn sink_rejection_cancels_transfer() {
        let bytes = data_packet(1, b"hello");
        let mut io = FakeSerial::new(&bytes);
        let mut info = info_with_size(5);
        let err = YmodemReceiver::receive_file(&mut io, &mut info, |_| false).unwrap_err();
        assert_eq!(err, YmodemError::CallbackFailed);
        assert_eq!(&io.tx[io.tx.len() - 2..], &[CAN, CAN]);
        assert_eq!(info.state, TransferState::Error);
    }

    #[test]
    fn retry_exhaustion_sends_can_before_giving_up() {
        // No valid bytes at all: every read times out, so every iteration
        // counts as one packet error.
        let io_bytes: Vec<u8> = Vec::new();
        let mut io = FakeSerial::new(&io_bytes);
        let mut info = info_with_size(1024);
        let err = YmodemReceiver::receive_file(&mut io, &mut info, |_| true).unwrap_err();
        assert_eq!(err, YmodemError::Timeout);
        assert_eq!(io.tx.last(), Some(&CAN));
        // 9 NAKs for the first 9 errors, then CAN on the 10th.
        assert_eq!(io.tx.iter().filter(|&&b| b == NAK).count(), 9);
    }

    #[test]
    fn out_of_order_sequence_is_accepted_not_rejected() {
        // Documented upstream quirk: only seq ^ inv_seq == 0xFF is checked.
        let mut bytes = data_packet(5, b"skip");
        bytes.push(EOT);
        bytes.push(EOT);
        let mut io = FakeSerial::new(&bytes);
        let mut info = info_with_size(4);
        let result = YmodemReceiver::receive_file(&mut io, &mut info, |_| true);
        assert!(result.is_ok());
    }

    #[test]
    fn bad_crc_triggers_nak_and_retry() {
        let mut data = vec![0u8; 128];
        data[..4].copy_from_slice(b"data");
        let mut bytes = vec![SOH, 1, 0xFE];
        bytes.extend_from_slice(&data);
        bytes.extend_from_slice(&[0x00, 0x00]); // wrong CRC
        bytes.extend_from_slice(&data_packet(1, b"data"));
        bytes.push(EOT);
        bytes.push(EOT);
        let mut io = FakeSerial::new(&bytes);
        let mut info = info_with_size(4);
        let mut received = Vec::new();
        YmodemReceiver::receive_file(&mut io, &mut info, |chunk| {
            received.extend_from_slice(chunk);
            true
        })
        .unwrap();
        assert!(io.tx.contains(&NAK));
    }
}
