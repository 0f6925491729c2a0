// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! End-to-end scenarios driving entry decision, update sequencing and image
//! validation together through the public API, the way a real boot cycle
//! would chain them.

use bootctl_core::entry::{decide, EntryDecision, EntryInputs};
use bootctl_core::layout::{APP_START, META_ADDR};
use bootctl_core::metadata::FirmwareMetadata;
use bootctl_core::update::{run_update, FlashError, FlashIo};
use bootctl_core::validator::validate_installed_image;
use bootctl_core::ymodem::{SerialError, SerialIo};
use std::collections::{HashMap, VecDeque};

// === shared fakes ===

struct MemFlash {
    cells: HashMap<u32, u16>,
    locked: bool,
}

impl MemFlash {
    fn new() -> Self {
        Self {
            cells: HashMap::new(),
            locked: true,
        }
    }

    fn write_word(&mut self, addr: u32, value: u32) {
        let bytes = value.to_le_bytes();
        self.cells.insert(addr, u16::from_le_bytes([bytes[0], bytes[1]]));
        self.cells
            .insert(addr + 2, u16::from_le_bytes([bytes[2], bytes[3]]));
    }
}

impl FlashIo for MemFlash {
    fn unlock(&mut self) -> Result<(), FlashError> {
        self.locked = false;
        Ok(())
    }
    fn lock(&mut self) {
        self.locked = true;
    }
    fn erase_pages(&mut self, start_addr: u32, page_count: u32) -> Result<(), FlashError> {
        for page in 0..page_count {
            for i in 0..512u32 {
                self.cells.insert(start_addr + page * 1024 + i * 2, 0xFFFF);
            }
        }
        Ok(())
    }
    fn program_halfword(&mut self, addr: u32, value: u16) -> Result<(), FlashError> {
        self.cells.insert(addr, value);
        Ok(())
    }
    fn read_halfword(&self, addr: u32) -> u16 {
        *self.cells.get(&addr).unwrap_or(&0xFFFF)
    }
}

struct ScriptedSerial {
    rx: VecDeque<u8>,
}

impl ScriptedSerial {
    fn new(bytes: Vec<u8>) -> Self {
        Self {
            rx: bytes.into_iter().collect(),
        }
    }
}

impl SerialIo for ScriptedSerial {
    fn recv_byte(&mut self, _timeout_ms: u32) -> Result<u8, SerialError> {
        self.rx.pop_front().ok_or(SerialError::Timeout)
    }
    fn send_byte(&mut self, _byte: u8) -> Result<(), SerialError> {
        Ok(())
    }
    fn flush_input(&mut self) {
        self.rx.clear();
    }
}

fn crc16(data: &[u8]) -> u16 {
    bootctl_core::crc::crc16(data)
}

fn header_packet(name: &str, size: u32) -> Vec<u8> {
    let mut data = vec![0u8; 128];
    let payload = format!("{}\0{}", name, size);
    data[..payload.len()].copy_from_slice(payload.as_bytes());
    let crc = crc16(&data);
    let mut packet = vec![0x01, 0x00, 0xFF];
    packet.extend_from_slice(&data);
    packet.extend_from_slice(&crc.to_be_bytes());
    packet
}

fn data_packet(seq: u8, payload: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8; 128];
    data[..payload.len()].copy_from_slice(payload);
    let crc = crc16(&data);
    let mut packet = vec![0x01, seq, !seq];
    packet.extend_from_slice(&data);
    packet.extend_from_slice(&crc.to_be_bytes());
    packet
}

fn transfer_bytes(name: &str, payload: &[u8]) -> Vec<u8> {
    let mut bytes = header_packet(name, payload.len() as u32);
    bytes.extend_from_slice(&data_packet(1, payload));
    bytes.push(0x04);
    bytes.push(0x04);
    bytes
}

// === scenarios ===

#[test]
fn scenario_factory_fresh_board_has_no_valid_image_and_enters_update() {
    let flash = MemFlash::new();
    let valid = validate_installed_image(&flash, APP_START, META_ADDR);
    assert!(!valid);

    let decision = decide(EntryInputs {
        button_held: false,
        ram_request_present: false,
        image_valid: valid,
    });
    assert_eq!(decision, EntryDecision::EnterUpdate);
}

#[test]
fn scenario_successful_update_then_reset_boots_straight_through() {
    let payload = b"a-complete-firmware-image";
    let mut io = ScriptedSerial::new(transfer_bytes("fw.bin", payload));
    let mut flash = MemFlash::new();

    let meta = run_update(&mut flash, &mut io).expect("update should succeed");
    assert!(meta.is_magic_valid());

    let valid = validate_installed_image(&flash, APP_START, META_ADDR);
    // Image body isn't a real vector table in this test, so validation still
    // fails on the SP/reset-vector checks even though metadata is intact.
    assert!(!valid);

    // Simulate a well-formed vector table to check the full handover gate.
    flash.write_word(APP_START, 0x2000_1000);
    flash.write_word(APP_START + 4, 0x0800_4001);
    assert!(validate_installed_image(&flash, APP_START, META_ADDR));

    let decision = decide(EntryInputs {
        button_held: false,
        ram_request_present: false,
        image_valid: true,
    });
    assert_eq!(decision, EntryDecision::Handover);
}

#[test]
fn scenario_button_held_overrides_an_otherwise_valid_image() {
    let mut flash = MemFlash::new();
    flash.write_word(APP_START, 0x2000_1000);
    flash.write_word(APP_START + 4, 0x0800_4001);
    flash.write_word(META_ADDR, FirmwareMetadata::MAGIC);

    let valid = validate_installed_image(&flash, APP_START, META_ADDR);
    assert!(valid);

    let decision = decide(EntryInputs {
        button_held: true,
        ram_request_present: false,
        image_valid: valid,
    });
    assert_eq!(decision, EntryDecision::EnterUpdate);
}

#[test]
fn scenario_app_requests_reentry_via_ram_cell() {
    let mut flash = MemFlash::new();
    flash.write_word(APP_START, 0x2000_1000);
    flash.write_word(APP_START + 4, 0x0800_4001);
    flash.write_word(META_ADDR, FirmwareMetadata::MAGIC);

    let decision = decide(EntryInputs {
        button_held: false,
        ram_request_present: true,
        image_valid: validate_installed_image(&flash, APP_START, META_ADDR),
    });
    assert_eq!(decision, EntryDecision::EnterUpdate);
}

#[test]
fn scenario_transfer_never_starts_leaves_flash_untouched() {
    let mut io = ScriptedSerial::new(Vec::new());
    let mut flash = MemFlash::new();
    let err = run_update(&mut flash, &mut io).unwrap_err();
    assert!(flash.cells.is_empty());
    let _ = err;
}

#[test]
fn scenario_crashed_mid_update_leaves_magic_invalid_forcing_reentry() {
    // Metadata is written last; simulate a reset right after the payload but
    // before the metadata record.
    let mut flash = MemFlash::new();
    flash.erase_pages(META_ADDR, 1).unwrap();
    flash.write_word(APP_START, 0x2000_1000);
    flash.write_word(APP_START + 4, 0x0800_4001);
    // META_ADDR left erased (0xFFFF cells) -- no metadata written.

    assert!(!validate_installed_image(&flash, APP_START, META_ADDR));
}
