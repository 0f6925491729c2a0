// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! YMODEM firmware-update bootloader for an STM32F303-class target.

#![no_std]
#![no_main]

mod board;

use bootctl_core::entry::{decide, EntryDecision, EntryInputs};
use bootctl_core::layout::{APP_START, META_ADDR, RAM_ENTRY_REQUEST_ADDR, RAM_ENTRY_REQUEST_MAGIC};
use bootctl_core::update::{run_update, ErrorBudget};
use bootctl_core::validator::validate_installed_image;

use cortex_m_rt::entry;
use defmt_rtt as _;
use panic_probe as _;
use stm32f3xx_hal::prelude::*;

defmt::timestamp!("{=u64:us}", { 0 });

/// Reads and clears the RAM entry-request cell. Destructive by design: a
/// request is good for exactly one boot.
fn take_ram_entry_request() -> bool {
    unsafe {
        let cell = RAM_ENTRY_REQUEST_ADDR as *mut u32;
        let present = core::ptr::read_volatile(cell) == RAM_ENTRY_REQUEST_MAGIC;
        core::ptr::write_volatile(cell, 0);
        present
    }
}

#[entry]
fn main() -> ! {
    defmt::println!("bootctl-device starting");

    let mut board = board::init();
    let ram_request_present = take_ram_entry_request();

    let image_valid = validate_installed_image(&board.flash, APP_START, META_ADDR);
    let button_held = board.entry_button.is_low().unwrap_or(false);

    let decision = decide(EntryInputs {
        button_held,
        ram_request_present,
        image_valid,
    });

    if decision == EntryDecision::Handover {
        defmt::println!("valid image found, handing over");
        unsafe {
            bootctl_core::handover::jump_to_application(APP_START, || board.deinit_peripherals())
        }
    }

    defmt::println!("entering update mode");
    let mut budget = ErrorBudget::default();
    loop {
        match run_update(&mut board.flash, &mut board.uart) {
            Ok(meta) => {
                defmt::println!("update complete, size={} crc32={:x}", meta.size, meta.crc32);
                budget.record_success();
                if validate_installed_image(&board.flash, APP_START, META_ADDR) {
                    unsafe {
                        bootctl_core::handover::jump_to_application(APP_START, || {
                            board.deinit_peripherals()
                        })
                    }
                }
            }
            Err(_) => {
                defmt::println!("update attempt failed");
                budget.record_failure();
                if budget.should_reset() {
                    cortex_m::peripheral::SCB::sys_reset();
                }
            }
        }
    }
}
