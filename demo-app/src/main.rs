// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Minimal application image: blinks an LED and, on request, drops back into
//! bootctl-device's update mode by writing the RAM entry-request cell and
//! resetting.
//!
//! Not part of the bootloader proper -- this exists only so the bootloader's
//! update and handover path has something real to hand over to.

#![no_std]
#![no_main]

use bootctl_core::layout::{RAM_ENTRY_REQUEST_ADDR, RAM_ENTRY_REQUEST_MAGIC};
use cortex_m_rt::entry;
use defmt_rtt as _;
use panic_probe as _;
use stm32f3xx_hal::pac;
use stm32f3xx_hal::prelude::*;

defmt::timestamp!("{=u64:us}", { 0 });

/// Writes the RAM magic the bootloader looks for on its next reset, then
/// resets. Never returns.
fn reboot_to_bootloader() -> ! {
    defmt::println!("requesting bootloader update mode");
    unsafe {
        core::ptr::write_volatile(RAM_ENTRY_REQUEST_ADDR as *mut u32, RAM_ENTRY_REQUEST_MAGIC);
    }
    cortex_m::asm::delay(1_000_000);
    cortex_m::peripheral::SCB::sys_reset();
}

#[entry]
fn main() -> ! {
    defmt::println!("demo-app started");

    let dp = unsafe { pac::Peripherals::steal() };
    let mut rcc = dp.RCC.constrain();
    let mut gpioa = dp.GPIOA.split(&mut rcc.ahb);
    let mut led = gpioa
        .pa5
        .into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper);
    let button = gpioa
        .pa0
        .into_pull_up_input(&mut gpioa.moder, &mut gpioa.pupdr);

    let mut cycles = 0u32;
    loop {
        if button.is_low().unwrap_or(false) {
            reboot_to_bootloader();
        }

        cycles = cycles.wrapping_add(1);
        if cycles % 500_000 == 0 {
            led.toggle().ok();
        }
    }
}
