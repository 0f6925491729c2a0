// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Final handover from the bootloader to the installed application.
//!
//! Unlike a RAM-resident multiboot image, the application here already
//! lives in flash at its final address, so handover only has to relocate
//! the vector table and jump — no copy. Everything past the `cpsid i` is a
//! one-way trip; there is no return path into the bootloader short of a
//! reset.

#[cfg(target_arch = "arm")]
use core::arch::asm;

/// Disables interrupts, deinitializes the peripherals the bootloader was
/// driving, points VTOR at `app_start`, loads the application's initial
/// stack pointer, and branches to its reset vector.
///
/// `deinit_peripherals` runs after interrupts are disabled but before VTOR
/// is relocated, so the application boots with the bootloader's UART and
/// any other claimed peripherals already torn down.
///
/// # Safety
/// `app_start` must point at a flash region already validated by
/// [`crate::validator::validate_installed_image`]: a plausible RAM stack
/// pointer followed by a plausible Thumb reset vector. Calling this on an
/// unvalidated image is undefined behavior.
#[cfg(target_arch = "arm")]
pub unsafe fn jump_to_application(app_start: u32, deinit_peripherals: impl FnOnce()) -> ! {
    let vtor = 0xE000_ED08 as *mut u32;
    let initial_sp = core::ptr::read_volatile(app_start as *const u32);
    let reset_vector = core::ptr::read_volatile((app_start + 4) as *const u32);

    asm!("cpsid i");
    deinit_peripherals();
    core::ptr::write_volatile(vtor, app_start);
    asm!(
        "msr msp, {sp}",
        "bx {entry}",
        sp = in(reg) initial_sp,
        entry = in(reg) reset_vector,
        options(noreturn),
    );
}
