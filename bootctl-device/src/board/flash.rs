// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Register-level FLASH driver: unlock sequence, page erase, half-word
//! programming with read-back verification.

use bootctl_core::update::{FlashError, FlashIo};
use cortex_m::asm;
use stm32f3xx_hal::pac::FLASH;

const FLASH_KEYR_KEY_1: u32 = 0x4567_0123;
const FLASH_KEYR_KEY_2: u32 = 0xCDEF_89AB;

pub struct Stm32Flash {
    flash: FLASH,
}

impl Stm32Flash {
    pub fn new(flash: FLASH) -> Self {
        Self { flash }
    }

    fn wait_not_busy(&self) {
        while self.flash.sr.read().bsy().bit_is_set() {
            asm::nop();
        }
    }

    fn clear_eop_if_set(&self) -> Result<(), FlashError> {
        if self.flash.sr.read().eop().bit_is_set() {
            self.flash.sr.modify(|_, w| w.eop().clear_bit());
            Ok(())
        } else {
            Err(FlashError::Program)
        }
    }
}

impl FlashIo for Stm32Flash {
    fn unlock(&mut self) -> Result<(), FlashError> {
        self.flash.keyr.write(|w| w.fkeyr().bits(FLASH_KEYR_KEY_1));
        self.flash.keyr.write(|w| w.fkeyr().bits(FLASH_KEYR_KEY_2));
        if self.flash.cr.read().lock().bit_is_set() {
            return Err(FlashError::Unaligned);
        }
        Ok(())
    }

    fn lock(&mut self) {
        self.flash.cr.modify(|_, w| w.lock().set_bit());
    }

    fn erase_pages(&mut self, start_addr: u32, page_count: u32) -> Result<(), FlashError> {
        const PAGE_SIZE: u32 = bootctl_core::layout::FLASH_PAGE_SIZE;
        for page in 0..page_count {
            let addr = start_addr + page * PAGE_SIZE;
            self.wait_not_busy();
            self.flash.cr.modify(|_, w| w.per().set_bit());
            self.flash.ar.write(|w| unsafe { w.bits(addr) });
            self.flash.cr.modify(|_, w| w.strt().set_bit());
            self.wait_not_busy();
            self.clear_eop_if_set().map_err(|_| FlashError::Erase)?;
            self.flash.cr.modify(|_, w| w.per().clear_bit());
        }
        Ok(())
    }

    fn program_halfword(&mut self, addr: u32, value: u16) -> Result<(), FlashError> {
        if addr % 2 != 0 {
            return Err(FlashError::Unaligned);
        }
        self.wait_not_busy();
        self.flash.cr.modify(|_, w| w.pg().set_bit());
        unsafe {
            core::ptr::write_volatile(addr as *mut u16, value);
        }
        self.wait_not_busy();
        self.clear_eop_if_set()?;
        self.flash.cr.modify(|_, w| w.pg().clear_bit());

        let written = unsafe { core::ptr::read_volatile(addr as *const u16) };
        if written != value {
            return Err(FlashError::ReadBack);
        }
        Ok(())
    }

    fn read_halfword(&self, addr: u32) -> u16 {
        unsafe { core::ptr::read_volatile(addr as *const u16) }
    }
}
