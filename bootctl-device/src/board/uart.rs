// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! USART1 wrapper exposing blocking, timed byte I/O via
//! [`bootctl_core::ymodem::SerialIo`].

use bootctl_core::ymodem::{SerialError, SerialIo};
use stm32f3xx_hal::pac::USART1;
use stm32f3xx_hal::rcc::{Clocks, APB2};

const BAUD_RATE: u32 = 115_200;

pub struct Stm32Uart {
    usart: USART1,
    cycles_per_ms: u32,
}

impl Stm32Uart {
    pub fn new(usart: USART1, clocks: &Clocks, apb2: &mut APB2) -> Self {
        apb2.enr().modify(|_, w| w.usart1en().set_bit());

        let brr = clocks.pclk2().0 / BAUD_RATE;
        usart.brr.write(|w| unsafe { w.bits(brr) });
        usart
            .cr1
            .modify(|_, w| w.ue().set_bit().te().set_bit().re().set_bit());

        Self {
            usart,
            cycles_per_ms: clocks.sysclk().0 / 1000,
        }
    }

    fn rxne(&self) -> bool {
        self.usart.isr.read().rxne().bit_is_set()
    }

    fn txe(&self) -> bool {
        self.usart.isr.read().txe().bit_is_set()
    }

    /// Disables the transmitter and receiver ahead of handover, so the
    /// application takes over USART1 in a known, idle state.
    pub fn deinit(&mut self) {
        self.usart
            .cr1
            .modify(|_, w| w.ue().clear_bit().te().clear_bit().re().clear_bit());
    }
}

impl SerialIo for Stm32Uart {
    fn recv_byte(&mut self, timeout_ms: u32) -> Result<u8, SerialError> {
        // Poll in roughly 1ms slices so the timeout budget is approximate
        // but bounded; exactness doesn't matter against a 1000ms budget.
        for _ in 0..timeout_ms.max(1) {
            if self.rxne() {
                return Ok(self.usart.rdr.read().rdr().bits() as u8);
            }
            cortex_m::asm::delay(self.cycles_per_ms);
        }
        Err(SerialError::Timeout)
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        while !self.txe() {
            cortex_m::asm::nop();
        }
        self.usart.tdr.write(|w| unsafe { w.tdr().bits(byte as u16) });
        Ok(())
    }

    fn flush_input(&mut self) {
        while self.rxne() {
            let _ = self.usart.rdr.read().rdr().bits();
        }
    }
}
