// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Board bring-up for the STM32F303-based target: clocks, the entry button,
//! the update UART, and the flash controller.

mod flash;
mod uart;

pub use flash::Stm32Flash;
pub use uart::Stm32Uart;

use stm32f3xx_hal::gpio::{Input, Pin, Gpioa, U};
use stm32f3xx_hal::pac;
use stm32f3xx_hal::prelude::*;

pub type EntryButtonPin = Pin<Gpioa, U<0>, Input>;

pub struct Board {
    pub entry_button: EntryButtonPin,
    pub uart: Stm32Uart,
    pub flash: Stm32Flash,
}

impl Board {
    /// Tears down the peripherals the bootloader was driving, ahead of
    /// handing control to the installed application.
    pub fn deinit_peripherals(&mut self) {
        self.uart.deinit();
    }
}

/// Brings up clocks off the internal oscillator, the entry-request button on
/// PA0 (pulled up, held low to request update mode), and USART1 at the
/// bootloader's fixed baud rate.
pub fn init() -> Board {
    let mut dp = unsafe { pac::Peripherals::steal() };

    let mut rcc = dp.RCC.constrain();
    let mut flash_cfg = dp.FLASH.constrain();
    let clocks = rcc.cfgr.freeze(&mut flash_cfg.acr);

    let mut gpioa = dp.GPIOA.split(&mut rcc.ahb);
    let entry_button = gpioa
        .pa0
        .into_pull_up_input(&mut gpioa.moder, &mut gpioa.pupdr);

    // Pins only need to be switched into the USART1 alternate function once;
    // the peripheral talks over them regardless of whether we keep the typed
    // handles around afterward.
    let _tx = gpioa.pa9.into_af7(&mut gpioa.moder, &mut gpioa.afrh);
    let _rx = gpioa.pa10.into_af7(&mut gpioa.moder, &mut gpioa.afrh);
    let uart = Stm32Uart::new(dp.USART1, &clocks, &mut rcc.apb2);

    // FLASH was consumed above by `constrain()` for clock setup; steal it
    // again for register-level program/erase access.
    let flash = Stm32Flash::new(unsafe { pac::Peripherals::steal() }.FLASH);

    Board {
        entry_button,
        uart,
        flash,
    }
}
