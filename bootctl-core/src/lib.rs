// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Hardware-independent core of the YMODEM firmware-update bootloader.
//!
//! This crate owns the protocol state machines and update sequencing; it
//! never touches a register directly. Concrete boards plug in an
//! implementation of [`SerialIo`] and [`FlashIo`] and drive the functions
//! here from their `main`.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod crc;
pub mod entry;
pub mod handover;
pub mod layout;
pub mod metadata;
pub mod update;
pub mod validator;
pub mod ymodem;

pub use metadata::FirmwareMetadata;
pub use update::{FlashError, FlashIo, UpdateError};
pub use ymodem::{FileInfo, SerialError, SerialIo, TransferState};
