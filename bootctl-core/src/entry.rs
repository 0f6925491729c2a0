// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Decides, on every reset, whether to stay in the bootloader and wait for a
//! YMODEM transfer or hand over to the installed application.
//!
//! Order of precedence: an operator holding the entry button down always
//! wins, then a running application's request to re-enter update mode left
//! in the RAM entry-request cell, then simply having no valid application
//! installed. Anything else boots straight to the application.

/// Snapshot of the three signals the decision depends on. Reading the RAM
/// entry-request cell is destructive (the caller must clear it after
/// reading), so that side effect lives outside this pure function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInputs {
    pub button_held: bool,
    pub ram_request_present: bool,
    pub image_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDecision {
    EnterUpdate,
    Handover,
}

pub fn decide(inputs: EntryInputs) -> EntryDecision {
    if inputs.button_held {
        return EntryDecision::EnterUpdate;
    }
    if inputs.ram_request_present {
        return EntryDecision::EnterUpdate;
    }
    if !inputs.image_valid {
        return EntryDecision::EnterUpdate;
    }
    EntryDecision::Handover
}
