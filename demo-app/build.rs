// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use std::env;
use std::fs;
use std::path::PathBuf;

const MEMORY_X: &str = r#"
MEMORY
{
  FLASH : ORIGIN = 0x08004000, LENGTH = 0xC000
  RAM   : ORIGIN = 0x20000000, LENGTH = 40K
}

_stack_start = ORIGIN(RAM) + LENGTH(RAM);
"#;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("memory.x"), MEMORY_X).expect("failed to write memory.x");

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg=-Tlink.x");
    println!("cargo:rustc-link-arg=-Tdefmt.x");
    println!("cargo:rerun-if-changed=build.rs");
}
