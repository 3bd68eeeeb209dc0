//! WebAssembly bindings for the micro0 emulator.
//!
//! This module provides JavaScript-friendly wrappers around [`System`].

use wasm_bindgen::prelude::*;
use crate::System;
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_at;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmSystem {
    system: System,
    program: Vec<u8>,
}

#[wasm_bindgen]
impl WasmSystem {
    /// Create a new machine with the standard memory map.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmSystem, JsError> {
        Ok(Self {
            system: System::new().map_err(js_error)?,
            program: Vec::new(),
        })
    }

    /// Assemble source code and load it. Returns the image size in bytes.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let image = assemble(source).map_err(js_error)?;
        Ok(self.load_binary(&image))
    }

    /// Load a raw image. Returns its size in bytes.
    #[wasm_bindgen]
    pub fn load_binary(&mut self, image: &[u8]) -> usize {
        self.program = image.to_vec();
        self.system.reset();
        self.system.load(self.program.clone());
        self.program.len()
    }

    /// Advance one clock tick.
    #[wasm_bindgen]
    pub fn tick(&mut self) -> Result<(), JsError> {
        self.system.tick().map_err(js_error)
    }

    /// Run to the end of the current instruction. Returns the disassembled
    /// instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let offset = self.system.cpu().regs.pc.wrapping_sub(self.system.config().ram_base);
        self.system.step().map_err(js_error)?;
        let (text, _) = disassemble_at(self.system.ram(), offset as usize);
        Ok(text)
    }

    /// Run exactly `cycles` ticks. Returns the total tick count.
    #[wasm_bindgen]
    pub fn run(&mut self, cycles: u32) -> Result<u64, JsError> {
        self.system.run(cycles as u64).map_err(js_error)?;
        Ok(self.system.cpu().cycles)
    }

    /// Reset CPU and reload the last image.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.system.reset();
        self.system.load(self.program.clone());
    }

    #[wasm_bindgen]
    pub fn is_faulted(&self) -> bool {
        self.system.cpu().is_faulted()
    }

    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.system.cpu().cycles
    }

    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.system.cpu().regs.pc
    }

    #[wasm_bindgen]
    pub fn accumulator(&self) -> u8 {
        self.system.cpu().regs.acc
    }

    #[wasm_bindgen]
    pub fn index(&self) -> u16 {
        self.system.cpu().regs.index
    }

    #[wasm_bindgen]
    pub fn buffer(&self) -> u8 {
        self.system.cpu().regs.buffer
    }

    #[wasm_bindgen]
    pub fn tick_counter(&self) -> u8 {
        self.system.cpu().tick_counter()
    }

    /// Get RAM byte at an image offset.
    #[wasm_bindgen]
    pub fn memory_at(&self, offset: usize) -> u8 {
        self.system.ram().get(offset).copied().unwrap_or(0)
    }

    /// Get the whole RAM image.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<u8> {
        self.system.ram().to_vec()
    }

    /// Get accumulated character output as text.
    #[wasm_bindgen]
    pub fn output(&self) -> String {
        self.system.output_text()
    }

    /// Get CPU state as a JSON string.
    #[wasm_bindgen]
    pub fn cpu_json(&self) -> Result<String, JsError> {
        serde_json::to_string(self.system.cpu()).map_err(js_error)
    }
}

/// Assemble source code and return the image.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<Vec<u8>, JsError> {
    assemble(source).map_err(js_error)
}

/// Disassemble the instruction at the start of `bytes`.
#[wasm_bindgen]
pub fn wasm_disassemble(bytes: &[u8]) -> String {
    disassemble_at(bytes, 0).0
}
