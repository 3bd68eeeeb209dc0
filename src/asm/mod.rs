//! Assembler and disassembler for micro0 programs.
//!
//! This module provides:
//! - A two-pass assembler (text → flat binary image)
//! - A disassembler (image → readable text)
//! - Helpers for reading and writing images on disk

pub mod assembler;
pub mod disasm;
pub mod image;
pub mod lexer;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_at};
pub use image::{load_image, save_image, ImageError};
pub use lexer::Location;
