//! Disassembler for micro0 images.
//!
//! A linear sweep: bytes that decode to an opcode are shown as
//! instructions, everything else as `db`.

use crate::cpu::Instruction;

/// Disassemble the item at `offset` within `bytes`.
///
/// Returns the text and the number of bytes consumed. An opcode whose
/// operand runs past the end of `bytes` is shown as a literal byte.
pub fn disassemble_at(bytes: &[u8], offset: usize) -> (String, usize) {
    let Some(&byte) = bytes.get(offset) else {
        return (String::new(), 0);
    };

    match Instruction::from_opcode(byte) {
        Some(instr) if offset + instr.size() as usize <= bytes.len() => {
            let target = u16::from_le_bytes([bytes[offset + 1], bytes[offset + 2]]);
            (format_instruction(instr, target), instr.size() as usize)
        }
        _ => (format!("db {:#04x}", byte), 1),
    }
}

/// Disassemble a whole image.
pub fn disassemble(bytes: &[u8], origin: u16) -> String {
    let mut output = String::new();
    output.push_str("; micro0 disassembly\n");
    output.push_str("; ------------------\n\n");

    let mut offset = 0;
    while offset < bytes.len() {
        let (text, len) = disassemble_at(bytes, offset);
        let addr = origin.wrapping_add(offset as u16);
        let raw: Vec<String> = bytes[offset..offset + len]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        output.push_str(&format!("{:04x}:  {:<9} {}\n", addr, raw.join(" "), text));
        offset += len;
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: Instruction, target: u16) -> String {
    format!("{} [{:#06x}]", instr.mnemonic(), target)
}
