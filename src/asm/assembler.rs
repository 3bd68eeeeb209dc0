//! Two-pass assembler for micro0 programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//!         .org 0x0000        ; Start a section at an origin
//! start:  load [value]       ; Load from a labelled address
//!         add [0x1001]       ; Add from an absolute address
//!         store [0xf000]     ; Write a character
//!         brz [start]        ; Branch if ACC is zero
//!
//!         .org 0x1000
//! value:  db 0x48            ; Literal byte
//!         db 1 /* block comments work too */
//! ```
//!
//! Pass 1 lays out sections in ascending origin order and records label
//! addresses. Pass 2 writes opcodes, little-endian operands, and literal
//! bytes into a zero-filled flat image.

use crate::asm::lexer::{parse_error, tokenize, Location, Token, TokenKind};
use crate::cpu::Instruction;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a flat binary image.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(AssemblerError::Empty);
    }

    let sections = Parser::new(tokens).program()?;
    Assembler::new(sections).assemble()
}

/// A direct-address operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Address(u16),
    Label(String),
}

/// One element of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Label(String),
    Instruction(Instruction, Operand),
    Byte(u8),
}

impl Item {
    /// Bytes this item occupies in the image.
    pub fn size(&self) -> u16 {
        match self {
            Item::Label(_) => 0,
            Item::Instruction(instr, _) => instr.size(),
            Item::Byte(_) => 1,
        }
    }
}

/// A run of items starting at an `.org` origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub origin: u16,
    pub location: Location,
    pub items: Vec<(Item, Location)>,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn end_location(&self) -> Location {
        self.tokens.last().map(|t| t.location).unwrap_or_default()
    }

    fn expect(&mut self, expected: TokenKind, context: &str) -> Result<Location, AssemblerError> {
        match self.next() {
            Some(token) if token.kind == expected => Ok(token.location),
            Some(token) => Err(parse_error(
                token.location,
                format!("expected {} {}, found {}", expected, context, token.kind),
            )),
            None => Err(parse_error(
                self.end_location(),
                format!("expected {} {}, found end of input", expected, context),
            )),
        }
    }

    fn number(&mut self, context: &str) -> Result<(u32, Location), AssemblerError> {
        match self.next() {
            Some(Token { kind: TokenKind::Number(n), location }) => Ok((n, location)),
            Some(token) => Err(parse_error(
                token.location,
                format!("expected number {}, found {}", context, token.kind),
            )),
            None => Err(parse_error(
                self.end_location(),
                format!("expected number {}, found end of input", context),
            )),
        }
    }

    fn program(&mut self) -> Result<Vec<Section>, AssemblerError> {
        let mut sections = Vec::new();
        while self.peek().is_some() {
            sections.push(self.section()?);
        }
        Ok(sections)
    }

    fn section(&mut self) -> Result<Section, AssemblerError> {
        let location = self.expect(TokenKind::Org, "to start a section")?;
        let (origin, origin_loc) = self.number("after `.org`")?;
        let origin = to_address(origin, origin_loc)?;

        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::Org {
                break;
            }
            items.push(self.item()?);
        }

        if items.is_empty() {
            return Err(parse_error(location, "section contains no instructions"));
        }

        Ok(Section { origin, location, items })
    }

    fn item(&mut self) -> Result<(Item, Location), AssemblerError> {
        let Some(token) = self.next() else {
            return Err(parse_error(self.end_location(), "unexpected end of input"));
        };
        let location = token.location;

        let name = match token.kind {
            TokenKind::Ident(name) => name,
            other => {
                return Err(parse_error(
                    location,
                    format!("expected label or mnemonic, found {}", other),
                ));
            }
        };

        if self.peek().is_some_and(|t| t.kind == TokenKind::Colon) {
            self.next();
            return Ok((Item::Label(name), location));
        }

        if name.eq_ignore_ascii_case("db") {
            let (value, value_loc) = self.number("after `db`")?;
            let byte = u8::try_from(value).map_err(|_| AssemblerError::ValueOutOfRange {
                location: value_loc,
                value,
            })?;
            return Ok((Item::Byte(byte), location));
        }

        let instr = Instruction::from_mnemonic(&name)
            .ok_or_else(|| parse_error(location, format!("unknown mnemonic `{}`", name)))?;
        let operand = self.direct_address(instr)?;
        Ok((Item::Instruction(instr, operand), location))
    }

    fn direct_address(&mut self, instr: Instruction) -> Result<Operand, AssemblerError> {
        let context = format!("after `{}`", instr.mnemonic());
        self.expect(TokenKind::LBracket, &context)?;

        let operand = match self.next() {
            Some(Token { kind: TokenKind::Number(n), location }) => {
                Operand::Address(to_address(n, location)?)
            }
            Some(Token { kind: TokenKind::Ident(label), .. }) => Operand::Label(label),
            Some(token) => {
                return Err(parse_error(
                    token.location,
                    format!("expected address or label, found {}", token.kind),
                ));
            }
            None => {
                return Err(parse_error(self.end_location(), "expected address or label"));
            }
        };

        self.expect(TokenKind::RBracket, "to close the address")?;
        Ok(operand)
    }
}

fn to_address(value: u32, location: Location) -> Result<u16, AssemblerError> {
    u16::try_from(value).map_err(|_| AssemblerError::ValueOutOfRange { location, value })
}

/// The assembler state.
struct Assembler {
    /// Sections in ascending origin order.
    sections: Vec<Section>,
    /// Symbol table (label -> address).
    symbols: HashMap<String, u16>,
    /// One past the highest address written.
    end: usize,
}

impl Assembler {
    fn new(mut sections: Vec<Section>) -> Self {
        sections.sort_by_key(|s| s.origin);
        Self {
            sections,
            symbols: HashMap::new(),
            end: 0,
        }
    }

    fn assemble(&mut self) -> Result<Vec<u8>, AssemblerError> {
        // Pass 1: lay out sections and collect labels
        self.layout()?;

        // Pass 2: emit bytes
        let mut image = vec![0u8; self.end];
        for section in &self.sections {
            let mut addr = section.origin as usize;
            for (item, location) in &section.items {
                self.emit(&mut image, addr, item, *location)?;
                addr += item.size() as usize;
            }
        }

        Ok(image)
    }

    fn layout(&mut self) -> Result<(), AssemblerError> {
        let mut previous: Option<(u16, usize)> = None;

        for section in &self.sections {
            if let Some((first, prev_end)) = previous {
                if (section.origin as usize) < prev_end {
                    return Err(AssemblerError::OverlappingSections {
                        first,
                        second: section.origin,
                    });
                }
            }

            let mut addr = section.origin as usize;
            for (item, location) in &section.items {
                if let Item::Label(name) = item {
                    if self.symbols.contains_key(name) {
                        return Err(AssemblerError::DuplicateLabel {
                            location: *location,
                            label: name.clone(),
                        });
                    }
                    let value = to_address(addr as u32, *location)?;
                    self.symbols.insert(name.clone(), value);
                }

                addr += item.size() as usize;
                if addr > 0x1_0000 {
                    return Err(AssemblerError::ValueOutOfRange {
                        location: *location,
                        value: addr as u32,
                    });
                }
            }

            previous = Some((section.origin, addr));
            self.end = self.end.max(addr);
        }

        Ok(())
    }

    fn emit(&self, image: &mut [u8], addr: usize, item: &Item, location: Location) -> Result<(), AssemblerError> {
        match item {
            Item::Label(_) => {}
            Item::Byte(value) => image[addr] = *value,
            Item::Instruction(instr, operand) => {
                let target = match operand {
                    Operand::Address(a) => *a,
                    Operand::Label(label) => *self.symbols.get(label).ok_or_else(|| {
                        AssemblerError::UnresolvedSymbol {
                            location,
                            label: label.clone(),
                        }
                    })?,
                };
                let [lo, hi] = target.to_le_bytes();
                image[addr] = instr.opcode();
                image[addr + 1] = lo;
                image[addr + 2] = hi;
            }
        }
        Ok(())
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error at {location}: {message}")]
    Parse { location: Location, message: String },

    #[error("unresolved symbol `{label}` at {location}")]
    UnresolvedSymbol { location: Location, label: String },

    #[error("label `{label}` defined twice (second definition at {location})")]
    DuplicateLabel { location: Location, label: String },

    #[error("value {value:#x} out of range at {location}")]
    ValueOutOfRange { location: Location, value: u32 },

    #[error("section at {second:#06x} overlaps section at {first:#06x}")]
    OverlappingSections { first: u16, second: u16 },

    #[error("source contains no sections")]
    Empty,
}
