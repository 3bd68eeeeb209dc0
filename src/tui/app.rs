//! Debugger application state and logic.

use crate::asm::disasm::disassemble_at;
use crate::{System, SystemConfig, SystemError};
use std::collections::HashSet;

/// Bytes shown per memory row.
pub const ROW_BYTES: usize = 16;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub system: System,
    /// Original image for reset.
    pub program: Vec<u8>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u16>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// First memory row shown.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<u8>, config: SystemConfig) -> Result<Self, SystemError> {
        let mut system = System::with_config(config)?;
        system.load(program.clone());

        Ok(Self {
            system,
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. 't' tick, 's' step, 'r' run, 'q' quit.".into(),
            mem_scroll: 0,
        })
    }

    /// Advance one clock tick.
    pub fn tick(&mut self) {
        match self.system.tick() {
            Ok(()) => {
                let cpu = self.system.cpu();
                self.status = format!("tick {} → {:?}", cpu.cycles, cpu.phase());
            }
            Err(e) => self.fault(e),
        }
    }

    /// Run to the end of the current instruction.
    pub fn step(&mut self) {
        let pc = self.system.cpu().regs.pc;
        match self.system.step() {
            Ok(ticks) => {
                let offset = pc.wrapping_sub(self.system.config().ram_base) as usize;
                let (text, _) = disassemble_at(self.system.ram(), offset);
                self.status = format!("{:04x}: {} ({} ticks)", pc, text, ticks);
            }
            Err(e) => self.fault(e),
        }
    }

    /// Run until breakpoint or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one instruction of continuous execution.
    pub fn update(&mut self) {
        if !self.running {
            return;
        }

        if !self.system.cpu().is_running() {
            self.running = false;
            self.status = format!("Faulted after {} ticks", self.system.cpu().cycles);
            return;
        }

        self.step();

        // Check for breakpoint
        let pc = self.system.cpu().regs.pc;
        if self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={:04x}", pc);
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.system.cpu().regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:04x}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:04x}", pc);
        }
    }

    /// Reset the machine and reload the original image.
    pub fn reset(&mut self) {
        self.system.reset();
        self.system.load(self.program.clone());
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Scroll the memory view by `rows` (negative scrolls up).
    pub fn scroll_memory(&mut self, rows: isize) {
        let max_row = self.system.ram().len().saturating_sub(1) / ROW_BYTES;
        self.mem_scroll = self.mem_scroll.saturating_add_signed(rows).min(max_row);
    }

    /// Bus address of the RAM byte at `offset`, or `None` if it lies past
    /// the top of the address space.
    pub fn memory_address(&self, offset: usize) -> Option<u16> {
        u16::try_from(self.system.config().ram_base as usize + offset).ok()
    }

    /// Get disassembly around current PC.
    ///
    /// Returns `(address, text, is_current)` for up to `lines` items.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let ram = self.system.ram();
        let origin = self.system.config().ram_base;
        let pc = self.system.cpu().regs.pc.wrapping_sub(origin) as usize;

        // Sweep from 0 so instructions stay aligned; PC may point into the
        // middle of a sweep item if the program jumps into data.
        let mut items = Vec::new();
        let mut offset = 0;
        while offset < ram.len() {
            let (text, len) = disassemble_at(ram, offset);
            items.push((offset, text));
            offset += len;
        }

        let current = items
            .iter()
            .rposition(|(addr, _)| *addr <= pc)
            .unwrap_or(0);
        let start = current.saturating_sub(lines / 2);

        items
            .into_iter()
            .skip(start)
            .take(lines)
            .map(|(offset, text)| (origin.wrapping_add(offset as u16), text, offset == pc))
            .collect()
    }

    fn fault(&mut self, error: SystemError) {
        self.status = format!("Error: {}", error);
        self.running = false;
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<u8>, config: SystemConfig) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    let mut app = DebuggerApp::new(program, config).map_err(std::io::Error::other)?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Main loop
    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('t') => {
                            app.running = false;
                            app.tick();
                        }
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_memory(-1),
                        KeyCode::Down => app.scroll_memory(1),
                        KeyCode::PageUp => app.scroll_memory(-16),
                        KeyCode::PageDown => app.scroll_memory(16),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.update();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> DebuggerApp {
        // load [6]; brz [3]; data
        let program = vec![0x01, 0x06, 0x00, 0x04, 0x03, 0x00, 0x00];
        DebuggerApp::new(program, SystemConfig::default()).unwrap()
    }

    #[test]
    fn test_step_and_reset() {
        let mut app = app();
        app.step();
        assert_eq!(app.system.cpu().regs.pc, 3);
        assert!(app.status.contains("load"));

        app.reset();
        assert_eq!(app.system.cpu().regs.pc, 0);
        assert_eq!(app.system.ram()[0], 0x01);
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = app();
        app.step();
        app.toggle_breakpoint();
        app.reset();

        app.run();
        app.update();
        assert!(!app.running);
        assert_eq!(app.system.cpu().regs.pc, 3);
    }

    #[test]
    fn test_disassembly_marks_pc() {
        let mut app = app();
        app.step();

        let lines = app.get_disassembly(4);
        assert_eq!(lines[0].1, "load [0x0006]");
        assert!(lines.iter().any(|(addr, text, cur)| *addr == 3 && *cur && text == "brz [0x0003]"));
    }

    #[test]
    fn test_memory_address_stops_at_top_of_address_space() {
        let config = SystemConfig { ram_base: 0x0100, ..SystemConfig::default() };
        let app = DebuggerApp::new(vec![0; 0x1_0000], config).unwrap();

        assert_eq!(app.memory_address(0), Some(0x0100));
        assert_eq!(app.memory_address(0xFEFF), Some(0xFFFF));
        assert_eq!(app.memory_address(0xFF00), None);
        assert_eq!(app.memory_address(0xFFFF), None);
    }

    #[test]
    fn test_fault_stops_running() {
        let mut app = DebuggerApp::new(vec![0xEE], SystemConfig::default()).unwrap();
        app.run();
        app.update();

        assert!(!app.running);
        assert!(app.status.starts_with("Error"));
    }
}
