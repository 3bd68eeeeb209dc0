//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem, Wrap},
    style::{Color, Style, Modifier},
};
use crate::Phase;
use super::app::{DebuggerApp, ROW_BYTES};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(frame.area());

    // Left side: code, registers, status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory, output, help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(5),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_output(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:04x}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cpu = app.system.cpu();
    let regs = &cpu.regs;

    let content = vec![
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:04x}", regs.pc), Style::default().fg(Color::Yellow)),
            Span::raw("   INDEX: "),
            Span::styled(format!("{:04x}", regs.index), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("ACC: "),
            Span::styled(format!("{:02x}", regs.acc), Style::default().fg(Color::White)),
            Span::raw(format!(" ({:>3})", regs.acc)),
            Span::raw("   BUFFER: "),
            Span::styled(format!("{:02x}", regs.buffer), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Tick: "),
            Span::styled(format!("{}", cpu.tick_counter()), phase_style(cpu.phase())),
            Span::raw(format!("  {:?}", cpu.phase())),
            Span::raw("   Instr: "),
            Span::raw(cpu.current_instruction().map_or("-", |i| i.mnemonic())),
        ]),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", cpu.cycles), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(format!("{:?}", cpu.state),
                if cpu.is_running() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                }),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Hex dump of RAM, one row of sixteen bytes per line.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let ram = app.system.ram();
    let regs = &app.system.cpu().regs;
    let visible_rows = (area.height as usize).saturating_sub(2);

    let items: Vec<ListItem> = ram
        .chunks(ROW_BYTES)
        .enumerate()
        .skip(app.mem_scroll)
        .take(visible_rows)
        .map(|(row, bytes)| {
            let offset = row * ROW_BYTES;
            let label = app
                .memory_address(offset)
                .map_or_else(|| "----".to_string(), |addr| format!("{:04x}", addr));
            let mut spans = vec![Span::styled(
                format!("{}: ", label),
                Style::default().fg(Color::DarkGray),
            )];

            for (i, byte) in bytes.iter().enumerate() {
                let addr = app.memory_address(offset + i);
                let style = if addr == Some(regs.pc) {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if addr == Some(regs.index) {
                    Style::default().fg(Color::Magenta)
                } else if *byte != 0 {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(format!("{:02x} ", byte), style));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(format!(" Memory ({} bytes) ", ram.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

fn draw_output(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let output = Paragraph::new(app.system.output_text())
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .block(Block::default()
            .title(format!(" Output @ {:04x} ", app.system.config().char_out_base))
            .borders(Borders::ALL));

    frame.render_widget(output, area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("t: Tick  s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓/PgUp/PgDn: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Color for the sequencer position.
fn phase_style(phase: Phase) -> Style {
    match phase {
        Phase::Idle => Style::default().fg(Color::Gray),
        Phase::Fetch => Style::default().fg(Color::Cyan),
        Phase::Execute(_) => Style::default().fg(Color::Green),
    }
}
