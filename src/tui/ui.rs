//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::Nibble;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_status(frame, left_chunks[1], app);

    // Right side: registers, LEDs, history and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(4),
            Constraint::Min(4),
            Constraint::Length(5),
        ])
        .split(chunks[1]);

    draw_registers(frame, right_chunks[0], app);
    draw_leds(frame, right_chunks[1], app);
    draw_history(frame, right_chunks[2], app);
    draw_help(frame, right_chunks[3]);
}

/// Draw the ROM with the current instruction highlighted.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let items: Vec<ListItem> = app
        .get_disassembly()
        .iter()
        .map(|line| {
            let prefix = if line.is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(&line.addr) { "●" } else { " " };
            let bits = match line.byte {
                Some(b) => format!("{:04b} {:04b}", b >> 4, b & 0x0F),
                None => "---- ----".to_string(),
            };
            let text = format!("{} {}{:02}: {}  {}", bp, prefix, line.addr, bits, line.text);

            let style = if line.is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(&line.addr) {
                Style::default().fg(Color::Red)
            } else if line.byte.is_none() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" ROM ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw register state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = &app.cpu.regs;

    let content = vec![
        Line::from(vec![
            Span::raw("A:  "),
            Span::styled(format!("{}", regs.a), Style::default().fg(Color::White)),
            Span::raw(format!(" = {:>2}", regs.a.get())),
            Span::raw("    B:  "),
            Span::styled(format!("{}", regs.b), Style::default().fg(Color::White)),
            Span::raw(format!(" = {:>2}", regs.b.get())),
        ]),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{}", regs.pc), Style::default().fg(Color::Yellow)),
            Span::raw(format!(" = {:>2}", regs.pc.get())),
            Span::raw("    C:  "),
            Span::styled(
                if regs.c { "1" } else { "0" },
                if regs.c { Style::default().fg(Color::Green) } else { Style::default().fg(Color::Gray) },
            ),
        ]),
        Line::from(vec![
            Span::raw("In: "),
            Span::styled(format!("{}", app.cpu.port.input), Style::default().fg(Color::Magenta)),
            Span::raw("       Out: "),
            Span::styled(format!("{}", app.cpu.port.output), Style::default().fg(Color::Magenta)),
        ]),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", app.cpu.cycles), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(format!("{:?}", app.cpu.state),
                if app.cpu.is_running() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                }),
        ]),
        Line::from(vec![
            Span::raw("Clock: "),
            Span::styled(
                format!("{:.1} Hz", 1.0 / app.period.as_secs_f64()),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw the output port as a row of LEDs.
fn draw_leds(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let spans: Vec<Span> = app.cpu.port.output
        .bits()
        .iter()
        .map(|&on| Span::styled(if on { " ● " } else { " ○ " }, led_style(on)))
        .collect();

    let leds = Paragraph::new(Line::from(spans))
        .block(Block::default()
            .title(" Output ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(leds, area);
}

/// Draw recent output values, newest first.
fn draw_history(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let items: Vec<ListItem> = app.outputs
        .iter()
        .rev()
        .take(visible_rows)
        .map(|value: &Nibble| ListItem::new(format!("{}  ({:>2})", value, value.get())))
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Output history ")
            .borders(Borders::ALL));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  k: Breakpoint"),
        Line::from("x: Reset  +/-: Clock speed  q: Quit"),
        Line::from("0-9, a-f: Set input port"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Color for a lit or dark LED.
fn led_style(on: bool) -> Style {
    if on {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}
