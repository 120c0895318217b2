//! Debugger application state and logic.

use crate::{Cpu, EmulatorConfig, Nibble, Rom};
use crate::asm::disasm::{disassemble_byte, format_instruction};
use crate::cpu::ROM_SIZE;
use crossterm::event::KeyCode;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// How many past output values to keep for the history panel.
const OUTPUT_HISTORY: usize = 64;

/// Bounds on the time between steps while running.
const MIN_PERIOD: Duration = Duration::from_millis(1);
const MAX_PERIOD: Duration = Duration::from_secs(10);

/// One row of the ROM view.
pub struct RomLine {
    pub addr: u8,
    pub byte: Option<u8>,
    pub text: String,
    pub is_current: bool,
}

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u8>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Values written to the output port, most recent last.
    pub outputs: Vec<Nibble>,
    /// Time between steps while running.
    pub period: Duration,
    last_tick: Instant,
    /// Set when resuming so we can leave the breakpoint we are sitting on.
    skip_breakpoint: bool,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(rom: Rom, config: &EmulatorConfig) -> Self {
        Self {
            cpu: Cpu::new(rom, config),
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            outputs: Vec::new(),
            period: config
                .clock_period()
                .map_or(MAX_PERIOD, clamp_period),
            last_tick: Instant::now(),
            skip_breakpoint: false,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("CPU halted after {} cycles. Press 'x' to reset.", self.cpu.cycles);
            self.running = false;
            return;
        }

        let pc = self.cpu.regs.pc.get();
        match self.cpu.step() {
            Ok(step) => {
                self.status = format!("PC={:02}: {}", pc, format_instruction(&step.instr));
                if let Some(value) = step.output {
                    self.outputs.push(value);
                    if self.outputs.len() > OUTPUT_HISTORY {
                        self.outputs.remove(0);
                    }
                }
                if self.cpu.is_halted() {
                    self.running = false;
                    self.status.push_str("  (halted)");
                }
            }
            Err(e) => {
                self.status = format!("Error at PC={:02}: {}", pc, e);
                self.running = false;
            }
        }
    }

    /// Start continuous execution.
    pub fn run(&mut self) {
        self.running = true;
        self.skip_breakpoint = true;
        self.last_tick = Instant::now();
        self.status = "Running...".into();
    }

    /// Stop continuous execution.
    pub fn pause(&mut self) {
        self.running = false;
        self.status = "Paused.".into();
    }

    /// Run one iteration of continuous execution, if a clock period has
    /// elapsed since the last one.
    pub fn tick(&mut self) {
        if !self.running || self.last_tick.elapsed() < self.period {
            return;
        }
        self.last_tick = Instant::now();

        // Check for breakpoint
        let pc = self.cpu.regs.pc.get();
        if self.breakpoints.contains(&pc) && !self.skip_breakpoint {
            self.running = false;
            self.status = format!("Breakpoint at PC={:02}", pc);
            return;
        }
        self.skip_breakpoint = false;

        self.step();
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.regs.pc.get();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:02}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:02}", pc);
        }
    }

    /// Drive the input port.
    pub fn set_input(&mut self, value: u8) {
        let value = Nibble::new(value);
        self.cpu.set_input(value);
        self.status = format!("Input port set to {}", value);
    }

    /// Reset CPU to initial state.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.outputs.clear();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Change the run speed by a factor.
    pub fn scale_speed(&mut self, factor: f64) {
        self.period = clamp_period(self.period.mul_f64(factor));
        self.status = format!("Clock: {:.1} Hz", 1.0 / self.period.as_secs_f64());
    }

    /// Apply one key press.
    ///
    /// Command keys are all outside the hex digits, so every `0-9`/`a-f`
    /// press drives the input port.
    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('s') => {
                self.running = false;
                self.step();
            }
            KeyCode::Char('r') => self.run(),
            KeyCode::Char('p') => self.pause(),
            KeyCode::Char('k') => self.toggle_breakpoint(),
            KeyCode::Char('x') => self.reset(),
            KeyCode::Char('+') => self.scale_speed(0.5),
            KeyCode::Char('-') => self.scale_speed(2.0),
            KeyCode::Char(c) => {
                if let Some(digit) = c.to_digit(16) {
                    self.set_input(digit as u8);
                }
            }
            _ => {}
        }
    }

    /// Disassembly of the whole address space.
    pub fn get_disassembly(&self) -> Vec<RomLine> {
        let rom = self.cpu.rom().as_bytes();
        let pc = self.cpu.regs.pc.get();

        (0..ROM_SIZE as u8)
            .map(|addr| {
                let byte = rom.get(addr as usize).copied();
                let text = match byte {
                    Some(b) => disassemble_byte(b),
                    None => "--".to_string(),
                };
                RomLine {
                    addr,
                    byte,
                    text,
                    is_current: addr == pc,
                }
            })
            .collect()
    }
}

fn clamp_period(period: Duration) -> Duration {
    period.clamp(MIN_PERIOD, MAX_PERIOD)
}

/// Run the debugger with a program.
pub fn run_debugger(rom: Rom, config: &EmulatorConfig) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create app
    let mut app = DebuggerApp::new(rom, config);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        // Tick for continuous running
        app.tick();

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

    fn app_at(clock_hz: f64) -> DebuggerApp {
        let config = EmulatorConfig { clock_hz, ..EmulatorConfig::default() };
        DebuggerApp::new(Rom::default(), &config)
    }

    fn app(bytes: &[u8]) -> DebuggerApp {
        let config = EmulatorConfig { clock_hz: 1000.0, ..EmulatorConfig::default() };
        DebuggerApp::new(Rom::new(bytes.to_vec()).unwrap(), &config)
    }

    #[test]
    fn test_step_records_output() {
        let mut app = app(&[0xB5, 0xB6]);
        app.step();
        assert_eq!(app.outputs, vec![Nibble::new(5)]);
        assert!(app.status.contains("OUT 0b0101"));
        app.step();
        assert!(app.cpu.is_halted());
        app.step();
        assert!(app.status.contains("halted"));
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = app(&[0xB1, 0xB2, 0xF0]);
        app.cpu.regs.pc = Nibble::new(1);
        app.toggle_breakpoint();
        app.cpu.regs.pc = Nibble::ZERO;

        app.run();
        app.period = Duration::ZERO;
        app.tick();
        assert_eq!(app.cpu.regs.pc.get(), 1);
        app.tick();
        assert!(!app.running);
        assert_eq!(app.cpu.regs.pc.get(), 1);

        // Resuming steps off the breakpoint
        app.run();
        app.tick();
        assert_eq!(app.cpu.regs.pc.get(), 2);
    }

    #[test]
    fn test_set_input_and_reset() {
        let mut app = app(&[0x20, 0xB1]);
        app.set_input(0xA);
        app.step();
        assert_eq!(app.cpu.regs.a.get(), 0xA);
        app.reset();
        assert_eq!(app.cpu.regs.a.get(), 0);
        assert_eq!(app.cpu.port.input.get(), 0xA);
        assert!(app.outputs.is_empty());
    }

    #[test]
    fn test_every_hex_key_sets_input() {
        let mut app = app(&[0xB1]);
        for (key, value) in "0123456789abcdef".chars().zip(0u8..) {
            app.handle_key(KeyCode::Char(key));
            assert_eq!(app.cpu.port.input.get(), value);
        }
        assert!(app.breakpoints.is_empty());

        app.handle_key(KeyCode::Char('b'));
        assert_eq!(app.cpu.port.input.get(), 0xB);
        assert!(app.breakpoints.is_empty());
    }

    #[test]
    fn test_clock_period_is_clamped() {
        let slow = EmulatorConfig { clock_hz: 1e-20, ..EmulatorConfig::default() };
        let app = DebuggerApp::new(Rom::default(), &slow);
        assert_eq!(app.period, Duration::from_secs(10));

        let mut app = app_at(1e6);
        assert_eq!(app.period, Duration::from_millis(1));
        app.scale_speed(0.5);
        assert_eq!(app.period, Duration::from_millis(1));
    }

    #[test]
    fn test_breakpoint_key() {
        let mut app = app(&[0xB1]);
        app.handle_key(KeyCode::Char('k'));
        assert!(app.breakpoints.contains(&0));
        app.handle_key(KeyCode::Char('k'));
        assert!(app.breakpoints.is_empty());
        assert_eq!(app.cpu.port.input.get(), 0);
    }

    #[test]
    fn test_disassembly_covers_address_space() {
        let app = app(&[0x31, 0x90]);
        let lines = app.get_disassembly();
        assert_eq!(lines.len(), 16);
        assert!(lines[0].is_current);
        assert_eq!(lines[0].text, "MOV A, 1");
        assert_eq!(lines[2].byte, None);
    }
}
