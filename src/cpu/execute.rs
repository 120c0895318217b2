//! CPU execution engine for the TD4.
//!
//! Implements the fetch-decode-execute cycle, all twelve instruction
//! behaviors, and the clock-driven run loop.

use std::fmt;
use crate::config::EmulatorConfig;
use crate::nibble::Nibble;
use crate::cpu::{Port, Registers, Rom};
use crate::cpu::clock::{CancelToken, Clock, ClockEvent};
use crate::cpu::decode::{decode_instruction, DecodeError, Instruction};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has stopped: the program counter ran past the end of the ROM, or
    /// an invalid instruction was fetched. There is no way back to Running
    /// short of [`Cpu::reset`].
    Halted,
}

/// The result of executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// The instruction that was executed.
    pub instr: Instruction,
    /// The value written to the output port, if the instruction was an OUT.
    pub output: Option<Nibble>,
}

/// Something the run loop reports to its observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Event {
    /// An OUT instruction wrote this value to the output port.
    Output(Nibble),
    /// Machine state after a step (only when tracing is enabled).
    Trace(Trace),
}

/// One traced step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trace {
    /// Address the instruction was fetched from.
    pub pc: Nibble,
    pub instr: Instruction,
    pub snapshot: Snapshot,
}

/// Why [`Cpu::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunExit {
    /// The CPU halted.
    Halted,
    /// The cancellation token fired (or the clock ran out of ticks).
    Cancelled,
    /// Execution stopped on an error; the CPU is halted.
    Faulted(CpuError),
}

/// A copy of all architectural state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub regs: Registers,
    pub port: Port,
    pub state: CpuState,
    pub cycles: u64,
}

/// Renders as the register table printed by `run --trace`.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "| A   | {} |", self.regs.a)?;
        writeln!(f, "| B   | {} |", self.regs.b)?;
        writeln!(f, "| C   | {}    |", u8::from(self.regs.c))?;
        writeln!(f, "| PC  | {} |", self.regs.pc)?;
        writeln!(f, "| In  | {} |", self.port.input)?;
        write!(f, "| Out | {} |", self.port.output)
    }
}

/// The TD4 CPU.
#[derive(Clone)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// I/O port.
    pub port: Port,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count.
    pub cycles: u64,
    rom: Rom,
    trace: bool,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a CPU with zeroed state that will execute `rom`.
    pub fn new(rom: Rom, config: &EmulatorConfig) -> Self {
        let mut port = Port::new();
        port.input = Nibble::new(config.input);
        Self {
            regs: Registers::new(),
            port,
            state: CpuState::Running,
            cycles: 0,
            rom,
            trace: config.trace,
            last_instr: None,
        }
    }

    /// Create a CPU with the default configuration.
    pub fn with_rom(rom: Rom) -> Self {
        Self::new(rom, &EmulatorConfig::default())
    }

    /// Reset registers, output latch and counters. The input latch is left
    /// alone since it is driven from outside.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.port.output = Nibble::ZERO;
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Drive the input port.
    pub fn set_input(&mut self, value: Nibble) {
        self.port.input = value;
    }

    /// The program being executed.
    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    /// Execute a single instruction.
    ///
    /// An invalid opcode halts the CPU without touching any other state.
    pub fn step(&mut self) -> Result<Step, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let pc = self.regs.pc;
        let raw = self.rom.fetch(pc);

        // Decode
        let instr = match decode_instruction(raw) {
            Ok(instr) => instr,
            Err(e) => {
                log::error!("{} at PC={} (byte {:08b}), halting", e, pc, raw);
                self.state = CpuState::Halted;
                return Err(CpuError::DecodeError(e));
            }
        };

        // Execute
        let output = self.execute(instr);
        if let Some(value) = output {
            log::info!("Port Out: {}", value);
        }

        // Update state
        self.cycles += 1;
        self.last_instr = Some(instr);

        if usize::from(self.regs.pc) >= self.rom.len() {
            log::info!("PC={} is past the end of the ROM, halting", self.regs.pc);
            self.state = CpuState::Halted;
        }

        Ok(Step { instr, output })
    }

    /// Run on `clock` until the CPU halts or `cancel` fires.
    ///
    /// Exactly one instruction is executed per tick. Output writes, and
    /// snapshots when tracing is on, are passed to `observer` as they happen.
    pub fn run<C, F>(&mut self, clock: &mut C, cancel: &CancelToken, mut observer: F) -> RunExit
    where
        C: Clock,
        F: FnMut(&Event),
    {
        while self.state == CpuState::Running {
            if clock.wait(cancel) == ClockEvent::Cancelled {
                log::debug!("cancelled after {} cycles", self.cycles);
                return RunExit::Cancelled;
            }

            let pc = self.regs.pc;
            let step = match self.step() {
                Ok(step) => step,
                Err(e) => return RunExit::Faulted(e),
            };

            if let Some(value) = step.output {
                observer(&Event::Output(value));
            }

            if self.trace {
                let trace = Trace {
                    pc,
                    instr: step.instr,
                    snapshot: self.snapshot(),
                };
                log::debug!("{:?}", trace);
                observer(&Event::Trace(trace));
            }
        }

        RunExit::Halted
    }

    /// Execute a decoded instruction.
    ///
    /// Every instruction except ADD clears the carry flag. ADD only ever
    /// sets it; a sum that fits in 4 bits leaves the previous carry in place.
    fn execute(&mut self, instr: Instruction) -> Option<Nibble> {
        let mut output = None;

        match instr {
            // ==================== Transfer ====================

            Instruction::MovA { im } => {
                self.regs.a = im;
                self.regs.c = false;
                self.regs.advance_pc();
            }

            Instruction::MovB { im } => {
                self.regs.b = im;
                self.regs.c = false;
                self.regs.advance_pc();
            }

            Instruction::MovBA => {
                self.regs.b = self.regs.a;
                self.regs.c = false;
                self.regs.advance_pc();
            }

            Instruction::MovAB => {
                self.regs.a = self.regs.b;
                self.regs.c = false;
                self.regs.advance_pc();
            }

            // ==================== Arithmetic ====================

            Instruction::AddA { im } => {
                let (sum, carry) = self.regs.a.overflowing_add(im);
                if carry {
                    self.regs.c = true;
                }
                self.regs.a = sum;
                self.regs.advance_pc();
            }

            Instruction::AddB { im } => {
                let (sum, carry) = self.regs.b.overflowing_add(im);
                if carry {
                    self.regs.c = true;
                }
                self.regs.b = sum;
                self.regs.advance_pc();
            }

            // ==================== Control Flow ====================

            Instruction::Jmp { im } => {
                self.regs.jump(im);
                self.regs.c = false;
            }

            Instruction::Jnc { im } => {
                if self.regs.c {
                    self.regs.advance_pc();
                } else {
                    self.regs.jump(im);
                }
                self.regs.c = false;
            }

            // ==================== I/O ====================

            Instruction::InA => {
                self.regs.a = self.port.input;
                self.regs.c = false;
                self.regs.advance_pc();
            }

            Instruction::InB => {
                self.regs.b = self.port.input;
                self.regs.c = false;
                self.regs.advance_pc();
            }

            Instruction::OutB => {
                self.port.output = self.regs.b;
                output = Some(self.port.output);
                self.regs.c = false;
                self.regs.advance_pc();
            }

            Instruction::OutIm { im } => {
                self.port.output = im;
                output = Some(self.port.output);
                self.regs.c = false;
                self.regs.advance_pc();
            }
        }

        output
    }

    /// Capture the current machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            regs: self.regs,
            port: self.port,
            state: self.state,
            cycles: self.cycles,
        }
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("port", &self.port)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("decode error: {0}")]
    DecodeError(#[from] DecodeError),
}
