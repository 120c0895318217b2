//! TD4 Emulator - CLI Entry Point
//!
//! Commands:
//! - `td4-emu run <program>` - Run a ROM or ASM file on the real-time clock
//! - `td4-emu debug <program>` - Interactive debugger
//! - `td4-emu asm <source>` - Assemble to a ROM file
//! - `td4-emu disasm <rom>` - Disassemble a ROM file

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use td4::{Cpu, EmulatorConfig, Rom};

#[derive(Parser)]
#[command(name = "td4-emu")]
#[command(version)]
#[command(about = "An emulator of the TD4 4-bit teaching CPU")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts or Ctrl-C is pressed
    Run {
        /// Path to the ROM or ASM file to execute
        program: String,
        /// Clock rate in Hz (default: 2)
        #[arg(long)]
        hz: Option<f64>,
        /// Print the registers after every instruction
        #[arg(short, long)]
        trace: bool,
        /// Log at debug level
        #[arg(short, long)]
        verbose: bool,
        /// Value on the input port (0-15)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=15))]
        input: Option<u8>,
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<String>,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the ROM or ASM file to debug
        program: String,
        /// Clock rate in Hz when running continuously
        #[arg(long)]
        hz: Option<f64>,
    },
    /// Assemble source to a ROM file
    Asm {
        /// Path to the source file
        source: String,
        /// Output ROM file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a ROM file to readable text
    Disasm {
        /// Path to the ROM file
        rom: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, hz, trace, verbose, input, config, json }) => {
            init_logger(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
            let config = build_config(config.as_deref(), hz, trace, input);
            run_program(&program, &config, json);
        }
        Some(Commands::Debug { program, hz }) => {
            let config = build_config(None, hz, false, None);
            debug_program(&program, &config);
        }
        Some(Commands::Asm { source, output }) => {
            init_logger(LevelFilter::Info);
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { rom }) => {
            init_logger(LevelFilter::Info);
            disassemble_file(&rom);
        }
        None => {
            println!("TD4 Emulator v{}", env!("CARGO_PKG_VERSION"));
            println!("A 4-bit teaching CPU emulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_logger(level: LevelFilter) {
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("❌ Failed to initialise logging: {}", e);
    }
}

/// Merge the optional config file with command line overrides.
fn build_config(path: Option<&str>, hz: Option<f64>, trace: bool, input: Option<u8>) -> EmulatorConfig {
    let mut config = match path {
        Some(path) => match EmulatorConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => EmulatorConfig::default(),
    };

    if let Some(hz) = hz {
        config.clock_hz = hz;
    }
    config.trace |= trace;
    if let Some(input) = input {
        config.input = input;
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ Invalid configuration: {}", e);
        std::process::exit(1);
    }
    config
}

/// Load a program (either ROM or ASM), exiting on failure.
fn load_or_exit(path: &str) -> Rom {
    match td4::load_program(path) {
        Ok(rom) => {
            log::info!("Loaded {} bytes from {}", rom.len(), path);
            rom
        }
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &str, config: &EmulatorConfig, json: bool) {
    use td4::{CancelToken, Event, RunExit, Ticker};
    use td4::asm::disasm::format_instruction;

    let rom = load_or_exit(path);
    let mut cpu = Cpu::new(rom, config);

    let cancel = CancelToken::new();
    let remote = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || remote.cancel()) {
        log::warn!("Ctrl-C handler unavailable: {}", e);
    }

    log::info!("--- start emulator ({} Hz) ---", config.clock_hz);
    if config.trace {
        println!("{}", cpu.snapshot());
    }

    let mut clock = match config.clock_period() {
        Ok(period) => Ticker::new(period),
        Err(e) => {
            eprintln!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    // Output writes are reported by the CPU's own `Port Out` log line.
    let exit = cpu.run(&mut clock, &cancel, |event| {
        if let Event::Trace(trace) = event {
            println!();
            println!("[{:02}] {}", trace.pc.get(), format_instruction(&trace.instr));
            println!("{}", trace.snapshot);
        }
    });

    match exit {
        RunExit::Halted => log::info!("--- halted after {} cycles ---", cpu.cycles),
        RunExit::Cancelled => log::info!("--- interrupted after {} cycles ---", cpu.cycles),
        RunExit::Faulted(e) => log::error!("--- stopped after {} cycles: {} ---", cpu.cycles, e),
    }

    if json {
        match serde_json::to_string_pretty(&cpu.snapshot()) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialise state: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!("{}", cpu.snapshot());
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, config: &EmulatorConfig) {
    use td4::tui::run_debugger;

    let rom = load_or_exit(path);

    if let Err(e) = run_debugger(rom, config) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _config: &EmulatorConfig) {
    eprintln!("❌ The debugger requires the `tui` feature");
    std::process::exit(1);
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use td4::{assemble, save_rom};

    let out_path = output.unwrap_or_else(|| {
        std::path::Path::new(source_path)
            .with_extension("rom")
            .to_string_lossy()
            .into_owned()
    });

    log::info!("Assembling: {} → {}", source_path, out_path);

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let rom = match assemble(&source).map(Rom::new) {
        Ok(Ok(rom)) => rom,
        Ok(Err(e)) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = save_rom(&out_path, &rom) {
        eprintln!("❌ Failed to save ROM: {}", e);
        std::process::exit(1);
    }

    println!("✓ Assembled {} bytes to {}", rom.len(), out_path);
}

fn disassemble_file(rom_path: &str) {
    use td4::disassemble;

    let rom = load_or_exit(rom_path);
    println!("{}", disassemble(rom.as_bytes()));
}
