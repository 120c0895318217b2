//! End-to-end runs of the sample programs in `roms/`.

use std::thread;
use std::time::{Duration, Instant};
use td4::{assemble, CancelToken, Cpu, EmulatorConfig, Event, Immediate, Rom, RunExit, Ticker};

const ADD: &str = include_str!("../roms/add.asm");
const LED: &str = include_str!("../roms/led.asm");
const RAMEN: &str = include_str!("../roms/ramen.asm");
const ECHO: &str = include_str!("../roms/echo.asm");

fn cpu_for(source: &str, config: &EmulatorConfig) -> Cpu {
    let bytes = assemble(source).unwrap();
    Cpu::new(Rom::new(bytes).unwrap(), config)
}

fn run_outputs(cpu: &mut Cpu, ticks: u64) -> (RunExit, Vec<u8>) {
    let mut outputs = Vec::new();
    let exit = cpu.run(&mut Immediate::limited(ticks), &CancelToken::new(), |event| {
        if let Event::Output(value) = event {
            outputs.push(value.get());
        }
    });
    (exit, outputs)
}

#[test]
fn add_program_outputs_two_and_halts() {
    let mut cpu = cpu_for(ADD, &EmulatorConfig::default());
    let (exit, outputs) = run_outputs(&mut cpu, 100);

    assert_eq!(exit, RunExit::Halted);
    assert_eq!(outputs, vec![0b0010]);
    assert_eq!(cpu.regs.pc.get(), 4);
    assert_eq!(cpu.regs.a.get(), 2);
    assert_eq!(cpu.regs.b.get(), 2);
    assert!(!cpu.regs.c);
}

#[test]
fn add_rom_file_matches_source() {
    let rom = td4::asm::parse_rom(include_str!("../roms/add.rom")).unwrap();
    assert_eq!(rom.as_bytes(), assemble(ADD).unwrap().as_slice());
}

#[test]
fn led_program_loops() {
    let mut cpu = cpu_for(LED, &EmulatorConfig::default());
    let (exit, outputs) = run_outputs(&mut cpu, 25);

    assert_eq!(exit, RunExit::Cancelled);
    assert!(cpu.is_running());
    let pattern = [0b0011, 0b0110, 0b1100, 0b1000, 0b1000, 0b1100, 0b0110, 0b0011, 0b0001];
    let expected: Vec<u8> = pattern.iter().cycle().take(23).copied().collect();
    assert_eq!(outputs, expected);
}

#[test]
fn ramen_timer_counts_with_carry() {
    let bytes = assemble(RAMEN).unwrap();
    assert_eq!(
        bytes,
        vec![
            0xB7, 0x01, 0xE1, 0x01, 0xE3, 0xB6, 0x01, 0xE6,
            0x01, 0xE8, 0xB0, 0xB4, 0x01, 0xEA, 0xB8, 0xFF,
        ]
    );

    let mut cpu = cpu_for(RAMEN, &EmulatorConfig::default());
    let (exit, outputs) = run_outputs(&mut cpu, 300);

    assert_eq!(exit, RunExit::Cancelled);
    let mut expected = vec![0b0111, 0b0110];
    for _ in 0..16 {
        expected.extend([0b0000, 0b0100]);
    }
    expected.push(0b1000);
    assert_eq!(outputs, expected);
    assert_eq!(cpu.regs.pc.get(), 15);
}

#[test]
fn echo_copies_input() {
    let config = EmulatorConfig { input: 0b1001, ..EmulatorConfig::default() };
    let mut cpu = cpu_for(ECHO, &config);
    let (_, outputs) = run_outputs(&mut cpu, 6);
    assert_eq!(outputs, vec![0b1001, 0b1001]);

    cpu.set_input(td4::Nibble::new(0b0110));
    let (_, outputs) = run_outputs(&mut cpu, 3);
    assert_eq!(outputs, vec![0b0110]);
}

#[test]
fn cancellation_stops_led_program_on_real_clock() {
    let mut cpu = cpu_for(LED, &EmulatorConfig::default());
    let cancel = CancelToken::new();
    let remote = cancel.clone();

    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        remote.cancel();
    });

    let start = Instant::now();
    let exit = cpu.run(&mut Ticker::new(Duration::from_millis(200)), &cancel, |_| {});
    handle.join().unwrap();

    assert_eq!(exit, RunExit::Cancelled);
    // The cancel arrives before the first 200 ms tick and cuts the wait short.
    assert_eq!(cpu.cycles, 0);
    assert!(start.elapsed() < Duration::from_secs(2));
}
