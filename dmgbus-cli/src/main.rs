mod config;

use crate::config::CliConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use dmgbus_core::{
    AddressSpace, Cartridge, Display, FrameBuffer, InterruptType, RegionKind, RunConfig,
    TimerControl, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

const TIMA_ADDRESS: u32 = 0xFF05;
const TMA_ADDRESS: u32 = 0xFF06;
const TAC_ADDRESS: u32 = 0xFF07;
const DIV_ADDRESS: u32 = 0xFF04;

#[derive(Parser)]
struct Cli {
    #[arg(short = 'f', long = "gb_file_path")]
    gb_file_path: String,
    #[arg(short = 'c', long = "config")]
    config_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the cartridge header and the memory layout
    Info,
    /// Run the timer for a number of cycles and report its registers
    Timer {
        #[arg(long, default_value_t = 0x05, value_parser = parse_byte)]
        tac: u8,
        #[arg(long, default_value_t = 0x00, value_parser = parse_byte)]
        tma: u8,
        #[arg(long, default_value_t = 70224)]
        cycles: u32,
        /// Cycles per tick, i.e. per emulated instruction
        #[arg(long, default_value_t = 4)]
        step: u32,
    },
    /// Render the test pattern frame to a PGM file
    Frame {
        #[arg(short = 'o', long = "out")]
        out: PathBuf,
    },
    /// Write a save state next to the cartridge file
    SaveState,
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|err| format!("invalid byte value '{s}': {err}"))
}

/// A headless display that writes every frame to a binary PGM image.
struct PgmDisplay {
    path: PathBuf,
}

impl Display for PgmDisplay {
    type Err = std::io::Error;

    fn update(&mut self, frame_buffer: &FrameBuffer) -> Result<(), Self::Err> {
        let mut contents = format!("P5\n{SCREEN_WIDTH} {SCREEN_HEIGHT}\n255\n").into_bytes();
        contents.extend_from_slice(frame_buffer.as_bytes());
        fs::write(&self.path, contents)
    }

    fn wait(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Read the cartridge back out of the loaded address space rather than from disk.
fn loaded_cartridge(address_space: &AddressSpace) -> Result<Cartridge, anyhow::Error> {
    address_space
        .region_snapshot(RegionKind::Cartridge)
        .map(Cartridge::new)
        .context("address space has no cartridge region")
}

fn print_info(address_space: &AddressSpace, gb_file_path: &str) -> Result<(), anyhow::Error> {
    let cartridge = loaded_cartridge(address_space)?;

    println!("file: {gb_file_path} (cartridge region {} bytes)", cartridge.len());
    match cartridge.title() {
        Some(title) => println!("title: {title}"),
        None => println!("title: <no header>"),
    }
    if let Some(entry_point) = cartridge.entry_point() {
        println!("entry point: {entry_point:02X?}");
    }
    println!();
    print!("{}", address_space.layout());

    Ok(())
}

fn run_timer(
    address_space: &mut AddressSpace,
    tac: u8,
    tma: u8,
    cycles: u32,
    step: u32,
) -> Result<(), anyhow::Error> {
    anyhow::ensure!(step > 0, "step must be nonzero");

    address_space.write(TMA_ADDRESS, tma)?;
    address_space.write(TAC_ADDRESS, tac)?;

    let control = TimerControl(tac);
    log::info!(
        "Running timer for {cycles} cycles, enabled={}, clock_select={}",
        control.enabled(),
        control.clock_select()
    );

    let mut overflows = 0;
    let mut remaining = cycles;
    while remaining > 0 {
        let elapsed = step.min(remaining);
        overflows += address_space.tick(elapsed);
        remaining -= elapsed;

        // Acknowledge the way an interrupt handler would
        if address_space.timer_interrupt_requested() {
            address_space.interrupt_flags().clear(InterruptType::Timer);
        }
    }

    println!("TIMA: {:02X}", address_space.read(TIMA_ADDRESS)?);
    println!("TMA:  {:02X}", address_space.read(TMA_ADDRESS)?);
    println!("TAC:  {:02X}", address_space.read(TAC_ADDRESS)?);
    println!("DIV:  {:02X}", address_space.read(DIV_ADDRESS)?);
    println!(
        "timer interrupts: {overflows} (handler at {:04X})",
        InterruptType::Timer.handler_address()
    );

    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = Cli::parse();

    let cli_config = match &args.config_path {
        Some(path) => CliConfig::from_toml_file(path)?,
        None => CliConfig::default(),
    };

    let run_config = RunConfig {
        gb_file_path: args.gb_file_path,
        emulator_config: cli_config.emulator.clone(),
    };
    log::info!("Running with config:\n{run_config}");

    let mut address_space = dmgbus_core::init_address_space(&run_config)?;

    match args.command {
        Command::Info => print_info(&address_space, &run_config.gb_file_path)?,
        Command::Timer {
            tac,
            tma,
            cycles,
            step,
        } => run_timer(&mut address_space, tac, tma, cycles, step)?,
        Command::Frame { out } => {
            let mut display = PgmDisplay { path: out };
            display
                .update(&FrameBuffer::test_pattern())
                .with_context(|| format!("error writing frame to '{}'", display.path.display()))?;
            display.wait(Duration::from_millis(cli_config.frame_delay_ms));
        }
        Command::SaveState => {
            let path = dmgbus_core::determine_save_state_path(&run_config.gb_file_path);
            dmgbus_core::save_state(&address_space, &path)?;
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}
