use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ga144_core::chip::Chip;
use ga144_core::compiled::CompiledProgram;
use ga144_core::coord::Coord;
use ga144_core::disasm;

mod config;

use config::ChipConfig;

#[derive(Parser)]
#[command(name = "ga144", about = "Assembler, boot-stream builder, and emulator for a 144-node array")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a source file into a CompiledProgram, written as JSON.
    Assemble {
        source: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Pretty-print the disassembly of an already-assembled program.
    Disasm { program: PathBuf },
    /// Build the serial boot stream for an assembled program.
    Boot {
        program: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Load a program into a fresh chip and step it to quiescence or budget.
    Run {
        program: PathBuf,
        #[arg(long)]
        via_boot_stream: bool,
        #[arg(long, default_value_t = 1_000_000)]
        budget: u64,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Load a program and dump one node's full snapshot as JSON.
    Snapshot {
        program: PathBuf,
        #[arg(long)]
        coord: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Assemble { source, output } => assemble(&source, &output),
        Command::Disasm { program } => run_disasm(&program),
        Command::Boot { program, output } => build_boot(&program, &output),
        Command::Run { program, via_boot_stream, budget, config } => {
            run_program(&program, via_boot_stream, budget, config.as_deref())
        }
        Command::Snapshot { program, coord } => dump_snapshot(&program, coord),
    }
}

fn assemble(source: &PathBuf, output: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(source)?;
    let compiled = ga144_asm::assemble_source(&text);

    for diag in &compiled.errors {
        eprintln!("error: {}:{}: {}", diag.line, diag.col, diag.message);
    }
    if let Some(warnings) = &compiled.warnings {
        for diag in warnings {
            eprintln!("warning: {}:{}: {}", diag.line, diag.col, diag.message);
        }
    }

    let json = serde_json::to_string_pretty(&compiled)?;
    std::fs::write(output, json)?;
    println!("assembled {} node(s) -> {}", compiled.nodes.len(), output.display());

    if compiled.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn load_program(path: &PathBuf) -> Result<CompiledProgram, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn run_disasm(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let program = load_program(path)?;
    for node in &program.nodes {
        println!("node {}:", node.coord);
        let mem: Vec<u32> = node.mem.iter().map(|c| c.unwrap_or(0)).collect();
        for (addr, line) in disasm::disassemble_node(&mem).iter().enumerate() {
            println!("  {addr:#04x}  {line}");
        }
    }
    Ok(())
}

fn build_boot(path: &PathBuf, output: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let program = load_program(path)?;
    let bytes = ga144_boot::build_boot_stream(&program)?;
    std::fs::write(output, &bytes)?;
    println!("built {}-byte boot stream -> {}", bytes.len(), output.display());
    Ok(())
}

fn build_chip(config_path: Option<&std::path::Path>) -> Result<Chip, Box<dyn std::error::Error>> {
    let config = ChipConfig::load(config_path)?;
    let mut chip = Chip::new(config.name.clone());
    let mut needs_reset = false;

    if !config.boot_nodes.is_empty() {
        let coords: std::collections::HashSet<Coord> = config
            .boot_nodes
            .iter()
            .map(|&raw| Coord::try_from(raw).expect("config boot_nodes entry names a valid coordinate"))
            .collect();
        chip.set_boot_nodes(coords);
        needs_reset = true;
    }
    if !config.rom.is_empty() {
        let table: HashMap<Coord, [u32; 64]> = config
            .rom_table()
            .into_iter()
            .map(|(raw, image)| (Coord::try_from(raw).expect("config ROM entry names a valid coordinate"), image))
            .collect();
        chip.set_rom_data(table);
        needs_reset = true;
    }
    if needs_reset {
        chip.reset();
    }
    Ok(chip)
}

fn run_program(
    path: &PathBuf,
    via_boot_stream: bool,
    budget: u64,
    config_path: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let program = load_program(path)?;
    let mut chip = build_chip(config_path)?;

    if via_boot_stream {
        let bytes = ga144_boot::build_boot_stream(&program)?;
        let boot_coord = program
            .nodes
            .iter()
            .map(|n| n.coord)
            .find(|coord| chip.boot_nodes().contains(coord))
            .ok_or("program names no node that is a configured boot node")?;
        chip.load_via_boot_stream(boot_coord, &bytes)?;
    } else {
        chip.load(&program);
    }

    let quiesced = chip.step_until_done(budget);
    println!("ran {} step(s), quiesced: {quiesced}", chip.total_steps());

    let snapshot = chip.snapshot(None);
    println!("active nodes: {}", snapshot.active_count);
    Ok(())
}

fn dump_snapshot(path: &PathBuf, raw_coord: u16) -> Result<(), Box<dyn std::error::Error>> {
    let program = load_program(path)?;
    let coord = Coord::try_from(raw_coord).map_err(|_| format!("{raw_coord} is not a valid node coordinate"))?;

    let mut chip = Chip::new("snapshot");
    chip.load(&program);

    let snapshot = chip.snapshot(Some(coord));
    let node = snapshot.node(coord).ok_or_else(|| format!("node {coord} not present in program"))?;
    println!("{}", serde_json::to_string_pretty(node)?);
    Ok(())
}
