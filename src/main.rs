//! micro0 Emulator - CLI Entry Point
//!
//! Commands:
//! - `micro0 run <program>` - Run an image or ASM file for a fixed number of ticks
//! - `micro0 debug <program>` - Interactive debugger
//! - `micro0 asm <source>` - Assemble to a flat image
//! - `micro0 disasm <image>` - Disassemble an image

use clap::{Parser, Subcommand};
use micro0::SystemConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "micro0")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "A tick-accurate emulator of the micro0 8-bit microcomputer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program for a fixed number of clock ticks
    Run {
        /// Path to the image or ASM file to execute
        program: String,
        /// Number of clock ticks to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        cycles: u64,
        /// JSON memory-map configuration
        #[arg(long)]
        config: Option<String>,
        /// Log every tick
        #[arg(short, long)]
        trace: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the image or ASM file to debug
        program: String,
        /// JSON memory-map configuration
        #[arg(long)]
        config: Option<String>,
    },
    /// Assemble source to a flat image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble an image to readable text
    Disasm {
        /// Path to the image file
        image: String,
        /// Address of the first byte
        #[arg(long, default_value = "0", value_parser = parse_address)]
        origin: u16,
    },
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Some(Commands::Run { trace: true, .. }));
    init_logging(trace);

    match cli.command {
        Some(Commands::Run { program, cycles, config, trace: _ }) => {
            run_program(&program, cycles, config.as_deref());
        }
        Some(Commands::Debug { program, config }) => {
            debug_program(&program, config.as_deref());
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { image, origin }) => {
            disassemble_file(&image, origin);
        }
        None => {
            println!("micro0 Emulator v0.1.0");
            println!("A tick-accurate 8-bit microcomputer emulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Logs go to stderr so program output stays clean. `--trace` overrides
/// `RUST_LOG`.
fn init_logging(trace: bool) {
    let filter = if trace {
        EnvFilter::new("micro0=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_address(text: &str) -> Result<u16, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", text, e))
}

/// Read a program, assembling it first if it is a `.asm` file.
fn load_program(path: &str) -> Vec<u8> {
    use micro0::{assemble, load_image};

    let image = if path.ends_with(".asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Failed to read file: {}", e);
                std::process::exit(1);
            }
        };

        match assemble(&source) {
            Ok(image) => {
                println!("📝 Assembled {} bytes", image.len());
                image
            }
            Err(e) => {
                eprintln!("❌ Assembly error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match load_image(path) {
            Ok(image) => {
                println!("📂 Loaded {} bytes", image.len());
                image
            }
            Err(e) => {
                eprintln!("❌ Failed to load image: {}", e);
                std::process::exit(1);
            }
        }
    };

    if image.is_empty() {
        eprintln!("❌ Nothing to execute");
        std::process::exit(1);
    }

    image
}

fn load_config(path: Option<&str>) -> SystemConfig {
    match path.map(SystemConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("❌ Bad configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &str, cycles: u64, config: Option<&str>) {
    use micro0::System;

    println!("🔧 Running: {}", path);

    let image = load_program(path);
    let config = load_config(config);

    let mut system = match System::with_config(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to build machine: {}", e);
            std::process::exit(1);
        }
    };
    system.load(image);

    let result = system.run(cycles);

    println!();
    println!("━━━ Output ━━━");
    println!("{}", system.output_text());

    let cpu = system.cpu();
    println!();
    println!("━━━ Result ━━━");
    println!("Ticks:        {}", cpu.cycles);
    println!("Instructions: {}", cpu.retired());
    println!("State:        {:?} ({:?})", cpu.state, cpu.phase());
    println!("PC:           {:04x}", cpu.regs.pc);
    println!("ACC:          {:02x} ({})", cpu.regs.acc, cpu.regs.acc);
    println!("INDEX:        {:04x}", cpu.regs.index);
    println!("BUFFER:       {:02x}", cpu.regs.buffer);

    if let Err(e) = result {
        eprintln!();
        eprintln!("❌ CPU fault after {} ticks: {}", cpu.cycles, e);
        std::process::exit(1);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, config: Option<&str>) {
    use micro0::run_debugger;

    println!("🔍 Loading: {}", path);

    let image = load_program(path);
    let config = load_config(config);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = run_debugger(image, config) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _config: Option<&str>) {
    eprintln!("❌ Built without the `tui` feature; the debugger is unavailable");
    std::process::exit(1);
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use micro0::{assemble, save_image};

    let out_path = output.unwrap_or_else(|| {
        source_path.replace(".asm", ".bin")
    });

    println!("📝 Assembling: {} → {}", source_path, out_path);

    // Read source
    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    // Assemble
    let image = match assemble(&source) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} bytes", image.len());

    if let Err(e) = save_image(&out_path, &image) {
        eprintln!("❌ Failed to save image: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(image_path: &str, origin: u16) {
    use micro0::{disassemble, load_image};

    let image = match load_image(image_path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    print!("{}", disassemble(&image, origin));
}
