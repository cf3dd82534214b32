//! Command-line tool for driving a serial rotary table.
//!
//! Subcommands:
//! - `ports`: List serial ports on this machine
//! - `run`, `forward`, `reverse`: Rotate continuously
//! - `move-abs`, `move-rel`: Positioning moves
//! - `set-coord`: Redefine the current position
//! - `stop`: Stop all motion
//! - `home`: Return to mechanical zero
//! - `jog`: Run for a fixed time, then stop
//!
//! With `--dry-run` the encoded frames are printed instead of sent.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rotary_table::table::{Command as TableCommand, Direction, DriverConfig, RotaryTable};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Rotary Table Control Tool
#[derive(Parser, Debug)]
#[command(name = "rotary_tool")]
#[command(about = "Send motion commands to a serial rotary table")]
#[command(version)]
struct Args {
    /// Serial port (overrides the config file)
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// JSON config file with port, timeouts and default speed
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial timeout in milliseconds (overrides the config file)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Pause after each frame in milliseconds (overrides the config file)
    #[arg(long, global = true)]
    settle_ms: Option<u64>,

    /// Print encoded frames without opening the port
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available serial ports
    Ports,

    /// Rotate continuously at constant speed
    Run {
        /// Speed in steps/second (0-65535)
        #[arg(short, long)]
        speed: Option<i64>,

        /// Direction of rotation
        #[arg(short, long, value_enum, default_value_t = Direction::Forward)]
        direction: Direction,
    },

    /// Rotate forward at constant speed
    Forward {
        /// Speed in steps/second (0-65535)
        #[arg(allow_hyphen_values = true)]
        speed: Option<i64>,
    },

    /// Rotate in reverse at constant speed
    Reverse {
        /// Speed in steps/second (0-65535)
        #[arg(allow_hyphen_values = true)]
        speed: Option<i64>,
    },

    /// Move to an absolute position
    MoveAbs {
        /// Target coordinate (signed 32-bit)
        #[arg(allow_hyphen_values = true)]
        position: i64,

        /// Speed in steps/second (0-65535)
        #[arg(short, long)]
        speed: Option<i64>,
    },

    /// Move by a relative number of steps
    MoveRel {
        /// Step count, negative to move backwards (signed 32-bit)
        #[arg(allow_hyphen_values = true)]
        steps: i64,

        /// Speed in steps/second (0-65535)
        #[arg(short, long)]
        speed: Option<i64>,
    },

    /// Set the current position to the given coordinate without moving
    SetCoord {
        /// New coordinate for the current position (signed 32-bit)
        #[arg(allow_hyphen_values = true)]
        position: i64,
    },

    /// Stop all motion
    Stop,

    /// Return to mechanical zero
    Home {
        /// Speed in steps/second (0-65535)
        #[arg(short, long)]
        speed: Option<i64>,

        /// Direction to search for zero
        #[arg(short, long, value_enum, default_value_t = Direction::Forward)]
        direction: Direction,
    },

    /// Run at constant speed for a fixed time, then stop
    Jog {
        /// Speed in steps/second (0-65535)
        #[arg(short, long)]
        speed: Option<i64>,

        /// Direction of rotation
        #[arg(short, long, value_enum, default_value_t = Direction::Forward)]
        direction: Direction,

        /// How long to run before stopping
        #[arg(short = 't', long, default_value = "3.0")]
        seconds: f64,
    },
}

/// One thing to do against the table.
#[derive(Debug)]
enum Step {
    Send(TableCommand),
    Wait(Duration),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Command::Ports = args.command {
        return cmd_ports();
    }

    let config = load_config(&args)?;
    let steps = plan(&args.command, i64::from(config.default_speed))?;

    if args.dry_run {
        print_plan(&steps)
    } else {
        execute(&config, &steps)
    }
}

fn load_config(args: &Args) -> Result<DriverConfig> {
    let mut config = match &args.config {
        Some(path) => DriverConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DriverConfig::default(),
    };

    if let Some(port) = &args.port {
        config.port = port.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(settle_ms) = args.settle_ms {
        config.settle_delay_ms = settle_ms;
    }
    Ok(config)
}

/// Turn a subcommand into the sequence of frames and pauses it needs.
fn plan(command: &Command, default_speed: i64) -> Result<Vec<Step>> {
    let speed_or_default = |speed: &Option<i64>| speed.unwrap_or(default_speed);

    let steps = match command {
        Command::Ports => Vec::new(),
        Command::Run { speed, direction } => vec![Step::Send(TableCommand::Run {
            speed: speed_or_default(speed),
            direction: *direction,
        })],
        Command::Forward { speed } => vec![Step::Send(TableCommand::Run {
            speed: speed_or_default(speed),
            direction: Direction::Forward,
        })],
        Command::Reverse { speed } => vec![Step::Send(TableCommand::Run {
            speed: speed_or_default(speed),
            direction: Direction::Reverse,
        })],
        Command::MoveAbs { position, speed } => vec![Step::Send(TableCommand::MoveAbsolute {
            coordinate: *position,
            speed: speed_or_default(speed),
        })],
        Command::MoveRel { steps, speed } => vec![Step::Send(TableCommand::MoveIncremental {
            steps: *steps,
            speed: speed_or_default(speed),
        })],
        Command::SetCoord { position } => vec![Step::Send(TableCommand::SetCoordinate {
            coordinate: *position,
        })],
        Command::Stop => vec![Step::Send(TableCommand::Stop)],
        Command::Home { speed, direction } => vec![Step::Send(TableCommand::ReturnToZero {
            speed: speed_or_default(speed),
            direction: *direction,
        })],
        Command::Jog {
            speed,
            direction,
            seconds,
        } => {
            let duration = Duration::try_from_secs_f64(*seconds)
                .with_context(|| format!("invalid jog duration {seconds}s"))?;
            vec![
                Step::Send(TableCommand::Run {
                    speed: speed_or_default(speed),
                    direction: *direction,
                }),
                Step::Wait(duration),
                Step::Send(TableCommand::Stop),
            ]
        }
    };

    // Validate every frame before anything touches the port
    for step in &steps {
        if let Step::Send(cmd) = step {
            cmd.encode()?;
        }
    }
    Ok(steps)
}

fn print_plan(steps: &[Step]) -> Result<()> {
    for step in steps {
        match step {
            Step::Send(cmd) => println!("{:<16} {}", cmd.opcode(), cmd.encode()?),
            Step::Wait(duration) => println!("{:<16} {:.3}s", "Wait", duration.as_secs_f64()),
        }
    }
    Ok(())
}

fn execute(config: &DriverConfig, steps: &[Step]) -> Result<()> {
    info!("Connecting to rotary table on {}...", config.port);
    let mut table = RotaryTable::open_with_config(config)
        .with_context(|| format!("connecting to {}", config.port))?;

    for step in steps {
        match step {
            Step::Send(cmd) => {
                info!("Sending {}", cmd.opcode());
                table.send(*cmd)?;
            }
            Step::Wait(duration) => {
                info!("Waiting {:.1}s...", duration.as_secs_f64());
                std::thread::sleep(*duration);
            }
        }
    }

    info!("Done!");
    Ok(())
}

fn cmd_ports() -> Result<()> {
    let ports = serialport::available_ports().context("enumerating serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    for port in ports {
        let kind = match port.port_type {
            serialport::SerialPortType::UsbPort(usb) => format!(
                "USB {:04x}:{:04x} {}",
                usb.vid,
                usb.pid,
                usb.product.unwrap_or_default()
            ),
            serialport::SerialPortType::PciPort => "PCI".to_string(),
            serialport::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
            serialport::SerialPortType::Unknown => "Unknown".to_string(),
        };
        println!("{:<20} {}", port.port_name, kind);
    }
    Ok(())
}
