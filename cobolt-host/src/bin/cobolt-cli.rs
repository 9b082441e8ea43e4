//! command line client for Cobolt lasers on a serial port.
//! without a subcommand it lists the ports, asks which one to use and reads
//! the serial number of the device behind it
use std::fmt;
use std::io;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;

use cobolt_host as client;
use cobolt_proto as cp;

#[derive(Parser)]
#[command(name = "cobolt-cli")]
#[command(author, version, about = "Talk to Cobolt lasers over a serial port")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Baud rate, defaults to 112500 for the serial number exchange and 115200 otherwise
    #[arg(long, global = true, env = "COBOLT_BAUD")]
    baud: Option<u32>,

    /// Reply timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args)]
struct Target {
    /// Serial port of the laser (ex: /dev/ttyUSB0)
    #[arg(short, long, env = "COBOLT_PORT")]
    port: Option<String>,

    /// Find the laser by serial number instead, takes precedence over --port
    #[arg(short, long)]
    serial_number: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick a port interactively and read the serial number (default)
    Hello,

    /// List serial ports
    #[command(alias = "ls")]
    List,

    /// Send a raw command and print the reply
    Query {
        #[command(flatten)]
        target: Target,
        /// Command text without terminator (ex: "glm?")
        command: String,
    },

    /// Find all Cobolt lasers
    Lasers,

    /// Identify a laser
    Info {
        #[command(flatten)]
        target: Target,
    },

    /// Show the operating state of a laser
    Status {
        #[command(flatten)]
        target: Target,
    },

    /// Turn the laser on with the autostart sequence
    On {
        #[command(flatten)]
        target: Target,
    },

    /// Turn the laser off
    Off {
        #[command(flatten)]
        target: Target,
    },

    /// Clear a latched fault
    ClearFault {
        #[command(flatten)]
        target: Target,
    },

    /// Show or set the laser current
    Current {
        #[command(flatten)]
        target: Target,
        /// New current in mA
        #[arg(long)]
        set: Option<f64>,
    },

    /// Show or set the output power
    Power {
        #[command(flatten)]
        target: Target,
        /// New power in mW
        #[arg(long)]
        set: Option<f64>,
    },

    /// Switch the operating mode
    Mode {
        #[command(flatten)]
        target: Target,
        #[arg(value_enum)]
        mode: Mode,
        /// Setpoint to apply first: mA for cc, mW for cp, modulation power (mW, 06-MLD)
        /// or high current (mA, 06-DPL) for mod
        #[arg(long)]
        value: Option<f64>,
    },

    /// Modulation settings of 06-MLD and 06-DPL lasers
    Modulation {
        #[command(flatten)]
        target: Target,
        #[command(subcommand)]
        action: ModulationAction,
    },

    /// Show the effective link settings
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Constant current
    Cc,
    /// Constant power
    Cp,
    /// Modulation
    Mod,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> Self {
        matches!(toggle, Toggle::On)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ImpedanceArg {
    HighZ,
    #[value(name = "50")]
    FiftyOhm,
}

impl From<ImpedanceArg> for cp::Impedance {
    fn from(arg: ImpedanceArg) -> Self {
        match arg {
            ImpedanceArg::HighZ => cp::Impedance::HighZ,
            ImpedanceArg::FiftyOhm => cp::Impedance::FiftyOhm,
        }
    }
}

#[derive(Subcommand)]
enum ModulationAction {
    /// Show which modulation inputs are enabled
    State,
    /// Enable or disable digital modulation
    Digital {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Enable or disable analog modulation
    Analog {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Enable or disable on/off modulation (06-MLD)
    OnOff {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Show or set the modulation power in mW (06-MLD)
    Power {
        #[arg(long)]
        set: Option<f64>,
    },
    /// Show or set the analog input impedance (06-MLD)
    Impedance {
        #[arg(long, value_enum)]
        set: Option<ImpedanceArg>,
    },
    /// Show or set the modulation currents in mA (06-DPL)
    Current {
        #[arg(long)]
        high: Option<f64>,
        #[arg(long)]
        low: Option<f64>,
    },
    /// Show or set the modulation TEC temperature in °C (06-DPL)
    Tec {
        #[arg(long)]
        set: Option<f64>,
    },
}

impl Cli {
    fn link_config(&self, preset: client::LinkConfig) -> client::LinkConfig {
        preset
            .with_baud_rate(self.baud)
            .with_timeout(self.timeout_ms.map(Duration::from_millis))
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let laser_config = cli.link_config(client::LinkConfig::laser());
    match cli.command.as_ref().unwrap_or(&Commands::Hello) {
        Commands::Hello => hello(cli.link_config(client::LinkConfig::hello())),
        Commands::List => list_ports(cli.json)?,
        Commands::Query { target, command } => {
            let mut laser = open(target, &laser_config)?;
            let reply = laser.query(&cp::Command::Raw(command))?;
            println!("{}", reply);
        }
        Commands::Lasers => list_lasers(&laser_config, cli.json)?,
        Commands::Info { target } => {
            let laser = open(target, &laser_config)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&laser.info())?);
            } else {
                println!("{}: {}", laser.port_name(), laser);
            }
        }
        Commands::Status { target } => {
            let mut laser = open(target, &laser_config)?;
            let status = laser.status()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status, &laser.operating_hours()?);
            }
        }
        Commands::On { target } => open(target, &laser_config)?.turn_on()?,
        Commands::Off { target } => open(target, &laser_config)?.shutdown()?,
        Commands::ClearFault { target } => open(target, &laser_config)?.clear_fault()?,
        Commands::Current { target, set } => {
            let mut laser = open(target, &laser_config)?;
            if let Some(current) = set {
                laser.set_current(*current)?;
            }
            println!(
                "current: {} mA (setpoint {} mA)",
                laser.current()?,
                laser.current_setpoint()?
            );
        }
        Commands::Power { target, set } => {
            let mut laser = open(target, &laser_config)?;
            if let Some(power) = set {
                laser.set_power(*power)?;
            }
            println!(
                "power: {} mW (setpoint {} mW)",
                laser.power()?,
                laser.power_setpoint()?
            );
        }
        Commands::Mode {
            target,
            mode,
            value,
        } => {
            let mut laser = open(target, &laser_config)?;
            match mode {
                Mode::Cc => laser.constant_current(*value)?,
                Mode::Cp => laser.constant_power(*value)?,
                Mode::Mod => match laser.kind() {
                    cp::LaserKind::Dpl06 => laser.dpl()?.modulation_mode(*value)?,
                    _ => laser.mld()?.modulation_mode(*value)?,
                },
            }
            println!("mode: {}", laser.operating_mode()?);
        }
        Commands::Modulation { target, action } => {
            let mut laser = open(target, &laser_config)?;
            modulation(&mut laser, action, cli.json)?;
        }
        Commands::Config => {
            let configs = [
                ("hello", cli.link_config(client::LinkConfig::hello())),
                ("laser", laser_config),
            ];
            if cli.json {
                let configs: std::collections::BTreeMap<_, _> = configs.into_iter().collect();
                println!("{}", serde_json::to_string_pretty(&configs)?);
            } else {
                for (name, config) in configs {
                    println!(
                        "{:<6} baud: {:<7} timeout: {} ms",
                        name,
                        config.baud_rate,
                        config.timeout.as_millis()
                    );
                }
            }
        }
    }
    Ok(())
}

/// The interactive exchange reports its errors but always exits normally.
fn hello(config: client::LinkConfig) {
    let ports = match client::list_ports() {
        Ok(ports) => ports,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let stdin = io::stdin();
    let stdout = io::stdout();
    let result = client::hello::run(
        &mut stdin.lock(),
        &mut stdout.lock(),
        &ports,
        &config,
        client::connect,
    );
    if let Err(e) = result {
        eprintln!("{}", e);
    }
}

fn open(target: &Target, config: &client::LinkConfig) -> anyhow::Result<client::SerialLaser> {
    if let Some(serial_number) = &target.serial_number {
        return client::find_laser(serial_number, config)
            .with_context(|| format!("Failed to find laser {}", serial_number));
    }
    let Some(port) = &target.port else {
        anyhow::bail!("Please provide a serial port (ex: --port /dev/ttyUSB0) or --serial-number");
    };
    client::open_laser(port, config).with_context(|| format!("Failed to open laser on {}", port))
}

fn list_ports(json: bool) -> anyhow::Result<()> {
    let ports = client::list_ports().context("Failed to enumerate serial ports")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }
    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }
    client::hello::print_ports(&mut io::stdout().lock(), &ports)?;
    Ok(())
}

fn list_lasers(config: &client::LinkConfig, json: bool) -> anyhow::Result<()> {
    let lasers = client::list_lasers(config)?;
    if json {
        let infos: Vec<_> = lasers.iter().map(|laser| laser.info()).collect();
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }
    if lasers.is_empty() {
        println!("No lasers found.");
        return Ok(());
    }
    for laser in &lasers {
        println!("{}: {}", laser.port_name(), laser);
    }
    println!("\nTotal: {} lasers", lasers.len());
    Ok(())
}

fn print_status(status: &client::LaserStatus, hours: &str) {
    println!("on:        {}", if status.on { "yes" } else { "no" });
    println!("interlock: {}", or_unknown(status.interlock));
    println!("fault:     {}", or_unknown(status.fault));
    println!("mode:      {}", or_unknown(status.mode));
    println!("state:     {}", or_unknown(status.state));
    println!("current:   {} mA", status.current_ma);
    println!("power:     {} mW", status.power_mw);
    println!("hours:     {}", hours);
}

fn or_unknown<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "unknown".to_string(), |value| value.to_string())
}

fn modulation(
    laser: &mut client::SerialLaser,
    action: &ModulationAction,
    json: bool,
) -> anyhow::Result<()> {
    match action {
        ModulationAction::State => {
            let state = match laser.kind() {
                cp::LaserKind::Dpl06 => laser.dpl()?.modulation_state()?,
                _ => laser.mld()?.modulation_state()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("analog: {}, digital: {}", state.analog, state.digital);
            }
        }
        ModulationAction::Digital { state } => match laser.kind() {
            cp::LaserKind::Dpl06 => laser.dpl()?.digital_modulation((*state).into())?,
            _ => laser.mld()?.digital_modulation((*state).into())?,
        },
        ModulationAction::Analog { state } => match laser.kind() {
            cp::LaserKind::Dpl06 => laser.dpl()?.analog_modulation((*state).into())?,
            _ => laser.mld()?.analog_modulation((*state).into())?,
        },
        ModulationAction::OnOff { state } => laser.mld()?.on_off_modulation((*state).into())?,
        ModulationAction::Power { set } => {
            let mut mld = laser.mld()?;
            if let Some(power) = set {
                mld.set_modulation_power(*power)?;
            }
            println!("modulation power: {} mW", mld.modulation_power()?);
        }
        ModulationAction::Impedance { set } => {
            let mut mld = laser.mld()?;
            if let Some(impedance) = set {
                mld.set_analog_impedance((*impedance).into())?;
            }
            println!("analog impedance: {}", mld.analog_impedance()?);
        }
        ModulationAction::Current { high, low } => {
            let mut dpl = laser.dpl()?;
            if let Some(high) = high {
                dpl.set_modulation_current_high(*high)?;
            }
            if let Some(low) = low {
                dpl.set_modulation_current_low(*low)?;
            }
            let (high, low) = dpl.modulation_current()?;
            println!("modulation current: high {} mA, low {} mA", high, low);
        }
        ModulationAction::Tec { set } => {
            let mut dpl = laser.dpl()?;
            if let Some(temperature) = set {
                dpl.set_modulation_tec(*temperature)?;
            }
            println!(
                "modulation TEC: {} °C (setpoint {} °C)",
                dpl.modulation_tec()?,
                dpl.modulation_tec_setpoint()?
            );
        }
    }
    Ok(())
}
