/*!
A small command-line control point: runs for a fixed duration, printing every device it
discovers (and, with `listen`, every event it receives from their evented services).
*/

use human_panic::setup_panic;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use structopt::StructOpt;
use tracing::{info, Level};
use upnp::config::ControlPointConfig;
use upnp::control_point::{ControlPointRegistry, DeviceObserver};
use upnp::model::Device;
use upnp::types::Udn;

#[derive(Debug, StructOpt)]
#[structopt(name = "upnp")]
struct CommandLine {
    /// The level of logging to perform, from off to trace
    #[structopt(long, short = "v", parse(from_occurrences))]
    verbose: i8,

    /// Local IPv4 address to bind discovery sockets on; default auto-selects every interface.
    #[structopt(long, short)]
    interface: Option<Ipv4Addr>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Send an initial M-SEARCH burst, wait, and print every device discovered.
    Search {
        #[structopt(long, short, default_value = "5")]
        wait_secs: u64,
    },
    /// Discover devices, subscribe to their evented services, and log every event received.
    Listen {
        #[structopt(long, short, default_value = "60")]
        duration_secs: u64,
    },
}

pub fn main() {
    setup_panic!();

    let args = CommandLine::from_args();
    init_tracing(args.verbose);
    let network_addresses = args.interface.into_iter().collect::<Vec<_>>();

    match args.cmd {
        Command::Search { wait_secs } => do_search(network_addresses, wait_secs),
        Command::Listen { duration_secs } => do_listen(network_addresses, duration_secs),
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn init_tracing(verbosity: i8) {
    let level = match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn do_search(network_addresses: Vec<Ipv4Addr>, wait_secs: u64) {
    let config = ControlPointConfig {
        subscribe_events: false,
        network_addresses,
        ..ControlPointConfig::default()
    };
    let registry = match ControlPointRegistry::new(config, Arc::new(ConsoleObserver)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("failed to start control point: {}", e);
            return;
        }
    };
    thread::sleep(Duration::from_secs(wait_secs));
    let devices = registry.known_devices();
    println!("discovered {} device(s)", devices.len());
    for device in &devices {
        println!("{:#?}", device);
    }
    registry.shutdown();
}

fn do_listen(network_addresses: Vec<Ipv4Addr>, duration_secs: u64) {
    let config = ControlPointConfig {
        subscribe_events: true,
        network_addresses,
        ..ControlPointConfig::default()
    };
    let registry = match ControlPointRegistry::new(config, Arc::new(ConsoleObserver)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("failed to start control point: {}", e);
            return;
        }
    };
    thread::sleep(Duration::from_secs(duration_secs));
    registry.shutdown();
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

struct ConsoleObserver;

impl DeviceObserver for ConsoleObserver {
    fn on_device_online(&self, device: &Device) {
        info!("device online: {} ({})", device.friendly_name, device.udn);
    }

    fn on_device_offline(&self, udn: &Udn) {
        info!("device offline: {}", udn);
    }

    fn on_event(&self, service_id: &str, properties: &[(String, String)]) {
        info!("event from '{}': {:?}", service_id, properties);
    }
}
