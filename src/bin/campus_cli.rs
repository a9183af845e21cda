use campus_ipv6::config::InventoryConfig;
use campus_ipv6::store::{InventoryStore, NativeDbBlobStore};
use campus_ipv6::ui::run_inventory_view;
use campus_ipv6::validate::{classify, AddressForm};
use campus_ipv6::{synthesize, DeviceStatus};
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, rename_all = "snake_case")]
struct Args {
    /// Command to execute: generate, validate, list, stats, view
    #[arg(short, long)]
    command: String,

    /// Campus number (for generate)
    #[arg(long, name = "campus_id")]
    campus_id: Option<String>,

    /// Subnet number (for generate)
    #[arg(long, name = "subnet_id")]
    subnet_id: Option<String>,

    /// Device type: sensor, camera, gateway, controller, endpoint (for generate)
    #[arg(long, name = "device_type")]
    device_type: Option<String>,

    /// Device name (for generate)
    #[arg(long, name = "device_name")]
    device_name: Option<String>,

    /// Register the generated device as offline
    #[arg(long, default_value = "false")]
    offline: bool,

    /// Address to check (for validate)
    #[arg(long, name = "address")]
    address: Option<String>,

    /// Print list output as JSON
    #[arg(long, default_value = "false")]
    json: bool,

    /// Inventory database path (or set CAMPUS_INVENTORY_DB env var)
    #[arg(long, name = "db_path")]
    db_path: Option<String>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

// example usage:
// ./target/release/campus_cli --command generate --campus_id 12 --subnet_id 3 --device_type sensor --device_name 'Library Sensor'
// ./target/release/campus_cli --command validate --address 'fe80::1%eth0'
// ./target/release/campus_cli --command list --json
// ./target/release/campus_cli --command stats
// ./target/release/campus_cli --command view

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn form_label(form: AddressForm) -> &'static str {
    match form {
        AddressForm::Full => "full",
        AddressForm::Compressed => "compressed",
        AddressForm::LinkLocalZoned => "link-local with zone",
        AddressForm::Ipv4Mapped => "IPv4-mapped",
        AddressForm::Ipv4Embedded => "IPv4-embedded",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!("campus_ipv6={}", args.log_level))
        .init();

    // Validation needs no inventory
    if args.command == "validate" {
        let address = match required(args.address) {
            Some(address) => address,
            None => {
                eprintln!("Please enter an IPv6 address (--address)");
                std::process::exit(1);
            }
        };
        match classify(&address) {
            Some(form) => println!("✓ Valid IPv6 Address ({}): {}", form_label(form), address),
            None => {
                println!("✗ Invalid IPv6 Address: {}", address);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let mut config = InventoryConfig::from_env()?;
    if let Some(db_path) = args.db_path {
        config = config.with_db_path(db_path);
    }

    let backend = NativeDbBlobStore::open(&config.db_path)?;
    let mut store = InventoryStore::open(backend, config.storage_key.clone())?;
    if config.seed_on_empty {
        store.seed_if_empty()?;
    }

    match args.command.as_str() {
        "generate" => {
            let fields = (
                required(args.campus_id),
                required(args.subnet_id),
                required(args.device_type),
                required(args.device_name),
            );
            let (campus_id, subnet_id, device_type, device_name) = match fields {
                (Some(c), Some(s), Some(t), Some(n)) => (c, s, t, n),
                _ => {
                    eprintln!(
                        "Please fill in all fields (--campus_id, --subnet_id, --device_type, --device_name)"
                    );
                    std::process::exit(1);
                }
            };

            let address = synthesize(&campus_id, &subnet_id, &device_type);
            let status = if args.offline {
                DeviceStatus::Offline
            } else {
                DeviceStatus::Online
            };
            let device = store.add_with_status(&device_name, &device_type, &address, status)?;
            info!("Registered device {} as {}", device.id, device.address);

            println!("Generated IPv6 Address");
            println!("{}", device.address);
            println!("Device: {} | Type: {}", device.name, device.device_type);
        }
        "list" => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(store.list())?);
            } else {
                for (index, device) in store.list().iter().enumerate() {
                    println!(
                        "{:>3}  {:<24} {:<11} {:<40} {:<8} {}",
                        index + 1,
                        device.name,
                        device.device_type,
                        device.address,
                        device.status,
                        device.registered_at
                    );
                }
            }
        }
        "stats" => {
            let stats = store.stats();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total Devices: {}", stats.total);
                println!("Online:        {}", stats.online);
                println!("Sensors:       {}", stats.sensors);
                println!("Other Devices: {}", stats.non_sensors);
            }
        }
        "view" => {
            let devices = store.list().to_vec();
            let stats = store.stats();
            if let Err(e) = run_inventory_view(devices, stats) {
                error!("Inventory view failed: {}", e);
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("Unknown command: {}", args.command);
            eprintln!("Available commands: generate, validate, list, stats, view");
            std::process::exit(1);
        }
    }

    Ok(())
}
