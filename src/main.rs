use std::env;
use std::process;

use tokio_stream::wrappers::ReceiverStream;
use tracing::level_filters::LevelFilter;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use vend_sim::csv::{read_commands, write_stock};
use vend_sim::machine::{AdminCredentials, Locked};
use vend_sim::{Machine, MachineConfig};

const USAGE: &str = "usage: vend-sim <script.csv> [capacity product_level coin_level]";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (path, config) = match args.as_slice() {
        [path] => (path.clone(), MachineConfig::default()),
        [path, capacity, products, coins] => match MachineConfig::parse(capacity, products, coins) {
            Ok(config) => (path.clone(), config),
            Err(e) => {
                eprintln!("{e}\n{USAGE}");
                process::exit(2);
            }
        },
        _ => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    if !path.ends_with(".csv") {
        warn!(path, "script file seems to not be a csv file");
    }

    let built = match AdminCredentials::from_env() {
        Some(credentials) => Machine::new(config, credentials),
        None => {
            warn!(
                "{} / {} not set, admin login disabled",
                AdminCredentials::USER_VAR,
                AdminCredentials::PASSWORD_VAR
            );
            Machine::new(config, Locked)
        }
    };
    let mut machine = match built {
        Ok(machine) => machine,
        Err(e) => {
            error!("{e}");
            process::exit(2);
        }
    };

    let commands = match read_commands(path) {
        Ok(commands) => commands,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let (cmd_sender, cmd_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in commands {
            match result {
                Ok(command) => {
                    if cmd_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    machine.run(ReceiverStream::new(cmd_receiver)).await;

    if let Err(e) = write_stock(&machine) {
        error!("failed to write stock report: {e}");
        process::exit(1);
    }
}
