mod config;
mod error;
mod provider;
mod publisher;

#[cfg(test)]
mod fake_dyn;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::info;

use config::{Config, Overrides, RecordConfig, Settings};

#[derive(Parser)]
#[command(name = "dyn-cname")]
#[command(about = "Create or update a CNAME record on Dyn and publish the zone")]
struct Args {
    /// Optional TOML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Customer name (financialtimes)
    #[arg(long = "customerName", visible_alias = "customer-name")]
    customer_name: Option<String>,

    /// User name (georgeangel)
    #[arg(long = "userName", visible_alias = "user-name")]
    user_name: Option<String>,

    /// Password
    #[arg(long)]
    password: Option<String>,

    /// Host the CNAME should point at (aws.elb.com)
    #[arg(long)]
    host: Option<String>,

    /// Hostname to register (*.ft.com)
    #[arg(long)]
    fqdn: Option<String>,

    /// Dyn zone (ft.com)
    #[arg(long)]
    zone: Option<String>,

    /// Dyn API base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
}

impl Args {
    fn into_overrides(self) -> Overrides {
        Overrides {
            record: RecordConfig {
                customer_name: self.customer_name,
                user_name: self.user_name,
                password: self.password,
                host: self.host,
                fqdn: self.fqdn,
                zone: self.zone,
            },
            api_base: self.api_base,
            timeout_secs: self.timeout,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(message) => {
            println!("{}", message);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(mut args: Args) -> Result<String> {
    // Load configuration first (before logger init)
    let config = match args.config.take() {
        Some(path) => {
            let config = Config::load(&path)?;
            init_logger(&config.log.level);
            info!("Loaded configuration from: {}", path.display());
            config
        }
        None => {
            let config = Config::default();
            init_logger(&config.log.level);
            config
        }
    };

    let settings = Settings::resolve(config, args.into_overrides());
    info!(
        "Pointing {} at {} in zone {} via {}",
        settings.fqdn, settings.host, settings.zone, settings.api_base
    );

    let outcome = publisher::publish_cname(&settings).await?;
    info!("Finished: {:?}", outcome);

    Ok(publisher::confirmation(&settings))
}

/// Env var takes precedence over the configured level.
fn init_logger(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
