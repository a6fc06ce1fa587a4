use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use bulk_mailer::mailer::{Connector, MailerConfig, SmtpConnector};
use bulk_mailer::recipients::{AddressSet, extract_addresses, normalize_manual_entry};

#[derive(Parser, Debug)]
#[command(
    name = "extract_addresses",
    about = "Extract and validate recipient addresses without sending mail",
    group(ArgGroup::new("source").required(true).args(["file", "emails"]))
)]
struct Args {
    /// CSV, XLSX or XLS file to scan for addresses.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Manually entered recipients separated by commas, semicolons or whitespace.
    #[arg(long)]
    emails: Option<String>,

    /// Also verify that the configured SMTP relay accepts a connection.
    #[arg(long)]
    check_transport: bool,

    /// Print the addresses as a JSON array instead of one per line.
    #[arg(long)]
    json: bool,
}

fn collect(args: &Args) -> Result<AddressSet, Box<dyn std::error::Error>> {
    if let Some(path) = &args.file {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(extract_addresses(&bytes, &file_name)?);
    }

    let validation = normalize_manual_entry(args.emails.as_deref().unwrap_or_default());
    for rejected in &validation.rejected {
        log::warn!("skipping invalid address '{}'", rejected);
    }
    Ok(validation.accepted)
}

async fn check_transport() -> Result<(), Box<dyn std::error::Error>> {
    let config = MailerConfig::from_env();
    let gateway = SmtpConnector.configure(&config)?;
    gateway.verify_reachable().await?;
    log::info!(
        "SMTP relay {}:{} accepted the connection",
        config.smtp_host,
        config.smtp_port
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let addresses = match collect(&args) {
        Ok(addresses) => addresses,
        Err(err) => {
            writeln!(io::stderr(), "error: {err}")?;
            std::process::exit(1);
        }
    };

    let mut stdout = io::stdout().lock();
    if args.json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&addresses.to_strings())?)?;
    } else {
        for address in &addresses {
            writeln!(stdout, "{address}")?;
        }
    }
    log::info!("found {} unique address(es)", addresses.len());

    if args.check_transport {
        if let Err(err) = check_transport().await {
            writeln!(io::stderr(), "error: {err}")?;
            std::process::exit(2);
        }
    }

    Ok(())
}
