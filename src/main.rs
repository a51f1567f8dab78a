use anyhow::{Context, Result};
use clap::Parser;
use ratewatch::config::Config;
use ratewatch::extract::PeriodKey;
use ratewatch::gate::SendGate;
use ratewatch::notify::{DisabledMailer, Mailer, SmtpMailer};
use ratewatch::run;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(
    name = "ratewatch",
    about = "Scrapes the regulated utility-rates page and emails a monthly summary"
)]
struct Args {
    /// Delete all send markers before running.
    #[arg(long = "purgeTempData")]
    purge_temp_data: bool,

    /// Path to the YAML configuration file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;
    info!(config = %args.config.display(), "startup");

    let gate = SendGate::new(&cfg.marker_dir, cfg.marker_policy)?;
    if args.purge_temp_data {
        gate.purge().context("purging marker store")?;
    }

    let mailer: Box<dyn Mailer> = if cfg.send_email {
        let smtp = cfg
            .smtp
            .as_ref()
            .context("send_email is enabled but no smtp section is configured")?;
        Box::new(SmtpMailer::new(smtp).context("building smtp transport")?)
    } else {
        Box::new(DisabledMailer)
    };

    let period = PeriodKey::current();
    let outcome = run::run(&cfg, &gate, mailer.as_ref(), &period).await?;
    println!("{}", outcome.status_line());
    Ok(())
}
