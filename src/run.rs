use crate::config::{Config, ExtractionMode, MarkerPolicy};
use crate::error::FetchError;
use crate::extract::{self, render, PeriodKey};
use crate::fetch;
use crate::gate::SendGate;
use crate::notify::Mailer;
use anyhow::{Context, Result};
use chrono::Local;
use std::time::Duration;
use tracing::{info, warn};

/// What a single invocation did; `main` turns this into the stdout status
/// line and the exit code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Sent { summary: String },
    /// A marker for this period already exists.
    AlreadySent,
    /// The page had no tables at all.
    NoData,
    /// Tables were fetched but the current period's rates are not published
    /// in the expected shape.
    NotPublished,
}

impl Outcome {
    pub fn status_line(&self) -> &str {
        match self {
            Outcome::Sent { summary } => summary,
            Outcome::AlreadySent | Outcome::NoData => "no new rates",
            Outcome::NotPublished => "no emails sent",
        }
    }
}

/// One invocation: at most one fetch, one extraction, one send. The marker is
/// written only after the send succeeds (or is explicitly bypassed for
/// dry runs); if the marker write fails after a successful send, that error
/// propagates rather than silently claiming success.
pub async fn run(
    cfg: &Config,
    gate: &SendGate,
    mailer: &dyn Mailer,
    period: &PeriodKey,
) -> Result<Outcome> {
    // Monthly markers are known before fetching; skip the network entirely.
    if cfg.marker_policy == MarkerPolicy::Monthly && gate.already_sent(period, None) {
        info!(month = %period.month, "already notified this period");
        return Ok(Outcome::AlreadySent);
    }

    let client = fetch::build_client(
        Duration::from_secs(cfg.timeout_secs),
        cfg.accept_invalid_certs,
    )
    .context("building http client")?;

    let tables = match fetch::fetch_tables(&client, &cfg.source_url).await {
        Ok(tables) => tables,
        Err(FetchError::NoTables { url }) => {
            info!(%url, "no tables published yet");
            return Ok(Outcome::NoData);
        }
        Err(err) => return Err(err).context("fetching rate tables"),
    };
    info!(count = tables.len(), "fetched tables");

    let message = match cfg.mode {
        ExtractionMode::Dual => match extract::select_rate_tables(&tables, period) {
            Ok(Some(rate_tables)) => {
                let fragments: Vec<String> =
                    rate_tables.iter().map(render::render_fragment).collect();
                let subject = subject_line();
                Composed {
                    summary: subject.clone(),
                    subject,
                    body: compose_dual_body(&fragments, cfg.info_url.as_deref()),
                    value: None,
                }
            }
            Ok(None) => {
                info!(
                    month = %period.month,
                    "current period's tables not published in expected shape"
                );
                return Ok(Outcome::NotPublished);
            }
            Err(err) => {
                warn!(%err, "malformed rate table; no send this run");
                return Ok(Outcome::NotPublished);
            }
        },
        ExtractionMode::Single => match extract::extract_single(&tables, period, &cfg.category) {
            Ok(Some(rate)) => Composed {
                summary: rate.line(),
                subject: subject_line(),
                body: compose_single_body(&rate.line(), cfg.info_url.as_deref()),
                value: Some(rate.value),
            },
            Ok(None) => {
                info!(category = %cfg.category, "no table matched the current period");
                return Ok(Outcome::NotPublished);
            }
            Err(err) => {
                warn!(%err, "malformed rate table; no send this run");
                return Ok(Outcome::NotPublished);
            }
        },
    };

    // Content-sensitive markers only exist once the value is extracted.
    if gate.already_sent(period, message.value.as_deref()) {
        info!(month = %period.month, "already notified for this exact rate");
        return Ok(Outcome::AlreadySent);
    }

    mailer
        .send(&message.subject, &message.body)
        .await
        .context("sending rate notification")?;

    if mailer.enabled() || cfg.mark_sent_when_disabled {
        gate.mark_sent(period, message.value.as_deref(), &message.body)
            .context("email sent but marker write failed; next run may send a duplicate")?;
    }

    Ok(Outcome::Sent {
        summary: message.summary,
    })
}

struct Composed {
    subject: String,
    body: String,
    summary: String,
    value: Option<String>,
}

fn subject_line() -> String {
    format!(
        "Updated energy rates as of {}",
        Local::now().format("%B %d, %Y")
    )
}

fn compose_dual_body(fragments: &[String], info_url: Option<&str>) -> String {
    let mut body = String::from(
        "<body>\n<p>This month's updated Electricity and Natural Gas rates are below:</p>\n",
    );
    for fragment in fragments {
        body.push_str(fragment);
        body.push('\n');
    }
    push_footer(&mut body, info_url);
    body
}

fn compose_single_body(line: &str, info_url: Option<&str>) -> String {
    let mut body = format!("<body>\n<p>{}</p>\n", line);
    push_footer(&mut body, info_url);
    body
}

fn push_footer(body: &mut String, info_url: Option<&str>) {
    body.push_str("<br>\n<p>\n");
    if let Some(url) = info_url {
        body.push_str(&format!(
            "Visit <a href=\"{}\">the provider's current plans</a> for non-regulated offers.\n<br><br>\n",
            url
        ));
    }
    body.push_str("Cheers,\n<br>\nratewatch\n</p>\n</body>\n");
}
