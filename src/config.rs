use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Which matching policy the extractor runs with.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// One table, one category label, one-line summary.
    Single,
    /// Exactly two category tables (electricity + natural gas) rendered as
    /// HTML fragments.
    #[default]
    Dual,
}

/// How a send-marker file is named.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerPolicy {
    /// One marker per calendar month.
    #[default]
    Monthly,
    /// Month plus the extracted value; a changed value within the same month
    /// counts as unsent. Only meaningful in single-rate mode.
    ContentSensitive,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Page to scrape for rate tables.
    pub source_url: String,
    /// Optional "current rates" link appended to the email body.
    #[serde(default)]
    pub info_url: Option<String>,
    /// When false the notifier short-circuits without touching the network.
    #[serde(default)]
    pub send_email: bool,
    #[serde(default)]
    pub mode: ExtractionMode,
    /// Category label matched against table titles in single-rate mode.
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_marker_dir")]
    pub marker_dir: PathBuf,
    #[serde(default)]
    pub marker_policy: MarkerPolicy,
    /// Write a marker even though sending was disabled. Default keeps send
    /// success and marker persistence as one logical unit.
    #[serde(default)]
    pub mark_sent_when_disabled: bool,
    /// The upstream rates page has served broken certificate chains before;
    /// this keeps the old escape hatch but makes the risk opt-in.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub bcc: Vec<String>,
}

// Credentials must never reach logs, so Debug is written by hand.
impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .field("bcc", &self.bcc)
            .finish()
    }
}

fn default_category() -> String {
    "Natural Gas".to_string()
}

fn default_marker_dir() -> PathBuf {
    PathBuf::from("markers")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_smtp_port() -> u16 {
    587
}

impl Config {
    /// Load and validate a YAML config file. Loaded once at process start,
    /// immutable thereafter.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let cfg: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        Url::parse(&self.source_url)
            .with_context(|| format!("invalid source_url `{}`", self.source_url))?;
        if let Some(url) = &self.info_url {
            Url::parse(url).with_context(|| format!("invalid info_url `{}`", url))?;
        }
        if self.marker_policy == MarkerPolicy::ContentSensitive
            && self.mode != ExtractionMode::Single
        {
            bail!("content-sensitive markers require single-rate mode");
        }
        if self.send_email && self.smtp.is_none() {
            bail!("send_email is enabled but no smtp section is configured");
        }
        Ok(())
    }
}
