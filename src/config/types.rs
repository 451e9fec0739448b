use serde::Deserialize;

/// Marketplace root
pub const DEFAULT_BASE_URL: &str = "https://www.kleinanzeigen.de";

/// Path of a user's ad listing, relative to the base URL
pub const DEFAULT_LISTING_PATH: &str = "/s-bestandsliste.html";

/// Default name of an ad's backup directory
pub const DEFAULT_AD_NAME_TEMPLATE: &str = "{{.Slug}}";

/// Browser-like user agent, the marketplace serves reduced pages to bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const DEFAULT_TEMPLATE: &str = "Title: {{.Title}}
Price: {{.Price}}
Shipping: {{.Shipping}}
Id: {{.ID}}
Category: {{.Category}}
Condition: {{.Condition}}
Type: {{.Type}}
Color: {{.Color}}
Material: {{.Material}}
Created: {{.Created}}
Expire: {{.Expire}}

{{.Text}}
";

/// Returns the default ad listing template with platform line endings
pub fn default_template() -> String {
    if cfg!(windows) {
        DEFAULT_TEMPLATE.replace('\n', "\r\n")
    } else {
        DEFAULT_TEMPLATE.to_string()
    }
}

/// Main configuration structure for Adkeep
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Marketplace user whose ads are backed up, 0 if unset
    pub user: u64,

    /// Output directory, may reference `{{.Year}}`, `{{.Month}}` and `{{.Day}}`
    pub outdir: String,

    /// Template rendered into `Adlisting.txt`
    pub template: String,

    /// Template for the name of each ad's directory
    #[serde(rename = "ad-name-template")]
    pub ad_name_template: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Maximum number of ads to back up, 0 means all
    pub limit: usize,

    /// Re-download and rewrite every image, skipping the duplicate check
    pub force: bool,

    /// Treat image download failures as non-fatal
    #[serde(rename = "ignore-errors")]
    pub ignore_errors: bool,

    pub site: SiteConfig,
    pub throttle: ThrottleConfig,
    pub retry: RetryConfig,

    /// Explicit ad URLs, only ever set from the command line
    #[serde(skip)]
    pub adlinks: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: 0,
            outdir: ".".to_string(),
            template: default_template(),
            ad_name_template: DEFAULT_AD_NAME_TEMPLATE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            limit: 0,
            force: false,
            ignore_errors: false,
            site: SiteConfig::default(),
            throttle: ThrottleConfig::default(),
            retry: RetryConfig::default(),
            adlinks: Vec::new(),
        }
    }
}

/// Marketplace endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(rename = "listing-path")]
    pub listing_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            listing_path: DEFAULT_LISTING_PATH.to_string(),
        }
    }
}

/// Politeness delay before each image download
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Lower bound in milliseconds
    #[serde(rename = "min-ms")]
    pub min_ms: u64,

    /// Upper bound in milliseconds
    #[serde(rename = "max-ms")]
    pub max_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_ms: 10,
            max_ms: 50,
        }
    }
}

/// Retry policy of the HTTP transport
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry, doubled for every further retry
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}
