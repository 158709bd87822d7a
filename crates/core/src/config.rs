use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CRM__` (e.g. `CRM__CAMPAIGNS__MAX_PAGE_SIZE=50`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub segments: SegmentConfig,
    #[serde(default)]
    pub campaigns: CampaignConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_json_logs")]
    pub json: bool,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentConfig {
    #[serde(default = "default_max_rules")]
    pub max_rules: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    #[serde(default = "default_name_min_len")]
    pub name_min_len: usize,
    #[serde(default = "default_name_max_len")]
    pub name_max_len: usize,
    #[serde(default = "default_message_max_len")]
    pub message_max_len: usize,
    /// How far in the past `scheduled_for` may lie when a campaign is created.
    #[serde(default = "default_schedule_grace_secs")]
    pub schedule_grace_secs: i64,
    #[serde(default = "default_recent_messages_limit")]
    pub recent_messages_limit: usize,
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default = "default_min_search_len")]
    pub min_search_len: usize,
}

// Default functions
fn default_environment() -> String {
    "development".to_string()
}
fn default_json_logs() -> bool {
    true
}
fn default_log_filter() -> String {
    "crm_admin=info,crm_segmentation=info,crm_campaigns=info".to_string()
}
fn default_max_rules() -> usize {
    20
}
fn default_name_min_len() -> usize {
    3
}
fn default_name_max_len() -> usize {
    100
}
fn default_message_max_len() -> usize {
    1000
}
fn default_schedule_grace_secs() -> i64 {
    60
}
fn default_recent_messages_limit() -> usize {
    10
}
fn default_page_size() -> u64 {
    10
}
fn default_max_page_size() -> u64 {
    100
}
fn default_min_search_len() -> usize {
    2
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: default_json_logs(),
            filter: default_log_filter(),
        }
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_rules: default_max_rules(),
        }
    }
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            name_min_len: default_name_min_len(),
            name_max_len: default_name_max_len(),
            message_max_len: default_message_max_len(),
            schedule_grace_secs: default_schedule_grace_secs(),
            recent_messages_limit: default_recent_messages_limit(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            min_search_len: default_min_search_len(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            logging: LoggingConfig::default(),
            segments: SegmentConfig::default(),
            campaigns: CampaignConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CRM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Internal error details are only surfaced outside production.
    pub fn expose_internal_errors(&self) -> bool {
        !self.environment.eq_ignore_ascii_case("production")
    }
}
