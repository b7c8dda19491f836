use std::path::PathBuf;

/// Credential used when the fixture user cannot be registered
pub const FALLBACK_EMAIL: &str = "admin@system.com";
pub const FALLBACK_PASSWORD: &str = "LA2028sGoldM";

/// Harness configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL of the application under test
    pub base_url: String,

    /// Default timeout for bounded waits (ms)
    pub default_timeout_ms: u64,

    /// Interval between condition checks while waiting (ms)
    pub poll_interval_ms: u64,

    /// Run the browser without a window
    pub headless: bool,

    /// Output directory for the report and screenshots
    pub output_dir: PathBuf,

    pub viewport_width: u32,
    pub viewport_height: u32,

    pub fallback_email: String,
    pub fallback_password: String,

    /// Pause between failed login attempts in the lockout scenario (ms)
    pub lockout_attempt_delay_ms: u64,

    /// Pause between failed login attempts in the lockout scope scenario (ms)
    pub scope_attempt_delay_ms: u64,

    /// Settle time after parallel registrations before follow-up checks (ms)
    pub race_settle_ms: u64,

    /// Settle time before revisiting the landing page on both sessions (ms)
    pub session_settle_ms: u64,
}

impl Config {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn register_url(&self) -> String {
        self.url("/register.jsp")
    }

    pub fn login_url(&self) -> String {
        self.url("/login.jsp")
    }

    pub fn welcome_url(&self) -> String {
        self.url("/welcome.jsp")
    }

    /// Config with every pause set to zero and short waits
    #[cfg(test)]
    pub fn for_tests(output_dir: &std::path::Path) -> Self {
        Self {
            base_url: "http://app.test".to_string(),
            default_timeout_ms: 300,
            poll_interval_ms: 10,
            headless: true,
            output_dir: output_dir.to_path_buf(),
            lockout_attempt_delay_ms: 0,
            scope_attempt_delay_ms: 0,
            race_settle_ms: 0,
            session_settle_ms: 0,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let headless = std::env::var("AUTHPROBE_HEADLESS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            base_url: "http://localhost:8080".to_string(),
            default_timeout_ms: 10000,
            poll_interval_ms: 500,
            headless,
            output_dir: PathBuf::from("."),
            viewport_width: 1280,
            viewport_height: 720,
            fallback_email: FALLBACK_EMAIL.to_string(),
            fallback_password: FALLBACK_PASSWORD.to_string(),
            lockout_attempt_delay_ms: 1500,
            scope_attempt_delay_ms: 1200,
            race_settle_ms: 3000,
            session_settle_ms: 2000,
        }
    }
}
