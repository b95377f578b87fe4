/// Port used when `PORT` is unset or carries no usable digits.
pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Expected value of the `x-mcp-key` header. `None` rejects every request.
    pub private_key: Option<String>,
    pub port: u16,
    pub geocoding_url: String,
    pub forecast_url: String,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// - `MCP_PRIVATE_KEY`: shared secret compared against `x-mcp-key`
    /// - `PORT` (optional, default 3000): listen port
    /// - `GEOCODING_API_URL` / `FORECAST_API_URL` (optional): weather upstreams
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => parse_port(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, default = DEFAULT_PORT, "PORT is not a valid port, using default");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            private_key: lookup("MCP_PRIVATE_KEY"),
            port,
            geocoding_url: lookup("GEOCODING_API_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODING_URL.to_string()),
            forecast_url: lookup("FORECAST_API_URL")
                .unwrap_or_else(|| DEFAULT_FORECAST_URL.to_string()),
        }
    }
}

/// Integer-prefix parse: leading whitespace is skipped and the longest run of
/// ASCII digits is used, so `"8080abc"` yields 8080 and `"abc"` yields `None`.
pub fn parse_port(raw: &str) -> Option<u16> {
    let trimmed = raw.trim_start();
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u16>().ok()
}
