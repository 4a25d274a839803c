use std::env;

const DEFAULT_MODEL_PROVIDER: &str = "ollama";
const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5:3b";
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful travel assistant.";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
const DEFAULT_HOTEL_SEARCH_URL: &str = "https://www.booking.com/searchresults.html";
const DEFAULT_HOTEL_WAIT_SECS: u64 = 15;
const DEFAULT_NIGHTS: u32 = 2;
const DEFAULT_CHECKIN_OFFSET_DAYS: u32 = 30;
const DEFAULT_AMADEUS_BASE_URL: &str = "https://test.api.amadeus.com";
const DEFAULT_TRAVEL_ADVISOR_URL: &str = "https://travel-advisor.p.rapidapi.com";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_MAX_RETRIES: u32 = 2;

/// How hotel result pages are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserBackend {
    /// Drive a real browser through a WebDriver endpoint (chromedriver).
    WebDriver,
    /// Plain GET of the page; no JavaScript is executed.
    Http,
}

impl BrowserBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebDriver => "webdriver",
            Self::Http => "http",
        }
    }
}

/// Where hotel offers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotelSource {
    /// Scrape the listings page named by `HOTEL_SEARCH_URL`.
    Scrape,
    /// Travel Advisor API on RapidAPI; names and ratings only.
    TravelAdvisor,
}

impl HotelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::TravelAdvisor => "travel_advisor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_HTTP_MAX_RETRIES,
            base_delay_ms: 250,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub model_provider: String,
    pub model: String,
    pub model_base_url: String,
    pub openai_api_key: Option<String>,
    pub system_prompt: String,
    pub model_timeout_secs: u64,
    pub hotel_source: HotelSource,
    pub browser_backend: BrowserBackend,
    pub webdriver_url: String,
    pub hotel_search_url: String,
    pub hotel_wait_secs: u64,
    pub default_nights: u32,
    pub default_checkin_offset_days: u32,
    pub travel_advisor_url: String,
    pub rapidapi_key: Option<String>,
    pub amadeus_base_url: String,
    pub amadeus_access_token: Option<String>,
    pub http_timeout_secs: u64,
    pub retry_policy: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub(crate) fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let model_provider = get_var("MODEL_PROVIDER")
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_PROVIDER.to_string());
        let (default_model, default_base_url) = provider_defaults(&model_provider);

        let model = non_empty(get_var("MODEL")).unwrap_or_else(|| default_model.to_string());
        let model_base_url =
            non_empty(get_var("MODEL_BASE_URL")).unwrap_or_else(|| default_base_url.to_string());
        let model_timeout_secs = parse_positive_u64(
            get_var("MODEL_TIMEOUT_SECS").as_deref(),
            DEFAULT_MODEL_TIMEOUT_SECS,
        );
        let hotel_source = parse_hotel_source(get_var("HOTEL_SOURCE").as_deref());
        let browser_backend = parse_browser_backend(get_var("BROWSER_BACKEND").as_deref());
        let hotel_wait_secs =
            parse_positive_u64(get_var("HOTEL_WAIT_SECS").as_deref(), DEFAULT_HOTEL_WAIT_SECS);
        let default_nights = parse_positive_u32(get_var("DEFAULT_NIGHTS").as_deref(), DEFAULT_NIGHTS);
        let default_checkin_offset_days = parse_u32(
            get_var("DEFAULT_CHECKIN_OFFSET_DAYS").as_deref(),
            DEFAULT_CHECKIN_OFFSET_DAYS,
        );
        let http_timeout_secs = parse_positive_u64(
            get_var("HTTP_TIMEOUT_SECS").as_deref(),
            DEFAULT_HTTP_TIMEOUT_SECS,
        );
        let retry_policy = RetryPolicy {
            max_retries: parse_u32(
                get_var("HTTP_MAX_RETRIES").as_deref(),
                DEFAULT_HTTP_MAX_RETRIES,
            ),
            ..RetryPolicy::default()
        };

        Self {
            model_provider,
            model,
            model_base_url,
            openai_api_key: non_empty(get_var("OPENAI_API_KEY")),
            system_prompt: get_var("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            model_timeout_secs,
            hotel_source,
            browser_backend,
            webdriver_url: non_empty(get_var("WEBDRIVER_URL"))
                .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string()),
            hotel_search_url: non_empty(get_var("HOTEL_SEARCH_URL"))
                .unwrap_or_else(|| DEFAULT_HOTEL_SEARCH_URL.to_string()),
            hotel_wait_secs,
            default_nights,
            default_checkin_offset_days,
            travel_advisor_url: non_empty(get_var("TRAVEL_ADVISOR_URL"))
                .unwrap_or_else(|| DEFAULT_TRAVEL_ADVISOR_URL.to_string()),
            rapidapi_key: non_empty(get_var("RAPIDAPI_KEY")),
            amadeus_base_url: non_empty(get_var("AMADEUS_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_AMADEUS_BASE_URL.to_string()),
            amadeus_access_token: non_empty(get_var("AMADEUS_ACCESS_TOKEN")),
            http_timeout_secs,
            retry_policy,
        }
    }
}

fn provider_defaults(provider: &str) -> (&'static str, &'static str) {
    match provider {
        "openai" => (DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_BASE_URL),
        _ => (DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_BASE_URL),
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_positive_u32(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_u32(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_browser_backend(raw: Option<&str>) -> BrowserBackend {
    match raw
        .unwrap_or("webdriver")
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "http" => BrowserBackend::Http,
        _ => BrowserBackend::WebDriver,
    }
}

fn parse_hotel_source(raw: Option<&str>) -> HotelSource {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("travel_advisor" | "travel-advisor" | "rapidapi") => HotelSource::TravelAdvisor,
        _ => HotelSource::Scrape,
    }
}
