use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	pub postgres: Postgres,
	pub security: Security,
	#[serde(default)]
	pub mailbox: Mailbox,
	/// Optional. Without it every fetched message resolves to unusable transaction details.
	pub extractor: Option<Extractor>,
	#[serde(default)]
	pub fx: Fx,
	pub accounting: Accounting,
	#[serde(default)]
	pub scheduler: Scheduler,
	#[serde(default)]
	pub worker: Worker,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	#[serde(default = "default_pool_max_conns")]
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	/// 64 hexadecimal characters decoding to the 32-byte mailbox credential key.
	pub credential_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Mailbox {
	pub lookback_days: i64,
	/// Used for accounts whose own sender list is empty.
	pub default_bank_senders: Vec<String>,
}
impl Default for Mailbox {
	fn default() -> Self {
		Self { lookback_days: 60, default_bank_senders: vec!["alerts@axisbank.com".to_string()] }
	}
}

#[derive(Debug, Deserialize)]
pub struct Extractor {
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_extractor_path")]
	pub path: String,
	#[serde(default = "default_extractor_model")]
	pub model: String,
	#[serde(default = "default_extractor_temperature")]
	pub temperature: f32,
	#[serde(default = "default_extractor_top_p")]
	pub top_p: f32,
	#[serde(default = "default_extractor_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Fx {
	pub api_base: String,
	pub api_key: Option<String>,
	/// Applied when no key is configured or the provider call fails.
	pub fallback_rate: f64,
	pub cache_ttl_minutes: i64,
	pub timeout_ms: u64,
}
impl Default for Fx {
	fn default() -> Self {
		Self {
			api_base: "https://v6.exchangerate-api.com/v6".to_string(),
			api_key: None,
			fallback_rate: 83.0,
			cache_ttl_minutes: 60,
			timeout_ms: 10_000,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Accounting {
	pub api_base: String,
	#[serde(default)]
	pub bearer_token: Option<String>,
	#[serde(default = "default_accounting_currency")]
	pub default_currency: String,
	#[serde(default = "default_accounting_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scheduler {
	pub cycle_seconds: u64,
	pub job_timeout_seconds: i64,
	pub retention_hours: i64,
}
impl Default for Scheduler {
	fn default() -> Self {
		Self { cycle_seconds: 300, job_timeout_seconds: 600, retention_hours: 72 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Worker {
	pub poll_interval_ms: i64,
	/// Must stay above scheduler.job_timeout_seconds so a live job never loses its lease.
	pub lease_seconds: i64,
}
impl Default for Worker {
	fn default() -> Self {
		Self { poll_interval_ms: 500, lease_seconds: 630 }
	}
}

fn default_pool_max_conns() -> u32 {
	16
}

fn default_extractor_path() -> String {
	"/v1/chat/completions".to_string()
}

fn default_extractor_model() -> String {
	"gemini-2.0-flash-lite".to_string()
}

fn default_extractor_temperature() -> f32 {
	0.2
}

fn default_extractor_top_p() -> f32 {
	0.9
}

fn default_extractor_timeout_ms() -> u64 {
	30_000
}

fn default_accounting_currency() -> String {
	"INR".to_string()
}

fn default_accounting_timeout_ms() -> u64 {
	15_000
}
