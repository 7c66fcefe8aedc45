mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Accounting, Config, Extractor, Fx, Mailbox, Postgres, Scheduler, Security, Service, Worker,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation { message: "postgres.dsn must be non-empty.".to_string() });
	}
	if cfg.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let key = cfg.security.credential_key.trim();

	if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(Error::Validation {
			message: "security.credential_key must be 64 hexadecimal characters.".to_string(),
		});
	}

	if cfg.mailbox.lookback_days <= 0 {
		return Err(Error::Validation {
			message: "mailbox.lookback_days must be greater than zero.".to_string(),
		});
	}

	if let Some(extractor) = cfg.extractor.as_ref() {
		if extractor.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: "extractor.api_base must be non-empty.".to_string(),
			});
		}
		if extractor.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: "extractor.api_key must be non-empty.".to_string(),
			});
		}
		if extractor.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "extractor.timeout_ms must be greater than zero.".to_string(),
			});
		}
	}

	if cfg.fx.api_base.trim().is_empty() {
		return Err(Error::Validation { message: "fx.api_base must be non-empty.".to_string() });
	}
	if !cfg.fx.fallback_rate.is_finite() || cfg.fx.fallback_rate <= 0.0 {
		return Err(Error::Validation {
			message: "fx.fallback_rate must be greater than zero.".to_string(),
		});
	}
	if cfg.fx.cache_ttl_minutes <= 0 {
		return Err(Error::Validation {
			message: "fx.cache_ttl_minutes must be greater than zero.".to_string(),
		});
	}
	if cfg.fx.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "fx.timeout_ms must be greater than zero.".to_string(),
		});
	}

	if cfg.accounting.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "accounting.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.accounting.default_currency.trim().is_empty() {
		return Err(Error::Validation {
			message: "accounting.default_currency must be non-empty.".to_string(),
		});
	}
	if cfg.accounting.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "accounting.timeout_ms must be greater than zero.".to_string(),
		});
	}

	if cfg.scheduler.cycle_seconds == 0 {
		return Err(Error::Validation {
			message: "scheduler.cycle_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.scheduler.job_timeout_seconds <= 0 {
		return Err(Error::Validation {
			message: "scheduler.job_timeout_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.scheduler.retention_hours <= 0 {
		return Err(Error::Validation {
			message: "scheduler.retention_hours must be greater than zero.".to_string(),
		});
	}

	if cfg.worker.poll_interval_ms <= 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.lease_seconds <= cfg.scheduler.job_timeout_seconds {
		return Err(Error::Validation {
			message: "worker.lease_seconds must be greater than scheduler.job_timeout_seconds."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if let Some(extractor) = cfg.extractor.as_mut() {
		trim_api_base(&mut extractor.api_base);
	}

	trim_api_base(&mut cfg.fx.api_base);
	trim_api_base(&mut cfg.accounting.api_base);

	for sender in &mut cfg.mailbox.default_bank_senders {
		*sender = sender.trim().to_ascii_lowercase();
	}

	cfg.mailbox.default_bank_senders.retain(|sender| !sender.is_empty());

	if cfg.fx.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.fx.api_key = None;
	}
	if cfg
		.accounting
		.bearer_token
		.as_deref()
		.map(|token| token.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.accounting.bearer_token = None;
	}
}

// Request URLs are formed by appending a path to the base.
fn trim_api_base(base: &mut String) {
	*base = base.trim().trim_end_matches('/').to_string();
}
