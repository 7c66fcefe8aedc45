//! Email transaction automation service.
//!
//! Wires mailbox retrieval, LLM extraction, currency normalization and
//! ledger submission into per-user processing runs, backed by Postgres for
//! account configuration, message dedup and job state.

pub mod accounts;
pub mod extract;
pub mod mappings;
pub mod process;
pub mod rates;
pub mod schedule;
pub mod submit;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use time::Duration;

pub use accounts::{AccountStatus, AccountUpsertRequest, JobSummary};
pub use error::Error;
use ledgermail_config::Config;
use ledgermail_providers::mailbox::{MailboxCredentials, MailboxScan, ScanRequest};
use ledgermail_storage::{crypto::CredentialCipher, db::Db};
pub use mappings::AccountMappings;
pub use process::{RunReport, RunStatus};
pub use rates::RateCache;
pub use schedule::ScheduleCycleReport;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait MailboxProvider
where
	Self: Send + Sync,
{
	fn scan<'a>(
		&'a self,
		request: ScanRequest,
	) -> BoxFuture<'a, ledgermail_providers::Result<MailboxScan>>;

	fn probe<'a>(
		&'a self,
		credentials: MailboxCredentials,
	) -> BoxFuture<'a, ledgermail_providers::Result<()>>;
}

pub trait TransactionExtractor
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a ledgermail_config::Extractor,
		messages: &'a [Value],
	) -> BoxFuture<'a, ledgermail_providers::Result<Value>>;
}

pub trait RateProvider
where
	Self: Send + Sync,
{
	fn fetch_pair_rate<'a>(
		&'a self,
		cfg: &'a ledgermail_config::Fx,
		api_key: &'a str,
		from: &'a str,
		to: &'a str,
	) -> BoxFuture<'a, ledgermail_providers::Result<f64>>;
}

pub trait LedgerClient
where
	Self: Send + Sync,
{
	fn fetch_account_mappings<'a>(
		&'a self,
		cfg: &'a ledgermail_config::Accounting,
	) -> BoxFuture<'a, ledgermail_providers::Result<Value>>;

	fn submit_transaction<'a>(
		&'a self,
		cfg: &'a ledgermail_config::Accounting,
		payload: &'a Value,
	) -> BoxFuture<'a, ledgermail_providers::Result<Value>>;
}

/// Pluggable outbound integrations. Tests swap these for stubs so runs are
/// deterministic without a mailbox or any HTTP endpoint.
#[derive(Clone)]
pub struct Providers {
	pub mailbox: Arc<dyn MailboxProvider>,
	pub extractor: Arc<dyn TransactionExtractor>,
	pub rates: Arc<dyn RateProvider>,
	pub ledger: Arc<dyn LedgerClient>,
}

struct DefaultProviders;

impl MailboxProvider for DefaultProviders {
	fn scan<'a>(
		&'a self,
		request: ScanRequest,
	) -> BoxFuture<'a, ledgermail_providers::Result<MailboxScan>> {
		Box::pin(ledgermail_providers::mailbox::scan(request))
	}

	fn probe<'a>(
		&'a self,
		credentials: MailboxCredentials,
	) -> BoxFuture<'a, ledgermail_providers::Result<()>> {
		Box::pin(ledgermail_providers::mailbox::probe(credentials))
	}
}
impl TransactionExtractor for DefaultProviders {
	fn extract<'a>(
		&'a self,
		cfg: &'a ledgermail_config::Extractor,
		messages: &'a [Value],
	) -> BoxFuture<'a, ledgermail_providers::Result<Value>> {
		Box::pin(ledgermail_providers::extractor::extract(cfg, messages))
	}
}
impl RateProvider for DefaultProviders {
	fn fetch_pair_rate<'a>(
		&'a self,
		cfg: &'a ledgermail_config::Fx,
		api_key: &'a str,
		from: &'a str,
		to: &'a str,
	) -> BoxFuture<'a, ledgermail_providers::Result<f64>> {
		Box::pin(ledgermail_providers::fx::fetch_pair_rate(cfg, api_key, from, to))
	}
}
impl LedgerClient for DefaultProviders {
	fn fetch_account_mappings<'a>(
		&'a self,
		cfg: &'a ledgermail_config::Accounting,
	) -> BoxFuture<'a, ledgermail_providers::Result<Value>> {
		Box::pin(ledgermail_providers::ledger::fetch_account_mappings(cfg))
	}

	fn submit_transaction<'a>(
		&'a self,
		cfg: &'a ledgermail_config::Accounting,
		payload: &'a Value,
	) -> BoxFuture<'a, ledgermail_providers::Result<Value>> {
		Box::pin(ledgermail_providers::ledger::submit_transaction(cfg, payload))
	}
}

impl Providers {
	pub fn new(
		mailbox: Arc<dyn MailboxProvider>,
		extractor: Arc<dyn TransactionExtractor>,
		rates: Arc<dyn RateProvider>,
		ledger: Arc<dyn LedgerClient>,
	) -> Self {
		Self { mailbox, extractor, rates, ledger }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			mailbox: provider.clone(),
			extractor: provider.clone(),
			rates: provider.clone(),
			ledger: provider,
		}
	}
}

pub struct AutomationService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
	pub(crate) cipher: CredentialCipher,
	pub(crate) rates: RateCache,
}
impl AutomationService {
	/// Builds the service with the real providers. Fails when the credential
	/// key is unusable so a bad key surfaces at startup, not on the first run.
	pub fn new(cfg: Config, db: Db) -> Result<Self> {
		Self::with_providers(cfg, db, Providers::default())
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Result<Self> {
		let cipher = CredentialCipher::from_hex_key(&cfg.security.credential_key)
			.map_err(|err| Error::Configuration { message: err.to_string() })?;
		let rates = RateCache::new(Duration::minutes(cfg.fx.cache_ttl_minutes));

		Ok(Self { cfg, db, providers, cipher, rates })
	}
}
