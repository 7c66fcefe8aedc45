#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Credential error: {message}")]
	Credential { message: String },
	#[error("Connectivity error: {message}")]
	Connectivity { message: String },
	#[error("Submission error: {message}")]
	Submission { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<ledgermail_storage::Error> for Error {
	fn from(err: ledgermail_storage::Error) -> Self {
		match err {
			ledgermail_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			ledgermail_storage::Error::InvalidArgument(message) =>
				Self::Configuration { message },
			ledgermail_storage::Error::NotFound(message) => Self::Storage { message },
			ledgermail_storage::Error::Crypto(message) => Self::Credential { message },
		}
	}
}
