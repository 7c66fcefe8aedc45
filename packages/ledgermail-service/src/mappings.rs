//! Account mapping export from the accounting service.

use std::collections::HashMap;

use serde_json::Value;

use ledgermail_domain::transaction::TransactionDetails;

/// Asset account charged when the masked account number has no mapping.
pub const DEFAULT_BANK_ACCOUNT: &str = "Assets:Bank:Axis";
/// Expense account used when the merchant has no mapping.
pub const DEFAULT_EXPENSE_ACCOUNT: &str = "Expenses:Groceries";

#[derive(Clone, Debug)]
struct ExpenseMapping {
	account: String,
	description: String,
}

/// Mappings exported by the accounting service. Bank accounts are keyed by
/// masked account number, expense accounts by merchant name as extracted.
#[derive(Clone, Debug, Default)]
pub struct AccountMappings {
	bank_accounts: HashMap<String, String>,
	expense_accounts: HashMap<String, ExpenseMapping>,
}

/// Ledger accounts and payee label picked for one transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAccounts {
	pub from_account: String,
	pub to_account: String,
	pub payee_name: String,
}

impl AccountMappings {
	/// Parses the export payload. Returns `None` when either map is missing,
	/// which usually means the export endpoint changed shape.
	pub fn from_value(value: &Value) -> Option<Self> {
		let bank_map = value.get("bank-account-map")?.as_object()?;
		let expense_map = value.get("expense-account-map")?.as_object()?;
		let mut mappings = Self::default();

		for (identifier, account) in bank_map {
			if let Some(account) = account.as_str() {
				mappings.bank_accounts.insert(identifier.clone(), account.to_string());
			}
		}
		for (merchant, entry) in expense_map {
			let Some(entry) = entry.as_array() else { continue };
			let Some(account) = entry.first().and_then(Value::as_str) else { continue };
			let description = entry.get(1).and_then(Value::as_str).unwrap_or_default();

			mappings.expense_accounts.insert(merchant.clone(), ExpenseMapping {
				account: account.to_string(),
				description: description.to_string(),
			});
		}

		Some(mappings)
	}

	/// Resolves extracted fields to ledger accounts. Account numbers and
	/// merchants match on the exact extracted value; unmapped ones fall back
	/// to the defaults. A mapped merchant description is appended to the
	/// payee label.
	pub fn resolve(&self, details: &TransactionDetails) -> ResolvedAccounts {
		let from_account = self
			.bank_accounts
			.get(&details.account_number)
			.cloned()
			.unwrap_or_else(|| DEFAULT_BANK_ACCOUNT.to_string());
		let (to_account, description) = match self.expense_accounts.get(&details.recipient) {
			Some(mapping) => (mapping.account.clone(), mapping.description.as_str()),
			None => (DEFAULT_EXPENSE_ACCOUNT.to_string(), ""),
		};
		let payee_name = if description.is_empty() {
			details.recipient.clone()
		} else {
			format!("{} {description}", details.recipient)
		};

		ResolvedAccounts { from_account, to_account, payee_name }
	}
}
