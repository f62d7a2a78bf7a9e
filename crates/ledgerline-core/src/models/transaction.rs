use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a transaction adds to or subtracts from the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

/// A transaction as returned by the API.
///
/// The list endpoint strips the storage id, so `id` is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<String>,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub transaction_date: NaiveDate,
}

impl Transaction {
    /// Amount signed by transaction type (expenses are negative).
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }

    /// Format the amount with a sign for display, e.g. "+25.50" / "-12.00".
    pub fn display_amount(&self) -> String {
        match self.kind {
            TransactionType::Income => format!("+{:.2}", self.amount),
            TransactionType::Expense => format!("-{:.2}", self.amount),
        }
    }
}

/// Payload for creating or replacing a transaction.
#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub transaction_date: NaiveDate,
}

/// Wrapper shape of the list endpoint: `{ "transactions": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsResponse {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_transaction_list() {
        let json = r#"{"transactions":[
            {"description":"Grocery shopping","amount":25.5,"type":"expense","category":"Food","transaction_date":"2025-04-26"},
            {"description":"Paycheck","amount":1200.0,"type":"income","category":"Salary","transaction_date":"2025-04-25"}
        ]}"#;

        let parsed: TransactionsResponse =
            serde_json::from_str(json).expect("Failed to parse transaction list");
        assert_eq!(parsed.transactions.len(), 2);

        let expense = &parsed.transactions[0];
        assert_eq!(expense.kind, TransactionType::Expense);
        assert_eq!(expense.display_amount(), "-25.50");
        assert!(expense.signed_amount() < 0.0);
        assert!(expense.id.is_none());

        let income = &parsed.transactions[1];
        assert_eq!(income.kind, TransactionType::Income);
        assert_eq!(income.signed_amount(), 1200.0);
    }

    #[test]
    fn serialize_new_transaction() {
        let tx = NewTransaction {
            description: "Bus ticket".to_string(),
            amount: 3.2,
            kind: TransactionType::Expense,
            category: "Transport".to_string(),
            transaction_date: NaiveDate::from_ymd_opt(2025, 4, 26).unwrap(),
        };

        let value = serde_json::to_value(&tx).expect("Failed to serialize transaction");
        assert_eq!(value["type"], "expense");
        assert_eq!(value["transaction_date"], "2025-04-26");
    }
}
