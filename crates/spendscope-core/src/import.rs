//! Gmail receipt import
//!
//! Messages arrive already fetched (as Gmail API `messages.get` payloads or as
//! flattened [`EmailMessage`]s). The extractor pulls an amount, merchant and
//! date out of each one; messages without a recognizable amount are skipped.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::ai::InsightBackend;
use crate::error::{Error, Result};
use crate::insights::categorize_expense;
use crate::models::{Expense, ExpenseSource, Money, NewExpense};
use crate::registry::CategoryRegistry;
use crate::store::MemoryStore;

/// Amounts at or above this are treated as parse noise
const MAX_AMOUNT: f64 = 1_000_000.0;

/// Longest description taken from a snippet
const SNIPPET_DESCRIPTION_CHARS: usize = 100;

/// Sender names that never identify a merchant
const GENERIC_SENDERS: &[&str] = &["no-reply", "noreply", "notifications", "donotreply"];

/// A fetched email, flattened to the fields the extractor reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Gmail message id (used to skip re-imports)
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub from: String,
    /// Raw `Date` header
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub snippet: String,
}

/// Gmail API message (`format=full`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GmailMessage {
    pub id: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub payload: GmailPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailPayload {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<GmailHeader>,
    #[serde(default)]
    pub body: Option<GmailBody>,
    #[serde(default)]
    pub parts: Vec<GmailPayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GmailHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GmailBody {
    /// base64url-encoded content
    #[serde(default)]
    pub data: Option<String>,
}

fn decode_base64url(data: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(data.trim().trim_end_matches('='))
        .map_err(|e| Error::Import(format!("Invalid base64 body: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn part_data(payload: &GmailPayload) -> Option<&str> {
    payload
        .body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .filter(|d| !d.is_empty())
}

/// Decode the text body of a payload
///
/// Uses the top-level body when present, otherwise the first `text/plain`
/// part, falling back to `text/html`.
pub fn decode_payload_body(payload: &GmailPayload) -> Result<String> {
    if let Some(data) = part_data(payload) {
        return decode_base64url(data);
    }

    let mut html = None;
    for part in &payload.parts {
        match part.mime_type.as_str() {
            "text/plain" => {
                if let Some(data) = part_data(part) {
                    return decode_base64url(data);
                }
            }
            "text/html" if html.is_none() => html = part_data(part),
            _ => {}
        }
    }

    html.map(decode_base64url).unwrap_or_else(|| Ok(String::new()))
}

impl EmailMessage {
    /// Flatten a Gmail API message
    pub fn from_gmail(message: &GmailMessage) -> Result<Self> {
        let header = |name: &str| {
            message
                .payload
                .headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.clone())
                .unwrap_or_default()
        };

        Ok(Self {
            id: message.id.clone(),
            subject: header("subject"),
            from: header("from"),
            date: header("date"),
            body: decode_payload_body(&message.payload)?,
            snippet: message.snippet.clone(),
        })
    }
}

/// What the extractor found in one message
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedExpense {
    pub email_id: String,
    pub amount: Money,
    pub description: String,
    pub merchant: Option<String>,
    pub date: NaiveDate,
}

impl ExtractedExpense {
    pub fn into_new_expense(self, category: Option<String>) -> NewExpense {
        NewExpense {
            amount: self.amount,
            description: self.description,
            category,
            merchant: self.merchant,
            date: Some(self.date),
            source: ExpenseSource::GmailImport,
            email_id: Some(self.email_id),
        }
    }
}

/// Regex-based receipt field extraction
pub struct ExpenseExtractor {
    amount_patterns: Vec<Regex>,
    merchant_patterns: Vec<Regex>,
    tz_comment: Regex,
}

impl ExpenseExtractor {
    pub fn new() -> Result<Self> {
        let amount_patterns = [
            r"\$\s*([\d,]+\.?\d*)",
            r"(?i)([\d,]+\.?\d*)\s*USD",
            r"(?i)(?:Total|Amount|Charged|Payment|Price)[\s:]*\$?\s*([\d,]+\.?\d*)",
            r"€\s*([\d,]+\.?\d*)",
            r"£\s*([\d,]+\.?\d*)",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

        let merchant_patterns = [
            r"(?:from|at|to)\s+([A-Z][A-Za-z0-9\s&']+?)(?:\s+for|\s+on|\s*$)",
            r"(?:Purchase at|Payment to|Transaction at)\s+([A-Za-z0-9\s&']+)",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            amount_patterns,
            merchant_patterns,
            tz_comment: Regex::new(r"\s*\([A-Za-z]+\)\s*$")?,
        })
    }

    /// Extract an expense, or `None` if the message has no usable amount
    pub fn extract(&self, email: &EmailMessage, default_date: NaiveDate) -> Option<ExtractedExpense> {
        let combined = format!("{} {} {}", email.subject, email.snippet, email.body);
        let amount = self.extract_amount(&combined)?;

        let description = if email.subject.trim().is_empty() {
            email.snippet.chars().take(SNIPPET_DESCRIPTION_CHARS).collect::<String>()
        } else {
            email.subject.trim().to_string()
        };

        Some(ExtractedExpense {
            email_id: email.id.clone(),
            amount,
            description: if description.trim().is_empty() {
                "Imported expense".to_string()
            } else {
                description
            },
            merchant: self.extract_merchant(&combined, &email.from),
            date: self.parse_date(&email.date).unwrap_or(default_date),
        })
    }

    /// First amount matched by the patterns, in pattern order
    pub fn extract_amount(&self, text: &str) -> Option<Money> {
        for pattern in &self.amount_patterns {
            let Some(captures) = pattern.captures(text) else {
                continue;
            };
            let raw = captures[1].replace(',', "");
            let Ok(value) = raw.trim_end_matches('.').parse::<f64>() else {
                continue;
            };
            if value > 0.0 && value < MAX_AMOUNT {
                if let Ok(money) = Money::from_dollars(value) {
                    return Some(money);
                }
            }
        }
        None
    }

    /// Merchant from "at/from/to X" phrases, else the sender's display name
    pub fn extract_merchant(&self, text: &str, from: &str) -> Option<String> {
        for pattern in &self.merchant_patterns {
            if let Some(captures) = pattern.captures(text) {
                let merchant = captures[1].trim();
                if !merchant.is_empty() {
                    return Some(merchant.to_string());
                }
            }
        }

        let name = from
            .split('<')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches('"')
            .trim();
        let lower = name.to_lowercase();
        if name.is_empty() || GENERIC_SENDERS.iter().any(|g| lower.contains(g)) {
            return None;
        }
        Some(name.to_string())
    }

    /// Parse an RFC 2822 `Date` header (timezone comments allowed)
    pub fn parse_date(&self, header: &str) -> Option<NaiveDate> {
        let cleaned = self.tz_comment.replace(header.trim(), "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(cleaned) {
            return Some(dt.date_naive());
        }
        NaiveDateTime::parse_from_str(cleaned, "%a, %d %b %Y %H:%M:%S")
            .ok()
            .map(|dt| dt.date())
    }
}

/// Result of one import run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub emails_processed: usize,
    pub new_expenses: usize,
    pub duplicates_skipped: usize,
    pub without_amount: usize,
    pub expenses: Vec<Expense>,
}

/// Extract and store expenses for `user_id`, skipping already-imported messages
///
/// When a backend is given, each new expense is auto-categorized through it;
/// an answer slower than `timeout` leaves that expense uncategorized.
pub async fn import_messages<B: InsightBackend + ?Sized>(
    store: &MemoryStore,
    user_id: Uuid,
    messages: &[EmailMessage],
    backend: Option<&B>,
    registry: &CategoryRegistry,
    default_date: NaiveDate,
    timeout: Duration,
) -> Result<ImportSummary> {
    let extractor = ExpenseExtractor::new()?;
    let mut seen = store.imported_email_ids(user_id);
    let mut summary = ImportSummary {
        emails_processed: messages.len(),
        ..Default::default()
    };

    for message in messages {
        if seen.contains(&message.id) {
            summary.duplicates_skipped += 1;
            continue;
        }
        let Some(extracted) = extractor.extract(message, default_date) else {
            debug!(email_id = %message.id, "No amount found in message");
            summary.without_amount += 1;
            continue;
        };

        let category = match backend {
            Some(backend) => {
                categorize_expense(
                    backend,
                    registry,
                    &extracted.description,
                    extracted.merchant.as_deref(),
                    timeout,
                )
                .await
            }
            None => None,
        };

        let expense = store.add_expense(user_id, extracted.into_new_expense(category))?;
        seen.insert(message.id.clone());
        summary.expenses.push(expense);
    }

    summary.new_expenses = summary.expenses.len();
    info!(
        user_id = %user_id,
        processed = summary.emails_processed,
        imported = summary.new_expenses,
        duplicates = summary.duplicates_skipped,
        "Gmail import complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::insights::service::DEFAULT_TIMEOUT;
    use crate::registry::builtin_categories;
    use base64::engine::general_purpose::URL_SAFE;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn extractor() -> ExpenseExtractor {
        ExpenseExtractor::new().unwrap()
    }

    fn email(subject: &str, body: &str) -> EmailMessage {
        EmailMessage {
            id: "msg-1".into(),
            subject: subject.into(),
            from: "Blue Bottle Coffee <receipts@bluebottle.com>".into(),
            date: "Mon, 3 Feb 2025 08:15:00 -0800 (PST)".into(),
            body: body.into(),
            snippet: String::new(),
        }
    }

    #[test]
    fn test_amount_patterns() {
        let ex = extractor();
        assert_eq!(ex.extract_amount("You paid $1,234.56 today"), Some(Money::from_cents(123456)));
        assert_eq!(ex.extract_amount("Charged 42.10 usd"), Some(Money::from_cents(4210)));
        assert_eq!(ex.extract_amount("Total: 18.00"), Some(Money::from_cents(1800)));
        assert_eq!(ex.extract_amount("€ 9.99 paid"), Some(Money::from_cents(999)));
        assert_eq!(ex.extract_amount("£12 paid"), Some(Money::from_cents(1200)));
        assert_eq!(ex.extract_amount("Your order has shipped"), None);
        // Out of range amounts are skipped
        assert_eq!(ex.extract_amount("$0.00 balance"), None);
        assert_eq!(ex.extract_amount("$5,000,000"), None);
    }

    #[test]
    fn test_merchant_extraction() {
        let ex = extractor();
        assert_eq!(
            ex.extract_merchant("Your purchase at Corner Deli for $5", ""),
            Some("Corner Deli".to_string())
        );
        assert_eq!(
            ex.extract_merchant("receipt", "\"Acme Store\" <orders@acme.com>"),
            Some("Acme Store".to_string())
        );
        assert_eq!(ex.extract_merchant("receipt", "no-reply@bank.com"), None);
        assert_eq!(ex.extract_merchant("receipt", "Notifications <n@x.com>"), None);
    }

    #[test]
    fn test_date_parsing() {
        let ex = extractor();
        assert_eq!(
            ex.parse_date("Mon, 3 Feb 2025 08:15:00 -0800 (PST)"),
            Some(date(2025, 2, 3))
        );
        assert_eq!(ex.parse_date("3 Feb 2025 08:15:00 +0000"), Some(date(2025, 2, 3)));
        assert_eq!(ex.parse_date("Mon, 03 Feb 2025 08:15:00"), Some(date(2025, 2, 3)));
        assert_eq!(ex.parse_date("yesterday"), None);
    }

    #[test]
    fn test_extract_full_message() {
        let ex = extractor();
        let fallback = date(2025, 3, 1);
        let found = ex
            .extract(&email("Your receipt", "Total: $4.75"), fallback)
            .unwrap();
        assert_eq!(found.amount, Money::from_cents(475));
        assert_eq!(found.description, "Your receipt");
        assert_eq!(found.merchant.as_deref(), Some("Blue Bottle Coffee"));
        assert_eq!(found.date, date(2025, 2, 3));

        let mut no_subject = email("", "Thanks! Amount 12.00");
        no_subject.snippet = "x".repeat(150);
        no_subject.date = "garbage".into();
        let found = ex.extract(&no_subject, fallback).unwrap();
        assert_eq!(found.description.len(), 100);
        assert_eq!(found.date, fallback);

        assert!(ex.extract(&email("Welcome!", "Thanks for joining"), fallback).is_none());
    }

    #[test]
    fn test_decode_payload_prefers_plain_text() {
        let encode = |s: &str| URL_SAFE.encode(s);
        let payload = GmailPayload {
            mime_type: "multipart/alternative".into(),
            headers: vec![],
            body: None,
            parts: vec![
                GmailPayload {
                    mime_type: "text/html".into(),
                    body: Some(GmailBody {
                        data: Some(encode("<b>$1</b>")),
                    }),
                    ..Default::default()
                },
                GmailPayload {
                    mime_type: "text/plain".into(),
                    body: Some(GmailBody {
                        data: Some(encode("plain $2?")),
                    }),
                    ..Default::default()
                },
            ],
        };
        assert_eq!(decode_payload_body(&payload).unwrap(), "plain $2?");

        let html_only = GmailPayload {
            parts: vec![payload.parts[0].clone()],
            ..Default::default()
        };
        assert_eq!(decode_payload_body(&html_only).unwrap(), "<b>$1</b>");
        assert_eq!(decode_payload_body(&GmailPayload::default()).unwrap(), "");
    }

    #[test]
    fn test_from_gmail_reads_headers() {
        let json = serde_json::json!({
            "id": "abc",
            "snippet": "Your total was $3.50",
            "payload": {
                "mimeType": "text/plain",
                "headers": [
                    {"name": "Subject", "value": "Receipt"},
                    {"name": "From", "value": "Cafe <a@b.c>"},
                    {"name": "Date", "value": "Tue, 4 Feb 2025 10:00:00 +0000"}
                ],
                "body": {"data": URL_SAFE_NO_PAD.encode("Total: $3.50")}
            }
        });
        let message: GmailMessage = serde_json::from_value(json).unwrap();
        let email = EmailMessage::from_gmail(&message).unwrap();
        assert_eq!(email.subject, "Receipt");
        assert_eq!(email.from, "Cafe <a@b.c>");
        assert_eq!(email.body, "Total: $3.50");
    }

    #[tokio::test]
    async fn test_import_skips_duplicates_and_categorizes() {
        let store = MemoryStore::default();
        let user = store.create_user("alex@example.com", None).unwrap();
        let registry = CategoryRegistry::from_specs(&builtin_categories());
        let backend = MockBackend::with_response("Food & Dining");

        let mut second = email("Lunch receipt", "Total: $12.00");
        second.id = "msg-2".into();
        let messages = vec![
            email("Coffee receipt", "$4.75"),
            second,
            EmailMessage {
                id: "msg-3".into(),
                subject: "Newsletter".into(),
                ..Default::default()
            },
        ];

        let summary = import_messages(
            &store,
            user.id,
            &messages,
            Some(&backend),
            &registry,
            date(2025, 3, 1),
            DEFAULT_TIMEOUT,
        )
        .await
        .unwrap();
        assert_eq!(summary.emails_processed, 3);
        assert_eq!(summary.new_expenses, 2);
        assert_eq!(summary.without_amount, 1);
        assert!(summary
            .expenses
            .iter()
            .all(|e| e.source == ExpenseSource::GmailImport
                && e.category.as_deref() == Some("Food & Dining")));

        let again = import_messages::<MockBackend>(
            &store,
            user.id,
            &messages,
            None,
            &registry,
            date(2025, 3, 1),
            DEFAULT_TIMEOUT,
        )
        .await
        .unwrap();
        assert_eq!(again.new_expenses, 0);
        assert_eq!(again.duplicates_skipped, 2);
    }

    #[tokio::test]
    async fn test_import_does_not_wait_on_stalled_backend() {
        let store = MemoryStore::default();
        let user = store.create_user("alex@example.com", None).unwrap();
        let registry = CategoryRegistry::from_specs(&builtin_categories());
        let backend =
            MockBackend::with_response("Food & Dining").with_delay(Duration::from_secs(3600));

        let mut second = email("Lunch receipt", "Total: $12.00");
        second.id = "msg-2".into();
        let messages = vec![email("Coffee receipt", "$4.75"), second];

        let summary = tokio::time::timeout(
            Duration::from_secs(5),
            import_messages(
                &store,
                user.id,
                &messages,
                Some(&backend),
                &registry,
                date(2025, 3, 1),
                Duration::from_millis(20),
            ),
        )
        .await
        .expect("import should finish without the backend")
        .unwrap();

        assert_eq!(summary.new_expenses, 2);
        assert!(summary.expenses.iter().all(|e| e.category.is_none()));
        assert_eq!(backend.calls(), 2);
    }
}
