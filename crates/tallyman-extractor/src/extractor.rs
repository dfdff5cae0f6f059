//! Core Record Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::parser::parse_response;
use crate::prompt::PromptBuilder;
use crate::rules::CategoryRules;
use tallyman_domain::traits::LlmProvider;
use tallyman_domain::{CandidateMessage, TransactionRecord};
use tracing::debug;

/// The Record Extractor converts one bank-notification message into a
/// structured [`TransactionRecord`] via the classification service
///
/// One call, one record. The extractor guarantees schema determinism (the
/// five record fields with their types); value correctness is the model's
/// best effort and not a property this component enforces, except for the
/// subject-override rules, which it pins locally after parsing.
pub struct RecordExtractor<L: LlmProvider> {
    provider: L,
    rules: CategoryRules,
    config: ExtractorConfig,
}

impl<L: LlmProvider> RecordExtractor<L>
where
    L::Error: std::fmt::Display,
{
    /// Create a new extractor
    pub fn new(provider: L, rules: CategoryRules, config: ExtractorConfig) -> Self {
        Self {
            provider,
            rules,
            config,
        }
    }

    /// Extract a transaction record from a candidate message
    ///
    /// The body is truncated to the configured character prefix before the
    /// prompt is assembled, so the classifier never sees more than the
    /// budgeted text. Failures are hard: there is no internal retry.
    pub fn extract(&self, msg: &CandidateMessage) -> Result<TransactionRecord, ExtractError> {
        let body = truncate_chars(&msg.body, self.config.max_body_chars);
        if body.len() < msg.body.len() {
            debug!(
                "Truncated body of message {} from {} to {} chars",
                msg.id,
                msg.body.chars().count(),
                self.config.max_body_chars
            );
        }

        let prompt = PromptBuilder::new(&self.rules).build(&msg.subject, body, msg.date);

        let response = self
            .provider
            .generate(&prompt)
            .map_err(|e| ExtractError::Provider(e.to_string()))?;

        debug!(
            "Classifier response for message {}: {} chars",
            msg.id,
            response.len()
        );

        let fields = parse_response(&response)?;

        let mut record = TransactionRecord {
            date: fields.date.unwrap_or(msg.date),
            merchant: fields.merchant,
            category: fields.category,
            amount: fields.amount,
            description: fields.description,
            source_message_id: msg.id.clone(),
        };

        // Subject-pattern rules outrank whatever the model answered.
        // Matching runs against the untruncated body: truncation bounds
        // transmission, not local rule evaluation.
        if let Some(rule) = self.rules.matching_override(&msg.subject) {
            record.category = rule.category.clone();
            if let Some(merchant) = rule.merchant.as_ref().and_then(|m| m.derive(&msg.body)) {
                record.merchant = merchant;
            }
        }

        Ok(record)
    }
}

/// Truncate to a character count, respecting char boundaries
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
