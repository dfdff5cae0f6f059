//! Prompt engineering for the extraction contract

use crate::rules::{CategoryRules, MerchantRule};
use chrono::NaiveDate;
use std::fmt::Write;

/// Builds classification prompts from the configured rule table
///
/// The rendered prompt fixes the rule precedence the contract requires:
/// subject-pattern overrides first, then the ordered taxonomy, then
/// free-form inference from the merchant name, followed by the output
/// format and the email context.
pub struct PromptBuilder<'r> {
    rules: &'r CategoryRules,
}

impl<'r> PromptBuilder<'r> {
    /// Create a prompt builder over a rule table
    pub fn new(rules: &'r CategoryRules) -> Self {
        Self { rules }
    }

    /// Build the complete extraction prompt
    ///
    /// `body` must already be truncated to the configured prefix; the
    /// builder sends exactly what it is given.
    pub fn build(&self, subject: &str, body: &str, fallback_date: NaiveDate) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "Act as a financial data extractor. Analyze the following bank transaction email.\n\n",
        );

        // 1. Priority subject-pattern rules
        if !self.rules.overrides.is_empty() {
            prompt.push_str("### PRIORITY RULES (check these first):\n\n");
            for (idx, rule) in self.rules.overrides.iter().enumerate() {
                let _ = writeln!(
                    prompt,
                    "{}. IF Subject contains \"{}\":",
                    idx + 1,
                    rule.subject_contains
                );
                let _ = writeln!(prompt, "   - Merchant: {}", merchant_instruction(rule.merchant.as_ref()));
                let _ = writeln!(prompt, "   - Category: \"{}\".", rule.category);
                let _ = writeln!(prompt, "   - Description: {}", rule.description);
                prompt.push('\n');
            }
        }

        // 2. Ordered standard taxonomy
        prompt.push_str("### STANDARD CATEGORIES (only use if no priority rule applies):\n\n");
        for (idx, category) in self.rules.categories.iter().enumerate() {
            let _ = writeln!(prompt, "{}. \"{}\":", idx + 1, category.name);
            if !category.brands.is_empty() {
                let _ = writeln!(prompt, "   - Specific brands: {}.", category.brands.join(", "));
            }
            if !category.keywords.is_empty() {
                let quoted: Vec<String> = category
                    .keywords
                    .iter()
                    .map(|k| format!("\"{}\"", k))
                    .collect();
                let _ = writeln!(prompt, "   - Keywords: {}.", quoted.join(", "));
            }
        }
        prompt.push('\n');

        // 3. Free-form inference fallback
        prompt.push_str(
            "GENERAL RULE: Use the merchant name to infer the category if it is not \
             explicitly listed.\n\n",
        );

        // 4. Output contract
        let _ = writeln!(
            prompt,
            "Expected Output: ONLY a valid JSON object (no markdown, no code blocks) with \
             these keys:\n{{\n  \"date\": \"YYYY-MM-DD\" (use the email date if not found in \
             the text: {}),\n  \"merchant\": \"Clean merchant name\",\n  \"amount\": \"Number \
             only (float)\",\n  \"category\": \"One of the categories above\",\n  \
             \"description\": \"Brief description based on the rules above\"\n}}",
            fallback_date
        );

        // 5. The email under analysis
        let _ = write!(
            prompt,
            "\nEmail Context:\nSubject: {}\nBody: {}\n",
            subject, body
        );

        prompt
    }
}

fn merchant_instruction(rule: Option<&MerchantRule>) -> String {
    match rule {
        Some(MerchantRule::Fixed { fixed }) => format!("\"{}\".", fixed),
        Some(MerchantRule::ExtractBefore { extract_before }) => format!(
            "Extract the specific entity name immediately preceding \"{}\" in the body.",
            extract_before
        ),
        None => "Clean merchant name from the email text.".to_string(),
    }
}
