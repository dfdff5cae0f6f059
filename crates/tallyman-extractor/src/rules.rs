//! Category rule table - data, not logic
//!
//! The taxonomy and the subject-override rules are deployment configuration.
//! They are rendered into the extraction prompt and, for overrides, enforced
//! locally after parsing, so a deployment can swap the table (via TOML)
//! without touching pipeline code.

use serde::{Deserialize, Serialize};

/// One standard category with its brand list and keyword list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category name as it appears in persisted records
    pub name: String,

    /// Known merchant brands that map to this category
    #[serde(default)]
    pub brands: Vec<String>,

    /// Generic merchant-name keywords that map to this category
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// How an override rule derives the merchant field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MerchantRule {
    /// Always use this merchant name
    Fixed {
        /// The fixed merchant name
        fixed: String,
    },

    /// Take the entity name that immediately precedes this marker phrase
    /// in the message body (e.g. `" has initiated"` captures "MIDAMERICAN"
    /// out of "MIDAMERICAN has initiated the following withdrawal")
    ExtractBefore {
        /// Marker phrase searched for in the body
        extract_before: String,
    },
}

impl MerchantRule {
    /// Derive the merchant from the full (untruncated) message body
    pub fn derive(&self, body: &str) -> Option<String> {
        match self {
            MerchantRule::Fixed { fixed } => Some(fixed.clone()),
            MerchantRule::ExtractBefore { extract_before } => {
                entity_before(body, extract_before).map(str::to_string)
            }
        }
    }
}

/// The entity name preceding `marker`, bounded by the enclosing sentence
fn entity_before<'a>(body: &'a str, marker: &str) -> Option<&'a str> {
    let idx = body.find(marker)?;
    let prefix = &body[..idx];
    let start = prefix
        .rfind(|c| matches!(c, '\n' | '.' | ':'))
        .map(|i| i + 1)
        .unwrap_or(0);
    let entity = prefix[start..].trim();
    if entity.is_empty() {
        None
    } else {
        Some(entity)
    }
}

/// A subject-pattern rule that takes precedence over the taxonomy
///
/// Overrides are checked in table order against the message subject; the
/// first match wins and pins the record's category (and merchant, when the
/// rule defines one) regardless of what the classifier answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRule {
    /// Case-insensitive substring matched against the subject line
    pub subject_contains: String,

    /// Category forced onto matching records
    pub category: String,

    /// Merchant derivation; `None` keeps the classifier's merchant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<MerchantRule>,

    /// Description instruction rendered into the prompt for this rule
    pub description: String,
}

impl OverrideRule {
    /// Whether this rule applies to the given subject line
    pub fn matches(&self, subject: &str) -> bool {
        subject
            .to_lowercase()
            .contains(&self.subject_contains.to_lowercase())
    }
}

/// The complete rule table: ordered taxonomy plus subject overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRules {
    /// Standard categories, in prompt order
    pub categories: Vec<CategoryRule>,

    /// Priority subject-pattern rules, checked before the taxonomy
    #[serde(default)]
    pub overrides: Vec<OverrideRule>,
}

impl CategoryRules {
    /// Load a rule table from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let rules: CategoryRules =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse rules TOML: {}", e))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load a rule table from a TOML file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read rules file: {}", e))?;
        Self::from_toml(&contents)
    }

    /// Validate the rule table
    pub fn validate(&self) -> Result<(), String> {
        if self.categories.is_empty() {
            return Err("rule table needs at least one category".to_string());
        }
        for category in &self.categories {
            if category.name.is_empty() {
                return Err("category name must not be empty".to_string());
            }
        }
        for rule in &self.overrides {
            if rule.subject_contains.is_empty() {
                return Err("override subject_contains must not be empty".to_string());
            }
            if rule.category.is_empty() {
                return Err("override category must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// First override rule matching the subject, in table order
    pub fn matching_override(&self, subject: &str) -> Option<&OverrideRule> {
        self.overrides.iter().find(|rule| rule.matches(subject))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for CategoryRules {
    /// The stock rule table shipped with the agent
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryRule {
                    name: "Dining".to_string(),
                    brands: strings(&[
                        "EUREST",
                        "EATFUTI",
                        "PANDA",
                        "STARBUCKS",
                        "UBER EATS",
                        "MCDONALDS",
                        "CHICK-FIL-A",
                        "APPLEBEES",
                    ]),
                    keywords: strings(&[
                        "GRILL",
                        "CAFE",
                        "KITCHEN",
                        "BURGER",
                        "PIZZA",
                        "TACO",
                        "BAR",
                        "RESTAURANT",
                        "DINER",
                    ]),
                },
                CategoryRule {
                    name: "General Shopping".to_string(),
                    brands: strings(&[
                        "TARGET",
                        "COSTCO",
                        "DOLLAR TREE",
                        "ROSS",
                        "MARSHALLS",
                        "AMAZON",
                        "KOHL'S",
                    ]),
                    keywords: Vec::new(),
                },
                CategoryRule {
                    name: "Gas".to_string(),
                    brands: strings(&["SHELL", "KUM&GO", "MAVERIK", "BP", "EXXON", "CASEYS"]),
                    keywords: Vec::new(),
                },
                CategoryRule {
                    name: "Tech/Services".to_string(),
                    brands: strings(&[
                        "OPENAI", "VERCEL", "GOOGLE", "NETFLIX", "APPLE", "SPOTIFY", "UDEMY",
                    ]),
                    keywords: Vec::new(),
                },
                CategoryRule {
                    name: "Home/Projects".to_string(),
                    brands: strings(&["HOME DEPOT", "LOWES", "MENARDS"]),
                    keywords: strings(&["HARDWARE"]),
                },
                CategoryRule {
                    name: "Pets".to_string(),
                    brands: strings(&["PETCO", "PETSMART"]),
                    keywords: strings(&["VET"]),
                },
                CategoryRule {
                    name: "Groceries".to_string(),
                    brands: strings(&[
                        "WALMART",
                        "SAMSCLUB",
                        "CARMQUINT FOOD & SERVI",
                        "ALDI",
                        "WHOLE FOODS",
                        "PUBLIX",
                        "TRADER JOES",
                        "HY-VEE",
                    ]),
                    keywords: Vec::new(),
                },
            ],
            overrides: vec![
                OverrideRule {
                    subject_contains: "withdrawal notice".to_string(),
                    category: "Withdrawal".to_string(),
                    merchant: Some(MerchantRule::ExtractBefore {
                        extract_before: " has initiated".to_string(),
                    }),
                    description: "Extract the full sentence describing the action (e.g., \
                                  \"MIDAMERICAN has initiated the following withdrawal from \
                                  your account\")."
                        .to_string(),
                },
                OverrideRule {
                    subject_contains: "You sent money with Zelle".to_string(),
                    category: "Zelle".to_string(),
                    merchant: Some(MerchantRule::Fixed {
                        fixed: "Zelle".to_string(),
                    }),
                    description: "Construct a string with this exact format: \"From: [Account \
                                  Info] To: [Recipient Name/Number] Memo: [Memo text]\"."
                        .to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_valid() {
        let rules = CategoryRules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.categories.len(), 7);
        assert_eq!(rules.overrides.len(), 2);
    }

    #[test]
    fn test_override_match_is_case_insensitive() {
        let rules = CategoryRules::default();
        let rule = rules.matching_override("Withdrawal Notice for account").unwrap();
        assert_eq!(rule.category, "Withdrawal");
    }

    #[test]
    fn test_no_override_for_plain_transaction() {
        let rules = CategoryRules::default();
        assert!(rules.matching_override("A new transaction was charged").is_none());
    }

    #[test]
    fn test_fixed_merchant_rule() {
        let rule = MerchantRule::Fixed {
            fixed: "Zelle".to_string(),
        };
        assert_eq!(rule.derive("whatever body"), Some("Zelle".to_string()));
    }

    #[test]
    fn test_extract_before_takes_preceding_entity() {
        let rule = MerchantRule::ExtractBefore {
            extract_before: " has initiated".to_string(),
        };
        let body = "Dear customer.\nMIDAMERICAN has initiated the following withdrawal.";
        assert_eq!(rule.derive(body), Some("MIDAMERICAN".to_string()));
    }

    #[test]
    fn test_extract_before_missing_marker() {
        let rule = MerchantRule::ExtractBefore {
            extract_before: " has initiated".to_string(),
        };
        assert_eq!(rule.derive("nothing relevant here"), None);
    }

    #[test]
    fn test_rules_toml_round_trip() {
        let rules = CategoryRules::default();
        let toml_str = toml::to_string(&rules).unwrap();
        let parsed = CategoryRules::from_toml(&toml_str).unwrap();
        assert_eq!(rules, parsed);
    }

    #[test]
    fn test_custom_rules_from_toml() {
        let toml_str = r#"
            [[categories]]
            name = "Travel"
            brands = ["DELTA", "UNITED"]
            keywords = ["AIRLINE"]

            [[overrides]]
            subject_contains = "refund issued"
            category = "Refund"
            description = "Describe the refunded purchase."
        "#;

        let rules = CategoryRules::from_toml(toml_str).unwrap();
        assert_eq!(rules.categories.len(), 1);
        assert_eq!(rules.categories[0].brands, vec!["DELTA", "UNITED"]);
        let rule = rules.matching_override("Refund issued for order").unwrap();
        assert_eq!(rule.category, "Refund");
        assert!(rule.merchant.is_none());
    }

    #[test]
    fn test_empty_table_rejected() {
        let result = CategoryRules::from_toml("categories = []");
        assert!(result.is_err());
    }
}
