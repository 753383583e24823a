use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Membership test for the operator-provisioned admin perimeter.
///
/// The guard only ever asks this one question, which keeps the allowlist
/// replaceable in tests without touching process configuration.
pub trait EmailAllowlist: Send + Sync {
    fn permits(&self, email: &str) -> bool;
}

/// Admin email allowlist, loaded once at startup and read-only afterwards.
///
/// Emails are trimmed and lower-cased on load and on lookup, so membership is
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAllowlist {
    emails: BTreeSet<String>,
}

impl AdminAllowlist {
    /// Parse a delimited list (`,`, `;` or whitespace) of email addresses.
    pub fn parse(raw: &str) -> Self {
        Self::from_emails(raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace()))
    }

    pub fn from_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .filter_map(|email| normalize_email(email.as_ref()))
            .collect();
        Self { emails }
    }

    pub fn contains(&self, email: &str) -> bool {
        match normalize_email(email) {
            Some(email) => self.emails.contains(&email),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl EmailAllowlist for AdminAllowlist {
    fn permits(&self, email: &str) -> bool {
        self.contains(email)
    }
}

fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim();
    if email.is_empty() {
        None
    } else {
        Some(email.to_lowercase())
    }
}
