use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Optional identity attached to a submission. Emails are trimmed and
/// lower-cased; blank fields count as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid user_email format: {0}")]
pub struct InvalidEmail(pub String);

impl Submitter {
    /// Returns `Ok(None)` when neither a name nor an email was supplied.
    pub fn parse(name: Option<&str>, email: Option<&str>) -> Result<Option<Self>, InvalidEmail> {
        let name = name.map(str::trim).filter(|n| !n.is_empty()).map(String::from);
        let email = email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());

        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(InvalidEmail(email.clone()));
            }
        }

        if name.is_none() && email.is_none() {
            return Ok(None);
        }

        Ok(Some(Self { name, email }))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
