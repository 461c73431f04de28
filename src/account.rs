//! Caller identity passed explicitly into every service operation.

use serde::{Deserialize, Serialize};

pub type AccountId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[serde(alias = "USER")]
    Customer,
}

/// The authenticated caller of a billing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    pub account_id: AccountId,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl AccountContext {
    pub fn admin(account_id: impl Into<AccountId>) -> Self {
        Self {
            account_id: account_id.into(),
            role: Role::Admin,
            email: None,
            name: None,
        }
    }

    pub fn customer(account_id: impl Into<AccountId>) -> Self {
        Self {
            account_id: account_id.into(),
            role: Role::Customer,
            email: None,
            name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins may act on any account; customers only on their own.
    pub fn can_access(&self, account_id: &str) -> bool {
        self.is_admin() || self.account_id == account_id
    }

    pub fn require_admin(&self, operation: &str) -> crate::Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(crate::Error::Permission(format!(
                "{operation} requires an admin account"
            )))
        }
    }

    pub fn require_access(&self, account_id: &str) -> crate::Result<()> {
        if self.can_access(account_id) {
            Ok(())
        } else {
            Err(crate::Error::Permission(format!(
                "account {} cannot access account {}",
                self.account_id, account_id
            )))
        }
    }
}
