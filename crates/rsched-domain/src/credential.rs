//! Credential entity: procedure competency tracking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Active,
    Suspended,
    Expired,
    PendingVerification,
}

/// A person's certified competency for a procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub person_id: Uuid,
    pub procedure: String,
    pub status: CredentialStatus,
    pub competency_level: u8,
    pub issued_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub last_verified_date: Option<NaiveDate>,
    pub caps: Option<u32>,
}

impl Credential {
    pub fn new(
        id: Uuid,
        person_id: Uuid,
        procedure: impl Into<String>,
        competency_level: u8,
        issued_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            person_id,
            procedure: procedure.into(),
            status: CredentialStatus::Active,
            competency_level,
            issued_date,
            expiration_date: None,
            last_verified_date: None,
            caps: None,
        }
    }

    /// Whether this credential currently qualifies its holder to perform
    /// the procedure: must be `Active` and not expired as of `as_of`.
    pub fn qualifies(&self, as_of: NaiveDate) -> bool {
        if self.status != CredentialStatus::Active {
            return false;
        }
        match self.expiration_date {
            Some(exp) => as_of <= exp,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspended_never_qualifies() {
        let mut c = Credential::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "central_line",
            3,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        );
        c.status = CredentialStatus::Suspended;
        assert!(!c.qualifies(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
    }

    #[test]
    fn expired_by_date_fails_even_if_status_active() {
        let mut c = Credential::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "central_line",
            3,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        );
        c.expiration_date = Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(!c.qualifies(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
    }
}
