use serde::{Deserialize, Serialize};

/// Whether a signup row counts against the capacity limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignupStatus {
    Approved,
    Waitlisted,
}

impl SignupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SignupStatus::Approved => "approved",
            SignupStatus::Waitlisted => "waitlisted",
        }
    }

    /// Parses a stored status string. Unrecognized values are treated as
    /// waitlisted so they never inflate the approved total; the next
    /// reconcile touching the user rewrites the row.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim() {
            "approved" => SignupStatus::Approved,
            "waitlisted" => SignupStatus::Waitlisted,
            other => {
                tracing::warn!(status = other, "unrecognized signup status, treating as waitlisted");
                SignupStatus::Waitlisted
            }
        }
    }
}

/// One ledger row. A user holds at most one approved and one waitlisted
/// row at any time; identity key is `user_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRecord {
    pub user_id: String,
    pub display_name: String,
    pub count: u32,
    pub status: SignupStatus,
    pub updated_ms: u64,
    pub note: Option<String>,
}

/// One row of the peripheral statistics table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRecord {
    pub user_id: String,
    pub name: String,
    pub description: String,
}

/// Parses a stored seat count. Malformed values compute as 0 rather than
/// failing the whole command; the row is cleaned up by the next reconcile
/// touching its user.
pub fn parse_count(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            tracing::warn!(count = raw, "malformed signup count, treating as 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_parses_digits_and_tolerates_garbage() {
        assert_eq!(parse_count("3"), 3);
        assert_eq!(parse_count(" 12 "), 12);
        assert_eq!(parse_count("three"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("-2"), 0);
    }

    #[test]
    fn unknown_status_falls_back_to_waitlisted() {
        assert_eq!(SignupStatus::parse_lossy("approved"), SignupStatus::Approved);
        assert_eq!(SignupStatus::parse_lossy("waitlisted"), SignupStatus::Waitlisted);
        assert_eq!(SignupStatus::parse_lossy("confirmed"), SignupStatus::Waitlisted);
    }
}
