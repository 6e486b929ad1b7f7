use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "studentstatus", rename_all = "lowercase")]
pub(crate) enum StudentStatus {
    #[default]
    Active,
    Inactive,
    Graduated,
    Expelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "messagetype", rename_all = "lowercase")]
pub(crate) enum MessageType {
    #[default]
    Question,
    Problem,
    Suggestion,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "adminrole", rename_all = "lowercase")]
pub(crate) enum AdminRole {
    Superadmin,
    #[default]
    Admin,
    Moderator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "stationstatus", rename_all = "lowercase")]
pub(crate) enum StationStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
}

impl StationStatus {
    /// Whether a student may sit down at a station in this state.
    pub(crate) fn accepts_new_session(self) -> bool {
        match self {
            Self::Available => true,
            Self::Occupied | Self::Maintenance => false,
        }
    }
}

impl StudentStatus {
    /// Parses a query-string value; unknown values yield `None`.
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "graduated" => Some(Self::Graduated),
            "expelled" => Some(Self::Expelled),
            _ => None,
        }
    }
}

impl MessageType {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "question" => Some(Self::Question),
            "problem" => Some(Self::Problem),
            "suggestion" => Some(Self::Suggestion),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl AdminRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Admin => "admin",
            Self::Moderator => "moderator",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_schema_defaults() {
        assert_eq!(StudentStatus::default(), StudentStatus::Active);
        assert_eq!(MessageType::default(), MessageType::Question);
        assert_eq!(AdminRole::default(), AdminRole::Admin);
        assert_eq!(StationStatus::default(), StationStatus::Available);
    }

    #[test]
    fn only_available_stations_accept_sessions() {
        assert!(StationStatus::Available.accepts_new_session());
        assert!(!StationStatus::Occupied.accepts_new_session());
        assert!(!StationStatus::Maintenance.accepts_new_session());
    }

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(serde_json::to_value(StudentStatus::Graduated).unwrap(), "graduated");
        assert_eq!(serde_json::to_value(MessageType::Suggestion).unwrap(), "suggestion");
        let parsed: StationStatus = serde_json::from_str("\"maintenance\"").unwrap();
        assert_eq!(parsed, StationStatus::Maintenance);
        assert!(serde_json::from_str::<AdminRole>("\"root\"").is_err());
    }

    #[test]
    fn query_values_parse_or_fall_through() {
        assert_eq!(StudentStatus::parse("graduated"), Some(StudentStatus::Graduated));
        assert_eq!(StudentStatus::parse("retired"), None);
        assert_eq!(MessageType::parse(" problem "), Some(MessageType::Problem));
        assert_eq!(MessageType::parse(""), None);
    }
}
