use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Store-assigned opportunity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct OpportunityId(Uuid);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{0}' is not a valid opportunity id")]
pub struct InvalidOpportunityId(pub String);

impl OpportunityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OpportunityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OpportunityId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for OpportunityId {
    type Err = InvalidOpportunityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| InvalidOpportunityId(s.to_string()))
    }
}

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted opportunity, as stored and as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Opportunity {
    #[serde(alias = "_id", alias = "ID")]
    pub id: OpportunityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub user_id: String,
}

/// Client payload for creating an opportunity. Any id or owner in the body is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpportunityInput {
    pub name: String,
    pub value: f64,
    pub status: String,
}

impl Opportunity {
    pub fn from_input(id: OpportunityId, owner: impl Into<String>, input: OpportunityInput) -> Self {
        Self {
            id,
            name: input.name,
            value: input.value,
            status: input.status,
            user_id: owner.into(),
        }
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.user_id == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_and_rejects_ids() {
        let id = OpportunityId::new();
        let parsed: OpportunityId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        let err = "not-an-id".parse::<OpportunityId>().unwrap_err();
        assert_eq!(err, InvalidOpportunityId("not-an-id".to_string()));
        assert!(err.to_string().contains("not-an-id"));
    }

    #[test]
    fn accepts_legacy_id_keys() {
        let id = OpportunityId::new();
        let body = json!({ "_id": id, "name": "Acme", "value": 10.5, "status": "open", "user_id": "u1" });
        let opp: Opportunity = serde_json::from_value(body).unwrap();
        assert_eq!(opp.id, id);
        assert!(opp.is_owned_by("u1"));
    }

    #[test]
    fn missing_fields_decode_to_zero_values() {
        let id = OpportunityId::new();
        let opp: Opportunity = serde_json::from_value(json!({ "id": id })).unwrap();
        assert_eq!(opp.name, "");
        assert_eq!(opp.value, 0.0);
        assert_eq!(opp.user_id, "");
    }

    #[test]
    fn input_ignores_client_identity_fields() {
        let input: OpportunityInput = serde_json::from_value(json!({
            "id": "client-chosen",
            "user_id": "someone-else",
            "name": "Renewal",
            "value": 1200,
            "status": "open"
        }))
        .unwrap();

        let id = OpportunityId::new();
        let opp = Opportunity::from_input(id, "owner-1", input);
        assert_eq!(opp.id, id);
        assert_eq!(opp.user_id, "owner-1");
        assert_eq!(opp.value, 1200.0);
    }

    #[test]
    fn serializes_with_plain_id_key() {
        let opp = Opportunity::from_input(OpportunityId::new(), "u", OpportunityInput::default());
        let value = serde_json::to_value(&opp).unwrap();
        assert!(value.get("id").is_some());
        assert!(value.get("_id").is_none());
    }
}
