use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Type-specific achievement fields, discriminated by `achievementType`.
///
/// Internally tagged so the wire/document shape stays flat:
/// `{ "achievementType": "competition", "competitionName": ..., "rank": ... }`.
/// Data that fits none of the typed fields goes into the content's
/// `custom_fields` bag instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "achievementType", rename_all = "camelCase")]
pub enum AchievementKind {
    #[serde(rename_all = "camelCase")]
    Competition {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        competition_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        competition_level: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rank: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        medal_type: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Publication {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        publication_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        publication_title: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        authors: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        publisher: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issn: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Organization {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        organization_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        period: Option<OrganizationPeriod>,
    },
    #[serde(rename_all = "camelCase")]
    Certification {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        certification_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issued_by: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        certification_number: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        valid_until: Option<DateTime<Utc>>,
    },
    #[serde(rename_all = "camelCase")]
    Academic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event_date: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        organizer: Option<String>,
    },
}

impl AchievementKind {
    /// The `achievementType` discriminator value.
    pub fn type_name(&self) -> &'static str {
        match self {
            AchievementKind::Competition { .. } => "competition",
            AchievementKind::Publication { .. } => "publication",
            AchievementKind::Organization { .. } => "organization",
            AchievementKind::Certification { .. } => "certification",
            AchievementKind::Academic { .. } => "academic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// One uploaded evidence file. The list on a detail document is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Caller-supplied achievement content. Updates are full-replace: fields not
/// present in the payload are reset, so callers resend the whole object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementContent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: AchievementKind,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub points: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Extension bag for forward compatibility with unrecognized fields.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_fields: Map<String, Value>,
}

/// Document-store record holding the variable-shaped achievement content.
///
/// `student_id` is duplicated from the reference for query convenience only;
/// the reference row stays authoritative for ownership. The `deleted` flag is
/// written solely by the coordinator's soft-delete protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDetail {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub student_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: AchievementKind,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_fields: Map<String, Value>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AchievementDetail {
    /// Build a fresh document from caller content, owned by `student_id`.
    pub fn from_content(student_id: Uuid, content: AchievementContent) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            student_id,
            title: content.title,
            description: content.description,
            kind: content.kind,
            tags: content.tags,
            points: content.points,
            attachments: content.attachments,
            custom_fields: content.custom_fields,
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_round_trips_with_internal_tag() {
        let input = json!({
            "title": "Hackathon Winner",
            "description": "National hackathon",
            "achievementType": "competition",
            "competitionName": "Gemastik",
            "rank": 1,
            "tags": ["hackathon"],
            "points": 10
        });

        let content: AchievementContent = serde_json::from_value(input).unwrap();
        assert_eq!(content.kind.type_name(), "competition");
        assert_eq!(content.points, 10);

        let out = serde_json::to_value(&content).unwrap();
        assert_eq!(out["achievementType"], "competition");
        assert_eq!(out["competitionName"], "Gemastik");
        assert_eq!(out["rank"], 1);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let input = json!({
            "title": "X",
            "achievementType": "sport"
        });
        assert!(serde_json::from_value::<AchievementContent>(input).is_err());
    }

    #[test]
    fn detail_defaults_to_not_deleted() {
        let content: AchievementContent = serde_json::from_value(json!({
            "title": "Paper",
            "achievementType": "publication",
            "authors": ["A", "B"]
        }))
        .unwrap();

        let detail = AchievementDetail::from_content(Uuid::new_v4(), content);
        assert!(!detail.deleted);
        assert!(detail.deleted_at.is_none());
        assert_eq!(detail.created_at, detail.updated_at);
    }
}
