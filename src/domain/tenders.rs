use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::documents::validate_uploads;
use super::validate_amount;
use super::{DocumentRef, DocumentUpload, UnknownVariant, UserProfile, ValidationError};

/// Category of work a tender asks for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TenderCategory {
    It,
    Construction,
    Services,
    Supplies,
    Consulting,
    Other,
}

impl TenderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::It => "it",
            Self::Construction => "construction",
            Self::Services => "services",
            Self::Supplies => "supplies",
            Self::Consulting => "consulting",
            Self::Other => "other",
        }
    }
}

impl FromStr for TenderCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "it" => Ok(Self::It),
            "construction" => Ok(Self::Construction),
            "services" => Ok(Self::Services),
            "supplies" => Ok(Self::Supplies),
            "consulting" => Ok(Self::Consulting),
            "other" => Ok(Self::Other),
            other => Err(UnknownVariant {
                kind: "tender category",
                value: other.to_string(),
            }),
        }
    }
}

/// Tender status
///
/// `Closed` and `Cancelled` are reserved for administrative actions; no
/// lifecycle operation produces them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TenderStatus {
    Open,
    Closed,
    Awarded,
    Cancelled,
    Completed,
}

impl TenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Awarded => "awarded",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "awarded" => Ok(Self::Awarded),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownVariant {
                kind: "tender status",
                value: other.to_string(),
            }),
        }
    }
}

/// Tender entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tender {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: TenderCategory,
    pub status: TenderStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_by: Uuid,
    pub min_budget: Option<Decimal>,
    pub max_budget: Option<Decimal>,
    pub documents: Vec<DocumentRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tender {
    pub fn is_open(&self) -> bool {
        self.status == TenderStatus::Open
    }

    pub fn summary(&self) -> TenderSummary {
        TenderSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            end_date: self.end_date,
        }
    }
}

/// Request DTO for publishing a tender
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenderRequest {
    pub title: String,
    pub description: String,
    pub category: TenderCategory,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub min_budget: Option<Decimal>,
    #[serde(default)]
    pub max_budget: Option<Decimal>,
    #[serde(default)]
    pub documents: Vec<DocumentUpload>,
}

impl CreateTenderRequest {
    /// Check the request against the tender rules, with `now` standing in
    /// for a missing start date.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("Tender title is required"));
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::new("Tender description is required"));
        }

        let start_date = self.start_date.unwrap_or(now);
        if self.end_date < start_date {
            return Err(ValidationError::new(
                "Tender end date must not be before its start date",
            ));
        }

        if let Some(min) = self.min_budget {
            validate_amount("Minimum budget", min)?;
        }
        if let Some(max) = self.max_budget {
            validate_amount("Maximum budget", max)?;
        }
        if let (Some(min), Some(max)) = (self.min_budget, self.max_budget) {
            if min > max {
                return Err(ValidationError::new(
                    "Minimum budget must not exceed maximum budget",
                ));
            }
        }

        validate_uploads(&self.documents)
    }
}

/// Validated tender handed to the store
#[derive(Debug, Clone)]
pub struct NewTender {
    pub title: String,
    pub description: String,
    pub category: TenderCategory,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub creator: UserProfile,
    pub min_budget: Option<Decimal>,
    pub max_budget: Option<Decimal>,
    pub documents: Vec<DocumentRef>,
}

/// Tender with its creator's display fields resolved
#[derive(Debug, Clone, Serialize)]
pub struct TenderListing {
    #[serde(flatten)]
    pub tender: Tender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserProfile>,
}

/// Tender display fields attached to a bid listing
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TenderSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TenderStatus,
    pub end_date: DateTime<Utc>,
}
