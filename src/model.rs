//! Domain vocabulary shared by both seeders.
//!
//! Every enum carries the exact spelling stored in the database.

use serde::{Deserialize, Serialize};

pub type Id = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Salutation {
    Mr,
    Ms,
}

impl Salutation {
    pub fn as_str(self) -> &'static str {
        match self {
            Salutation::Mr => "Mr",
            Salutation::Ms => "Ms",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientType {
    ReferralLab,
    Patient,
}

impl ClientType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientType::ReferralLab => "REFERRAL_LAB",
            ClientType::Patient => "PATIENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMode {
    Cash,
}

impl PaymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMode::Cash => "CASH",
        }
    }
}

/// Workflow state of one ordered test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitTestStatus {
    Pending,
    SampleCollected,
    InProgress,
    Approved,
}

impl VisitTestStatus {
    pub const ALL: [VisitTestStatus; 4] = [
        VisitTestStatus::Pending,
        VisitTestStatus::SampleCollected,
        VisitTestStatus::InProgress,
        VisitTestStatus::Approved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VisitTestStatus::Pending => "PENDING",
            VisitTestStatus::SampleCollected => "SAMPLE_COLLECTED",
            VisitTestStatus::InProgress => "IN_PROGRESS",
            VisitTestStatus::Approved => "APPROVED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Sudo,
    Admin,
    Reception,
    Phlebotomy,
    Lab,
    Approver,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Sudo => "SUDO",
            Role::Admin => "ADMIN",
            Role::Reception => "RECEPTION",
            Role::Phlebotomy => "PHLEBOTOMY",
            Role::Lab => "LAB",
            Role::Approver => "APPROVER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Standard,
    Culture,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Standard => "standard",
            ReportType::Culture => "culture",
        }
    }
}
