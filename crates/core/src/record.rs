#![forbid(unsafe_code)]

use crate::ids::{IdError, RegisterNo};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }

    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }

    /// Spreadsheet cells and form posts use a mix of spellings; anything that
    /// is not an explicit affirmative reads as `No`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" | "on" => YesNo::Yes,
            _ => YesNo::No,
        }
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value { YesNo::Yes } else { YesNo::No }
    }
}

impl Serialize for YesNo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for YesNo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct YesNoVisitor;

        impl Visitor<'_> for YesNoVisitor {
            type Value = YesNo;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("\"Yes\", \"No\" or a boolean")
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<YesNo, E> {
                Ok(YesNo::from(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<YesNo, E> {
                Ok(YesNo::parse_lenient(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<YesNo, E> {
                Ok(YesNo::from(value == 1))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<YesNo, E> {
                Ok(YesNo::from(value == 1))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<YesNo, E> {
                Ok(YesNo::from(value == 1.0))
            }

            fn visit_unit<E: de::Error>(self) -> Result<YesNo, E> {
                Ok(YesNo::No)
            }

            fn visit_none<E: de::Error>(self) -> Result<YesNo, E> {
                Ok(YesNo::No)
            }
        }

        deserializer.deserialize_any(YesNoVisitor)
    }
}

/// The five submission flags tracked per record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentFlag {
    OfferLetter,
    CompletionCertificate,
    InternshipReport,
    StudentFeedback,
    EmployerFeedback,
}

impl DocumentFlag {
    pub const ALL: [DocumentFlag; 5] = [
        DocumentFlag::OfferLetter,
        DocumentFlag::CompletionCertificate,
        DocumentFlag::InternshipReport,
        DocumentFlag::StudentFeedback,
        DocumentFlag::EmployerFeedback,
    ];

    /// Column header in the tabular file.
    pub fn column(self) -> &'static str {
        match self {
            DocumentFlag::OfferLetter => "Offer Letter Submitted",
            DocumentFlag::CompletionCertificate => "Completion Certificate",
            DocumentFlag::InternshipReport => "Internship Report Submitted",
            DocumentFlag::StudentFeedback => "Student Feedback Submitted",
            DocumentFlag::EmployerFeedback => "Employer Feedback Submitted",
        }
    }

    pub fn from_doc_type(doc_type: &str) -> Option<Self> {
        match doc_type.trim().to_ascii_lowercase().as_str() {
            "offer letter" => Some(DocumentFlag::OfferLetter),
            "completion certificate" => Some(DocumentFlag::CompletionCertificate),
            "internship report" | "report" => Some(DocumentFlag::InternshipReport),
            "student feedback" => Some(DocumentFlag::StudentFeedback),
            "employer feedback" | "employee feedback" => Some(DocumentFlag::EmployerFeedback),
            _ => None,
        }
    }
}

/// One row of the tabular store. Serde names are the spreadsheet headers, so
/// the same shape is used for the file and for the JSON API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternshipRecord {
    #[serde(rename = "Record ID", default)]
    pub record_id: String,
    #[serde(rename = "Register No", default)]
    pub register_no: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Mobile No", default)]
    pub mobile: String,
    #[serde(rename = "Section", default)]
    pub section: String,
    #[serde(rename = "Obtained Internship", default)]
    pub obtained_internship: YesNo,
    #[serde(rename = "Period", default)]
    pub period: String,
    #[serde(rename = "Start Date", default)]
    pub start_date: String,
    #[serde(rename = "End Date", default)]
    pub end_date: String,
    #[serde(rename = "Company Name", default)]
    pub company_name: String,
    #[serde(rename = "Placement Source", default)]
    pub placement_source: String,
    #[serde(rename = "Stipend (Rs.)", default)]
    pub stipend: String,
    #[serde(rename = "Internship Type", default)]
    pub internship_type: String,
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Offer Letter Submitted", default)]
    pub offer_letter: YesNo,
    #[serde(rename = "Completion Certificate", default)]
    pub completion_certificate: YesNo,
    #[serde(rename = "Internship Report Submitted", default)]
    pub internship_report: YesNo,
    #[serde(rename = "Student Feedback Submitted", default)]
    pub student_feedback: YesNo,
    #[serde(rename = "Employer Feedback Submitted", default)]
    pub employer_feedback: YesNo,
}

/// Header row of the tabular file, in column order.
pub const RECORD_COLUMNS: [&str; 19] = [
    "Record ID",
    "Register No",
    "Name",
    "Mobile No",
    "Section",
    "Obtained Internship",
    "Period",
    "Start Date",
    "End Date",
    "Company Name",
    "Placement Source",
    "Stipend (Rs.)",
    "Internship Type",
    "Location",
    "Offer Letter Submitted",
    "Completion Certificate",
    "Internship Report Submitted",
    "Student Feedback Submitted",
    "Employer Feedback Submitted",
];

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("invalid register number: {0}")]
    RegisterNo(#[from] IdError),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl InternshipRecord {
    pub fn flag(&self, flag: DocumentFlag) -> YesNo {
        match flag {
            DocumentFlag::OfferLetter => self.offer_letter,
            DocumentFlag::CompletionCertificate => self.completion_certificate,
            DocumentFlag::InternshipReport => self.internship_report,
            DocumentFlag::StudentFeedback => self.student_feedback,
            DocumentFlag::EmployerFeedback => self.employer_feedback,
        }
    }

    pub fn set_flag(&mut self, flag: DocumentFlag, value: YesNo) {
        let slot = match flag {
            DocumentFlag::OfferLetter => &mut self.offer_letter,
            DocumentFlag::CompletionCertificate => &mut self.completion_certificate,
            DocumentFlag::InternshipReport => &mut self.internship_report,
            DocumentFlag::StudentFeedback => &mut self.student_feedback,
            DocumentFlag::EmployerFeedback => &mut self.employer_feedback,
        };
        *slot = value;
    }

    pub fn submitted_count(&self) -> usize {
        DocumentFlag::ALL
            .iter()
            .filter(|flag| self.flag(**flag).is_yes())
            .count()
    }

    pub fn belongs_to(&self, register_no: &str) -> bool {
        self.register_no.trim() == register_no.trim()
    }

    pub fn matches_company(&self, company: &str) -> bool {
        self.company_name.trim().eq_ignore_ascii_case(company.trim())
    }

    pub fn validate(&self) -> Result<RegisterNo, RecordError> {
        let register_no = RegisterNo::try_new(self.register_no.as_str())?;
        if self.name.trim().is_empty() {
            return Err(RecordError::MissingField("Name"));
        }
        if self.obtained_internship.is_yes() && self.company_name.trim().is_empty() {
            return Err(RecordError::MissingField("Company Name"));
        }
        Ok(register_no)
    }
}
