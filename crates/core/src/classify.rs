#![forbid(unsafe_code)]

pub const UNKNOWN_DOCUMENT: &str = "Unknown Document";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentLabel {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

/// Ordered: the first label with a matching keyword wins.
pub const CLASSIFICATION_TABLE: &[DocumentLabel] = &[
    DocumentLabel {
        label: "Permission Letter",
        keywords: &["Permission Letter"],
    },
    DocumentLabel {
        label: "Offer Letter",
        keywords: &["Offer Letter"],
    },
    DocumentLabel {
        label: "Completion Certificate",
        keywords: &["Completion Certificate"],
    },
    DocumentLabel {
        label: "Student Feedback",
        keywords: &["Student Feedback"],
    },
    DocumentLabel {
        label: "Employee Feedback",
        keywords: &["Employee Feedback"],
    },
    DocumentLabel {
        label: "Internship Report",
        keywords: &["Internship Report"],
    },
    DocumentLabel {
        label: "Resume",
        keywords: &["Resume", "Curriculum Vitae", "CV"],
    },
];

pub fn classify(text: &str) -> &'static str {
    classify_with(CLASSIFICATION_TABLE, text)
}

pub fn classify_with(table: &[DocumentLabel], text: &str) -> &'static str {
    let haystack = text.to_lowercase();
    table
        .iter()
        .find(|entry| {
            entry
                .keywords
                .iter()
                .any(|keyword| haystack.contains(&keyword.to_lowercase()))
        })
        .map(|entry| entry.label)
        .unwrap_or(UNKNOWN_DOCUMENT)
}

/// Every non-blank keyword must occur in `text` (case-insensitive).
pub fn contains_all_keywords<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .map(|keyword| keyword.as_ref().trim())
        .filter(|keyword| !keyword.is_empty())
        .all(|keyword| haystack.contains(&keyword.to_lowercase()))
}

/// Returns the canonical label when `value` names one of the table entries.
pub fn known_label(value: &str) -> Option<&'static str> {
    let trimmed = value.trim();
    CLASSIFICATION_TABLE
        .iter()
        .map(|entry| entry.label)
        .chain(["Employer Feedback"])
        .find(|label| label.eq_ignore_ascii_case(trimmed))
}
