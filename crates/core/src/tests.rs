#![forbid(unsafe_code)]

use super::*;

fn record(register_no: &str, company: &str) -> InternshipRecord {
    InternshipRecord {
        register_no: register_no.to_string(),
        name: "Asha".to_string(),
        company_name: company.to_string(),
        obtained_internship: YesNo::Yes,
        ..InternshipRecord::default()
    }
}

#[test]
fn username_validation() {
    assert_eq!(Username::try_new("").unwrap_err(), IdError::Empty);
    assert_eq!(Username::try_new("   ").unwrap_err(), IdError::Empty);
    assert_eq!(
        Username::try_new("a".repeat(65)).unwrap_err(),
        IdError::TooLong
    );
    assert_eq!(
        Username::try_new("reg no").unwrap_err(),
        IdError::InvalidChar { ch: ' ', index: 3 }
    );
    assert_eq!(
        Username::try_new(" 7376221CS101 ").unwrap().as_str(),
        "7376221CS101"
    );
}

#[test]
fn username_suffix_takes_last_four_chars() {
    assert_eq!(Username::try_new("7376221CS101").unwrap().suffix(), "S101");
    assert_eq!(Username::try_new("abc").unwrap().suffix(), "abc");
    assert_eq!(Username::try_new("abcd").unwrap().suffix(), "abcd");
}

#[test]
fn classification_picks_the_only_matching_label() {
    assert_eq!(
        classify("This is to certify... INTERNSHIP REPORT submitted by"),
        "Internship Report"
    );
    assert_eq!(classify("my curriculum vitae"), "Resume");
}

#[test]
fn classification_without_match_is_unknown() {
    assert_eq!(classify(""), UNKNOWN_DOCUMENT);
    assert_eq!(classify("Lorem ipsum dolor sit amet"), UNKNOWN_DOCUMENT);
}

#[test]
fn classification_prefers_earlier_table_entry() {
    let text = "Internship Report attached along with the Offer Letter";
    assert_eq!(classify(text), "Offer Letter");

    let text = "Completion Certificate. Permission Letter enclosed.";
    assert_eq!(classify(text), "Permission Letter");
}

#[test]
fn verification_requires_every_keyword() {
    let keywords = ["Acme Corp", "offer letter", "Stipend"];
    let text = "ACME CORP is pleased to extend this Offer Letter. Stipend: 10000";
    assert!(contains_all_keywords(text, &keywords));

    for skipped in keywords {
        let mutilated = text.to_lowercase().replace(&skipped.to_lowercase(), "");
        assert!(
            !contains_all_keywords(&mutilated, &keywords),
            "dropping {skipped:?} must fail verification"
        );
    }
}

#[test]
fn verification_ignores_blank_keywords() {
    assert!(contains_all_keywords("offer letter", &["offer", "  ", ""]));
}

#[test]
fn known_label_is_case_insensitive() {
    assert_eq!(known_label("offer letter"), Some("Offer Letter"));
    assert_eq!(known_label("Employer Feedback"), Some("Employer Feedback"));
    assert_eq!(known_label("Bank Statement"), None);
}

#[test]
fn stored_file_name_formats() {
    let user = Username::try_new("7376221CS101").unwrap();
    assert_eq!(
        stored_file_name(&user, Some("Acme Corp"), "Offer Letter", "scan.PDF"),
        "S101-Acme Corp-Offer Letter.PDF"
    );
    assert_eq!(
        stored_file_name(&user, None, "Resume", "cv.docx"),
        "S101-Resume.docx"
    );
    assert_eq!(
        stored_file_name(&user, Some("  "), "Resume", "noext"),
        "S101-Resume"
    );
    assert_eq!(
        stored_file_name(&user, Some("A/B"), "Resume", "x.pdf"),
        "S101-A_B-Resume.pdf"
    );
}

#[test]
fn extension_and_stem() {
    assert_eq!(file_extension("a/b/report.final.pdf"), ".pdf");
    assert_eq!(file_extension(".hidden"), "");
    assert_eq!(file_stem("Offer Letter.pdf"), "Offer Letter");
}

#[test]
fn yes_no_parses_leniently() {
    assert_eq!(YesNo::parse_lenient("YES"), YesNo::Yes);
    assert_eq!(YesNo::parse_lenient("true"), YesNo::Yes);
    assert_eq!(YesNo::parse_lenient(""), YesNo::No);
    assert_eq!(YesNo::parse_lenient("maybe"), YesNo::No);

    let parsed: YesNo = serde_json::from_str("true").unwrap();
    assert_eq!(parsed, YesNo::Yes);
    let parsed: YesNo = serde_json::from_str("\"No\"").unwrap();
    assert_eq!(parsed, YesNo::No);
}

#[test]
fn record_json_uses_spreadsheet_headers() {
    let value = serde_json::to_value(record("7376221CS101", "Acme")).unwrap();
    assert_eq!(value["Register No"], "7376221CS101");
    assert_eq!(value["Company Name"], "Acme");
    assert_eq!(value["Offer Letter Submitted"], "No");
    assert_eq!(
        value.as_object().unwrap().len(),
        RECORD_COLUMNS.len(),
        "every column is serialized"
    );
}

#[test]
fn record_validation() {
    assert!(record("7376221CS101", "Acme").validate().is_ok());
    assert_eq!(
        record("7376221CS101", " ").validate().unwrap_err(),
        RecordError::MissingField("Company Name")
    );
    let mut missing_name = record("7376221CS101", "Acme");
    missing_name.name.clear();
    assert_eq!(
        missing_name.validate().unwrap_err(),
        RecordError::MissingField("Name")
    );
    assert!(matches!(
        record("", "Acme").validate().unwrap_err(),
        RecordError::RegisterNo(IdError::Empty)
    ));
}

#[test]
fn flags_map_from_document_types() {
    assert_eq!(
        DocumentFlag::from_doc_type("Employee Feedback"),
        Some(DocumentFlag::EmployerFeedback)
    );
    assert_eq!(
        DocumentFlag::from_doc_type("offer letter").map(DocumentFlag::column),
        Some("Offer Letter Submitted")
    );
    assert_eq!(DocumentFlag::from_doc_type("Resume"), None);
}

#[test]
fn stats_count_distinct_students() {
    let mut first = record("A1", "Acme");
    first.set_flag(DocumentFlag::OfferLetter, YesNo::Yes);
    first.set_flag(DocumentFlag::InternshipReport, YesNo::Yes);
    let second = record("A1", "Globex");
    let mut third = record("B2", "");
    third.obtained_internship = YesNo::No;
    third.set_flag(DocumentFlag::StudentFeedback, YesNo::Yes);

    let stats = student_stats(&[first, second, third]);
    assert_eq!(stats.total_students, 2);
    assert_eq!(stats.internship_obtained, 1);
    assert_eq!(stats.documents_submitted, 3);
    assert_eq!(stats.records, 3);
    assert_eq!(stats.per_flag.len(), 5);
    assert_eq!(stats.per_flag[0].submitted, 1);
}
