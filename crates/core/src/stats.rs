#![forbid(unsafe_code)]

use crate::record::{DocumentFlag, InternshipRecord};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub total_students: usize,
    pub internship_obtained: usize,
    pub documents_submitted: usize,
    pub records: usize,
    pub per_flag: Vec<FlagCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlagCount {
    pub column: &'static str,
    pub submitted: usize,
}

pub fn student_stats(records: &[InternshipRecord]) -> StudentStats {
    let mut students = BTreeSet::new();
    let mut obtained = BTreeSet::new();
    for record in records {
        let register_no = record.register_no.trim();
        if register_no.is_empty() {
            continue;
        }
        students.insert(register_no);
        if record.obtained_internship.is_yes() {
            obtained.insert(register_no);
        }
    }

    let per_flag = DocumentFlag::ALL
        .iter()
        .map(|flag| FlagCount {
            column: flag.column(),
            submitted: records.iter().filter(|r| r.flag(*flag).is_yes()).count(),
        })
        .collect::<Vec<_>>();

    StudentStats {
        total_students: students.len(),
        internship_obtained: obtained.len(),
        documents_submitted: per_flag.iter().map(|f| f.submitted).sum(),
        records: records.len(),
        per_flag,
    }
}
