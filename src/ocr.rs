use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::models::OcrData;

pub const STUDENT_NAMES: [&str; 6] = [
    "Rahul Kumar Singh",
    "Priya Sharma",
    "Amit Patel",
    "Sneha Gupta",
    "Vikram Rao",
    "Anjali Verma",
];

pub const DEPARTMENTS: [&str; 6] = [
    "Computer Science",
    "Mechanical Engineering",
    "Electrical Engineering",
    "Civil Engineering",
    "Information Technology",
    "Electronics & Communication",
];

pub const ISSUING_UNIVERSITY: &str = "Jharkhand University of Technology";

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct OcrResult {
    pub extracted_text: String,
    pub ocr_data: OcrData,
}

pub fn simulate<R: Rng + ?Sized>(file_name: &str, rng: &mut R) -> OcrResult {
    let student_name = STUDENT_NAMES
        .choose(rng)
        .copied()
        .unwrap_or(STUDENT_NAMES[0]);
    let department = DEPARTMENTS.choose(rng).copied().unwrap_or(DEPARTMENTS[0]);
    let roll_number = format!("JU{}", rng.gen_range(100_000..1_000_000));
    let marks = format!("{}%", rng.gen_range(70..100));
    let year = rng.gen_range(2020..2024).to_string();

    log::debug!("simulated OCR for `{}`: {}", file_name, roll_number);

    let extracted_text = format!(
        "This is to certify that {student_name}\n\
         Roll Number: {roll_number}\n\
         has successfully completed the requirements for\n\
         {department} program\n\
         with {marks} marks\n\
         in the academic year {year}\n\
         from {ISSUING_UNIVERSITY}"
    );

    OcrResult {
        extracted_text,
        ocr_data: OcrData {
            student_name: student_name.to_string(),
            roll_number,
            marks,
            year,
            department: department.to_string(),
        },
    }
}
