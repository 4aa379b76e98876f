//! Seed vocabularies for the open-coded domains.
//!
//! Condition and medication leaves accept any non-blank code; these entries only feed
//! catalog search so authors can find the common ones quickly.

/// A code with a display name and a relative usage frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub code: &'static str,
    pub display: &'static str,
    pub frequency: u32,
}

const fn entry(code: &'static str, display: &'static str, frequency: u32) -> VocabularyEntry {
    VocabularyEntry {
        code,
        display,
        frequency,
    }
}

pub const CONDITIONS: &[VocabularyEntry] = &[
    entry("diabetes", "Type 2 diabetes mellitus", 980),
    entry("hypertension", "Essential hypertension", 990),
    entry("hyperlipidemia", "Hyperlipidemia", 900),
    entry("ckd", "Chronic kidney disease", 640),
    entry("heart-failure", "Heart failure", 610),
    entry("atrial-fibrillation", "Atrial fibrillation", 580),
    entry("copd", "Chronic obstructive pulmonary disease", 560),
    entry("asthma", "Asthma", 620),
    entry("depression", "Major depressive disorder", 700),
    entry("sepsis", "Sepsis", 240),
    entry("pneumonia", "Pneumonia", 410),
    entry("hypothyroidism", "Hypothyroidism", 530),
];

pub const MEDICATIONS: &[VocabularyEntry] = &[
    entry("metformin", "Metformin", 950),
    entry("insulin-glargine", "Insulin glargine", 620),
    entry("lisinopril", "Lisinopril", 930),
    entry("losartan", "Losartan", 810),
    entry("amlodipine", "Amlodipine", 900),
    entry("atorvastatin", "Atorvastatin", 970),
    entry("warfarin", "Warfarin", 430),
    entry("apixaban", "Apixaban", 560),
    entry("furosemide", "Furosemide", 600),
    entry("ibuprofen", "Ibuprofen", 880),
    entry("levothyroxine", "Levothyroxine", 890),
    entry("vancomycin", "Vancomycin", 210),
];
