//! Regex rules used by the pattern recognizer, grouped by entity type.
//!
//! Dictionary rules carry higher confidence than morphological (suffix) rules.

use regex::Regex;
use std::sync::LazyLock;

use super::types::EntityType;

/// A compiled entity rule.
pub struct EntityPattern {
    pub name: &'static str,
    pub entity_type: EntityType,
    pub regex: &'static LazyLock<Option<Regex>>,
    pub confidence: f32,
    /// Lowercase words the rule matches but that are not entities.
    pub exclude: &'static [&'static str],
}

const DISEASE_SUFFIX_EXCLUDE: &[&str] = &[
    "diagnosis",
    "prognosis",
    "osmosis",
    "academia",
    "diploma",
    "aroma",
    "empathy",
    "sympathy",
    "telepathy",
];

const PROCEDURE_SUFFIX_EXCLUDE: &[&str] = &[
    "biography",
    "geography",
    "photography",
    "bibliography",
    "choreography",
    "dichotomy",
];

macro_rules! entity_pattern {
    ($name:ident, $regex_str:expr) => {
        pub static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

// ── Diseases ───────────────────────────────────────────────────────────────
entity_pattern!(
    RE_DISEASE_TERMS,
    r"(?i)\b(?:type [12] diabetes|diabetes(?: mellitus)?|hypertension|hypotension|asthma|copd|pneumonia|tuberculosis|influenza|covid-19|cancer|leukemia|lymphoma|stroke|heart failure|myocardial infarction|coronary artery disease|atrial fibrillation|chronic kidney disease|kidney disease|renal failure|liver disease|cirrhosis|hepatitis|epilepsy|migraine|depression|anxiety|schizophrenia|alzheimer'?s disease|parkinson'?s disease|dementia|obesity|hyperlipidemia|hypothyroidism|hyperthyroidism|anemia|sepsis|hiv|aids|malaria|peptic ulcer|gout|osteoporosis|rheumatoid arthritis|osteoarthritis|lupus|psoriasis|infection)\b"
);
entity_pattern!(
    RE_DISEASE_SUFFIX,
    r"(?i)\b[a-z]{3,}(?:itis|osis|emia|oma|pathy|algia)\b"
);

// ── Drugs ──────────────────────────────────────────────────────────────────
entity_pattern!(
    RE_DRUG_TERMS,
    r"(?i)\b(?:metformin|insulin|glipizide|sitagliptin|empagliflozin|aspirin|ibuprofen|naproxen|acetaminophen|paracetamol|warfarin|heparin|apixaban|clopidogrel|lisinopril|enalapril|losartan|amlodipine|metoprolol|atenolol|propranolol|atorvastatin|simvastatin|rosuvastatin|furosemide|hydrochlorothiazide|spironolactone|amoxicillin|penicillin|azithromycin|doxycycline|ciprofloxacin|vancomycin|prednisone|dexamethasone|morphine|oxycodone|codeine|tramadol|levothyroxine|omeprazole|pantoprazole|albuterol|salbutamol|sertraline|fluoxetine|lithium|nsaids?|ace inhibitors?|beta[- ]blockers?|statins?|antibiotics?|corticosteroids?)\b"
);
entity_pattern!(
    RE_DRUG_SUFFIX,
    r"(?i)\b[a-z]{3,}(?:mab|nib|pril|sartan|statin|olol|azole|cillin|mycin|floxacin|gliptin|gliflozin|parin|dipine|prazole|tidine)\b"
);

// ── Symptoms ───────────────────────────────────────────────────────────────
entity_pattern!(
    RE_SYMPTOM_TERMS,
    r"(?i)\b(?:chest pain|abdominal pain|back pain|shortness of breath|dyspnea|pain|fever|cough|fatigue|nausea|vomiting|diarrhea|constipation|headache|dizziness|syncope|palpitations|wheezing|rash|itching|swelling|edema|weight loss|weight gain|insomnia|confusion|seizures?|tremor|numbness|weakness|blurred vision|polyuria|polydipsia|chills|sweating|bleeding|jaundice)\b"
);

// ── Procedures ─────────────────────────────────────────────────────────────
entity_pattern!(
    RE_PROCEDURE_TERMS,
    r"(?i)\b(?:surgery|biopsy|mri|ct scan|x-ray|ultrasound|echocardiogram|electrocardiogram|ecg|ekg|endoscopy|colonoscopy|dialysis|transplant(?:ation)?|angioplasty|catheterization|intubation|vaccination|blood test|screening|stent placement|bypass surgery)\b"
);
entity_pattern!(
    RE_PROCEDURE_SUFFIX,
    r"(?i)\b[a-z]{3,}(?:ectomy|otomy|ostomy|oscopy|plasty|graphy)\b"
);

// ── Treatments ─────────────────────────────────────────────────────────────
entity_pattern!(
    RE_TREATMENT_TERMS,
    r"(?i)\b(?:insulin therapy|chemotherapy|radiotherapy|radiation therapy|immunotherapy|physical therapy|physiotherapy|cognitive behavioral therapy|psychotherapy|hormone therapy|oxygen therapy|lifestyle modification|diet(?:ary changes)?|exercise|weight management|rehabilitation|antibiotic therapy|anticoagulation|blood transfusion|therapy|treatment)\b"
);

// ── Anatomical sites ───────────────────────────────────────────────────────
entity_pattern!(
    RE_ANATOMY_TERMS,
    r"(?i)\b(?:heart|lungs?|liver|kidneys?|brain|pancreas|stomach|intestines?|colon|bladder|spleen|thyroid|skin|bones?|spine|blood vessels?|arteries|artery|veins?|chest|abdomen|eyes?|retina|joints?|muscles?|prostate|breast|cervix|uterus|ovar(?:y|ies))\b"
);

// ── Measurements ───────────────────────────────────────────────────────────
entity_pattern!(
    RE_MEASUREMENT_VALUE,
    r"(?i)\b\d+(?:\.\d+)?\s?(?:mg/dl|mmol/l|mmhg|mg|mcg|µg|ml|kg|bpm|units?|iu)\b|\b\d+(?:\.\d+)?\s?%"
);
entity_pattern!(
    RE_MEASUREMENT_TERMS,
    r"(?i)\b(?:hba1c|a1c|blood pressure|blood glucose|heart rate|bmi|body mass index|ldl|hdl|cholesterol|egfr|creatinine|oxygen saturation|temperature)\b"
);

/// All rules, grouped by type in [`EntityType::ALL`] order.
pub fn all_patterns() -> Vec<EntityPattern> {
    vec![
        EntityPattern {
            name: "disease_terms",
            entity_type: EntityType::Disease,
            regex: &RE_DISEASE_TERMS,
            confidence: 0.90,
            exclude: &[],
        },
        EntityPattern {
            name: "disease_suffix",
            entity_type: EntityType::Disease,
            regex: &RE_DISEASE_SUFFIX,
            confidence: 0.70,
            exclude: DISEASE_SUFFIX_EXCLUDE,
        },
        EntityPattern {
            name: "drug_terms",
            entity_type: EntityType::Drug,
            regex: &RE_DRUG_TERMS,
            confidence: 0.90,
            exclude: &[],
        },
        EntityPattern {
            name: "drug_suffix",
            entity_type: EntityType::Drug,
            regex: &RE_DRUG_SUFFIX,
            confidence: 0.75,
            exclude: &[],
        },
        EntityPattern {
            name: "symptom_terms",
            entity_type: EntityType::Symptom,
            regex: &RE_SYMPTOM_TERMS,
            confidence: 0.85,
            exclude: &[],
        },
        EntityPattern {
            name: "procedure_terms",
            entity_type: EntityType::Procedure,
            regex: &RE_PROCEDURE_TERMS,
            confidence: 0.85,
            exclude: &[],
        },
        EntityPattern {
            name: "procedure_suffix",
            entity_type: EntityType::Procedure,
            regex: &RE_PROCEDURE_SUFFIX,
            confidence: 0.75,
            exclude: PROCEDURE_SUFFIX_EXCLUDE,
        },
        EntityPattern {
            name: "treatment_terms",
            entity_type: EntityType::Treatment,
            regex: &RE_TREATMENT_TERMS,
            confidence: 0.80,
            exclude: &[],
        },
        EntityPattern {
            name: "anatomy_terms",
            entity_type: EntityType::AnatomicalSite,
            regex: &RE_ANATOMY_TERMS,
            confidence: 0.80,
            exclude: &[],
        },
        EntityPattern {
            name: "measurement_value",
            entity_type: EntityType::Measurement,
            regex: &RE_MEASUREMENT_VALUE,
            confidence: 0.90,
            exclude: &[],
        },
        EntityPattern {
            name: "measurement_terms",
            entity_type: EntityType::Measurement,
            regex: &RE_MEASUREMENT_TERMS,
            confidence: 0.80,
            exclude: &[],
        },
    ]
}

