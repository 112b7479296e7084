use std::collections::HashMap;

use thiserror::Error;

const TD1_LINE_LEN: usize = 30;
const TD3_LINE_LEN: usize = 44;

/// ICAO 9303 check-digit weights, repeated across the field.
const WEIGHTS: [u32; 3] = [7, 3, 1];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MrzError {
    #[error("expected {expected} characters per line, got {actual}")]
    LineLength { expected: usize, actual: usize },
    #[error("invalid character {0:?} in machine-readable zone")]
    InvalidCharacter(char),
    #[error("check digit mismatch for {0}")]
    CheckDigit(&'static str),
    #[error("unsupported layout: {0} lines")]
    UnsupportedLayout(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MrzFormat {
    /// Identity cards: 3 lines of 30 characters.
    Td1,
    /// Passports: 2 lines of 44 characters.
    Td3,
}

/// Fields read from a validated machine-readable zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrzRecord {
    pub format: MrzFormat,
    pub document_code: String,
    pub issuing_state: String,
    pub document_number: String,
    pub surname: String,
    pub given_names: String,
    pub nationality: String,
    /// `YYMMDD`, as printed.
    pub birth_date: String,
    pub sex: String,
    /// `YYMMDD`, as printed.
    pub expiry_date: String,
}

impl MrzRecord {
    pub fn to_fields(&self) -> HashMap<String, String> {
        HashMap::from([
            ("document_code".to_string(), self.document_code.clone()),
            ("issuing_state".to_string(), self.issuing_state.clone()),
            ("document_number".to_string(), self.document_number.clone()),
            ("surname".to_string(), self.surname.clone()),
            ("given_names".to_string(), self.given_names.clone()),
            ("nationality".to_string(), self.nationality.clone()),
            ("birth_date".to_string(), self.birth_date.clone()),
            ("sex".to_string(), self.sex.clone()),
            ("expiry_date".to_string(), self.expiry_date.clone()),
        ])
    }
}

/// Normalizes one OCR line: uppercase, whitespace removed.
///
/// Returns `None` unless the result has an MRZ line length and contains
/// the `<` filler.
pub fn candidate_line(raw: &str) -> Option<String> {
    let line: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let len_ok = line.len() == TD1_LINE_LEN || line.len() == TD3_LINE_LEN;
    if len_ok && line.contains('<') && line.chars().all(is_mrz_char) {
        Some(line)
    } else {
        None
    }
}

/// Scans OCR lines for a complete, consecutive MRZ block and parses it.
///
/// `None` means no MRZ block was found. `Some(Err(_))` means the block was
/// found but failed validation (typically an OCR misread).
pub fn find_and_parse<'a, I>(lines: I) -> Option<Result<MrzRecord, MrzError>>
where
    I: IntoIterator<Item = &'a str>,
{
    let candidates: Vec<String> = lines.into_iter().filter_map(candidate_line).collect();

    for window in candidates.windows(3) {
        if window.iter().all(|l| l.len() == TD1_LINE_LEN) {
            return Some(parse(&[
                window[0].as_str(),
                window[1].as_str(),
                window[2].as_str(),
            ]));
        }
    }
    for window in candidates.windows(2) {
        if window.iter().all(|l| l.len() == TD3_LINE_LEN) {
            return Some(parse(&[window[0].as_str(), window[1].as_str()]));
        }
    }
    None
}

/// Parses a TD1 (3 lines) or TD3 (2 lines) zone, validating check digits.
pub fn parse(lines: &[&str]) -> Result<MrzRecord, MrzError> {
    match lines.len() {
        3 => parse_td1(lines[0], lines[1], lines[2]),
        2 => parse_td3(lines[0], lines[1]),
        n => Err(MrzError::UnsupportedLayout(n)),
    }
}

fn parse_td1(l1: &str, l2: &str, l3: &str) -> Result<MrzRecord, MrzError> {
    for line in [l1, l2, l3] {
        validate_line(line, TD1_LINE_LEN)?;
    }

    verify(&l1[5..14], char_at(l1, 14), "document_number")?;
    verify(&l2[0..6], char_at(l2, 6), "birth_date")?;
    verify(&l2[8..14], char_at(l2, 14), "expiry_date")?;
    let composite = format!("{}{}{}{}", &l1[5..30], &l2[0..7], &l2[8..15], &l2[18..29]);
    verify(&composite, char_at(l2, 29), "composite")?;

    let (surname, given_names) = split_names(l3);
    Ok(MrzRecord {
        format: MrzFormat::Td1,
        document_code: unfill(&l1[0..2]),
        issuing_state: unfill(&l1[2..5]),
        document_number: unfill(&l1[5..14]),
        surname,
        given_names,
        nationality: unfill(&l2[15..18]),
        birth_date: l2[0..6].to_string(),
        sex: unfill(&l2[7..8]),
        expiry_date: l2[8..14].to_string(),
    })
}

fn parse_td3(l1: &str, l2: &str) -> Result<MrzRecord, MrzError> {
    for line in [l1, l2] {
        validate_line(line, TD3_LINE_LEN)?;
    }

    verify(&l2[0..9], char_at(l2, 9), "document_number")?;
    verify(&l2[13..19], char_at(l2, 19), "birth_date")?;
    verify(&l2[21..27], char_at(l2, 27), "expiry_date")?;
    verify(&l2[28..42], char_at(l2, 42), "personal_number")?;
    let composite = format!("{}{}{}", &l2[0..10], &l2[13..20], &l2[21..43]);
    verify(&composite, char_at(l2, 43), "composite")?;

    let (surname, given_names) = split_names(&l1[5..]);
    Ok(MrzRecord {
        format: MrzFormat::Td3,
        document_code: unfill(&l1[0..2]),
        issuing_state: unfill(&l1[2..5]),
        document_number: unfill(&l2[0..9]),
        surname,
        given_names,
        nationality: unfill(&l2[10..13]),
        birth_date: l2[13..19].to_string(),
        sex: unfill(&l2[20..21]),
        expiry_date: l2[21..27].to_string(),
    })
}

fn validate_line(line: &str, expected: usize) -> Result<(), MrzError> {
    if line.len() != expected {
        return Err(MrzError::LineLength {
            expected,
            actual: line.len(),
        });
    }
    match line.chars().find(|c| !is_mrz_char(*c)) {
        Some(c) => Err(MrzError::InvalidCharacter(c)),
        None => Ok(()),
    }
}

fn is_mrz_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '<'
}

fn char_value(c: char) -> u32 {
    match c {
        '0'..='9' => c as u32 - '0' as u32,
        'A'..='Z' => c as u32 - 'A' as u32 + 10,
        _ => 0,
    }
}

pub fn check_digit(field: &str) -> u32 {
    field
        .chars()
        .zip(WEIGHTS.iter().cycle())
        .map(|(c, w)| char_value(c) * w)
        .sum::<u32>()
        % 10
}

fn verify(field: &str, digit: char, name: &'static str) -> Result<(), MrzError> {
    // An all-filler optional field may carry `<` as its check digit.
    if char_value(digit) == check_digit(field) && (digit.is_ascii_digit() || digit == '<') {
        Ok(())
    } else {
        Err(MrzError::CheckDigit(name))
    }
}

fn char_at(line: &str, idx: usize) -> char {
    line.as_bytes()[idx] as char
}

fn unfill(field: &str) -> String {
    field.trim_end_matches('<').replace('<', " ")
}

fn split_names(field: &str) -> (String, String) {
    let field = field.trim_end_matches('<');
    match field.split_once("<<") {
        Some((surname, given)) => (unfill(surname), unfill(given)),
        None => (unfill(field), String::new()),
    }
}
