use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating code fields (college code, course code, ...)
    /// Must be lowercase alphanumeric with hyphens
    /// - Valid: "nitk", "ipu-delhi", "cse"
    /// - Invalid: "-nitk", "nitk-", "ipu--delhi", "NITK", "ipu_delhi"
    pub static ref CODE_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    /// Semester number, 1 through 8
    pub static ref SEMESTER_REGEX: Regex = Regex::new(r"^[1-8]$").unwrap();

    /// Everything a storage path segment may not contain
    pub static ref SEGMENT_STRIP_REGEX: Regex = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();

    /// Characters stripped from uploaded file names
    pub static ref FILENAME_FORBIDDEN_REGEX: Regex = Regex::new(r#"[<>:"/\\|?*]"#).unwrap();

    /// Runs of whitespace inside file names
    pub static ref WHITESPACE_RUN_REGEX: Regex = Regex::new(r"\s+").unwrap();

    /// A 13-digit unix-millis token at the end of a file stem
    /// - Matches: "unit1_1712345678901", "1712345678901"
    /// - No match: "unit1_171234567890", "unit11712345678901"
    pub static ref TRAILING_TIMESTAMP_REGEX: Regex =
        Regex::new(r"(?:^|[_\-\s])[0-9]{13}$").unwrap();
}

/// `%term%` for a `LIKE ... ESCAPE '\'` match, with the term's own
/// wildcards escaped
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
