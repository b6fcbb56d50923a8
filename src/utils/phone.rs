use regex::Regex;
use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    InvalidPhoneNumber,
}

/// A normalized Indian mobile number: exactly 10 digits, first digit 6-9.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn validate(raw: &str) -> Result<PhoneNumber, Error> {
    let stripped = raw.trim().strip_prefix("+91").unwrap_or(raw.trim());
    let digits = stripped
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>();

    let regex = Regex::new(r"^[6-9][0-9]{9}$").expect("Invalid phone number regex");
    match regex.is_match(&digits) {
        true => Ok(PhoneNumber(digits)),
        false => Err(Error::InvalidPhoneNumber),
    }
}
