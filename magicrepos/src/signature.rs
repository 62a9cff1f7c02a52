use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::Local;

use crate::error::{Error, Result};

/// `Name <email> unix_seconds ±HHMM`, the author/committer line embedded in
/// a commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub timestamp: i64,
    /// offset from UTC in minutes, positive east
    pub offset_minutes: i32,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            name: name.into(),
            email: email.into(),
            timestamp: now.timestamp(),
            offset_minutes: now.offset().local_minus_utc() / 60,
        }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.offset_minutes >= 0 { '+' } else { '-' };
        let abs = self.offset_minutes.abs();
        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.timestamp,
            sign,
            abs / 60,
            abs % 60
        )
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let email_start = s.find('<').ok_or_else(|| malformed(s))?;
        let email_end = s.find('>').ok_or_else(|| malformed(s))?;
        if email_start == 0 || email_end < email_start {
            return Err(malformed(s));
        }
        let name = s[..email_start - 1].to_owned();
        let email = s[email_start + 1..email_end].to_owned();

        let rest = s[email_end + 1..].trim();
        let (ts_tok, offset_tok) = rest.split_once(' ').ok_or_else(|| malformed(s))?;
        let timestamp: i64 = ts_tok.parse().map_err(|_| malformed(s))?;

        if offset_tok.len() != 5 {
            return Err(malformed(s));
        }
        let sign = match &offset_tok[0..1] {
            "+" => 1,
            "-" => -1,
            _ => return Err(malformed(s)),
        };
        let hours: i32 = offset_tok[1..3].parse().map_err(|_| malformed(s))?;
        let minutes: i32 = offset_tok[3..5].parse().map_err(|_| malformed(s))?;
        let offset_minutes = sign * (hours * 60 + minutes);

        Ok(Self { name, email, timestamp, offset_minutes })
    }
}

fn malformed(s: &str) -> Error {
    Error::MalformedObject(format!("invalid signature `{s}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trips() {
        let sig = Signature {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            timestamp: 1_616_061_862,
            offset_minutes: 13 * 60,
        };
        let s = sig.to_string();
        assert_eq!(s, "Ada Lovelace <ada@example.com> 1616061862 +1300");
        assert_eq!(Signature::from_str(&s).unwrap(), sig);
    }

    #[test]
    fn signature_handles_negative_offset() {
        let sig = Signature {
            name: "A".into(),
            email: "a@b.com".into(),
            timestamp: 0,
            offset_minutes: -(7 * 60 + 30),
        };
        assert_eq!(sig.to_string(), "A <a@b.com> 0 -0730");
        assert_eq!(Signature::from_str(&sig.to_string()).unwrap(), sig);
    }
}
