use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use magicrepos::error::{Error, Result};

/// `user@host:owner/repo`. No percent-decoding; each field must be
/// non-empty; IPv6 host literals (which themselves contain `:`) are out of
/// scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub user: String,
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl FromStr for RemoteUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (user, rest) = s
            .split_once('@')
            .ok_or_else(|| Error::MalformedUrl(format!("missing `@` in `{s}`")))?;
        let (host, rest) = rest
            .split_once(':')
            .ok_or_else(|| Error::MalformedUrl(format!("missing `:` in `{s}`")))?;
        let (owner, repo) = rest
            .split_once('/')
            .ok_or_else(|| Error::MalformedUrl(format!("missing `/` in `{s}`")))?;

        if [user, host, owner, repo].iter().any(|field| field.is_empty()) {
            return Err(Error::MalformedUrl(format!("empty field in `{s}`")));
        }
        if host.contains(':') {
            return Err(Error::MalformedUrl(format!("IPv6 host literals are not supported: `{s}`")));
        }

        Ok(Self { user: user.to_owned(), host: host.to_owned(), owner: owner.to_owned(), repo: repo.to_owned() })
    }
}

impl Display for RemoteUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_url() {
        let url: RemoteUrl = "ada@git.example.com:ada/engine".parse().unwrap();
        assert_eq!(url.user, "ada");
        assert_eq!(url.host, "git.example.com");
        assert_eq!(url.owner, "ada");
        assert_eq!(url.repo, "engine");
    }

    #[test]
    fn round_trips_through_display() {
        let url: RemoteUrl = "ada@git.example.com:ada/engine".parse().unwrap();
        assert_eq!(url.to_string(), "ada@git.example.com:ada/engine");
    }

    #[test]
    fn rejects_missing_separators() {
        assert!("ada.git.example.com:ada/engine".parse::<RemoteUrl>().is_err());
        assert!("ada@git.example.comada/engine".parse::<RemoteUrl>().is_err());
        assert!("ada@git.example.com:adaengine".parse::<RemoteUrl>().is_err());
    }

    #[test]
    fn rejects_empty_fields() {
        assert!("@git.example.com:ada/engine".parse::<RemoteUrl>().is_err());
        assert!("ada@:ada/engine".parse::<RemoteUrl>().is_err());
        assert!("ada@git.example.com:/engine".parse::<RemoteUrl>().is_err());
        assert!("ada@git.example.com:ada/".parse::<RemoteUrl>().is_err());
    }

    #[test]
    fn rejects_ipv6_host_literals() {
        assert!("ada@::1:ada/engine".parse::<RemoteUrl>().is_err());
    }
}
