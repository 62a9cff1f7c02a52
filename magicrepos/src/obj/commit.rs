use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::signature::Signature;

/// `"tree " hexdigest "\n" ("parent " hexdigest "\n")* "author " sig "\n"
/// "committer " sig "\n" "\n" message`. A single-user engine uses the same
/// signature for author and committer.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub tree: Digest,
    pub parents: Vec<Digest>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = format!("tree {}\n", self.tree);
        for parent in &self.parents {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!("committer {}\n", self.committer));
        out.push('\n');
        out.push_str(&self.message);
        out.into_bytes()
    }

    pub fn decode(content: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(content)
            .map_err(|_| Error::MalformedObject("commit body is not utf8".into()))?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        let mut pos = 0;
        let message_start;
        loop {
            let newline = text[pos..]
                .find('\n')
                .map(|i| pos + i)
                .ok_or_else(|| Error::MalformedObject("commit missing blank line before message".into()))?;
            let line = &text[pos..newline];
            if line.is_empty() {
                message_start = newline + 1;
                break;
            } else if let Some(rest) = line.strip_prefix("tree ") {
                tree = Some(rest.parse()?);
            } else if let Some(rest) = line.strip_prefix("parent ") {
                parents.push(rest.parse()?);
            } else if let Some(rest) = line.strip_prefix("author ") {
                author = Some(rest.parse()?);
            } else if let Some(rest) = line.strip_prefix("committer ") {
                committer = Some(rest.parse()?);
            } else {
                return Err(Error::MalformedObject(format!("unrecognized commit header line `{line}`")));
            }
            pos = newline + 1;
        }

        let tree = tree.ok_or_else(|| Error::MalformedObject("commit missing tree".into()))?;
        let author = author.ok_or_else(|| Error::MalformedObject("commit missing author".into()))?;
        let committer =
            committer.ok_or_else(|| Error::MalformedObject("commit missing committer".into()))?;
        let message = text[message_start..].to_owned();

        Ok(Self { tree, parents, author, committer, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;

    fn sig() -> Signature {
        Signature { name: "A".into(), email: "a@b.com".into(), timestamp: 0, offset_minutes: 0 }
    }

    #[test]
    fn root_commit_round_trips() {
        let commit = Commit {
            tree: hash_bytes(b"tree"),
            parents: vec![],
            author: sig(),
            committer: sig(),
            message: "initial commit".into(),
        };
        let encoded = commit.encode();
        assert_eq!(Commit::decode(&encoded).unwrap(), commit);
    }

    #[test]
    fn commit_with_parent_round_trips() {
        let commit = Commit {
            tree: hash_bytes(b"tree2"),
            parents: vec![hash_bytes(b"parent")],
            author: sig(),
            committer: sig(),
            message: "second commit\n\nwith a body".into(),
        };
        let encoded = commit.encode();
        assert_eq!(Commit::decode(&encoded).unwrap(), commit);
    }
}
