//! Remote repository identity and URL handling

use crate::error::FetchError;
use anyhow::Result;
use core::fmt;
use core::str::FromStr;
use regex::Regex;

/// Host used when a repository is given in `owner/name` form
pub const DEFAULT_HOST: &str = "https://github.com";

/// Owner and name of a remote repository, plus the host serving it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryIdentity {
    owner: String,
    name: String,
    host: String,
}

impl RepositoryIdentity {
    /// Create an identity on the default host
    ///
    /// # Errors
    ///
    /// Returns a configuration error if owner or name is empty, contains a
    /// `/`, whitespace, or other characters not allowed in a path segment
    pub fn new(owner: &str, name: &str) -> Result<Self> {
        validate_segment("owner", owner)?;
        validate_segment("name", name)?;

        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
            host: DEFAULT_HOST.to_owned(),
        })
    }

    /// Serve this repository from another host or base URL
    ///
    /// `file:///srv/git` makes the clone URL `file:///srv/git/<owner>/<name>.git`.
    #[must_use]
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Canonical URL passed to `git clone`
    #[must_use]
    pub fn clone_url(&self) -> String {
        format!("{}/{}/{}.git", self.host, self.owner, self.name)
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryIdentity {
    type Err = anyhow::Error;

    /// Parse `owner/name` or a `https://`, `http://` or `file://` URL whose
    /// last two path segments are the owner and name
    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim();

        if let Some((scheme, rest)) = input.split_once("://") {
            if !matches!(scheme, "https" | "http" | "file") {
                return Err(unsupported(input));
            }

            let rest = rest.trim_end_matches('/');
            let rest = rest.strip_suffix(".git").unwrap_or(rest);
            let mut segments = rest.rsplitn(3, '/');
            let (Some(name), Some(owner), Some(base)) =
                (segments.next(), segments.next(), segments.next())
            else {
                return Err(unsupported(input));
            };

            return Ok(Self::new(owner, name)?.with_host(&format!("{scheme}://{base}")));
        }

        if input.contains(':') {
            return Err(unsupported(input));
        }

        match input.split_once('/') {
            Some((owner, name)) if !name.contains('/') => {
                let name = name.strip_suffix(".git").unwrap_or(name);
                Self::new(owner, name)
            }
            _ => Err(unsupported(input)),
        }
    }
}

fn validate_segment(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(
            FetchError::configuration(format!("Repository {field} cannot be empty")).into(),
        );
    }

    let segment = Regex::new(r"^[A-Za-z0-9_.\-]+$")?;
    if !segment.is_match(value) || value == "." || value == ".." {
        return Err(FetchError::configuration(format!(
            "Invalid repository {field}: '{value}'. \
            Only letters, digits, '-', '_' and '.' are allowed"
        ))
        .into());
    }

    Ok(())
}

fn unsupported(input: &str) -> anyhow::Error {
    FetchError::configuration(format!(
        "Unsupported repository format: '{input}'\n\
        Supported formats:\n\
        - Short: owner/name\n\
        - HTTPS: https://github.com/owner/name.git\n\
        - Local: file:///path/to/owner/name.git"
    ))
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_url_default_host() {
        let repo = RepositoryIdentity::new("verilog-to-routing", "vtr-verilog-to-routing").unwrap();
        assert_eq!(
            repo.clone_url(),
            "https://github.com/verilog-to-routing/vtr-verilog-to-routing.git"
        );
        assert_eq!(repo.to_string(), "verilog-to-routing/vtr-verilog-to-routing");
    }

    #[test]
    fn test_with_host() {
        let repo = RepositoryIdentity::new("acme", "widgets")
            .unwrap()
            .with_host("file:///srv/git/");
        assert_eq!(repo.clone_url(), "file:///srv/git/acme/widgets.git");
    }

    #[test]
    fn test_empty_owner_or_name_rejected() {
        for (owner, name) in [("", "repo"), ("org", ""), ("  ", "repo")] {
            let err = RepositoryIdentity::new(owner, name).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<FetchError>(),
                Some(FetchError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_segments_rejected() {
        assert!(RepositoryIdentity::new("org/sub", "repo").is_err());
        assert!(RepositoryIdentity::new("org", "my repo").is_err());
        assert!(RepositoryIdentity::new("..", "repo").is_err());
    }

    #[test]
    fn test_parse_short_form() {
        let repo: RepositoryIdentity = "acme/widgets".parse().unwrap();
        assert_eq!(repo.owner(), "acme");
        assert_eq!(repo.name(), "widgets");
        assert_eq!(repo.host(), DEFAULT_HOST);

        let repo: RepositoryIdentity = "acme/widgets.git".parse().unwrap();
        assert_eq!(repo.name(), "widgets");
    }

    #[test]
    fn test_parse_urls() {
        let repo: RepositoryIdentity = "https://github.com/acme/widgets".parse().unwrap();
        assert_eq!(repo.clone_url(), "https://github.com/acme/widgets.git");

        let repo: RepositoryIdentity = "https://gitlab.example.com/group/acme/widgets.git"
            .parse()
            .unwrap();
        assert_eq!(repo.host(), "https://gitlab.example.com/group");
        assert_eq!(repo.owner(), "acme");

        let repo: RepositoryIdentity = "file:///tmp/upstream/acme/widgets.git".parse().unwrap();
        assert_eq!(repo.clone_url(), "file:///tmp/upstream/acme/widgets.git");
    }

    #[test]
    fn test_parse_rejects_unsupported() {
        assert!("invalid".parse::<RepositoryIdentity>().is_err());
        assert!("".parse::<RepositoryIdentity>().is_err());
        assert!("too/many/slashes".parse::<RepositoryIdentity>().is_err());
        assert!("git@github.com:acme/widgets.git".parse::<RepositoryIdentity>().is_err());
        assert!("ssh://github.com/widgets".parse::<RepositoryIdentity>().is_err());
    }
}
