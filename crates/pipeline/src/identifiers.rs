//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`BranchName`] with a [`RepositoryId`] even though both are strings under
//! the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or_else(|| {
                    format!("{} must not be empty", stringify!($name))
                })
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (GitHub-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies a GitHub Pull Request by its number within a repository.
    PullRequestNumber
}

u64_id! {
    /// Identifies an issue comment (used for the sticky report comment).
    CommentId
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single tbdocs run (one invocation of the action).
///
/// Generated fresh for every CLI invocation and attached to the root span so
/// all activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (configuration / Git names)
// ---------------------------------------------------------------------------

string_id! {
    /// A Git branch name (e.g. `"main"`, `"tbdocs-bot/docs"`).
    BranchName
}

string_id! {
    /// A Git commit SHA.
    CommitSha
}

string_id! {
    /// Identifies a GitHub repository in `"owner/repo"` format.
    RepositoryId
}

string_id! {
    /// A file-system path relative to the project root.
    ///
    /// Used for entry point files, changed files, and generated docs locations.
    /// Paths always use `/` separators and never start with `./`.
    ArtifactPath
}

string_id! {
    /// Identifies a diagnostic emitted by a docs reporter
    /// (e.g. `"ae-missing-release-tag"`, `"tsdoc-param-tag-missing-hyphen"`).
    MessageId
}

impl RepositoryId {
    /// Splits `"owner/repo"` into its two components.
    ///
    /// Returns `None` if the identifier is not of that shape.
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        let (owner, name) = self.0.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((owner, name))
    }
}

impl ArtifactPath {
    /// Creates a path, normalising `\` separators and a leading `./`.
    ///
    /// Returns `None` if nothing remains after normalisation.
    pub fn normalized(value: impl AsRef<str>) -> Option<Self> {
        let v = value.as_ref().replace('\\', "/");
        let mut v = v.as_str();
        while let Some(rest) = v.strip_prefix("./") {
            v = rest;
        }
        Self::new(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_ids_are_rejected() {
        assert!(BranchName::new("").is_none());
        assert!(serde_json::from_str::<ArtifactPath>("\"\"").is_err());
    }

    #[test]
    fn repository_id_splits_owner_and_name() {
        let repo = RepositoryId::new("TBD54566975/web5-js").unwrap();
        assert_eq!(repo.owner_and_name(), Some(("TBD54566975", "web5-js")));

        let bad = RepositoryId::new("just-a-name").unwrap();
        assert_eq!(bad.owner_and_name(), None);
    }

    #[test]
    fn artifact_paths_are_normalised() {
        let p = ArtifactPath::normalized("./packages\\api\\src/index.ts").unwrap();
        assert_eq!(p.as_str(), "packages/api/src/index.ts");
        assert!(ArtifactPath::normalized("./").is_none());
    }
}
