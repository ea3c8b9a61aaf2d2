use lazy_static::lazy_static;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};

// This module contains the validated string types which name entities of the
// catalog. They use the newtype pattern for strong type safety: construction
// is permissive (including through serde), and `Validate` reports the exact
// unmatched portion of a value that fails its pattern.

// NAME_CHAR is the restricted ASCII set allowed in entity names.
const NAME_CHAR: &'static str = r"A-Za-z0-9_\-";
// LABEL_CHAR additionally excludes '-': labels double as human-facing
// version handles and sort cleanly.
const LABEL_CHAR: &'static str = r"A-Za-z0-9_";

lazy_static! {
    // NAME is one or more NAME_CHARs.
    static ref NAME: String = ["[", NAME_CHAR, "]+"].concat();
    // NAME_RE is a single name component: catalog, variant, namespace, or
    // collection-schema names, and the segments of a resource path.
    pub static ref NAME_RE: Regex = Regex::new(&NAME).unwrap();
    // PATH_RE is one or more '/'-prefixed NAME components. A trailing '/'
    // is accepted on input and ignored by `ResourcePath::key`.
    static ref PATH_RE: Regex = Regex::new(&["(/", &NAME, ")+/?"].concat()).unwrap();
    // LABEL_RE matches version and workspace labels.
    static ref LABEL_RE: Regex = Regex::new(&["[", LABEL_CHAR, "]+"].concat()).unwrap();
    // SCOPE_ID_RE matches tenant and project identifiers, which are capped
    // at ten characters.
    static ref SCOPE_ID_RE: Regex = Regex::new(&["[", NAME_CHAR, "]{1,10}"].concat()).unwrap();
}

macro_rules! scoped_name_types {
    (
        $(#[$outer:meta])*
        $vis:vis struct $Wrapper:ident(pattern = $Regex:ident);

        $($rest:tt)*
    ) => {

        $(#[$outer])*
        #[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, JsonSchema, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "sqlx-support", derive(sqlx::Decode, sqlx::Encode))]
        pub struct $Wrapper(String);

        impl $Wrapper {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
            pub fn regex() -> &'static Regex {
                &$Regex
            }
        }

        impl std::ops::Deref for $Wrapper {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $Wrapper {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Into<String> for $Wrapper {
            fn into(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $Wrapper {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl Validate for $Wrapper {
            fn validate(&self) -> Result<(), ValidationErrors> {
                let s = self.0.as_ref();

                let unmatched = match $Regex.find(s) {
                    Some(m) if m.start() == 0 && m.end() == s.len() => None, // Full match.
                    Some(m) => Some([&s[..m.start()], &s[m.end()..]].concat()), // Partial match.
                    None => Some(s.to_string()), // No match.
                };

                if let Some(unmatched) = unmatched {
                    let mut errors = ValidationErrors::new();
                    errors.add(
                        "",
                        ValidationError {
                            code: "pattern mismatch".into(),
                            message: Some(format!(
                                "{:?} doesn't match pattern {} (unmatched portion is: {:?})",
                                s, $Regex.to_string(), unmatched,
                            ).into()),
                            params: std::collections::HashMap::new(),
                        },
                    );
                    Err(errors)
                } else {
                    Ok(())
                }
            }
        }

        #[cfg(feature = "sqlx-support")]
        impl sqlx::Type<sqlx::Postgres> for $Wrapper {
            fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }

        scoped_name_types! {
            $($rest)*
        }
    };

    () => {};
}

scoped_name_types! {
    /// Name is a single component of ASCII letters, numbers, '-' or '_'.
    /// Catalogs, variants, parameters and collection schemas carry one.
    pub struct Name(pattern = NAME_RE);

    /// Namespace partitions the collections of a variant. It shares the
    /// Name production; the tombstone literal used by workspace overlays is
    /// reserved and never validates.
    pub struct Namespace(pattern = NAME_RE);

    /// Label is an optional human-facing handle on a version or workspace,
    /// unique within its variant when present.
    pub struct Label(pattern = LABEL_RE);

    /// ResourcePath locates an object inside a schema directory: one or
    /// more '/'-separated Name segments with a mandatory leading slash.
    pub struct ResourcePath(pattern = PATH_RE);

    /// TenantId is the short identifier of an onboarded tenant.
    pub struct TenantId(pattern = SCOPE_ID_RE);

    /// ProjectId is the short identifier of a project within a tenant.
    pub struct ProjectId(pattern = SCOPE_ID_RE);
}

impl ResourcePath {
    /// The canonical directory key for this path: the validated input with
    /// any trailing '/' removed.
    pub fn key(&self) -> &str {
        self.0.strip_suffix('/').unwrap_or(&self.0)
    }

    /// The final segment of the path.
    pub fn leaf(&self) -> &str {
        self.key().rsplit('/').next().unwrap_or("")
    }

    /// The path with its final segment removed; empty for a root-level path.
    pub fn parent(&self) -> &str {
        let key = self.key();
        match key.rfind('/') {
            Some(at) => &key[..at],
            None => "",
        }
    }
}
