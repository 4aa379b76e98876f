use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Defines a string-backed identifier newtype with a prefixed random generator.
macro_rules! define_id {
    ( $( ($name:ident, $prefix:literal) ),* $(,)? ) => {
        $(
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                pub fn new(id: impl Into<String>) -> Self {
                    Self(id.into())
                }

                /// A fresh identifier that cannot collide with any existing one.
                pub fn generate() -> Self {
                    Self(format!("{}-{}", $prefix, Uuid::new_v4().simple()))
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl From<&str> for $name {
                fn from(id: &str) -> Self {
                    Self(id.to_string())
                }
            }

            impl From<String> for $name {
                fn from(id: String) -> Self {
                    Self(id)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

define_id! {
    (NodeId, "node"),
    (CardId, "card"),
    (SuggestionId, "sugg"),
}
