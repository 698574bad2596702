use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Build an id from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Stable clip identity. Survives every edit except `BladeClip`.
    ClipId
);
string_id!(
    /// Stable track identity.
    TrackId
);
string_id!(
    /// Stable timeline identity.
    TimelineId
);
string_id!(
    /// Stable media/generator asset identity.
    AssetId
);
string_id!(
    /// Capability identifier, e.g. `mv.color_grade`.
    EffectId
);
string_id!(
    /// Kernel identifier resolved by the render engine, e.g. `fx.blur_h`.
    ShaderId
);
