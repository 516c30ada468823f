//! Typed ADM element identifiers.
//!
//! Every ADM element carries a textual ID made of a kind prefix followed by one
//! or more underscore separated hexadecimal groups (`AO_1001`,
//! `AT_00031001_01`). The first group is the element's numeric identity value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Element kinds present in an ADM document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Programme,
    Content,
    Object,
    PackFormat,
    ChannelFormat,
    StreamFormat,
    TrackFormat,
    TrackUid,
}

impl ElementKind {
    /// Textual prefix used by IDs of this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            ElementKind::Programme => "APR",
            ElementKind::Content => "ACO",
            ElementKind::Object => "AO",
            ElementKind::PackFormat => "AP",
            ElementKind::ChannelFormat => "AC",
            ElementKind::StreamFormat => "AS",
            ElementKind::TrackFormat => "AT",
            ElementKind::TrackUid => "ATU",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ElementKind::Programme => "audioProgramme",
            ElementKind::Content => "audioContent",
            ElementKind::Object => "audioObject",
            ElementKind::PackFormat => "audioPackFormat",
            ElementKind::ChannelFormat => "audioChannelFormat",
            ElementKind::StreamFormat => "audioStreamFormat",
            ElementKind::TrackFormat => "audioTrackFormat",
            ElementKind::TrackUid => "audioTrackUID",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn parse_value(kind: ElementKind, text: &str) -> Result<u64, DocumentError> {
    let invalid = || DocumentError::InvalidId {
        kind,
        text: text.to_string(),
    };
    let rest = text
        .strip_prefix(kind.prefix())
        .and_then(|rest| rest.strip_prefix('_'))
        .ok_or_else(invalid)?;

    let mut value = None;
    for group in rest.split('_') {
        if group.is_empty() || group.len() > 8 || !group.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        if value.is_none() {
            value = Some(u64::from_str_radix(group, 16).map_err(|_| invalid())?);
        }
    }
    value.ok_or_else(invalid)
}

/// Numeric identity of a leaf track reference: the owning object's value in
/// the high 32 bits, the track UID's in the low 32. IDs spelled differently
/// but carrying the same values share an identity.
pub fn leaf_identity(object: Option<&AudioObjectId>, uid: Option<&AudioTrackUidId>) -> u64 {
    let high = object.map_or(0, |object| object.value() << 32);
    let low = uid.map_or(0, |uid| uid.value() & 0xffff_ffff);
    high | low
}

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name {
            text: String,
            value: u64,
        }

        impl $name {
            pub const KIND: ElementKind = $kind;

            pub fn parse(text: &str) -> Result<Self, DocumentError> {
                let value = parse_value(Self::KIND, text)?;
                Ok(Self {
                    text: text.to_string(),
                    value,
                })
            }

            /// Numeric identity value taken from the first hexadecimal group.
            pub fn value(&self) -> u64 {
                self.value
            }

            pub fn as_str(&self) -> &str {
                &self.text
            }
        }

        impl FromStr for $name {
            type Err = DocumentError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DocumentError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                let parsed = parse_value(Self::KIND, &value)?;
                Ok(Self {
                    text: value,
                    value: parsed,
                })
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.text
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.text)
            }
        }
    };
}

element_id!(
    /// `APR_wwww`
    AudioProgrammeId,
    ElementKind::Programme
);
element_id!(
    /// `ACO_wwww`
    AudioContentId,
    ElementKind::Content
);
element_id!(
    /// `AO_wwww`
    AudioObjectId,
    ElementKind::Object
);
element_id!(
    /// `AP_yyyyxxxx`
    AudioPackFormatId,
    ElementKind::PackFormat
);
element_id!(
    /// `AC_yyyyxxxx`
    AudioChannelFormatId,
    ElementKind::ChannelFormat
);
element_id!(
    /// `AS_yyyyxxxx`
    AudioStreamFormatId,
    ElementKind::StreamFormat
);
element_id!(
    /// `AT_yyyyxxxx_zz`
    AudioTrackFormatId,
    ElementKind::TrackFormat
);
element_id!(
    /// `ATU_xxxxxxxx`
    AudioTrackUidId,
    ElementKind::TrackUid
);
