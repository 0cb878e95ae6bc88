use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Identifier fallback sent when the server did not tag the case.
pub const DEFAULT_CASE_ID: &str = "current";

/// Accepts either a JSON string or a JSON number and keeps its textual form.
/// `null` reads as an empty id.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;

    impl de::Visitor<'_> for Visitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(Visitor)
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                string_or_number(deserializer).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(CaseId);
id_newtype!(QuestionId);

impl Default for CaseId {
    fn default() -> Self {
        Self(DEFAULT_CASE_ID.to_string())
    }
}

/// How the questions attached to a case are put in front of the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    /// Sequential when the case carries `questions`, batched otherwise.
    #[default]
    Auto,
    Sequential,
    Batched,
}

impl std::str::FromStr for PresentationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "sequential" => Ok(Self::Sequential),
            "batched" => Ok(Self::Batched),
            other => Err(format!("unknown presentation mode '{other}'")),
        }
    }
}

/// The five narrative sections of a case, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CaseSection {
    PatientInfo,
    PresentingComplaint,
    History,
    Examination,
    Vitals,
}

impl CaseSection {
    pub const ALL: [CaseSection; 5] = [
        CaseSection::PatientInfo,
        CaseSection::PresentingComplaint,
        CaseSection::History,
        CaseSection::Examination,
        CaseSection::Vitals,
    ];

    pub fn title(self) -> &'static str {
        match self {
            CaseSection::PatientInfo => "Patient Information",
            CaseSection::PresentingComplaint => "Presenting Complaint",
            CaseSection::History => "Medical History",
            CaseSection::Examination => "Examination Findings",
            CaseSection::Vitals => "Vital Signs",
        }
    }

    pub fn expanded_by_default(self) -> bool {
        matches!(
            self,
            CaseSection::PatientInfo | CaseSection::PresentingComplaint
        )
    }
}
