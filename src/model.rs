use crate::error::AttendanceError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayType {
    #[default]
    Regular,
    Holiday,
    AlternativeLearningDay,
    Saturday,
    Sunday,
}

impl DayType {
    pub fn code(self) -> &'static str {
        match self {
            Self::Regular => "",
            Self::Holiday => "HOL",
            Self::AlternativeLearningDay => "ILD",
            Self::Saturday => "SAT",
            Self::Sunday => "SUN",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim() {
            "" => Some(Self::Regular),
            "HOL" => Some(Self::Holiday),
            "ILD" => Some(Self::AlternativeLearningDay),
            "SAT" => Some(Self::Saturday),
            "SUN" => Some(Self::Sunday),
            _ => None,
        }
    }

    pub fn is_no_class(self) -> bool {
        self != Self::Regular
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn code(self) -> &'static str {
        match self {
            Self::Present => "P",
            Self::Absent => "A",
            Self::Late => "L",
            Self::Excused => "X",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim() {
            "P" => Some(Self::Present),
            "A" => Some(Self::Absent),
            "L" => Some(Self::Late),
            "X" => Some(Self::Excused),
            _ => None,
        }
    }

    /// Text shown in the status cell and written to saved records.
    pub fn display_text(self) -> &'static str {
        match self {
            Self::Present => "✔",
            Self::Absent => "A",
            Self::Late => "L",
            Self::Excused => "X",
        }
    }

    /// Reads a saved status back into a selection. Excused and day-type codes do not map.
    pub fn from_saved_text(text: &str) -> Option<Self> {
        if text.contains('✔') || text == "P" || text == "V" {
            Some(Self::Present)
        } else if text == "A" || text == "/" {
            Some(Self::Absent)
        } else if text == "L" {
            Some(Self::Late)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConductSlot {
    PrayerLife,
    Relationship,
    Attitude,
}

impl ConductSlot {
    pub const ALL: [ConductSlot; 3] = [Self::PrayerLife, Self::Relationship, Self::Attitude];

    pub fn index(self) -> usize {
        match self {
            Self::PrayerLife => 0,
            Self::Relationship => 1,
            Self::Attitude => 2,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "prayerLife" | "0" => Some(Self::PrayerLife),
            "relationship" | "1" => Some(Self::Relationship),
            "attitude" | "2" => Some(Self::Attitude),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConductField {
    Value,
    Reason,
}

impl ConductField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "value" => Some(Self::Value),
            "reason" => Some(Self::Reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductEntry {
    #[serde(default, deserialize_with = "loose_string")]
    pub value: String,
    #[serde(rename = "valueReason", default, deserialize_with = "loose_string")]
    pub reason: String,
}

/// A Student Directory document. Read-only for the attendance workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "Idnumber", deserialize_with = "loose_string")]
    pub id: String,
    #[serde(rename = "Section", deserialize_with = "loose_string")]
    pub section: String,
    #[serde(rename = "CN", default, deserialize_with = "loose_string")]
    pub class_number: String,
    #[serde(rename = "LastName", default, deserialize_with = "loose_string")]
    pub last_name: String,
    #[serde(rename = "FirstName", default, deserialize_with = "loose_string")]
    pub first_name: String,
    #[serde(
        rename = "passWord",
        default,
        deserialize_with = "loose_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,
    #[serde(
        rename = "schoolYear",
        default,
        deserialize_with = "loose_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub school_year: Option<String>,
    #[serde(
        default,
        deserialize_with = "loose_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub term: Option<String>,
    #[serde(
        default,
        deserialize_with = "loose_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub subject: Option<String>,
}

impl Student {
    pub fn from_doc(key: &str, doc: &Value) -> Result<Self, AttendanceError> {
        let student = Student::deserialize(doc).map_err(|e| AttendanceError::DataShape {
            what: "student",
            key: key.to_string(),
            message: e.to_string(),
        })?;
        if student.id.trim().is_empty() {
            return Err(AttendanceError::DataShape {
                what: "student",
                key: key.to_string(),
                message: "Idnumber is empty".to_string(),
            });
        }
        Ok(student)
    }
}

/// One student row inside a saved attendance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    #[serde(rename = "Idnumber", deserialize_with = "loose_string")]
    pub id: String,
    #[serde(rename = "CN", default, deserialize_with = "loose_string")]
    pub class_number: String,
    #[serde(rename = "LastName", default, deserialize_with = "loose_string")]
    pub last_name: String,
    #[serde(
        rename = "firstName",
        alias = "FirstName",
        default,
        deserialize_with = "loose_string"
    )]
    pub first_name: String,
    #[serde(rename = "fullName", default, deserialize_with = "loose_string")]
    pub full_name: String,
    #[serde(rename = "passWord", default, deserialize_with = "loose_string")]
    pub password: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub status: String,
    #[serde(rename = "conductGrade", default, deserialize_with = "conduct_slots")]
    pub conduct: Vec<Option<ConductEntry>>,
}

/// A persisted attendance document, addressed by [`record_key`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub date: String,
    pub section: String,
    #[serde(rename = "schoolYear")]
    pub school_year: String,
    pub term: String,
    pub subject: String,
    #[serde(rename = "dayType", skip_serializing_if = "Option::is_none")]
    pub day_type: Option<String>,
    pub students: Vec<RecordEntry>,
}

impl AttendanceRecord {
    /// Validates a stored document. Entries without a usable identifier are dropped; a
    /// document without a `students` array is rejected.
    pub fn from_doc(key: &str, doc: &Value) -> Result<Self, AttendanceError> {
        let shape_err = |message: &str| AttendanceError::DataShape {
            what: "attendance",
            key: key.to_string(),
            message: message.to_string(),
        };
        let Some(obj) = doc.as_object() else {
            return Err(shape_err("document is not an object"));
        };
        let Some(raw_students) = obj.get("students").and_then(|v| v.as_array()) else {
            return Err(shape_err("students must be an array"));
        };

        let mut students = Vec::with_capacity(raw_students.len());
        for (i, raw) in raw_students.iter().enumerate() {
            match RecordEntry::deserialize(raw) {
                Ok(entry) if !entry.id.trim().is_empty() => students.push(entry),
                Ok(_) => log::warn!("attendance {}: entry {} has an empty Idnumber", key, i),
                Err(e) => log::warn!("attendance {}: skipping entry {}: {}", key, i, e),
            }
        }

        let text = |k: &str| obj.get(k).map(value_to_text).unwrap_or_default();
        let day_type = Some(text("dayType")).filter(|s| !s.is_empty());
        Ok(AttendanceRecord {
            date: text("date"),
            section: text("section"),
            school_year: text("schoolYear"),
            term: text("term"),
            subject: text("subject"),
            day_type,
            students,
        })
    }
}

/// Document key for the attendance of one section on one date.
pub fn record_key(section: &str, date: &str) -> String {
    format!("{}_{}", section, date)
}

fn value_to_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn loose_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(de)?;
    match v {
        Value::Array(_) | Value::Object(_) => Err(serde::de::Error::custom(
            "expected a string or number",
        )),
        other => Ok(value_to_text(&other)),
    }
}

fn loose_opt_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(de)?;
    match v {
        Value::Null => Ok(None),
        Value::Array(_) | Value::Object(_) => Err(serde::de::Error::custom(
            "expected a string or number",
        )),
        other => Ok(Some(value_to_text(&other))),
    }
}

fn conduct_slots<'de, D>(de: D) -> Result<Vec<Option<ConductEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(de)?;
    let Value::Array(items) = v else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .map(|item| {
            if item.is_object() {
                ConductEntry::deserialize(item).ok()
            } else {
                None
            }
        })
        .collect())
}
