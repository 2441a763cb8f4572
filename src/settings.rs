use crate::db;
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

const SETTINGS_KEY: &str = "school_settings.config";

/// Base64 length of a 1 MiB image, the largest logo accepted.
const MAX_LOGO_BASE64_LEN: usize = 4 * ((1024 * 1024 + 2) / 3);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolYear {
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub semesters: Vec<Semester>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolSettings {
    #[serde(rename = "schoolYears", default)]
    pub school_years: Vec<SchoolYear>,
    #[serde(rename = "logoData", default)]
    pub logo_data: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("logo is too large ({0} base64 chars); maximum image size is 1MB")]
    LogoTooLarge(usize),
    #[error("Please setup School Years in Settings first.")]
    NotConfigured,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// School year, semester and term choices for one selection.
///
/// Each level defaults to its first entry when the caller leaves it unset. A selection that
/// names an unknown year or semester yields empty lists below it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TermContext {
    #[serde(rename = "schoolYears")]
    pub school_years: Vec<String>,
    #[serde(rename = "schoolYear")]
    pub school_year: String,
    pub semesters: Vec<String>,
    pub semester: String,
    pub terms: Vec<String>,
    pub term: String,
}

impl SchoolSettings {
    /// Trims every name and drops years, semesters and terms left empty.
    pub fn normalized(self) -> Self {
        let school_years = self
            .school_years
            .into_iter()
            .filter_map(|sy| {
                let year = sy.year.trim().to_string();
                if year.is_empty() {
                    return None;
                }
                let semesters = sy
                    .semesters
                    .into_iter()
                    .filter_map(|sem| {
                        let name = sem.name.trim().to_string();
                        if name.is_empty() {
                            return None;
                        }
                        let terms = sem
                            .terms
                            .iter()
                            .map(|t| t.trim())
                            .filter(|t| !t.is_empty())
                            .map(str::to_string)
                            .collect();
                        Some(Semester { name, terms })
                    })
                    .collect();
                Some(SchoolYear { year, semesters })
            })
            .collect();
        SchoolSettings {
            school_years,
            logo_data: self.logo_data.filter(|l| !l.trim().is_empty()),
            updated_at: self.updated_at,
        }
    }
}

pub fn term_context(
    settings: &SchoolSettings,
    school_year: Option<&str>,
    semester: Option<&str>,
) -> Result<TermContext, SettingsError> {
    let first_year = settings
        .school_years
        .first()
        .ok_or(SettingsError::NotConfigured)?;
    let mut ctx = TermContext {
        school_years: settings.school_years.iter().map(|sy| sy.year.clone()).collect(),
        ..Default::default()
    };

    let year = match school_year.filter(|y| !y.is_empty()) {
        Some(wanted) => settings.school_years.iter().find(|sy| sy.year == wanted),
        None => Some(first_year),
    };
    let Some(year) = year else {
        return Ok(ctx);
    };
    ctx.school_year = year.year.clone();
    ctx.semesters = year.semesters.iter().map(|sem| sem.name.clone()).collect();

    let sem = match semester.filter(|s| !s.is_empty()) {
        Some(wanted) => year.semesters.iter().find(|sem| sem.name == wanted),
        None => year.semesters.first(),
    };
    let Some(sem) = sem else {
        return Ok(ctx);
    };
    ctx.semester = sem.name.clone();
    ctx.terms = sem.terms.clone();
    ctx.term = sem.terms.first().cloned().unwrap_or_default();
    Ok(ctx)
}

fn logo_payload_len(logo: &str) -> usize {
    match logo.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => payload.len(),
        _ => logo.len(),
    }
}

pub fn load(conn: &Connection) -> anyhow::Result<SchoolSettings> {
    match db::settings_get_json(conn, SETTINGS_KEY)? {
        Some(v) => Ok(serde_json::from_value(v)?),
        None => Ok(SchoolSettings::default()),
    }
}

pub fn save(conn: &Connection, incoming: SchoolSettings) -> Result<SchoolSettings, SettingsError> {
    let mut settings = incoming.normalized();
    if let Some(logo) = settings.logo_data.as_deref() {
        let len = logo_payload_len(logo);
        if len > MAX_LOGO_BASE64_LEN {
            return Err(SettingsError::LogoTooLarge(len));
        }
    }
    settings.updated_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
    let value = serde_json::to_value(&settings).map_err(|e| SettingsError::Storage(e.into()))?;
    db::settings_set_json(conn, SETTINGS_KEY, &value)?;
    log::info!("school settings saved ({} school years)", settings.school_years.len());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute(
            "CREATE TABLE settings(key TEXT PRIMARY KEY, value_json TEXT NOT NULL)",
            [],
        )
        .expect("schema");
        conn
    }

    #[test]
    fn normalization_trims_and_drops_blank_names() {
        let raw = SchoolSettings {
            school_years: vec![
                SchoolYear {
                    year: " SY 2024-2025 ".into(),
                    semesters: vec![
                        Semester {
                            name: " 1st Semester".into(),
                            terms: vec!["Term 1 ".into(), "  ".into(), "Term 2".into()],
                        },
                        Semester {
                            name: "   ".into(),
                            terms: vec!["orphan".into()],
                        },
                    ],
                },
                SchoolYear {
                    year: "".into(),
                    semesters: vec![],
                },
            ],
            logo_data: Some("  ".into()),
            updated_at: None,
        };
        let n = raw.normalized();
        assert_eq!(n.school_years.len(), 1);
        assert_eq!(n.school_years[0].year, "SY 2024-2025");
        assert_eq!(n.school_years[0].semesters.len(), 1);
        assert_eq!(n.school_years[0].semesters[0].name, "1st Semester");
        assert_eq!(n.school_years[0].semesters[0].terms, vec!["Term 1", "Term 2"]);
        assert_eq!(n.logo_data, None);
    }

    fn two_years() -> SchoolSettings {
        SchoolSettings {
            school_years: vec![
                SchoolYear {
                    year: "SY 2024-2025".into(),
                    semesters: vec![
                        Semester {
                            name: "1st Semester".into(),
                            terms: vec!["Term 1".into(), "Term 2".into()],
                        },
                        Semester {
                            name: "2nd Semester".into(),
                            terms: vec!["Term 3".into()],
                        },
                    ],
                },
                SchoolYear {
                    year: "SY 2025-2026".into(),
                    semesters: vec![],
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn term_context_defaults_each_level_to_its_first_entry() {
        let ctx = term_context(&two_years(), None, None).expect("context");
        assert_eq!(ctx.school_years, vec!["SY 2024-2025", "SY 2025-2026"]);
        assert_eq!(ctx.school_year, "SY 2024-2025");
        assert_eq!(ctx.semesters, vec!["1st Semester", "2nd Semester"]);
        assert_eq!(ctx.semester, "1st Semester");
        assert_eq!(ctx.terms, vec!["Term 1", "Term 2"]);
        assert_eq!(ctx.term, "Term 1");
    }

    #[test]
    fn term_context_follows_the_selected_semester() {
        let ctx = term_context(&two_years(), Some("SY 2024-2025"), Some("2nd Semester"))
            .expect("context");
        assert_eq!(ctx.semester, "2nd Semester");
        assert_eq!(ctx.terms, vec!["Term 3"]);
        assert_eq!(ctx.term, "Term 3");

        let bare = term_context(&two_years(), Some("SY 2025-2026"), None).expect("context");
        assert_eq!(bare.school_year, "SY 2025-2026");
        assert!(bare.semesters.is_empty());
        assert_eq!(bare.semester, "");
        assert!(bare.terms.is_empty());

        let unknown = term_context(&two_years(), Some("SY 1999"), None).expect("context");
        assert_eq!(unknown.school_year, "");
        assert!(unknown.semesters.is_empty());
        assert_eq!(unknown.school_years.len(), 2);
    }

    #[test]
    fn term_context_requires_school_years() {
        let res = term_context(&SchoolSettings::default(), None, None);
        assert!(matches!(res, Err(SettingsError::NotConfigured)));
    }

    #[test]
    fn missing_settings_load_as_default() {
        let conn = memory_conn();
        assert_eq!(load(&conn).expect("load"), SchoolSettings::default());
    }

    #[test]
    fn oversized_logo_is_rejected() {
        let conn = memory_conn();
        let big = format!("data:image/png;base64,{}", "A".repeat(MAX_LOGO_BASE64_LEN + 4));
        let res = save(
            &conn,
            SchoolSettings {
                logo_data: Some(big),
                ..Default::default()
            },
        );
        assert!(matches!(res, Err(SettingsError::LogoTooLarge(_))));
        assert_eq!(load(&conn).expect("load"), SchoolSettings::default());
    }

    #[test]
    fn saved_settings_are_stamped_and_reloaded() {
        let conn = memory_conn();
        let saved = save(
            &conn,
            SchoolSettings {
                school_years: vec![SchoolYear {
                    year: "SY 2025-2026".into(),
                    semesters: vec![Semester {
                        name: "1st Semester".into(),
                        terms: vec!["Term 1".into()],
                    }],
                }],
                logo_data: Some("data:image/png;base64,AAAA".into()),
                updated_at: None,
            },
        )
        .expect("save");
        assert!(saved.updated_at.is_some());
        assert_eq!(load(&conn).expect("load"), saved);
    }
}
