use crate::error::AttendanceError;
use crate::gateway::{Collection, PersistenceGateway};
use crate::model::Student;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Students of one section, sorted by class number.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    section: String,
    students: Vec<Student>,
    by_id: HashMap<String, usize>,
}

impl Roster {
    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn get(&self, student_id: &str) -> Option<&Student> {
        self.by_id.get(student_id).map(|&i| &self.students[i])
    }

    pub fn first(&self) -> Option<&Student> {
        self.students.first()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Builds a roster from directory students, keeping only `section`.
    /// A repeated identifier keeps its first occurrence.
    pub fn from_students(section: &str, all: impl IntoIterator<Item = Student>) -> Self {
        let mut students: Vec<Student> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for s in all {
            if s.section != section {
                continue;
            }
            if !seen.insert(s.id.clone()) {
                log::warn!("section {}: duplicate student id {} ignored", section, s.id);
                continue;
            }
            students.push(s);
        }
        students.sort_by(|a, b| {
            parse_class_number(&a.class_number)
                .cmp(&parse_class_number(&b.class_number))
                .then_with(|| a.id.cmp(&b.id))
        });
        let by_id = students
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        Roster {
            section: section.to_string(),
            students,
            by_id,
        }
    }
}

/// Leading-integer parse: optional whitespace and sign, then digits. Anything else is 0.
pub fn parse_class_number(raw: &str) -> i64 {
    let t = raw.trim_start();
    let (negative, rest) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let digits: &str = {
        let end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..end]
    };
    let n = digits.parse::<i64>().unwrap_or(0);
    if negative {
        -n
    } else {
        n
    }
}

fn directory_students(gw: &dyn PersistenceGateway) -> Result<Vec<Student>, AttendanceError> {
    let docs = gw
        .query(Collection::Students)
        .map_err(|e| AttendanceError::Fetch {
            what: "student directory",
            message: e.to_string(),
        })?;
    let mut out = Vec::with_capacity(docs.len());
    for (key, doc) in docs {
        match Student::from_doc(&key, &doc) {
            Ok(s) => out.push(s),
            Err(e) => log::warn!("{}", e),
        }
    }
    Ok(out)
}

/// Reads the whole directory and keeps the students of `section`.
pub fn load_roster(gw: &dyn PersistenceGateway, section: &str) -> Result<Roster, AttendanceError> {
    let students = directory_students(gw)?;
    let roster = Roster::from_students(section, students);
    log::debug!("section {}: {} students loaded", roster.section(), roster.len());
    Ok(roster)
}

/// Distinct non-empty section labels, ascending.
pub fn list_sections(gw: &dyn PersistenceGateway) -> Result<Vec<String>, AttendanceError> {
    let sections: BTreeSet<String> = directory_students(gw)?
        .into_iter()
        .map(|s| s.section)
        .filter(|s| !s.is_empty())
        .collect();
    Ok(sections.into_iter().collect())
}

/// Directory students, optionally narrowed to one section, in roster order.
pub fn list_students(
    gw: &dyn PersistenceGateway,
    section: Option<&str>,
) -> Result<Vec<Student>, AttendanceError> {
    let mut students = directory_students(gw)?;
    if let Some(section) = section {
        return Ok(Roster::from_students(section, students).students);
    }
    students.sort_by(|a, b| {
        a.section
            .cmp(&b.section)
            .then_with(|| {
                parse_class_number(&a.class_number).cmp(&parse_class_number(&b.class_number))
            })
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(students)
}
