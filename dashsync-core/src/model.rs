//! The canonical dashboard model.
//!
//! Field names on the wire follow the persisted JSON schema shared with the
//! dashboard page (`aniversariosPessoais`, `nome`, `depto`, ...). Records are
//! plain values: nothing identifies "the same" entry across a collect/apply
//! cycle.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::normalize::{clean, clean_day_month};

/// A personal birthday (no year, recurs annually).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonalBirthday {
    #[serde(rename = "nome", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "depto", default, deserialize_with = "lenient_string")]
    pub department: String,
    /// `DD/MM`
    #[serde(rename = "data", default, deserialize_with = "lenient_string")]
    pub date: String,
}

/// A company anniversary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompanyAnniversary {
    #[serde(rename = "nome", default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Accepts a JSON number or a numeric string; always written as a number.
    #[serde(rename = "anos", default, deserialize_with = "lenient_years")]
    pub years_of_service: u32,
    /// `DD/MM`
    #[serde(rename = "data", default, deserialize_with = "lenient_string")]
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Priority {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "alta")]
    High,
}

impl Priority {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "alta" | "high" => Priority::High,
            _ => Priority::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "alta",
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.map(|l| Priority::from_label(&l)).unwrap_or_default())
    }
}

/// A news item. List order is insertion order, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(rename = "titulo", default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(rename = "conteudo", default, deserialize_with = "lenient_string")]
    pub body: String,
    #[serde(rename = "autor", default, deserialize_with = "lenient_string")]
    pub author: String,
    /// Free-form localized date (e.g. `16/10/2026`).
    #[serde(rename = "data", default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(rename = "prioridade", default)]
    pub priority: Priority,
}

/// A company event. Events are edited through a side channel, not the view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "nome", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "descricao", default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(rename = "local", default, deserialize_with = "lenient_string")]
    pub location: String,
    /// ISO-8601 start time as entered.
    #[serde(rename = "data", default, deserialize_with = "lenient_string")]
    pub timestamp: String,
}

/// Root aggregate: the four collections plus the last persist time.
///
/// A list missing from the input deserializes as empty (as does `null`), and
/// a missing `lastUpdated` becomes the current time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "aniversariosPessoais", default, deserialize_with = "null_as_empty")]
    pub birthdays: Vec<PersonalBirthday>,
    #[serde(rename = "aniversariosEmpresa", default, deserialize_with = "null_as_empty")]
    pub anniversaries: Vec<CompanyAnniversary>,
    #[serde(rename = "noticias", default, deserialize_with = "null_as_empty")]
    pub news: Vec<NewsItem>,
    #[serde(rename = "eventos", default, deserialize_with = "null_as_empty")]
    pub events: Vec<Event>,
    #[serde(rename = "lastUpdated", default = "timestamp_now", with = "iso_millis")]
    pub last_updated: DateTime<Utc>,
}

impl Default for Model {
    fn default() -> Self {
        Model::empty()
    }
}

impl Model {
    pub fn empty() -> Self {
        Model {
            birthdays: Vec::new(),
            anniversaries: Vec::new(),
            news: Vec::new(),
            events: Vec::new(),
            last_updated: timestamp_now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.birthdays.is_empty()
            && self.anniversaries.is_empty()
            && self.news.is_empty()
            && self.events.is_empty()
    }

    pub fn len_of(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Birthdays => self.birthdays.len(),
            EntityKind::Anniversaries => self.anniversaries.len(),
            EntityKind::News => self.news.len(),
            EntityKind::Events => self.events.len(),
        }
    }

    /// Advance `last_updated` to `now`, never moving it backwards.
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        let now = now.trunc_subsecs(3);
        if now > self.last_updated {
            self.last_updated = now;
        }
    }

    /// Undo any decoration that slipped into stored names and dates.
    pub fn clean_stored(&mut self) {
        for person in &mut self.birthdays {
            person.name = clean(&person.name);
            person.date = clean_day_month(&person.date);
        }
        for person in &mut self.anniversaries {
            person.name = clean(&person.name);
            person.date = clean_day_month(&person.date);
        }
    }
}

/// The four collections, used to address hooks and change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Birthdays,
    Anniversaries,
    News,
    Events,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Birthdays,
        EntityKind::Anniversaries,
        EntityKind::News,
        EntityKind::Events,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            EntityKind::Birthdays => "birthdays",
            EntityKind::Anniversaries => "anniversaries",
            EntityKind::News => "news",
            EntityKind::Events => "events",
        };
        write!(f, "{}", label)
    }
}

/// Current time at the millisecond precision the wire format carries.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Strings written by the admin panel can come back as `null` or numbers.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

fn lenient_years<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                u32::try_from(v).map_err(|_| D::Error::custom(format!("years out of range: {v}")))
            } else if let Some(f) = n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0) {
                Ok(f as u32)
            } else {
                Err(D::Error::custom(format!("invalid years of service: {n}")))
            }
        }
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0);
            }
            trimmed
                .parse::<u32>()
                .map_err(|_| D::Error::custom(format!("invalid years of service: '{s}'")))
        }
        other => Err(D::Error::custom(format!("invalid years of service: {other}"))),
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| serde::de::Error::custom(format!("invalid lastUpdated '{raw}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deserialize_schema_example() {
        let json = r#"{
            "aniversariosPessoais": [{"nome":"Ana Silva","depto":"TI","data":"05/03"}],
            "aniversariosEmpresa":  [{"nome":"Carlos Souza","anos":5,"data":"12/07"}],
            "noticias": [{"titulo":"T", "conteudo":"C", "autor":"A", "data":"01/09/2024", "prioridade":"normal"}],
            "eventos": [{"nome":"N", "descricao":"D", "local":"L", "data":"2024-09-01T10:00:00.000Z"}],
            "lastUpdated": "2024-09-01T09:00:00.000Z"
        }"#;

        let model: Model = serde_json::from_str(json).unwrap();
        assert_eq!(model.birthdays[0].department, "TI");
        assert_eq!(model.anniversaries[0].years_of_service, 5);
        assert_eq!(model.news[0].priority, Priority::Normal);
        assert_eq!(model.events[0].location, "L");
        assert_eq!(
            model.last_updated,
            Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_years_accepts_numeric_string_and_null() {
        let a: CompanyAnniversary =
            serde_json::from_str(r#"{"nome":"X","anos":"7","data":"01/01"}"#).unwrap();
        assert_eq!(a.years_of_service, 7);

        let b: CompanyAnniversary =
            serde_json::from_str(r#"{"nome":"X","anos":null,"data":"01/01"}"#).unwrap();
        assert_eq!(b.years_of_service, 0);

        let bad = serde_json::from_str::<CompanyAnniversary>(r#"{"anos":"sete"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_years_serialize_as_number() {
        let a = CompanyAnniversary {
            name: "X".into(),
            years_of_service: 3,
            date: "01/02".into(),
        };
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["anos"], serde_json::json!(3));
    }

    #[test]
    fn test_priority_labels() {
        let high: NewsItem = serde_json::from_str(r#"{"prioridade":"alta"}"#).unwrap();
        assert_eq!(high.priority, Priority::High);
        let english: NewsItem = serde_json::from_str(r#"{"prioridade":"high"}"#).unwrap();
        assert_eq!(english.priority, Priority::High);
        let other: NewsItem = serde_json::from_str(r#"{"prioridade":"urgente"}"#).unwrap();
        assert_eq!(other.priority, Priority::Normal);
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), "alta");
    }

    #[test]
    fn test_null_fields_become_empty() {
        let p: PersonalBirthday =
            serde_json::from_str(r#"{"nome":null,"depto":null,"data":"01/02"}"#).unwrap();
        assert_eq!(p.name, "");
        assert_eq!(p.department, "");

        let m: Model = serde_json::from_str(r#"{"noticias":null}"#).unwrap();
        assert!(m.news.is_empty());
    }

    #[test]
    fn test_last_updated_serializes_with_millis() {
        let mut m = Model::empty();
        m.last_updated = Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap();
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["lastUpdated"], "2024-09-01T09:00:00.000Z");
    }

    #[test]
    fn test_stamp_never_moves_backwards() {
        let mut m = Model::empty();
        let later = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        m.last_updated = later;
        m.stamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(m.last_updated, later);

        let even_later = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();
        m.stamp(even_later);
        assert_eq!(m.last_updated, even_later);
    }

    #[test]
    fn test_clean_stored_removes_decorations() {
        let mut m = Model::empty();
        m.birthdays.push(PersonalBirthday {
            name: "Ana Hoje! 16/10".into(),
            department: "TI".into(),
            date: "16/10 Hoje!".into(),
        });
        m.anniversaries.push(CompanyAnniversary {
            name: "🏆 Carlos".into(),
            years_of_service: 2,
            date: "1/2".into(),
        });
        m.clean_stored();
        assert_eq!(m.birthdays[0].name, "Ana");
        assert_eq!(m.birthdays[0].date, "16/10");
        assert_eq!(m.anniversaries[0].name, "Carlos");
        assert_eq!(m.anniversaries[0].date, "01/02");
    }
}
