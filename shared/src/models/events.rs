use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A planned event, owned by the user who created it
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub name: String,
    pub year: i32,
    /// Calendar date as `YYYY-MM-DD`
    pub date: String,
    #[serde(default, rename = "local", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    pub created_at: i64,
}

impl Event {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Location with blank values treated as absent
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.trim().is_empty())
    }
}

const MONTHS_PT_BR: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Formats a `YYYY-MM-DD` date the way invitations print it, e.g.
/// `20 de março de 2025`. Empty input gives an empty string; anything that
/// does not parse is returned unchanged.
pub fn format_event_date(date: &str) -> String {
    let date = date.trim();
    if date.is_empty() {
        return String::new();
    }

    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => format!(
            "{:02} de {} de {}",
            d.day(),
            MONTHS_PT_BR[d.month0() as usize],
            d.year()
        ),
        Err(_) => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_long_portuguese_date() {
        assert_eq!(format_event_date("2025-03-20"), "20 de março de 2025");
        assert_eq!(format_event_date("2024-12-05"), "05 de dezembro de 2024");
    }

    #[test]
    fn empty_and_invalid_dates() {
        assert_eq!(format_event_date(""), "");
        assert_eq!(format_event_date("soon"), "soon");
    }

    #[test]
    fn event_reads_stored_field_names() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "id": "ev-1",
            "userId": "owner-1",
            "name": "Festa",
            "year": 2025,
            "date": "2025-03-20",
            "local": "Salão",
            "createdAt": 1
        }))
        .unwrap();
        assert_eq!(event.owner_id, "owner-1");
        assert_eq!(event.location(), Some("Salão"));
        assert!(event.is_owned_by("owner-1"));
    }
}
