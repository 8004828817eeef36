//! Placeholder expansion for invitation text.
//!
//! Recognised tokens are `{{guestName}}`, `{{eventName}}`, `{{eventDate}}`,
//! `{{eventLocal}}` and `{{guestId}}`. Anything else between braces is copied
//! through untouched. Expansion is a single left-to-right pass, so values that
//! happen to contain token text are never expanded again.

use serde::Serialize;

use crate::models::{format_event_date, Event, Guest};

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionContext {
    pub guest_name: String,
    pub event_name: String,
    /// Already formatted for display
    pub event_date: String,
    pub event_location: Option<String>,
    pub guest_id: String,
}

impl SubstitutionContext {
    pub fn for_guest(guest: &Guest, event: &Event) -> Self {
        Self {
            guest_name: guest.name.clone(),
            event_name: event.name.clone(),
            event_date: format_event_date(&event.date),
            event_location: event.location().map(str::to_string),
            guest_id: guest.id.clone(),
        }
    }

    fn lookup(&self, token: &str) -> Option<&str> {
        match token {
            "guestName" => Some(&self.guest_name),
            "eventName" => Some(&self.event_name),
            "eventDate" => Some(&self.event_date),
            "eventLocal" => Some(self.event_location.as_deref().unwrap_or("")),
            "guestId" => Some(&self.guest_id),
            _ => None,
        }
    }
}

/// Expands every recognised token in `text`
pub fn substitute(text: &str, ctx: &SubstitutionContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find("}}") {
            Some(end) => match ctx.lookup(&after_open[..end]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after_open[end + 2..];
                }
                None => {
                    // Not ours: emit the braces and keep scanning inside, so
                    // "{{{{guestName}}" still finds the inner token.
                    out.push_str("{{");
                    rest = after_open;
                }
            },
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SubstitutionContext {
        SubstitutionContext {
            guest_name: "Maria".into(),
            event_name: "Festa da Ana".into(),
            event_date: "20 de março de 2025".into(),
            event_location: Some("Salão Encantado".into()),
            guest_id: "g-1".into(),
        }
    }

    #[test]
    fn replaces_every_occurrence_of_each_token() {
        let out = substitute("{{guestName}}, {{guestName}}! {{eventName}} em {{eventLocal}}", &ctx());
        assert_eq!(out, "Maria, Maria! Festa da Ana em Salão Encantado");
    }

    #[test]
    fn leaves_unknown_tokens_alone() {
        assert_eq!(substitute("{{rsvp}} {{eventDate}}", &ctx()), "{{rsvp}} 20 de março de 2025");
        assert_eq!(substitute("open {{guestName", &ctx()), "open {{guestName");
        assert_eq!(substitute("{{{{guestId}}", &ctx()), "{{g-1");
    }

    #[test]
    fn missing_location_is_empty() {
        let mut c = ctx();
        c.event_location = None;
        assert_eq!(substitute("[{{eventLocal}}]", &c), "[]");
    }

    #[test]
    fn does_not_expand_replacement_values() {
        let mut c = ctx();
        c.guest_name = "{{eventName}}".into();
        assert_eq!(substitute("Oi {{guestName}}", &c), "Oi {{eventName}}");
    }

    #[test]
    fn idempotent_once_tokens_are_gone() {
        let once = substitute("Convidado: {{guestName}} ({{guestId}})", &ctx());
        assert_eq!(substitute(&once, &ctx()), once);
    }
}
