//! Back-reference token codec.
//!
//! A task's link to its originating lead is a parseable marker embedded in
//! the card's free-text notes; there is no foreign-key field on the board.
//! If the board ever truncates a description the token is simply lost and
//! the task becomes untracked. Known limitation.

/// Literal marker preceding the lead id in a task's notes.
pub const LEAD_ID_MARKER: &str = "LeadID:";

/// Builds the notes text for a new task, with the lead id token on the
/// first line.
pub fn embed_lead_id(lead_id: &str, notes: &str) -> String {
    format!("{LEAD_ID_MARKER} {lead_id}\n{notes}")
}

/// Recovers a lead id from free-text notes.
///
/// Takes the text after the LAST occurrence of the marker, trims it, and
/// keeps the first line. Returns `None` when the marker is absent or
/// nothing usable follows it.
pub fn extract_lead_id(notes: &str) -> Option<String> {
    let (_, tail) = notes.rsplit_once(LEAD_ID_MARKER)?;
    let id = tail.trim().lines().next()?.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn extracts_from_embedded_notes() {
        let notes = embed_lead_id("L1", "Email: a@x.com\nSource: web");
        assert_eq!(notes, "LeadID: L1\nEmail: a@x.com\nSource: web");
        assert_eq!(extract_lead_id(&notes), Some("L1".to_string()));
    }

    #[test]
    fn missing_marker_yields_none() {
        assert_eq!(extract_lead_id("just some notes"), None);
        assert_eq!(extract_lead_id(""), None);
    }

    #[test]
    fn bare_marker_yields_none() {
        assert_eq!(extract_lead_id("LeadID:"), None);
        assert_eq!(extract_lead_id("LeadID:   \n"), None);
    }

    #[test]
    fn last_occurrence_wins() {
        let notes = "LeadID: L1\nsome text\nLeadID: L2\ntrailing";
        assert_eq!(extract_lead_id(notes), Some("L2".to_string()));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            extract_lead_id("prefix LeadID:   L42  \nmore"),
            Some("L42".to_string())
        );
    }

    proptest! {
        #[test]
        fn embed_extract_round_trip(
            lead_id in "[A-Za-z0-9_-]{1,40}",
            notes in "[A-Za-z0-9 @.:\\n-]{0,120}",
        ) {
            prop_assume!(!notes.contains(LEAD_ID_MARKER));
            let embedded = embed_lead_id(&lead_id, &notes);
            prop_assert_eq!(extract_lead_id(&embedded), Some(lead_id));
        }
    }
}
