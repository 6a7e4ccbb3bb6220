//! Property-based tests for inbound payload handling

use chatflow::shared::error::require_content;
use chatflow::shared::messaging::ListMessagesParams;
use chatflow::shared::ClientEvent;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_parse_never_panics(text in ".{0,200}") {
        let _ = ClientEvent::parse(&text);
    }

    #[test]
    fn test_whitespace_content_is_rejected(content in "[ \t\r\n]{0,20}") {
        prop_assert!(require_content(&content).is_err());
    }

    #[test]
    fn test_padded_content_is_accepted(word in "[a-z]{1,20}", pad in "[ \t\n]{0,5}") {
        let content = format!("{pad}{word}{pad}");
        prop_assert!(require_content(&content).is_ok());
    }

    #[test]
    fn test_limit_is_clamped(limit in proptest::option::of(0u32..10_000)) {
        let params = ListMessagesParams { limit, offset: None };
        prop_assert!((1..=200).contains(&params.limit()));
    }
}
