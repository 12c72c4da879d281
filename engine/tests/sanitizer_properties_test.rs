//! Property tests for the output sanitizer
//!
//! The sanitizer's contract holds for arbitrary input, not just the
//! shapes we have seen backends produce: cleaning is total, idempotent,
//! and its output carries no structural artifacts.

use proptest::prelude::*;

use viva_engine::sanitizer::{OutputSanitizer, FALLBACK_REPLY};

fn contains_key_token(text: &str) -> bool {
    // mirror of the artifact definition: "word":
    let re = regex::Regex::new(r#""[A-Za-z_][A-Za-z0-9_]*"\s*:"#).unwrap();
    re.is_match(text)
}

proptest! {
    #[test]
    fn clean_never_panics(input in ".*") {
        let sanitizer = OutputSanitizer::new().unwrap();
        let _ = sanitizer.clean(&input);
    }

    #[test]
    fn clean_is_idempotent(input in ".*") {
        let sanitizer = OutputSanitizer::new().unwrap();
        let once = sanitizer.clean(&input);
        prop_assert_eq!(sanitizer.clean(&once), once);
    }

    #[test]
    fn output_carries_no_key_tokens(input in ".*") {
        let sanitizer = OutputSanitizer::new().unwrap();
        let cleaned = sanitizer.clean(&input);
        prop_assert!(!contains_key_token(&cleaned), "key token in {:?}", cleaned);
    }

    #[test]
    fn output_never_starts_with_a_structural_delimiter(input in ".*") {
        let sanitizer = OutputSanitizer::new().unwrap();
        let cleaned = sanitizer.clean(&input);
        prop_assert!(!cleaned.starts_with('{'), "starts with open brace: {:?}", cleaned);
        prop_assert!(!cleaned.starts_with('['), "starts with open bracket: {:?}", cleaned);
    }

    /// JSON objects wrapping a reply field always surface the reply, not
    /// the wrapper
    #[test]
    fn wrapped_replies_are_unwrapped(reply in "[a-zA-Z ,.?]{1,80}") {
        prop_assume!(!reply.trim().is_empty());
        let sanitizer = OutputSanitizer::new().unwrap();
        let wrapped = format!(r#"{{"reply": "{}"}}"#, reply);
        let cleaned = sanitizer.clean(&wrapped);
        prop_assert_eq!(cleaned, reply.trim().to_string());
    }
}

#[test]
fn fallback_reply_is_itself_clean() {
    let sanitizer = OutputSanitizer::new().unwrap();
    assert_eq!(sanitizer.clean(FALLBACK_REPLY), FALLBACK_REPLY);
}
