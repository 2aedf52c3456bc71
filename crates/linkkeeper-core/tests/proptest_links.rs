use linkkeeper_core::links::{extract_links, normalize_link};
use proptest::prelude::*;

proptest! {
    /// Normalizing twice gives the same result as normalizing once.
    #[test]
    fn normalize_is_idempotent(s in "\\PC*") {
        let once = normalize_link(&s);
        prop_assert_eq!(normalize_link(&once), once);
    }

    /// Trailing slashes, query and fragment never change the canonical form.
    #[test]
    fn query_and_trailing_slash_are_ignored(
        path in "[A-Za-z0-9_]{1,20}",
        query in "[a-z0-9=&]{0,10}",
        fragment in "[a-z0-9]{0,10}",
        slash in proptest::bool::ANY,
    ) {
        let base = format!("https://t.me/{path}");
        let decorated = format!(
            "{base}{}?{query}#{fragment}",
            if slash { "/" } else { "" }
        );
        prop_assert_eq!(normalize_link(&decorated), base.clone());
        prop_assert_eq!(normalize_link(&base), base);
    }

    /// A WhatsApp invite never lands in the Telegram bucket and vice versa.
    #[test]
    fn platforms_are_isolated(
        code in "[A-Za-z0-9]{1,22}",
        prose in "[a-z ]{0,20}",
    ) {
        let invite = format!("https://chat.whatsapp.com/{code}");
        let found = extract_links(&format!("{prose} {invite} {prose}"));
        prop_assert!(found.telegram.is_empty());
        prop_assert_eq!(found.whatsapp, vec![invite]);

        let tg = format!("http://t.me/{code}");
        let found = extract_links(&format!("{prose} {tg}"));
        prop_assert!(found.whatsapp.is_empty());
        prop_assert_eq!(found.telegram, vec![tg]);
    }

    /// Extraction never panics on arbitrary text.
    #[test]
    fn extraction_does_not_crash(s in "\\PC*") {
        let found = extract_links(&s);
        for link in found.telegram.iter().chain(found.whatsapp.iter()) {
            prop_assert!(!link.chars().any(char::is_whitespace));
        }
    }
}
