//! Property-based tests for Page
//!
//! Pages never go below 1 and consecutive pages tile the result set
//! without gaps or overlap.

use proptest::prelude::*;
use docqa::shared::pagination::{Page, DOCUMENTS_PER_PAGE, USERS_PER_PAGE};

proptest! {
    #[test]
    fn test_page_is_at_least_one(raw in any::<i64>()) {
        prop_assert!(Page::new(raw).number() >= 1);
    }

    #[test]
    fn test_offset_is_never_negative(raw in any::<i64>()) {
        let (limit, offset) = Page::new(raw).limit_offset(DOCUMENTS_PER_PAGE);
        prop_assert_eq!(limit, DOCUMENTS_PER_PAGE);
        prop_assert!(offset >= 0);
    }

    #[test]
    fn test_consecutive_pages_tile(n in 1i64..10_000) {
        let (limit, offset) = Page::new(n).limit_offset(USERS_PER_PAGE);
        let (_, next_offset) = Page::new(n + 1).limit_offset(USERS_PER_PAGE);
        prop_assert_eq!(offset + limit, next_offset);
    }
}
