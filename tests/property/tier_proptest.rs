//! Property-based tests for AccountTier
//!
//! Authorization relies on the derived order; these pin it to the
//! Basic < Premium < Moderator ranking.

use proptest::prelude::*;
use docqa::shared::AccountTier;

fn tier() -> impl Strategy<Value = AccountTier> {
    prop::sample::select(AccountTier::ALL.to_vec())
}

fn rank(tier: AccountTier) -> usize {
    match tier {
        AccountTier::Basic => 0,
        AccountTier::Premium => 1,
        AccountTier::Moderator => 2,
    }
}

proptest! {
    #[test]
    fn test_allows_matches_rank(user in tier(), required in tier()) {
        prop_assert_eq!(user.allows(required), rank(user) >= rank(required));
    }

    #[test]
    fn test_parse_accepts_any_case(tier in tier(), upper in any::<bool>()) {
        let raw = if upper {
            tier.as_str().to_string()
        } else {
            tier.as_str().to_lowercase()
        };
        prop_assert_eq!(raw.parse::<AccountTier>().ok(), Some(tier));
    }

    #[test]
    fn test_parse_rejects_unknown_names(raw in "[a-z]{1,12}") {
        prop_assume!(!["basic", "premium", "moderator"].contains(&raw.as_str()));
        prop_assert!(raw.parse::<AccountTier>().is_err());
    }

    #[test]
    fn test_serde_matches_storage_form(tier in tier()) {
        let json = serde_json::to_string(&tier).unwrap();
        prop_assert_eq!(json, format!("\"{}\"", tier.as_str()));
    }
}
