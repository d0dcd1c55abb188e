//! Feed decoding at the merger boundary
//!
//! A feed is accepted only as a whole: a JSON array whose every element
//! decodes into the expected record type. Anything else is rejected before
//! it can touch the working set.

use crate::error::{json_type_name, FeedError, FeedKind};
use crate::types::{LpPosition, PairSnapshot};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a uniform array of records of type `T`
pub fn decode_records<T: DeserializeOwned>(feed: FeedKind, value: Value) -> Result<Vec<T>, FeedError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(FeedError::NotACollection {
                feed,
                found: json_type_name(&other),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| FeedError::MalformedRecord { feed, index, source })
        })
        .collect()
}

/// Decode the base market feed
pub fn decode_base(value: Value) -> Result<Vec<PairSnapshot>, FeedError> {
    decode_records(FeedKind::Base, value)
}

/// Decode the wallet position feed, enforcing `lp_share` ∈ [0, 1]
pub fn decode_wallet(value: Value) -> Result<Vec<LpPosition>, FeedError> {
    let positions: Vec<LpPosition> = decode_records(FeedKind::Wallet, value)?;

    for (index, pos) in positions.iter().enumerate() {
        if let Some(share) = pos.lp_share {
            if !(0.0..=1.0).contains(&share) {
                return Err(FeedError::ShareOutOfRange {
                    feed: FeedKind::Wallet,
                    index,
                    pair: pos.pair_address.to_string(),
                    value: share,
                });
            }
        }
    }

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_base_accepts_array() {
        let value = json!([
            {
                "pair_address": "0xAAA",
                "item_name": "Sword",
                "price_vee": 2.5,
                "reserve_vee": 100,
                "reserve_item": 40,
                "volume_7d_vee": 5000,
                "ts": "2026-01-01T12:00:00Z"
            }
        ]);

        let snaps = decode_base(value).unwrap();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].pair_address.key(), "0xaaa");
        assert_eq!(snaps[0].volume_7d_vee, Some(5000.0));
        assert_eq!(snaps[0].volume_24h_vee, None);
    }

    #[test]
    fn test_decode_rejects_non_array() {
        let err = decode_base(json!({"detail": "boom"})).unwrap_err();
        assert!(matches!(err, FeedError::NotACollection { found: "object", .. }));
    }

    #[test]
    fn test_decode_rejects_mixed_collection() {
        let value = json!([
            {"pair_address": "0x1", "price_vee": 1.0, "ts": "2026-01-01T12:00:00Z"},
            "not a record"
        ]);
        let err = decode_base(value).unwrap_err();
        assert!(matches!(err, FeedError::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn test_decode_wallet_keeps_unknown_earn() {
        let value = json!([
            {"pair_address": "0xaaa", "lp_share": 0.1, "user_vee": 200, "lp_earn_vee_7d": 0}
        ]);
        let positions = decode_wallet(value).unwrap();
        assert_eq!(positions[0].lp_earn_vee_7d, Some(0.0));
        assert_eq!(positions[0].lp_earn_vee_24h, None);
    }

    #[test]
    fn test_decode_wallet_rejects_share_out_of_range() {
        let value = json!([{"pair_address": "0xaaa", "lp_share": 1.5}]);
        let err = decode_wallet(value).unwrap_err();
        assert!(matches!(err, FeedError::ShareOutOfRange { index: 0, .. }));
    }
}
