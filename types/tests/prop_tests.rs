use proptest::prelude::*;

use lumen_types::{MemberAddress, Timestamp};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// plus_secs agrees with saturating addition on the raw seconds.
    #[test]
    fn timestamp_plus_secs(base in 0u64..u64::MAX, add in 0u64..u64::MAX) {
        let t = Timestamp::new(base).plus_secs(add);
        prop_assert_eq!(t.as_secs(), base.saturating_add(add));
    }

    /// elapsed_since(now) = now - self, saturating at zero.
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::new(base);
        let now = Timestamp::new(base + offset);
        prop_assert_eq!(t.elapsed_since(now), offset);
        prop_assert_eq!(now.elapsed_since(t), 0);
    }

    /// Timestamp bincode roundtrip.
    #[test]
    fn timestamp_bincode_roundtrip(secs in 0u64..u64::MAX) {
        let t = Timestamp::new(secs);
        let encoded = bincode::serialize(&t).unwrap();
        let decoded: Timestamp = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, t);
    }

    /// MemberAddress roundtrips through serde and preserves its string.
    #[test]
    fn address_bincode_roundtrip(suffix in "[0-9a-f]{40}") {
        let addr = MemberAddress::new(format!("lmn_{suffix}"));
        let encoded = bincode::serialize(&addr).unwrap();
        let decoded: MemberAddress = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded.as_str(), addr.as_str());
        prop_assert!(addr.is_well_formed());
    }
}
