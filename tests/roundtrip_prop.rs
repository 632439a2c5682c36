use icnspack::block::IconBlock;
use icnspack::catalog::IconTag;
use icnspack::container::{encode_container, parse_container, HEADER_LEN};
use proptest::collection::{hash_map, vec};
use proptest::prelude::*;

proptest! {
    // Any non-empty list of unique-tag, non-empty-payload blocks must survive
    // encode → parse with content and order intact.
    #[test]
    fn roundtrip_preserves_blocks(
        entries in hash_map(any::<[u8; 4]>(), vec(any::<u8>(), 1..256), 1..8)
    ) {
        let blocks: Vec<IconBlock> = entries
            .into_iter()
            .map(|(t, payload)| IconBlock { tag: IconTag(t), payload })
            .collect();

        let data = encode_container(&blocks).unwrap();

        let expected: u64 = blocks.iter().map(|b| b.declared_len() as u64).sum::<u64>()
            + HEADER_LEN as u64;
        prop_assert_eq!(data.len() as u64, expected);

        let parsed = parse_container(&data).unwrap();
        prop_assert_eq!(parsed, blocks);
    }

    // Truncating anywhere inside a valid container never parses cleanly.
    #[test]
    fn truncation_is_always_detected(
        payload in vec(any::<u8>(), 1..128),
        cut in 0usize..16,
    ) {
        let blocks = vec![IconBlock { tag: IconTag(*b"ic09"), payload }];
        let data = encode_container(&blocks).unwrap();
        let cut = cut.min(data.len() - 1);
        prop_assert!(parse_container(&data[..data.len() - 1 - cut]).is_err());
    }
}
