use std::collections::BTreeSet;

use spanscore::codec::tagging::{decode_document, encode_mentions};
use spanscore::codec::EncodeOptions;
use spanscore::ir::{Document, DocumentField, Mention};
use spanscore::merge::{merge_all, merge_documents};

use proptest::prelude::*;

mod proptest_helpers;

use proptest_helpers::{mention_set, relation_set};

fn with_mentions(document: &Document, mentions: Vec<Mention>) -> Document {
    document
        .copy(&[
            DocumentField::Mentions,
            DocumentField::Entities,
            DocumentField::Relations,
        ])
        .with_mentions(mentions)
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn tagged_roundtrip_preserves_mentions(doc in proptest_helpers::arb_document(24)) {
        let text = encode_mentions(&doc, &EncodeOptions::default());
        let decoded = decode_document(&doc, &text).expect("decode encoded text");

        prop_assert!(decoded.report.is_clean());
        prop_assert_eq!(mention_set(&decoded.document), mention_set(&doc));
        prop_assert_eq!(&decoded.document.tokens, &doc.tokens);
        prop_assert!(decoded.document.relations.is_empty());
    }

    #[test]
    fn filtered_roundtrip_keeps_selected_types(doc in proptest_helpers::arb_document(24)) {
        let opts = EncodeOptions::default()
            .with_filter(["actor", "activity data"])
            .with_ids();
        let text = encode_mentions(&doc, &opts);
        let decoded = decode_document(&doc, &text).expect("decode encoded text");

        let expected: BTreeSet<Mention> = doc
            .mentions
            .iter()
            .filter(|m| m.mention_type == "actor" || m.mention_type == "activity data")
            .cloned()
            .collect();
        prop_assert_eq!(mention_set(&decoded.document), expected);
    }

    #[test]
    fn merge_with_itself_is_identity(doc in proptest_helpers::arb_document(24)) {
        let merged = merge_documents(&doc, &doc).expect("merge");
        prop_assert_eq!(merged, doc);
    }

    #[test]
    fn merging_split_mentions_is_order_independent(doc in proptest_helpers::arb_document(24)) {
        let (even, odd): (Vec<_>, Vec<_>) = doc
            .mentions
            .iter()
            .cloned()
            .enumerate()
            .partition(|(i, _)| i % 2 == 0);
        let a = with_mentions(&doc, even.into_iter().map(|(_, m)| m).collect());
        let b = with_mentions(&doc, odd.into_iter().map(|(_, m)| m).collect());

        let ab = merge_all([&a, &b]).expect("merge a, b");
        let ba = merge_all([&b, &a]).expect("merge b, a");

        prop_assert_eq!(mention_set(&ab), mention_set(&doc));
        prop_assert_eq!(mention_set(&ba), mention_set(&doc));
    }

    #[test]
    fn merging_pipeline_steps_restores_relations(doc in proptest_helpers::arb_document(24)) {
        let mentions_step = doc.copy(&[DocumentField::Entities, DocumentField::Relations]);
        let relations_step = doc.copy(&[DocumentField::Entities]);

        let forward = merge_all([&mentions_step, &relations_step]).expect("merge forward");
        let backward = merge_all([&relations_step, &mentions_step]).expect("merge backward");

        prop_assert_eq!(mention_set(&forward), mention_set(&doc));
        prop_assert_eq!(relation_set(&forward), relation_set(&doc));
        prop_assert_eq!(relation_set(&backward), relation_set(&doc));
        forward.validate_references().expect("merged references are valid");
    }
}
