use formkit_rust::{decode, decode_query, encode, encode_query, FormValue};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn key_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just("a"),
        Just("b"),
        Just("foo"),
        Just("bar"),
        Just("name"),
        Just("items"),
        Just("first-name"),
        Just("user_id"),
        Just("prénom"),
    ]
    .prop_map(str::to_string)
    .boxed()
}

fn leaf_strategy() -> BoxedStrategy<FormValue> {
    prop_oneof![
        Just(String::new()),
        Just("bar1".to_string()),
        Just("a b".to_string()),
        Just("x&y=z".to_string()),
        Just("50%".to_string()),
        Just("日本語".to_string()),
        any::<u16>().prop_map(|v| v.to_string()),
    ]
    .prop_map(FormValue::String)
    .boxed()
}

/// Trees without empty containers: those flatten to nothing and cannot
/// come back.
fn node_strategy() -> BoxedStrategy<FormValue> {
    leaf_strategy()
        .prop_recursive(4, 48, 4, |inner| {
            prop_oneof![
                vec(inner.clone(), 1..4).prop_map(FormValue::Array),
                btree_map(key_strategy(), inner, 1..4).prop_map(FormValue::Object),
            ]
        })
        .boxed()
}

fn root_strategy() -> BoxedStrategy<FormValue> {
    btree_map(key_strategy(), node_strategy(), 0..5)
        .prop_map(FormValue::Object)
        .boxed()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn flatten_then_build_restores_tree(tree in root_strategy()) {
        let entries = decode(&tree).expect("tree should flatten");
        let rebuilt = encode(&entries).expect("flattened names should build");
        prop_assert_eq!(rebuilt, tree);
    }

    #[test]
    fn query_string_round_trip(tree in root_strategy()) {
        let query = decode_query(&tree).expect("tree should encode as a query");
        let rebuilt = encode_query(&query).expect("query should decode");
        prop_assert_eq!(rebuilt, tree);
    }

    #[test]
    fn flattened_names_are_unique(tree in root_strategy()) {
        let entries = decode(&tree).expect("tree should flatten");
        let mut names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        prop_assert_eq!(names.len(), total);
    }
}
