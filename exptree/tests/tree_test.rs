use std::collections::HashMap;

use exptree::eytzinger;
use exptree::Tree;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_case::test_case;

#[test]
fn s1_three_inserts_distinct_keys() {
    let mut t = Tree::<i64, char>::new();
    t.put(10, 'a').unwrap();
    t.put(20, 'b').unwrap();
    t.put(5, 'c').unwrap();

    assert_eq!(t.get(&5), Some('c'));
    assert_eq!(t.get(&10), Some('a'));
    assert_eq!(t.get(&20), Some('b'));
    assert_eq!(t.get(&7), None);
}

#[test]
fn s2_replace_returns_true_and_updates_value() {
    let mut t = Tree::<i64, i64>::new();
    assert_eq!(t.put(1, 100).unwrap(), false);
    assert_eq!(t.put(1, 200).unwrap(), true);
    assert_eq!(t.get(&1), Some(200));
}

#[test]
fn s3_triggering_internal_split_off_by_one_regression() {
    let pairs: [(i64, i64); 5] = [
        (1252075908893741079, 3354519622996530995),
        (-9122029241647599558, -8875707323772236480),
        (3066288812951245061, 3382948815761252436),
        (8638083922624639840, -5998269892568312676),
        (-231486179338831356, 1835017602961901510),
    ];
    let mut t = Tree::<i64, i64>::new();
    for &(k, v) in &pairs {
        t.put(k, v).unwrap();
    }
    for &(k, v) in &pairs {
        assert_eq!(t.get(&k), Some(v), "key {k} should be retrievable");
    }
}

#[test]
fn s4_triggering_leaf_split_second_regression() {
    let keys: [i64; 5] = [
        8741602964818778106,
        698897563146389788,
        3579074129189551850,
        -2188343147285029592,
        -5102797669907719704,
    ];
    let mut t = Tree::<i64, i64>::new();
    for (i, &k) in keys.iter().enumerate() {
        t.put(k, i as i64).unwrap();
    }
    for (i, &k) in keys.iter().enumerate() {
        assert_eq!(t.get(&k), Some(i as i64));
    }
}

#[test_case(1 ; "seed_1")]
#[test_case(2 ; "seed_2")]
#[test_case(42 ; "seed_42")]
fn s5_random_fuzz_ten_thousand_pairs(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model: HashMap<i64, i64> = HashMap::new();
    let mut t = Tree::<i64, i64>::new();

    for _ in 0..10_000 {
        let k: i64 = rng.gen();
        let v: i64 = rng.gen();
        t.put(k, v).unwrap();
        model.insert(k, v);
    }

    for (&k, &v) in &model {
        assert_eq!(t.get(&k), Some(v), "last-written value for {k} must be retrievable");
    }

    let mut misses = 0u32;
    for _ in 0..10_000 {
        let k: i64 = rng.gen();
        if !model.contains_key(&k) {
            assert_eq!(t.get(&k), None);
            misses += 1;
        }
    }
    assert!(misses > 0, "random non-inserted probes should mostly miss");

    let bytes_used = t.bytes_used();
    assert!(bytes_used > 0);
    // O(n * entry_size): generous upper bound, well above any plausible
    // per-entry overhead for i64/i64 leaf and internal nodes.
    assert!(bytes_used < model.len() * 4096);
}

#[test_case(0, 31, 15 ; "len_31_i_0")]
#[test_case(12, 31, 21 ; "len_31_i_12")]
#[test_case(15, 31, 0 ; "len_31_i_15")]
fn s6_from_linear_spot_checks(i: usize, len: usize, expected_e: usize) {
    assert_eq!(eytzinger::from_linear(i, len), expected_e);
}

#[test_case(8, 511, 95 ; "len_511_e_8")]
#[test_case(2014, 4095, 3965 ; "len_4095_e_2014")]
fn s6_to_linear_spot_checks(e: usize, len: usize, expected_i: usize) {
    assert_eq!(eytzinger::to_linear(e, len), expected_i);
}

#[test]
fn idempotence_of_replace() {
    let mut once = Tree::<i64, i64>::new();
    once.put(7, 1).unwrap();
    once.put(7, 2).unwrap();

    let mut twice = Tree::<i64, i64>::new();
    twice.put(7, 1).unwrap();
    twice.put(7, 2).unwrap();
    twice.put(7, 2).unwrap();

    assert_eq!(once.get(&7), twice.get(&7));
}

#[test]
fn dropping_a_tree_does_not_panic_with_many_live_nodes() {
    let mut t = Tree::<i64, i64>::new();
    for i in 0..5_000i64 {
        t.put(i, i).unwrap();
    }
    drop(t);
}

#[test]
fn round_trip_indexing_up_to_a_few_thousand() {
    for len in 1..=4096usize {
        for i in (0..len).step_by((len / 37).max(1)) {
            let e = eytzinger::from_linear(i, len);
            assert_eq!(eytzinger::to_linear(e, len), i);
        }
    }
}

#[test]
fn ordering_invariant_holds_after_many_inserts() {
    let mut rng = StdRng::seed_from_u64(1234);
    let mut t = Tree::<i64, i64>::new();
    let mut keys: Vec<i64> = Vec::new();
    for _ in 0..2_000 {
        let k: i64 = rng.gen_range(-10_000..10_000);
        t.put(k, k * 2).unwrap();
        keys.push(k);
    }
    keys.sort_unstable();
    keys.dedup();
    for k in keys {
        assert_eq!(t.get(&k), Some(k * 2));
    }
}
