// tests/path_diff_props.rs

use std::collections::BTreeSet;
use std::path::PathBuf;

use compose_watcher::listener::path_diff;
use proptest::prelude::*;

fn dir_set() -> impl Strategy<Value = BTreeSet<PathBuf>> {
    prop::collection::btree_set("(a|b|c|a/b|a/c|b/a|a/b/c)", 0..5)
        .prop_map(|set| set.into_iter().map(PathBuf::from).collect())
}

proptest! {
    #[test]
    fn applying_the_delta_yields_the_new_set(old in dir_set(), new in dir_set()) {
        let delta = path_diff(&old, &new);

        prop_assert!(delta.added.is_disjoint(&delta.removed));
        prop_assert!(delta.added.iter().all(|p| new.contains(p) && !old.contains(p)));
        prop_assert!(delta.removed.iter().all(|p| old.contains(p) && !new.contains(p)));

        let mut applied = old.clone();
        for p in &delta.removed {
            applied.remove(p);
        }
        applied.extend(delta.added.iter().cloned());
        prop_assert_eq!(applied, new);
    }

    #[test]
    fn diff_against_itself_is_empty(set in dir_set()) {
        prop_assert!(path_diff(&set, &set).is_empty());
    }
}
