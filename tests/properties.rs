//! Property tests over ring geometry and attachment point identity.

use proptest::prelude::*;

use apgraph::{Ap, Ring, UniqueApMap, Vertex};

fn ring_of(n: usize) -> (Ring, Vec<Vertex>) {
    let vs: Vec<Vertex> = (0..n).map(|_| Vertex::new_empty()).collect();
    (Ring::from_vertices(vs.clone()), vs)
}

fn owned_ap(holder: &mut Vec<Vertex>, atom_pos: usize, class: &str) -> Ap {
    let v = Vertex::new_empty();
    let ap = v.add_ap_full(Some(atom_pos), None, Some(class.parse().unwrap()));
    holder.push(v);
    ap
}

proptest! {
    #[test]
    fn ring_distance_is_symmetric(n in 2usize..12, i in 0usize..64, j in 0usize..64) {
        let (ring, vs) = ring_of(n);
        let a = &vs[i % n];
        let b = &vs[j % n];
        let d_ab = ring.distance(a, b).unwrap();
        let d_ba = ring.distance(b, a).unwrap();
        prop_assert_eq!(d_ab, d_ba);
        prop_assert!(d_ab < n);
    }

    #[test]
    fn closer_to_never_returns_a_non_member(
        n in 2usize..10,
        i in 0usize..64,
        j in 0usize..64,
        t in 0usize..64,
        outsider_a in any::<bool>(),
        outsider_b in any::<bool>(),
    ) {
        let (ring, vs) = ring_of(n);
        let stranger_a = Vertex::new_empty();
        let stranger_b = Vertex::new_empty();
        let a = if outsider_a { &stranger_a } else { &vs[i % n] };
        let b = if outsider_b { &stranger_b } else { &vs[j % n] };
        if let Some(winner) = ring.closer_to(a, b, &vs[t % n]) {
            prop_assert!(ring.contains(&winner));
        }
    }

    #[test]
    fn map_keys_never_alias_after_merging(copies in 1usize..8) {
        // One original and several content-equal twins, as produced when
        // independently built sub-structures are merged.
        let mut holder = Vec::new();
        let original = owned_ap(&mut holder, 3, "merge:0");
        let mut map = UniqueApMap::new();
        let value = owned_ap(&mut holder, 0, "out:0");
        map.insert(original.clone(), value);
        for _ in 0..copies {
            let twin = owned_ap(&mut holder, 3, "merge:0");
            let id_before = twin.id();
            let value = owned_ap(&mut holder, 0, "out:0");
            map.insert(twin.clone(), value);
            // A colliding key is re-identified, never dropped or aliased.
            prop_assert_ne!(twin.id(), id_before);
        }
        let ids: Vec<_> = map.keys().map(|k| k.id()).collect();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(ids.len(), copies + 1);
        prop_assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn minted_ids_stay_strictly_increasing(n in 2usize..32) {
        let mut last = None;
        for _ in 0..n {
            let v = Vertex::new_empty();
            let ap = v.add_ap();
            if let Some(prev) = last {
                prop_assert!(ap.id() > prev);
            }
            last = Some(ap.id());
        }
    }
}
