use ryacc::charset::CharSet;

fn a() -> u16 {
    'a' as u16
}

#[test]
fn lexer_class_round_trip() {
    // [a-z] minus 'm', then restored by re-adding the adjacent point.
    let s = CharSet::new().add_range(a(), 'z' as u16);
    let s = s.remove('m' as u16);
    assert_eq!(
        s.intervals().collect::<Vec<_>>(),
        vec![(a(), 'l' as u16), ('n' as u16, 'z' as u16)]
    );
    assert_eq!(s.len(), 25);

    let s = s.add_range('m' as u16, 'm' as u16);
    assert_eq!(s.intervals().collect::<Vec<_>>(), vec![(a(), 'z' as u16)]);
    assert_eq!(s.len(), 26);
}

#[test]
fn add_then_contains_and_remove_then_absent() {
    let values = [0u16, 1, 13, 12, 500, 499, 498, u16::MAX, 7, 7];
    let mut s = CharSet::new();
    for &c in &values {
        s = s.add(c);
        assert!(s.contains(c));
    }
    assert!(!CharSet::new().add(42).remove(42).contains(42));
    for &c in &values {
        s = s.remove(c);
        assert!(!s.contains(c));
    }
    assert!(s.is_empty());
}

#[test]
fn intervals_stay_sorted_and_separated() {
    // A fixed pseudo-random walk; the invariant must hold after every step.
    let mut seed = 0x2f6e_u32;
    let mut s = CharSet::new();
    for step in 0..4000 {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        let c = (seed >> 8) as u16 % 512;
        s = if step % 3 == 0 { s.remove(c) } else { s.add(c) };

        let intervals: Vec<_> = s.intervals().collect();
        for (lo, hi) in &intervals {
            assert!(lo <= hi);
        }
        for pair in intervals.windows(2) {
            assert!((pair[0].1 as u32) + 1 < pair[1].0 as u32);
        }
        assert_eq!(
            s.len(),
            intervals
                .iter()
                .map(|(lo, hi)| (hi - lo) as usize + 1)
                .sum::<usize>()
        );
    }
}

#[test]
fn conversion_round_trips() {
    let s = CharSet::of_intervals([(10, 20), (40, 40), (100, 163)]);
    assert_eq!(s.to_vec().into_iter().collect::<CharSet>(), s);
    assert_eq!(CharSet::of_intervals(s.intervals()), s);
    assert_eq!(CharSet::from(&s.to_vec()[..]), s);

    let union = s.union(&CharSet::of_intervals([(15, 45)]));
    assert_eq!(union.to_vec().into_iter().collect::<CharSet>(), union);
}

#[test]
fn algebra_identities() {
    let a = CharSet::of_intervals([(0, 30), (60, 90)]);
    let b = CharSet::of_intervals([(20, 70)]);

    assert_eq!(a.intersect(&b), a.difference(&a.difference(&b)));
    assert_eq!(a.union(&b).len(), a.len() + b.len() - a.intersect(&b).len());
    assert!(a.difference(&b).intersect(&b).is_empty());
    assert!(a.union(&b).for_all(|c| a.contains(c) || b.contains(c)));
}

#[test]
fn min_max_and_bounds() {
    assert_eq!(CharSet::new().min(), None);
    assert_eq!(CharSet::new().max(), None);

    let s = CharSet::of_intervals([(5, 9), (200, 300)]);
    assert_eq!(s.min(), Some(5));
    assert_eq!(s.max(), Some(300));

    let full_tail = CharSet::new().add_range(u16::MAX - 2, u16::MAX);
    assert_eq!(full_tail.max(), Some(u16::MAX));
    assert_eq!(full_tail.len(), 3);
}
