use parity_core::demangle::DemangleCache;

#[test]
fn recognized_names_demangle() {
    let mut cache = DemangleCache::new();
    assert_eq!(cache.demangle("_ZN3foo3barE"), "foo::bar");
}

#[test]
fn unrecognized_names_pass_through() {
    let mut cache = DemangleCache::new();
    assert_eq!(cache.demangle("printf"), "printf");
    assert_eq!(cache.demangle(""), "");
}

#[test]
fn results_are_memoized_per_name() {
    let mut cache = DemangleCache::new();
    assert!(cache.is_empty());

    let first = cache.demangle("_ZN3foo3barE");
    assert_eq!(cache.len(), 1);

    // Second lookup hits the memo and agrees with the first.
    let second = cache.demangle("_ZN3foo3barE");
    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);

    // Misses are memoized too.
    cache.demangle("not_mangled");
    cache.demangle("not_mangled");
    assert_eq!(cache.len(), 2);
}
