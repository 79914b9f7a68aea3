#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Barrier;
use std::thread;

use super::*;
use crate::link::Op;

fn program(name: &str) -> Arc<Program> {
    Arc::new(Program {
        name: name.to_owned(),
        input: "User".to_owned(),
        accumulator: "text".to_owned(),
        registers: 1,
        body: vec![Op::Text(name.to_owned())],
        source: String::new(),
    })
}

fn ok(name: &str) -> impl FnOnce() -> Result<Arc<Program>, String> + '_ {
    move || Ok(program(name))
}

#[test]
fn test_hit_after_compile() {
    let cache = RenderCache::new(8, None);
    let key = ContentHash::new(1);
    assert!(cache.get(key, "t").is_none());

    let first = cache.get_or_compile(key, "t", ok("a")).unwrap();
    let second = cache.get_or_compile(key, "t", ok("b")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.name(), "a");
    assert_eq!(cache.compilations(), 1);
}

#[test]
fn test_colliding_key_does_not_share_programs() {
    let cache = RenderCache::new(8, None);
    let key = ContentHash::new(7);
    let first = cache.get_or_compile(key, "${name}", ok("first")).unwrap();
    assert!(cache.get(key, "${nick}").is_none());

    let second = cache.get_or_compile(key, "${nick}", ok("second")).unwrap();
    assert_eq!(first.name(), "first");
    assert_eq!(second.name(), "second");
    assert_eq!(cache.compilations(), 2);
    // The newer template took the slot.
    assert!(cache.get(key, "${name}").is_none());
    assert_eq!(cache.get(key, "${nick}").map(|p| p.name().to_owned()), Some("second".into()));
}

#[test]
fn test_failures_are_not_cached() {
    let cache = RenderCache::new(8, None);
    let key = ContentHash::new(1);
    let err =
        cache.get_or_compile(key, "t", || Err::<Arc<Program>, _>("boom".to_owned())).unwrap_err();
    assert_eq!(err, "boom");
    assert_eq!(cache.len(), 0);

    assert!(cache.get_or_compile(key, "t", ok("a")).is_ok());
    assert_eq!(cache.compilations(), 2);
}

#[test]
fn test_single_flight() {
    const THREADS: usize = 16;
    let cache = RenderCache::new(8, None);
    let barrier = Barrier::new(THREADS);
    let key = ContentHash::new(42);

    let programs: Vec<Arc<Program>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    cache
                        .get_or_compile(key, "t", || {
                            thread::sleep(Duration::from_millis(20));
                            Ok::<_, String>(program("slow"))
                        })
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.compilations(), 1);
    assert!(programs.iter().all(|p| Arc::ptr_eq(p, &programs[0])));
    assert!(cache.gates.is_empty());
}

#[test]
fn test_capacity_evicts_least_recently_used() {
    let cache = RenderCache::new(2, None);
    let (a, b, c) = (ContentHash::new(1), ContentHash::new(2), ContentHash::new(3));
    cache.get_or_compile(a, "a", ok("a")).unwrap();
    thread::sleep(Duration::from_millis(5));
    cache.get_or_compile(b, "b", ok("b")).unwrap();
    thread::sleep(Duration::from_millis(5));
    // Touch `a` so `b` becomes the oldest.
    assert!(cache.get(a, "a").is_some());
    thread::sleep(Duration::from_millis(5));

    cache.get_or_compile(c, "c", ok("c")).unwrap();
    assert_eq!(cache.len(), 2);
    assert!(cache.get(a, "a").is_some());
    assert!(cache.get(b, "b").is_none());
    assert!(cache.get(c, "c").is_some());
}

#[test]
fn test_sweep_by_ttl() {
    let cache = RenderCache::new(8, Some(Duration::from_secs(60)));
    cache.get_or_compile(ContentHash::new(1), "a", ok("a")).unwrap();

    assert_eq!(cache.sweep(Instant::now()), 0);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.sweep(Instant::now() + Duration::from_secs(61)), 1);
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_sweep_without_ttl_keeps_everything() {
    let cache = RenderCache::new(8, None);
    cache.get_or_compile(ContentHash::new(1), "a", ok("a")).unwrap();
    assert_eq!(cache.sweep(Instant::now() + Duration::from_secs(86_400)), 0);
    assert_eq!(cache.len(), 1);
}
