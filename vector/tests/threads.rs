use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use steady_vector::Vector;

/// A value that keeps track of how many copies of it are alive.
#[derive(Debug)]
struct Tracked {
    value: usize,
    live: Arc<AtomicUsize>,
}

impl Tracked {
    fn new(value: usize, live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Tracked {
            value,
            live: Arc::clone(live),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Tracked::new(self.value, &self.live)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[test]
fn shared_readers() {
    let vec: Vector<usize, 8> = (0..10_000).collect();

    thread::scope(|s| {
        for t in 0..8 {
            let vec = &vec;
            s.spawn(move || {
                for i in (t..vec.len()).step_by(8) {
                    assert_eq!(vec[i], i);
                }
                assert_eq!(vec.iter().sum::<usize>(), 10_000 * 9_999 / 2);
            });
        }
    });
}

#[test]
fn threads_derive_their_own_versions() {
    let base: Vector<usize, 4> = (0..1000).collect();

    let derived: Vec<Vector<usize, 4>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|t| {
                // Clones are cheap, and can be sent to another thread.
                let mine = base.clone();
                s.spawn(move || {
                    let mut mine = mine;
                    for i in 0..100 {
                        mine = mine.push_back(t * 1000 + i);
                        mine = mine.assoc(t, t);
                    }
                    mine.pop_back()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(base.to_vec(), (0..1000).collect::<Vec<_>>());
    for (t, vec) in derived.iter().enumerate() {
        vec.check_invariants();
        assert_eq!(vec.len(), 1099);
        assert_eq!(vec[t], t);
        assert_eq!(vec[1098], t * 1000 + 98);
        // Only the leaves touched by this thread were copied.
        assert!(std::ptr::eq(base.leaf(100), vec.leaf(100)));
    }
}

#[test]
fn every_value_is_dropped() {
    let live = Arc::new(AtomicUsize::new(0));

    {
        let base: Vector<Tracked, 4> = (0..500).map(|i| Tracked::new(i, &live)).collect();
        assert_eq!(live.load(Ordering::SeqCst), 500);

        let versions: Vec<Vector<Tracked, 4>> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let base = &base;
                    let live = &live;
                    s.spawn(move || {
                        let mut vec = base.assoc(t, Tracked::new(t * 10, live));
                        vec = vec.push_back(Tracked::new(t, live));
                        vec.concat(base).pop_back()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect()
        });

        for (t, vec) in versions.iter().enumerate() {
            assert_eq!(vec.len(), 1000);
            assert_eq!(vec[t].value, t * 10);
            assert_eq!(vec[500].value, t);
            assert_eq!(vec[999].value, 498);
        }
        // Taking apart a vector whose nodes are shared leaves the others intact.
        let owned: Vec<Tracked> = versions[0].clone().into_iter().collect();
        assert_eq!(owned.len(), 1000);
        drop(owned);
        assert_eq!(base[499].value, 499);
    }

    assert_eq!(live.load(Ordering::SeqCst), 0);
}
