// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic

//! One factory shared by many threads.

use std::sync::{Arc, Barrier};
use std::thread;
use typewire::model::TypeRef;
use typewire::{Record, SerializerFactory, Wire};

#[derive(Wire, Debug, Clone, PartialEq)]
#[wire(name = "mt.Sample")]
struct Sample {
    worker: u32,
    seq: u64,
    tags: Vec<String>,
    parent: Option<Box<Sample>>,
}

const THREADS: u32 = 8;
const ROUNDS: u64 = 200;

fn sample(worker: u32, seq: u64) -> Sample {
    Sample {
        worker,
        seq,
        tags: (0..seq % 4).map(|i| format!("t{}", i)).collect(),
        parent: (seq % 3 == 0).then(|| {
            Box::new(Sample {
                worker,
                seq: seq + 1,
                tags: Vec::new(),
                parent: None,
            })
        }),
    }
}

#[test]
fn test_concurrent_roundtrips() {
    let factory = Arc::new(SerializerFactory::new());
    let barrier = Arc::new(Barrier::new(THREADS as usize));

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..ROUNDS {
                    let value = sample(worker, seq);
                    let bytes = factory.serialize(&value).expect("serialize");
                    let back: Sample = factory.deserialize(&bytes).expect("deserialize");
                    assert_eq!(back, value);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }
}

#[test]
fn test_serializer_cache_converges() {
    let factory = Arc::new(SerializerFactory::new());
    let barrier = Arc::new(Barrier::new(THREADS as usize));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                factory
                    .resolve_for_write(&TypeRef::of::<Sample>())
                    .expect("resolve")
            })
        })
        .collect();
    let serializers: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .collect();

    let cached = factory.resolve_for_write(&TypeRef::of::<Sample>()).expect("resolve");
    for s in &serializers {
        assert!(Arc::ptr_eq(s, &cached), "threads ended up with different serializers");
    }
    let names = factory.registry().names();
    assert_eq!(names.iter().filter(|n| n.as_str() == "mt.Sample").count(), 1);
}

#[test]
fn test_concurrent_carpentry_registers_once() {
    let bytes = SerializerFactory::new().serialize(&sample(1, 3)).expect("serialize");
    let reader = Arc::new(SerializerFactory::new());
    let bytes = Arc::new(bytes);
    let barrier = Arc::new(Barrier::new(THREADS as usize));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let reader = Arc::clone(&reader);
            let bytes = Arc::clone(&bytes);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let any = reader.deserialize_any(&bytes).expect("synthesize");
                any.downcast_ref::<Record>().map(|r| r.type_name.clone())
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("worker panicked").as_deref(), Some("mt.Sample"));
    }
    let names = reader.registry().names();
    assert_eq!(names.iter().filter(|n| n.as_str() == "mt.Sample").count(), 1);
}
