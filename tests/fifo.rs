use proptest::prelude::*;
use spsc_fifo::{Error, ErrorKind, Fifo, Notify, Semaphore};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

const COUNT: u64 = 200_000;

#[test]
fn fill_then_drain_32() {
    let (mut tx, mut rx) = Fifo::split::<u32>(32).unwrap();
    assert_eq!(tx.size(), 31);

    for v in 1..=31 {
        assert!(tx.push(v).is_ok(), "push {v} should fit");
    }
    let rejected = tx.push(32).unwrap_err();
    assert_eq!(rejected.kind(), ErrorKind::Overflow);
    assert_eq!(rejected.into_inner(), 32);

    for v in 1..=31 {
        assert_eq!(rx.pop(), Ok(v));
    }
    assert_eq!(rx.pop(), Err(Error::Underflow));
}

#[test]
fn smallest_fifo_holds_one() {
    let (mut tx, mut rx) = Fifo::split(2).unwrap();
    assert_eq!(tx.size(), 1);
    assert!(tx.push('a').is_ok());
    assert!(tx.push('b').is_err());
    assert_eq!(rx.pop(), Ok('a'));
    assert_eq!(rx.pop(), Err(Error::Underflow));
}

#[test]
fn rejects_unusable_capacity() {
    assert_eq!(
        Fifo::split::<u8>(1).unwrap_err(),
        Error::CapacityTooSmall { capacity: 1 }
    );
    assert_eq!(Fifo::split::<u8>(0).unwrap_err().kind(), ErrorKind::CapacityTooSmall);
}

#[test]
fn oversized_capacity_fails_to_allocate() {
    let err = Fifo::split::<u64>(usize::MAX).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Allocation);
    assert_eq!(err, Error::Allocation { capacity: usize::MAX });
}

#[test]
fn zero_sized_records_need_no_storage() {
    let (mut tx, mut rx) = Fifo::split::<()>(usize::MAX).unwrap();
    assert_eq!(tx.size(), usize::MAX - 1);
    for _ in 0..3 {
        tx.push(()).unwrap();
    }
    assert_eq!(rx.used(), 3);
    assert_eq!(rx.pop(), Ok(()));
    assert_eq!(rx.peek(), Ok(&()));
}

#[test]
fn empty_fifo_underflows() {
    let (mut tx, mut rx) = Fifo::split::<u8>(4).unwrap();
    assert_eq!(rx.peek(), Err(Error::Underflow));
    assert_eq!(rx.pop(), Err(Error::Underflow));

    tx.push(1).unwrap();
    rx.pop().unwrap();
    assert_eq!(rx.peek(), Err(Error::Underflow));
    assert_eq!(rx.pop(), Err(Error::Underflow));
}

#[test]
fn usable_after_errors() {
    let (mut tx, mut rx) = Fifo::split(3).unwrap();
    assert_eq!(rx.pop(), Err(Error::Underflow));
    tx.push(1).unwrap();
    assert_eq!(rx.pop(), Ok(1));

    tx.push(2).unwrap();
    tx.push(3).unwrap();
    assert!(tx.push(4).is_err());
    assert_eq!(rx.pop(), Ok(2));
    tx.push(4).unwrap();
    assert_eq!(rx.pop(), Ok(3));
    assert_eq!(rx.pop(), Ok(4));
}

#[test]
fn peek_does_not_consume() {
    let (mut tx, mut rx) = Fifo::split(8).unwrap();
    tx.push(String::from("head")).unwrap();
    tx.push(String::from("tail")).unwrap();

    for _ in 0..5 {
        assert_eq!(rx.peek().map(String::as_str), Ok("head"));
    }
    assert_eq!(rx.used(), 2);
    assert_eq!(rx.pop().as_deref(), Ok("head"));
    assert_eq!(rx.peek().map(String::as_str), Ok("tail"));
}

#[test]
fn notifier_counts_successful_pushes() {
    let sem = Arc::new(Semaphore::new(0));
    let (mut tx, mut rx) = Fifo::builder(4).notifier(sem.clone()).split().unwrap();

    for v in 0..3 {
        tx.push(v).unwrap();
    }
    assert_eq!(sem.count(), 3);
    assert!(tx.push(3).is_err());
    assert_eq!(sem.count(), 3);

    // Pops do not touch the notifier.
    rx.pop().unwrap();
    assert_eq!(sem.count(), 3);
    tx.push(3).unwrap();
    assert_eq!(sem.count(), 4);
}

#[test]
fn notifier_can_be_swapped_and_detached() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(Semaphore::new(0));
    let (mut tx, _rx) = Fifo::split(16).unwrap();

    tx.push(0).unwrap();

    let counter = Arc::clone(&first);
    let previous = tx.attach_notifier(Some(Arc::new(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    })));
    assert!(previous.is_none());
    tx.push(1).unwrap();
    tx.push(2).unwrap();

    let previous = tx.attach_notifier(Some(second.clone()));
    assert!(previous.is_some());
    tx.push(3).unwrap();

    assert!(tx.attach_notifier(None).is_some());
    tx.push(4).unwrap();

    assert_eq!(first.load(Ordering::Relaxed), 2);
    assert_eq!(second.count(), 1);
}

#[test]
fn notifier_is_shared_not_owned() {
    let sem = Arc::new(Semaphore::new(0));
    {
        let notifier: Arc<dyn Notify> = sem.clone();
        let (mut tx, _rx) = Fifo::builder(4).notifier(notifier).split().unwrap();
        tx.push(()).unwrap();
        assert_eq!(Arc::strong_count(&sem), 2);
    }
    assert_eq!(Arc::strong_count(&sem), 1);
    assert_eq!(sem.count(), 1);
}

#[test]
fn buffered_elements_dropped_with_fifo() {
    let tracker = Arc::new(());
    let (mut tx, mut rx) = Fifo::split(8).unwrap();
    for _ in 0..6 {
        tx.push(Arc::clone(&tracker)).unwrap();
    }
    drop(rx.pop().unwrap());
    drop(tx);
    assert_eq!(Arc::strong_count(&tracker), 6);
    drop(rx);
    assert_eq!(Arc::strong_count(&tracker), 1);
}

#[test]
fn stress_checksum_across_threads() {
    let (mut tx, mut rx) = Fifo::split::<u64>(64).unwrap();

    let producer = thread::spawn(move || {
        for i in 0..COUNT {
            let mut item = i;
            while let Err(rejected) = tx.push(item) {
                item = rejected.into_inner();
                std::hint::spin_loop();
            }
        }
    });

    let consumer = thread::spawn(move || {
        let mut checksum = 0u64;
        for expected in 0..COUNT {
            loop {
                match rx.pop() {
                    Ok(v) => {
                        assert_eq!(v, expected);
                        checksum = checksum.wrapping_add(v);
                        break;
                    }
                    Err(e) => {
                        assert_eq!(e, Error::Underflow);
                        std::hint::spin_loop();
                    }
                }
            }
        }
        assert_eq!(rx.pop(), Err(Error::Underflow));
        checksum
    });

    producer.join().unwrap();
    assert_eq!(consumer.join().unwrap(), (0..COUNT).sum::<u64>());
}

#[test]
fn heap_payloads_arrive_intact() {
    // A torn slot would show up as a mismatched length or content.
    let (mut tx, mut rx) = Fifo::split::<Vec<u64>>(8).unwrap();

    let producer = thread::spawn(move || {
        for i in 0..20_000u64 {
            let mut item = vec![i; (i % 17) as usize + 1];
            while let Err(rejected) = tx.push(item) {
                item = rejected.into_inner();
                std::hint::spin_loop();
            }
        }
    });

    let mut received = 0u64;
    while received < 20_000 {
        if let Ok(peeked) = rx.peek() {
            assert_eq!(peeked.len(), (received % 17) as usize + 1);
            let v = rx.pop().unwrap();
            assert!(v.iter().all(|&x| x == received));
            received += 1;
        } else {
            std::hint::spin_loop();
        }
    }
    producer.join().unwrap();
}

#[test]
fn consumer_sleeps_on_semaphore() {
    let ready = Arc::new(Semaphore::new(0));
    let (mut tx, mut rx) = Fifo::builder(4).notifier(ready.clone()).split::<u32>().unwrap();

    let producer = thread::spawn(move || {
        for v in 0..1_000 {
            let mut item = v;
            while let Err(rejected) = tx.push(item) {
                item = rejected.into_inner();
                thread::yield_now();
            }
        }
    });

    for v in 0..1_000 {
        ready.wait();
        assert_eq!(rx.pop(), Ok(v));
    }
    producer.join().unwrap();
    assert!(!ready.try_wait());
}

#[derive(Debug, Clone)]
enum Op {
    Push,
    Pop,
    Peek,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Push), Just(Op::Pop), Just(Op::Peek)]
}

proptest! {
    #[test]
    fn accepts_exactly_capacity_minus_one(capacity in 2usize..512) {
        let (mut tx, _rx) = Fifo::split(capacity).unwrap();
        for i in 0..capacity - 1 {
            prop_assert!(tx.push(i).is_ok());
        }
        prop_assert!(tx.push(capacity).is_err());
        prop_assert_eq!(tx.free(), 0);
    }

    #[test]
    fn matches_vecdeque_model(capacity in 2usize..16, ops in prop::collection::vec(op(), 0..400)) {
        let (mut tx, mut rx) = Fifo::split(capacity).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tx.attach_notifier(Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })));

        let mut model = VecDeque::new();
        let mut next = 0u32;
        let mut pushed = 0usize;
        for op in ops {
            match op {
                Op::Push => {
                    let full = model.len() == capacity - 1;
                    let result = tx.push(next);
                    prop_assert_eq!(result.is_err(), full);
                    if !full {
                        model.push_back(next);
                        pushed += 1;
                    }
                    next += 1;
                }
                Op::Pop => {
                    prop_assert_eq!(rx.pop().ok(), model.pop_front());
                }
                Op::Peek => {
                    prop_assert_eq!(rx.peek().ok(), model.front());
                }
            }
            prop_assert_eq!(rx.used(), model.len());
            prop_assert_eq!(tx.used() + tx.free(), tx.size());
            prop_assert_eq!(hits.load(Ordering::Relaxed), pushed);
        }
    }
}
