//! Producer/consumer behaviour across real threads.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chargrid_input::{
    ConsoleConfig, InputCoordinator, KeyPoll, KeySet, MouseKind, MouseMode, Overflow, RingBuffer,
    Throttle,
};

const GENEROUS: Duration = Duration::from_secs(5);

fn active(throttle: Throttle) -> Arc<InputCoordinator> {
    let input = InputCoordinator::new(ConsoleConfig {
        throttle,
        mouse: MouseMode::ButtonsAndDrag,
        ..ConsoleConfig::default()
    })
    .unwrap();
    assert!(input.attach());
    Arc::new(input)
}

#[test]
fn blocked_pop_wakes_on_push() {
    let ring = Arc::new(RingBuffer::new(4, Overflow::DropIncoming).unwrap());
    let producer = Arc::clone(&ring);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        producer.push('k');
    });

    let start = Instant::now();
    assert_eq!(ring.pop(GENEROUS), Some('k'));
    assert!(start.elapsed() < Duration::from_secs(2));
    handle.join().unwrap();
}

#[test]
fn blocked_get_any_wakes_on_add() {
    let set = Arc::new(KeySet::new(4).unwrap());
    let producer = Arc::clone(&set);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        producer.add(42);
    });

    let start = Instant::now();
    assert_eq!(set.get_any(GENEROUS), Some(42));
    assert!(start.elapsed() < Duration::from_secs(2));
    handle.join().unwrap();
}

#[test]
fn remove_does_not_wake_get_any() {
    let set = Arc::new(KeySet::new(4).unwrap());
    let producer = Arc::clone(&set);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        producer.remove(1);
        producer.clear();
    });

    let start = Instant::now();
    assert_eq!(set.get_any(Duration::from_millis(80)), None);
    assert!(start.elapsed() >= Duration::from_millis(80));
    handle.join().unwrap();
}

#[test]
fn fifo_survives_a_concurrent_producer() {
    let ring = Arc::new(RingBuffer::new(8, Overflow::DropIncoming).unwrap());
    let producer = Arc::clone(&ring);
    let handle = thread::spawn(move || {
        for i in 0..2_000u32 {
            while !producer.push(i) {
                thread::yield_now();
            }
        }
    });

    let received: Vec<u32> = (0..2_000).map_while(|_| ring.pop(GENEROUS)).collect();
    handle.join().unwrap();
    assert_eq!(received, (0..2_000).collect::<Vec<_>>());
    assert!(ring.is_empty());
}

#[test]
fn evicting_buffer_only_ever_skips_forward() {
    let ring = Arc::new(RingBuffer::new(4, Overflow::EvictOldest).unwrap());
    let producer = Arc::clone(&ring);
    let handle = thread::spawn(move || {
        for i in 0..5_000u32 {
            producer.push(i);
        }
    });

    let mut seen = Vec::new();
    while let Some(value) = ring.pop(Duration::from_millis(200)) {
        seen.push(value);
    }
    handle.join().unwrap();

    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(seen.last(), Some(&4_999));
}

#[test]
fn key_pressed_during_wait_returns_promptly() {
    let input = active(Throttle::disabled());
    let source = Arc::clone(&input);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        source.on_key_down(38);
    });

    let start = Instant::now();
    assert_eq!(input.poll_any_key(GENEROUS), KeyPoll::Key(38));
    assert!(start.elapsed() < Duration::from_secs(2));
    handle.join().unwrap();
}

#[test]
fn throttled_poll_never_beats_the_minimum_interval() {
    let min = Duration::from_millis(40);
    let input = active(Throttle::new(min));
    input.on_key_down(32);
    for _ in 0..3 {
        let start = Instant::now();
        assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::Key(32));
        assert!(start.elapsed() >= min);
    }
}

#[test]
fn throttled_poll_with_nothing_waits_the_minimum_interval() {
    let min = Duration::from_millis(40);
    let input = active(Throttle::new(min));
    let start = Instant::now();
    assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::NoKey);
    assert!(start.elapsed() >= min);
}

#[test]
fn typed_text_arrives_in_order_across_threads() {
    let input = active(Throttle::new(Duration::from_millis(2)));
    let source = Arc::clone(&input);
    let text = "the quick brown fox";
    let handle = thread::spawn(move || {
        for c in text.chars() {
            source.on_char_typed(c);
            thread::sleep(Duration::from_millis(1));
        }
    });

    let received: String = (0..text.len())
        .map_while(|_| input.wait_char(Some(GENEROUS)))
        .collect();
    handle.join().unwrap();
    assert_eq!(received, text);
}

#[test]
fn drags_from_another_thread_are_deduplicated() {
    let input = active(Throttle::disabled());
    let source = Arc::clone(&input);
    thread::spawn(move || {
        for col in [1, 1, 1, 2, 2, 3] {
            source.on_mouse_event(MouseKind::Drag, 5, col);
        }
    })
    .join()
    .unwrap();

    let cols: Vec<u16> = std::iter::from_fn(|| input.poll_mouse_event(Duration::ZERO))
        .map(|ev| ev.at.col)
        .collect();
    assert_eq!(cols, vec![1, 2, 3]);
}

#[test]
fn detach_releases_a_consumer_waiting_forever() {
    let input = active(Throttle::new(Duration::from_millis(5)));
    let closer = Arc::clone(&input);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        closer.detach();
    });

    let start = Instant::now();
    assert_eq!(input.wait_char(None), None);
    assert!(start.elapsed() < Duration::from_secs(2));
    handle.join().unwrap();
}
