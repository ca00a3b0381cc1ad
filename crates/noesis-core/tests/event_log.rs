use noesis_core::{EventLog, EventSink, MindEvent};

#[test]
fn log_is_bounded_oldest_first() {
    let mut log = EventLog::new(3);
    for tick in 0..5u64 {
        log.emit(MindEvent::new(tick, "test", "tick"));
    }

    assert_eq!(log.len(), 3);
    let ticks: Vec<u64> = log.iter().map(|e| e.tick).collect();
    assert_eq!(ticks, vec![2, 3, 4]);
}

#[test]
fn recent_returns_last_n_oldest_first() {
    let mut log = EventLog::new(10);
    for tick in 0..6u64 {
        log.emit(MindEvent::new(tick, "test", "tick"));
    }

    let recent: Vec<u64> = log.recent(2).iter().map(|e| e.tick).collect();
    assert_eq!(recent, vec![4, 5]);
    assert_eq!(log.recent(100).len(), 6);
}
