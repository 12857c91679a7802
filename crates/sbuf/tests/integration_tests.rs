//! Concrete end-to-end scenarios for the shared buffer's drain-then-close
//! protocol, plus the boundary behaviors around closing an empty or
//! non-empty buffer.

use sbuf::{Consumer, Sbuf};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rec(u32);

#[test]
fn empty_shutdown() {
    let buf: Sbuf<Rec> = Sbuf::new();
    buf.close();
    assert!(buf.remove(Consumer::Data).is_err());
    assert!(buf.remove(Consumer::Storage).is_err());
}

#[test]
fn single_record_data_first() {
    let buf: Sbuf<Rec> = Sbuf::new();
    buf.insert(Rec(1)).unwrap();
    assert_eq!(buf.remove(Consumer::Data).unwrap(), Rec(1));
    assert_eq!(buf.remove(Consumer::Storage).unwrap(), Rec(1));
    buf.close();
    assert!(buf.remove(Consumer::Data).is_err());
    assert!(buf.remove(Consumer::Storage).is_err());
}

#[test]
fn two_records_interleaved() {
    let buf: Sbuf<Rec> = Sbuf::new();
    buf.insert(Rec(1)).unwrap();
    buf.insert(Rec(2)).unwrap();

    assert_eq!(buf.remove(Consumer::Data).unwrap(), Rec(1));
    assert_eq!(buf.remove(Consumer::Data).unwrap(), Rec(2));
    assert_eq!(buf.remove(Consumer::Storage).unwrap(), Rec(1));
    assert_eq!(buf.remove(Consumer::Storage).unwrap(), Rec(2));

    buf.close();
    assert!(buf.remove(Consumer::Data).is_err());
    assert!(buf.remove(Consumer::Storage).is_err());
}

#[test]
fn producer_leads_storage_lags() {
    let buf: Sbuf<Rec> = Sbuf::new();
    for i in 0..10 {
        buf.insert(Rec(i)).unwrap();
    }

    for i in 0..10 {
        assert_eq!(buf.remove(Consumer::Data).unwrap(), Rec(i));
    }
    for i in 0..10 {
        assert_eq!(buf.remove(Consumer::Storage).unwrap(), Rec(i));
    }

    buf.close();
    assert!(buf.remove(Consumer::Data).is_err());
    assert!(buf.remove(Consumer::Storage).is_err());
}

#[test]
fn insert_after_close_is_rejected() {
    let buf: Sbuf<Rec> = Sbuf::new();
    buf.close();
    assert!(buf.insert(Rec(1)).is_err());
    assert!(buf.remove(Consumer::Data).is_err());
    assert!(buf.remove(Consumer::Storage).is_err());
}

#[test]
fn close_wakes_blocked_consumers_on_empty_buffer() {
    let buf = Arc::new(Sbuf::<Rec>::new());

    let d = {
        let buf = Arc::clone(&buf);
        thread::spawn(move || buf.remove(Consumer::Data))
    };
    let s = {
        let buf = Arc::clone(&buf);
        thread::spawn(move || buf.remove(Consumer::Storage))
    };

    // Give both threads a chance to block in remove() before closing.
    thread::sleep(std::time::Duration::from_millis(50));
    buf.close();

    assert!(d.join().unwrap().is_err());
    assert!(s.join().unwrap().is_err());
}

#[test]
fn close_drains_non_empty_buffer_before_terminating() {
    let buf = Arc::new(Sbuf::<Rec>::new());
    buf.insert(Rec(1)).unwrap();
    buf.insert(Rec(2)).unwrap();

    let d = {
        let buf = Arc::clone(&buf);
        thread::spawn(move || {
            let mut out = Vec::new();
            loop {
                match buf.remove(Consumer::Data) {
                    Ok(r) => out.push(r),
                    Err(_) => return out,
                }
            }
        })
    };
    let s = {
        let buf = Arc::clone(&buf);
        thread::spawn(move || {
            let mut out = Vec::new();
            loop {
                match buf.remove(Consumer::Storage) {
                    Ok(r) => out.push(r),
                    Err(_) => return out,
                }
            }
        })
    };

    buf.close();
    assert_eq!(d.join().unwrap(), vec![Rec(1), Rec(2)]);
    assert_eq!(s.join().unwrap(), vec![Rec(1), Rec(2)]);
}

#[test]
fn single_record_one_consumer_then_close_other_still_observes_it() {
    let buf = Arc::new(Sbuf::<Rec>::new());
    buf.insert(Rec(42)).unwrap();
    assert_eq!(buf.remove(Consumer::Data).unwrap(), Rec(42));

    let buf2 = Arc::clone(&buf);
    buf2.close();

    // Storage manager must still be able to observe the record before
    // Terminated, even though close already happened.
    assert_eq!(buf.remove(Consumer::Storage).unwrap(), Rec(42));
    assert!(buf.remove(Consumer::Storage).is_err());
    assert!(buf.remove(Consumer::Data).is_err());
}

#[test]
fn close_races_with_in_flight_remove() {
    // Scenario 5: producer inserts R1, then close races with two removes.
    // By conservation, if R1 was accepted, both consumers eventually see it.
    for _ in 0..200 {
        let buf = Arc::new(Sbuf::<Rec>::new());
        buf.insert(Rec(1)).unwrap();

        let buf_close = Arc::clone(&buf);
        let closer = thread::spawn(move || buf_close.close());

        let buf_d = Arc::clone(&buf);
        let d = thread::spawn(move || {
            let mut seen = None;
            loop {
                match buf_d.remove(Consumer::Data) {
                    Ok(r) => seen = Some(r),
                    Err(_) => return seen,
                }
            }
        });
        let buf_s = Arc::clone(&buf);
        let s = thread::spawn(move || {
            let mut seen = None;
            loop {
                match buf_s.remove(Consumer::Storage) {
                    Ok(r) => seen = Some(r),
                    Err(_) => return seen,
                }
            }
        });

        closer.join().unwrap();
        assert_eq!(d.join().unwrap(), Some(Rec(1)));
        assert_eq!(s.join().unwrap(), Some(Rec(1)));
    }
}
