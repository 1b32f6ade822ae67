//! Registry lookups, code allocation and concurrent use.

use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use tictac_server::{
    CodeSource, ErrorReason, ParticipantId, Phase, RandomCodes, RoomCode, SessionError,
    SessionRegistry,
};

/// Hands out the given codes in order, then repeats the last one.
struct Sequence(Mutex<Vec<&'static str>>);

impl Sequence {
    fn new(codes: &[&'static str]) -> Arc<Self> {
        let mut codes = codes.to_vec();
        codes.reverse();
        Arc::new(Self(Mutex::new(codes)))
    }
}

impl CodeSource for Sequence {
    fn next_code(&self) -> RoomCode {
        let mut codes = self.0.lock().unwrap();
        let code = if codes.len() > 1 {
            codes.pop().unwrap()
        } else {
            codes[0]
        };
        RoomCode::parse(code).unwrap()
    }
}

fn code(text: &str) -> RoomCode {
    RoomCode::parse(text).unwrap()
}

#[test]
fn test_collision_draws_again() {
    let registry = SessionRegistry::with_codes(Sequence::new(&["AAAA", "AAAA", "BBBB"]), 8);
    let first = registry.create(ParticipantId(1), "A".into()).unwrap();
    let second = registry.create(ParticipantId(2), "B".into()).unwrap();
    assert_eq!(first.lock().unwrap().session().code().as_str(), "AAAA");
    assert_eq!(second.lock().unwrap().session().code().as_str(), "BBBB");
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_exhausted_code_space() {
    let registry = SessionRegistry::with_codes(Sequence::new(&["AAAA"]), 3);
    registry.create(ParticipantId(1), "A".into()).unwrap();
    let err = registry.create(ParticipantId(2), "B".into()).unwrap_err();
    assert_eq!(err, SessionError::CodeSpaceExhausted(3));
    assert_eq!(err.reason(), ErrorReason::CodeSpaceExhausted);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_join_unknown_code() {
    let registry = SessionRegistry::new();
    let err = registry
        .join(&code("ZZZZ"), ParticipantId(2), "B".into())
        .unwrap_err();
    assert_eq!(err.reason(), ErrorReason::SessionNotFound);
}

#[test]
fn test_third_participant_gets_session_full() {
    let registry = SessionRegistry::with_codes(Sequence::new(&["CAFE"]), 8);
    registry.create(ParticipantId(1), "A".into()).unwrap();
    registry.join(&code("cafe"), ParticipantId(2), "B".into()).unwrap();

    for joiner in [3, 4] {
        let err = registry
            .join(&code("CAFE"), ParticipantId(joiner), "C".into())
            .unwrap_err();
        assert_eq!(err, SessionError::SessionFull("CAFE".to_string()));
    }

    let handle = registry.get(&code("CAFE")).unwrap();
    assert_eq!(handle.lock().unwrap().session().participants().len(), 2);
}

#[test]
fn test_remove_is_idempotent() {
    let registry = SessionRegistry::with_codes(Sequence::new(&["DEAD"]), 8);
    registry.create(ParticipantId(1), "A".into()).unwrap();
    registry.remove(&code("DEAD"));
    registry.remove(&code("DEAD"));
    assert!(registry.is_empty());
    assert!(registry.get(&code("DEAD")).is_none());

    // The code is free again
    registry.create(ParticipantId(2), "B".into()).unwrap();
    assert!(registry.get(&code("DEAD")).is_some());
}

#[test]
fn test_list_is_sorted_by_code() {
    let registry = SessionRegistry::with_codes(Sequence::new(&["ZZ00", "AA00"]), 8);
    registry.create(ParticipantId(1), "A".into()).unwrap();
    registry.create(ParticipantId(2), "B".into()).unwrap();
    registry.join(&code("zz00"), ParticipantId(3), "C".into()).unwrap();

    let list = registry.list();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].code.as_str(), "AA00");
    assert_eq!(list[0].phase, Phase::Forming);
    assert_eq!(list[0].players, 1);
    assert_eq!(list[1].code.as_str(), "ZZ00");
    assert_eq!(list[1].phase, Phase::Active);
    assert_eq!(list[1].generation, 1);
}

#[test]
fn test_concurrent_creates_get_distinct_codes() {
    let registry = SessionRegistry::with_codes(Arc::new(RandomCodes::with_seed(7)), 64);
    let workers: Vec<_> = (0..8u64)
        .map(|worker| {
            let registry = registry.clone();
            thread::spawn(move || {
                (0..25u64)
                    .map(|i| {
                        let handle = registry
                            .create(ParticipantId(worker * 100 + i), "P".into())
                            .unwrap();
                        let code = handle.lock().unwrap().session().code().clone();
                        code
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut codes = HashSet::new();
    for worker in workers {
        for code in worker.join().unwrap() {
            assert!(codes.insert(code));
        }
    }
    assert_eq!(codes.len(), 200);
    assert_eq!(registry.len(), 200);
}

#[test]
fn test_stale_handle_keeps_reused_code() {
    let registry = SessionRegistry::with_codes(Sequence::new(&["BEEF"]), 8);
    let old = registry.create(ParticipantId(1), "A".into()).unwrap();
    registry.remove(&code("BEEF"));
    let new = registry.create(ParticipantId(2), "B".into()).unwrap();

    registry.remove_if_same(&code("BEEF"), &old);
    let live = registry.get(&code("BEEF")).unwrap();
    assert!(Arc::ptr_eq(&live, &new));

    registry.remove_if_same(&code("BEEF"), &new);
    assert!(registry.is_empty());
}

#[test]
fn test_join_racing_remove_leaves_nothing() {
    let registry = SessionRegistry::with_codes(Arc::new(RandomCodes::with_seed(11)), 64);
    for round in 0..200u64 {
        let handle = registry.create(ParticipantId(round * 2), "A".into()).unwrap();
        let code = handle.lock().unwrap().session().code().clone();
        let start = Arc::new(Barrier::new(2));

        let joiner = {
            let (registry, code, start) = (registry.clone(), code.clone(), Arc::clone(&start));
            thread::spawn(move || {
                start.wait();
                registry.join(&code, ParticipantId(round * 2 + 1), "B".into())
            })
        };
        let remover = {
            let (registry, code, start) = (registry.clone(), code.clone(), Arc::clone(&start));
            thread::spawn(move || {
                start.wait();
                registry.remove(&code);
            })
        };

        match joiner.join().unwrap() {
            Ok(joined) => assert!(Arc::ptr_eq(&joined, &handle)),
            Err(err) => assert_eq!(err.reason(), ErrorReason::SessionNotFound),
        }
        remover.join().unwrap();
        assert!(registry.get(&code).is_none());
    }
    assert!(registry.is_empty());
}
