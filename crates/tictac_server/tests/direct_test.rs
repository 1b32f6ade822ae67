//! Peer-hosted sessions: host authority and follower preview.

use tictac_game::{Board, Mark, Square};
use tictac_server::{DirectGuest, DirectHost, ErrorReason, Intent, Notification, Phase};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

fn take(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        out.push(notification);
    }
    out
}

struct Pair {
    host: DirectHost,
    local: UnboundedReceiver<Notification>,
    link: UnboundedReceiver<Notification>,
    guest: DirectGuest,
}

impl Pair {
    fn joined() -> Self {
        let (local_tx, mut local) = unbounded_channel();
        let (link_tx, link) = unbounded_channel();
        let mut host = DirectHost::new("Host", Box::new(local_tx), Box::new(link_tx));
        assert!(matches!(
            take(&mut local).as_slice(),
            [Notification::SessionCreated { mark: Mark::X, .. }]
        ));

        let code = host.code().as_str().to_ascii_lowercase();
        host.on_remote(DirectGuest::join(&code, "Guest"));
        let mut pair = Self {
            host,
            local,
            link,
            guest: DirectGuest::new(),
        };
        pair.sync();
        take(&mut pair.local);
        pair
    }

    fn sync(&mut self) {
        for notification in take(&mut self.link) {
            self.guest.apply(&notification);
        }
    }
}

#[test]
fn test_guest_follows_host() {
    let mut pair = Pair::joined();
    assert_eq!(pair.guest.mark(), Some(Mark::O));
    assert_eq!(pair.guest.generation(), 1);
    assert_eq!(pair.guest.turn(), Some(Mark::X));
    assert_eq!(pair.host.session().phase(), Phase::Active);

    pair.host.on_local(Intent::SubmitMove {
        cell: 0,
        generation: 1,
    });
    pair.sync();
    assert_eq!(pair.guest.confirmed().get(0), Some(Square::Occupied(Mark::X)));
    assert_eq!(pair.guest.turn(), Some(Mark::O));
    assert_eq!(take(&mut pair.local).len(), 1);
}

#[test]
fn test_preview_is_replaced_by_confirmation() {
    let mut pair = Pair::joined();

    // Not the guest's turn yet
    assert_eq!(pair.guest.preview(4), None);

    pair.host.on_local(Intent::SubmitMove {
        cell: 0,
        generation: 1,
    });
    pair.sync();

    let intent = pair.guest.preview(4).unwrap();
    assert_eq!(
        intent,
        Intent::SubmitMove {
            cell: 4,
            generation: 1
        }
    );
    assert!(pair.guest.is_previewing());
    assert_eq!(pair.guest.board().get(4), Some(Square::Occupied(Mark::O)));
    assert!(pair.guest.confirmed().is_empty(4));

    pair.host.on_remote(intent);
    pair.sync();
    assert!(!pair.guest.is_previewing());
    assert_eq!(pair.guest.confirmed().get(4), Some(Square::Occupied(Mark::O)));
    assert_eq!(pair.guest.board(), *pair.host.session().board());
}

#[test]
fn test_rejected_preview_is_discarded() {
    let mut pair = Pair::joined();
    pair.host.on_local(Intent::SubmitMove {
        cell: 0,
        generation: 1,
    });
    pair.sync();
    take(&mut pair.local);

    assert!(pair.guest.preview(5).is_some());
    let shown = pair.guest.board();
    assert_ne!(shown, *pair.guest.confirmed());

    // The host sees a move from a superseded round
    pair.host.on_remote(Intent::SubmitMove {
        cell: 5,
        generation: 0,
    });
    let out = take(&mut pair.link);
    assert!(matches!(
        out.as_slice(),
        [Notification::Error {
            reason: ErrorReason::StaleGeneration,
            ..
        }]
    ));
    for notification in &out {
        pair.guest.apply(notification);
    }
    assert!(!pair.guest.is_previewing());
    assert_eq!(pair.guest.board(), *pair.guest.confirmed());
    assert!(take(&mut pair.local).is_empty());
}

#[test]
fn test_wrong_code_is_rejected() {
    let (local_tx, _local) = unbounded_channel::<Notification>();
    let (link_tx, mut link) = unbounded_channel();
    let mut host = DirectHost::new("Host", Box::new(local_tx), Box::new(link_tx));

    host.on_remote(DirectGuest::join("????", "Guest"));
    assert!(matches!(
        take(&mut link).as_slice(),
        [Notification::Error {
            reason: ErrorReason::SessionNotFound,
            ..
        }]
    ));
    assert_eq!(host.session().phase(), Phase::Forming);
}

#[test]
fn test_lost_link_ends_session() {
    let mut pair = Pair::joined();
    pair.host.link_lost();
    assert_eq!(take(&mut pair.local), vec![Notification::OpponentLeft]);
    assert_eq!(pair.host.session().phase(), Phase::Terminated);
}

#[test]
fn test_host_leaving_reaches_guest() {
    let mut pair = Pair::joined();
    pair.host.on_local(Intent::Leave);
    pair.sync();
    assert!(pair.guest.opponent_left());
    assert_eq!(pair.guest.preview(0), None);
    assert_eq!(pair.guest.board(), Board::new());
}
