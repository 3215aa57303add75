//! Both transports honor the same read/apply contract under the gate

use hotel_transport::{
    mutate, BrokeredLedger, Gate, LedgerBroker, LedgerTransport, MappedLedger,
};
use hotel_types::{
    BookingOutcome, ClientId, ClientRequest, Gender, RoomLedger, RoomStatus, SINGLE_ROOMS_COUNT,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

const POLL: Duration = Duration::from_millis(1);

async fn book_and_release(transport: Arc<dyn LedgerTransport>) {
    let gate = Gate::local(POLL);
    let cancel = CancellationToken::new();

    let male = ClientRequest::new(ClientId(1), Gender::Male, 1);
    let guard = gate.acquire(&cancel).await.unwrap();
    let (published, outcome) = mutate(transport.as_ref(), &guard, |ledger| ledger.claim(&male))
        .await
        .unwrap();
    drop(guard);

    assert_eq!(outcome, BookingOutcome::Single(0));
    assert_eq!(published.singles.status(0), Some(RoomStatus::Full));
    assert_eq!(transport.read().await.unwrap(), published);

    let guard = gate.acquire(&cancel).await.unwrap();
    let (published, released) = mutate(transport.as_ref(), &guard, |ledger| {
        ledger.release(&male, outcome)
    })
    .await
    .unwrap();
    guard.release().unwrap();

    assert_eq!(released.unwrap(), Some(RoomStatus::Free));
    assert_eq!(published, RoomLedger::new());
}

/// Singles all booked but one, a full double, a half-full double of each gender
fn mixed_ledger() -> RoomLedger {
    let mut ledger = RoomLedger::new();
    let mut id = 0;
    let mut book = |ledger: &mut RoomLedger, gender| {
        id += 1;
        let request = ClientRequest::new(ClientId(id), gender, 1);
        let outcome = ledger.claim(&request);
        (request, outcome)
    };

    let mut singles = Vec::new();
    for _ in 0..SINGLE_ROOMS_COUNT {
        singles.push(book(&mut ledger, Gender::Male));
    }
    book(&mut ledger, Gender::Female);
    book(&mut ledger, Gender::Female);
    book(&mut ledger, Gender::Male);
    book(&mut ledger, Gender::Female);

    let (request, outcome) = singles[3];
    ledger.release(&request, outcome).unwrap();
    ledger
}

async fn assert_round_trip_is_noop(transport: &dyn LedgerTransport, expected: &RoomLedger) {
    let snapshot = transport.read().await.unwrap();
    assert_eq!(&snapshot, expected);

    let acknowledged = transport.apply(&snapshot).await.unwrap();
    assert_eq!(&acknowledged, expected);
    assert_eq!(&transport.read().await.unwrap(), expected);
}

#[test]
fn mixed_ledger_covers_every_status() {
    let ledger = mixed_ledger();
    ledger.check_invariants().unwrap();
    assert_eq!(ledger.singles.status(3), Some(RoomStatus::Free));
    assert_eq!(ledger.singles.free_count(), 1);
    assert_eq!(ledger.doubles.status(0), Some(RoomStatus::Full));
    assert_eq!(ledger.doubles.status(1), Some(RoomStatus::OccupiedByMale));
    assert_eq!(ledger.doubles.status(2), Some(RoomStatus::OccupiedByFemale));
}

#[tokio::test]
async fn mapped_apply_of_read_is_noop() {
    let ledger = mixed_ledger();
    let region = MappedLedger::anonymous().unwrap();
    region.store(&ledger);

    assert_round_trip_is_noop(&region, &ledger).await;
    assert_eq!(region.snapshot().unwrap(), ledger);
}

#[tokio::test]
async fn brokered_apply_of_read_is_noop() {
    let dir = tempdir().unwrap();
    let (input, output) = (dir.path().join("rooms_in"), dir.path().join("rooms_out"));

    let ledger = mixed_ledger();
    let mut broker = LedgerBroker::bind(&input, &output).unwrap();
    let cancel = CancellationToken::new();
    let serving = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            broker.serve(cancel).await.unwrap();
            broker
        }
    });

    let client = BrokeredLedger::connect(&input, &output).unwrap();
    client.apply(&ledger).await.unwrap();
    assert_round_trip_is_noop(&client, &ledger).await;

    cancel.cancel();
    let broker = serving.await.unwrap();
    assert_eq!(broker.ledger(), &ledger);
}

#[tokio::test]
async fn mapped_transport_contract() {
    book_and_release(Arc::new(MappedLedger::anonymous().unwrap())).await;
}

#[tokio::test]
async fn brokered_transport_contract() {
    let dir = tempdir().unwrap();
    let (input, output) = (dir.path().join("rooms_in"), dir.path().join("rooms_out"));

    let mut broker = LedgerBroker::bind(&input, &output).unwrap();
    let cancel = CancellationToken::new();
    let serving = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            broker.serve(cancel).await.unwrap();
            broker
        }
    });

    let client = BrokeredLedger::connect(&input, &output).unwrap();
    book_and_release(Arc::new(client)).await;

    cancel.cancel();
    let broker = serving.await.unwrap();
    // GET, SET, GET, GET, SET
    assert_eq!(broker.frames_served(), 5);
    assert_eq!(broker.ledger(), &RoomLedger::new());
}

#[tokio::test]
async fn brokered_clients_share_one_ledger() {
    let dir = tempdir().unwrap();
    let (input, output) = (dir.path().join("rooms_in"), dir.path().join("rooms_out"));

    let mut broker = LedgerBroker::bind(&input, &output).unwrap();
    let cancel = CancellationToken::new();
    let serving = tokio::spawn({
        let cancel = cancel.clone();
        async move { broker.serve(cancel).await }
    });

    let first = BrokeredLedger::connect(&input, &output).unwrap();
    let second = BrokeredLedger::connect(&input, &output).unwrap();

    let mut ledger = first.read().await.unwrap();
    ledger.claim(&ClientRequest::new(ClientId(5), Gender::Female, 1));
    first.apply(&ledger).await.unwrap();

    assert_eq!(second.read().await.unwrap(), ledger);

    cancel.cancel();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn connect_without_broker_fails() {
    let dir = tempdir().unwrap();
    assert!(BrokeredLedger::connect(dir.path().join("in"), dir.path().join("out")).is_err());
}
