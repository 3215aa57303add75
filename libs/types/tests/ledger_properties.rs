//! Property tests for the room ledger
//!
//! Random interleavings of claims and releases must never break the
//! single-room exclusivity or double-room gender invariants.

use hotel_types::{
    BookingOutcome, ClientId, ClientRequest, Gender, RoomLedger, RoomStatus, SINGLE_ROOMS_COUNT,
};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Claim(Gender),
    /// Release the n-th currently held booking (modulo the number held)
    Release(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => prop_oneof![Just(Gender::Male), Just(Gender::Female)].prop_map(Op::Claim),
        2 => any::<usize>().prop_map(Op::Release),
    ]
}

proptest! {
    #[test]
    fn invariants_hold_for_any_sequence(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut ledger = RoomLedger::new();
        let mut held: Vec<(ClientRequest, BookingOutcome)> = Vec::new();
        let mut next_id = 0;

        for op in ops {
            match op {
                Op::Claim(gender) => {
                    next_id += 1;
                    let request = ClientRequest::new(ClientId(next_id), gender, 1);
                    let outcome = ledger.claim(&request);
                    if outcome.is_booked() {
                        held.push((request, outcome));
                    }
                }
                Op::Release(n) if !held.is_empty() => {
                    let (request, outcome) = held.remove(n % held.len());
                    ledger.release(&request, outcome).unwrap();
                }
                Op::Release(_) => {}
            }

            prop_assert!(ledger.check_invariants().is_ok());

            // single-room exclusivity: no two live bookings share a single room
            let singles: Vec<usize> = held
                .iter()
                .filter_map(|(_, o)| match o {
                    BookingOutcome::Single(i) => Some(*i),
                    _ => None,
                })
                .collect();
            let distinct: HashSet<_> = singles.iter().collect();
            prop_assert_eq!(distinct.len(), singles.len());
            for index in &singles {
                prop_assert_eq!(ledger.singles.status(*index), Some(RoomStatus::Full));
            }

            // every live double booking is recorded in its room with its gender
            for (request, outcome) in &held {
                if let BookingOutcome::Double(i) = outcome {
                    let room = ledger.doubles.get(*i).unwrap();
                    prop_assert!(room.holds(request.id));
                    prop_assert!(room.occupants().all(|o| o.gender == request.gender));
                }
            }
        }

        // checkout of every remaining guest empties the hotel
        for (request, outcome) in held.drain(..) {
            ledger.release(&request, outcome).unwrap();
            prop_assert!(ledger.check_invariants().is_ok());
        }
        prop_assert_eq!(ledger, RoomLedger::new());
    }

    #[test]
    fn singles_are_preferred_while_any_is_free(genders in prop::collection::vec(any::<bool>(), 1..40)) {
        let mut ledger = RoomLedger::new();
        for (i, female) in genders.iter().enumerate() {
            let gender = if *female { Gender::Female } else { Gender::Male };
            let outcome = ledger.claim(&ClientRequest::new(ClientId(i as i32), gender, 1));
            if i < SINGLE_ROOMS_COUNT {
                prop_assert_eq!(outcome, BookingOutcome::Single(i));
            } else {
                prop_assert!(!matches!(outcome, BookingOutcome::Single(_)));
            }
        }
    }
}
