//! End-to-end behaviour of the manager, sessions, gateway and dispatch stage
//! wired together the way a host would wire them.

use std::sync::{Arc, Mutex};

use passenger_registry::{
    AddPassengerEvent, Cancellable, DispatchOutcome, EntityId, MutationOutcome, PacketSender,
    PassengerConfig, PassengerEventBus, PassengerManager, PassengerPacketEvent, PassengerSet,
    Recipient, RemovePassengerEvent, SendError, SetPassengersPacket,
};

/// Packets seen by the host, as `(recipient name, packet)`.
type Outbox = Arc<Mutex<Vec<(String, SetPassengersPacket)>>>;

struct OutboxSender(Outbox);

impl PacketSender for OutboxSender {
    fn send_silently(
        &self,
        recipient: &Recipient,
        packet: &SetPassengersPacket,
    ) -> Result<(), SendError> {
        self.0
            .lock()
            .unwrap()
            .push((recipient.name.clone(), packet.clone()));
        Ok(())
    }
}

struct Harness {
    bus: Arc<PassengerEventBus>,
    manager: PassengerManager,
    outbox: Outbox,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(PassengerConfig::default())
    }

    fn with_config(config: PassengerConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let bus = Arc::new(PassengerEventBus::new());
        let outbox = Outbox::default();
        let manager = PassengerManager::builder()
            .config(config)
            .publisher(bus.clone())
            .recipients(|| vec![Recipient::new("p1"), Recipient::new("p2")])
            .sender(OutboxSender(Arc::clone(&outbox)))
            .build()
            .unwrap();
        Self {
            bus,
            manager,
            outbox,
        }
    }

    fn sent_targets(&self) -> Vec<EntityId> {
        self.outbox
            .lock()
            .unwrap()
            .iter()
            .map(|(_, packet)| packet.target_entity)
            .collect()
    }

    fn last_packet_for(&self, target: EntityId) -> Option<Vec<EntityId>> {
        self.outbox
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(_, packet)| packet.target_entity == target)
            .map(|(_, packet)| packet.passengers.clone())
    }

    fn clear_outbox(&self) {
        self.outbox.lock().unwrap().clear();
    }
}

#[test]
fn scenario_a_union_of_two_owners() {
    let h = Harness::new();
    let a = h.manager.session("ownerA");
    let b = h.manager.session("ownerB");

    a.add_passengers(false, 100, [1, 2]).unwrap();
    b.add_passengers(false, 100, [2, 3]).unwrap();

    assert_eq!(a.global_passengers(100), PassengerSet::from([1, 2, 3]));
    assert_eq!(a.passengers(100), PassengerSet::from([1, 2]));
    assert_eq!(h.last_packet_for(100), Some(vec![1, 2, 3]));
}

#[test]
fn scenario_b_cross_owner_removal() {
    let h = Harness::new();
    let a = h.manager.session("ownerA");
    let b = h.manager.session("ownerB");
    a.add_passengers(false, 100, [1, 2]).unwrap();
    b.add_passengers(false, 100, [2, 3]).unwrap();

    a.remove_global_passengers(false, 100, [2]).unwrap();

    assert_eq!(a.global_passengers(100), PassengerSet::from([1, 3]));
    assert_eq!(a.passengers(100), PassengerSet::from([1]));
    assert_eq!(b.passengers(100), PassengerSet::from([3]));
    assert_eq!(h.last_packet_for(100), Some(vec![1, 3]));
}

#[test]
fn scenario_c_clearing_prunes_owner() {
    let h = Harness::new();
    let a = h.manager.session("ownerA");

    a.add_passenger(false, 7, 5).unwrap();
    a.remove_all_passengers(false, 7).unwrap();

    assert_eq!(a.target_count(), 0);
    assert_eq!(h.manager.total_target_count(), 0);
    assert!(h.manager.registry().owners().is_empty());
    assert_eq!(h.last_packet_for(7), Some(vec![]));
}

#[test]
fn scenario_d_cancelled_removal() {
    let h = Harness::new();
    let a = h.manager.session("ownerA");
    a.add_passenger(false, 7, 5).unwrap();
    h.clear_outbox();

    h.bus.on::<RemovePassengerEvent>("veto", |e| e.set_cancelled(true));

    assert_eq!(
        a.remove_passenger(false, 7, 5).unwrap(),
        MutationOutcome::Cancelled
    );
    assert_eq!(a.passengers(7), PassengerSet::from([5]));
    assert!(h.sent_targets().is_empty());
}

#[test]
fn vetoed_removals_leave_every_owner_untouched() {
    let h = Harness::new();
    let a = h.manager.session("ownerA");
    let b = h.manager.session("ownerB");
    a.add_passengers(false, 100, [1, 2]).unwrap();
    b.add_passengers(false, 100, [2, 3]).unwrap();
    b.add_passengers(false, 200, [2]).unwrap();
    h.clear_outbox();
    let before = h.manager.registry().dump();

    h.bus.on::<RemovePassengerEvent>("veto", |e| e.set_cancelled(true));

    let outcomes = [
        a.remove_global_passengers(false, 100, [2]).unwrap(),
        a.remove_all_global_passengers(false, 100).unwrap(),
        b.remove_passengers_from_all(false, [2]).unwrap(),
        h.manager.remove_passenger(false, 100, 1, true).unwrap(),
        h.manager.remove_passengers(false, [2, 3], true).unwrap(),
    ];
    assert!(outcomes.iter().all(|o| *o == MutationOutcome::Cancelled));
    assert_eq!(h.manager.registry().dump(), before);
    assert!(h.sent_targets().is_empty());
}

#[test]
fn remove_all_spares_passengers_mounted_during_the_intent() {
    let h = Harness::new();
    let a = h.manager.session("ownerA");
    a.add_passenger(false, 7, 5).unwrap();

    let named = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&named);
    let late = a.clone();
    h.bus.on::<RemovePassengerEvent>("late-mount", move |e| {
        sink.lock().unwrap().push(e.passenger_ids().clone());
        late.add_passenger(false, 7, 6).unwrap();
    });

    assert!(a.remove_all_passengers(false, 7).unwrap().is_applied());
    assert_eq!(*named.lock().unwrap(), vec![PassengerSet::from([5])]);
    assert_eq!(a.passengers(7), PassengerSet::from([6]));
    assert_eq!(h.last_packet_for(7), Some(vec![6]));
}

#[test]
fn cancelled_add_changes_nothing_and_sends_nothing() {
    let h = Harness::new();
    h.bus.on::<AddPassengerEvent>("veto", |e| e.set_cancelled(true));
    let a = h.manager.session("ownerA");
    let before = h.manager.registry().dump();

    assert_eq!(
        a.add_passengers(false, 1, [2, 3]).unwrap(),
        MutationOutcome::Cancelled
    );
    assert_eq!(h.manager.registry().dump(), before);
    assert!(h.sent_targets().is_empty());
}

#[test]
fn view_is_union_of_every_owner() {
    let h = Harness::new();
    for (owner, ids) in [("a", [1, 2]), ("b", [2, 4]), ("c", [8, 1])] {
        h.manager.session(owner).add_passengers(false, 50, ids).unwrap();
    }
    h.manager.add_passengers(false, 50, [16], true).unwrap();

    let expected: PassengerSet = [1, 2, 4, 8, 16].into();
    assert_eq!(h.manager.session("a").global_passengers(50), expected);
    assert_eq!(h.last_packet_for(50), Some(vec![1, 2, 4, 8, 16]));
}

#[test]
fn owners_do_not_touch_each_other() {
    let h = Harness::new();
    let a = h.manager.session("a");
    let b = h.manager.session("b");
    a.add_passengers(false, 1, [10]).unwrap();
    b.add_passengers(false, 1, [10, 11]).unwrap();

    a.remove_passengers(false, 1, [10, 11]).unwrap();
    assert!(a.passengers(1).is_empty());
    assert_eq!(b.passengers(1), PassengerSet::from([10, 11]));
    assert_eq!(h.last_packet_for(1), Some(vec![10, 11]));
}

#[test]
fn repeated_add_is_idempotent() {
    let h = Harness::new();
    let a = h.manager.session("a");
    a.add_passenger(false, 1, 2).unwrap();
    let once = h.manager.registry().dump();
    a.add_passenger(false, 1, 2).unwrap();

    assert_eq!(h.manager.registry().dump(), once);
    assert_eq!(h.manager.total_passenger_count(), 1);
}

#[test]
fn observers_choose_recipients() {
    let h = Harness::new();
    h.bus.on::<PassengerPacketEvent>("p2-only", |e| {
        e.receivers_mut().retain(|r| r.name == "p2")
    });
    h.manager.session("a").add_passenger(false, 3, 4).unwrap();

    let outbox = h.outbox.lock().unwrap();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].0, "p2");
}

#[test]
fn empty_views_can_be_withheld() {
    let config = PassengerConfig {
        dispatch_empty_views: false,
        ..Default::default()
    };
    let h = Harness::with_config(config);
    let a = h.manager.session("a");
    a.add_passenger(false, 9, 1).unwrap();
    h.clear_outbox();

    a.remove_passenger(false, 9, 1).unwrap();
    assert!(h.sent_targets().is_empty());
    assert_eq!(h.manager.refresh(false, 9).unwrap(), DispatchOutcome::Skipped);
}

#[test]
fn internal_removals_span_all_owners() {
    let h = Harness::new();
    let a = h.manager.session("a");
    let b = h.manager.session("b");
    a.add_passengers(false, 1, [5, 6]).unwrap();
    b.add_passengers(false, 2, [5]).unwrap();
    b.add_passengers(false, 3, [7]).unwrap();
    h.clear_outbox();

    h.manager.remove_passengers(false, [5], true).unwrap();

    assert_eq!(h.manager.registry().global_snapshot(1), PassengerSet::from([6]));
    assert!(h.manager.registry().global_snapshot(2).is_empty());
    // Two recipients per touched target, target 3 untouched.
    assert_eq!(h.sent_targets(), vec![1, 1, 2, 2]);
}

#[test]
fn batched_mutations_then_refresh() {
    let h = Harness::new();
    let quiet = h.manager.session("a").with_dispatch(false);
    for target in [30, 10, 20] {
        quiet.add_passenger(true, target, target + 1).unwrap();
    }
    assert!(h.sent_targets().is_empty());

    let outcomes = h.manager.refresh_all(false).unwrap();
    assert_eq!(
        outcomes,
        vec![
            (10, DispatchOutcome::Sent { recipients: 2 }),
            (20, DispatchOutcome::Sent { recipients: 2 }),
            (30, DispatchOutcome::Sent { recipients: 2 }),
        ]
    );
    assert_eq!(h.sent_targets(), vec![10, 10, 20, 20, 30, 30]);
}

#[test]
fn concurrent_owners_keep_their_entries() {
    let h = Harness::new();
    std::thread::scope(|scope| {
        for owner in 0..4 {
            let session = h.manager.session(format!("owner-{owner}")).with_dispatch(false);
            scope.spawn(move || {
                for target in 0..25 {
                    session.add_passengers(true, target, [owner, 100 + owner]).unwrap();
                    session.remove_passenger(true, target, 100 + owner).unwrap();
                }
            });
        }
    });

    assert_eq!(h.manager.total_target_count(), 100);
    assert_eq!(
        h.manager.registry().global_snapshot(12),
        PassengerSet::from([0, 1, 2, 3])
    );
}
