//! 行程会话协调器单元测试
//!
//! 覆盖参与者授权、聊天顺序、到达转移的幂等拒绝和尽力通知。

use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    ConnectionId, Coordinate, DomainError, Identity, Outbound, RequestedTime, Ride, RideId,
    RideRequest, Role, RoomKey, ServerEvent, UserId, VehicleClass,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::ApplicationError;
use crate::notifier::{Notifier, NotifyError};
use crate::repository::memory::MemoryRideStore;
use crate::repository::RideStore;
use crate::services::ride_session_service::{RideSessionCoordinator, RideSessionDependencies};
use crate::sessions::{Channel, SessionDirectory};

/// 记录收到的通知，便于断言
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(UserId, String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_id: UserId, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .await
            .push((user_id, subject.to_owned(), body.to_owned()));
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _: UserId, _: &str, _: &str) -> Result<(), NotifyError> {
        Err(NotifyError::failed("smtp sandbox unreachable"))
    }
}

struct Fixture {
    coordinator: RideSessionCoordinator,
    rides: Arc<MemoryRideStore>,
    notifier: Arc<RecordingNotifier>,
}

fn fixture() -> Fixture {
    let rides = Arc::new(MemoryRideStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let coordinator = RideSessionCoordinator::new(RideSessionDependencies {
        sessions: Arc::new(SessionDirectory::new()),
        rides: rides.clone(),
        notifier: notifier.clone(),
    });
    Fixture {
        coordinator,
        rides,
        notifier,
    }
}

async fn matched_ride(rides: &MemoryRideStore) -> (Ride, Identity, Identity) {
    let rider_id = UserId::new(Uuid::new_v4());
    let driver_id = UserId::new(Uuid::new_v4());
    let class = VehicleClass::parse("sedan").unwrap();
    let ride = Ride::from_request(
        RideId::new(Uuid::new_v4()),
        driver_id,
        RideRequest {
            rider_id,
            vehicle_class: class.clone(),
            pickup: Coordinate::new(48.85, 2.35),
            destination: Coordinate::new(48.86, 2.29),
            destination_text: "Champ de Mars".to_owned(),
            requested_time: RequestedTime::Now,
        },
    );
    rides.create(ride.clone()).await.unwrap();
    (
        ride,
        Identity::rider(rider_id),
        Identity::driver(driver_id, class),
    )
}

#[tokio::test]
async fn join_ride_admits_both_parties() {
    let fixture = fixture();
    let (ride, rider, driver) = matched_ride(&fixture.rides).await;

    for identity in [&rider, &driver] {
        let effects = fixture
            .coordinator
            .join_ride(identity, ConnectionId::generate(), Channel::Ride, ride.id)
            .await
            .unwrap();
        assert_eq!(effects, vec![Outbound::JoinRoom(RoomKey::Ride(ride.id))]);
    }
}

#[tokio::test]
async fn join_ride_rejects_strangers() {
    let fixture = fixture();
    let (ride, _, _) = matched_ride(&fixture.rides).await;
    let stranger = Identity::rider(UserId::new(Uuid::new_v4()));

    let err = fixture
        .coordinator
        .join_ride(&stranger, ConnectionId::generate(), Channel::Chat, ride.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Unauthorized)
    ));
}

#[tokio::test]
async fn join_ride_on_a_missing_ride_is_not_found() {
    let fixture = fixture();
    let err = fixture
        .coordinator
        .join_ride(
            &Identity::rider(UserId::new(Uuid::new_v4())),
            ConnectionId::generate(),
            Channel::Ride,
            RideId::new(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn chat_appends_in_send_order_with_the_sender_role() {
    let fixture = fixture();
    let (ride, rider, driver) = matched_ride(&fixture.rides).await;

    fixture
        .coordinator
        .post_chat(&driver, ride.id, "on my way".to_owned())
        .await
        .unwrap();
    fixture
        .coordinator
        .post_chat(&rider, ride.id, "thanks".to_owned())
        .await
        .unwrap();
    fixture
        .coordinator
        .post_chat(&driver, ride.id, "two minutes".to_owned())
        .await
        .unwrap();

    let stored = fixture.rides.get(ride.id).await.unwrap().unwrap();
    let log: Vec<_> = stored
        .chat
        .iter()
        .map(|entry| (entry.sender, entry.message.as_str()))
        .collect();
    assert_eq!(
        log,
        vec![
            (Role::Driver, "on my way"),
            (Role::Rider, "thanks"),
            (Role::Driver, "two minutes"),
        ]
    );
}

#[tokio::test]
async fn chat_broadcasts_refresh_to_the_ride_room() {
    let fixture = fixture();
    let (ride, _, driver) = matched_ride(&fixture.rides).await;

    let effects = fixture
        .coordinator
        .post_chat(&driver, ride.id, "on my way".to_owned())
        .await
        .unwrap();
    assert_eq!(
        effects,
        vec![Outbound::ToRoom(
            RoomKey::Ride(ride.id),
            ServerEvent::Refresh
        )]
    );
}

#[tokio::test]
async fn empty_chat_message_is_rejected() {
    let fixture = fixture();
    let (ride, _, driver) = matched_ride(&fixture.rides).await;

    let err = fixture
        .coordinator
        .post_chat(&driver, ride.id, "   ".to_owned())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn chat_rejects_non_parties() {
    let fixture = fixture();
    let (ride, _, _) = matched_ride(&fixture.rides).await;

    let err = fixture
        .coordinator
        .post_chat(
            &Identity::rider(UserId::new(Uuid::new_v4())),
            ride.id,
            "let me in".to_owned(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Unauthorized)
    ));
}

#[tokio::test]
async fn arrival_sets_cost_within_the_fare_range() {
    let fixture = fixture();
    let (ride, _, driver) = matched_ride(&fixture.rides).await;

    let effects = fixture
        .coordinator
        .trigger_arrived(&driver, ride.id)
        .await
        .unwrap();
    assert_eq!(
        effects,
        vec![Outbound::ToRoom(
            RoomKey::Ride(ride.id),
            ServerEvent::Refresh
        )]
    );

    let stored = fixture.rides.get(ride.id).await.unwrap().unwrap();
    assert!(stored.arrived);
    let cost = stored.cost.unwrap();
    assert!((1..=100).contains(&cost), "cost out of range: {cost}");
}

#[tokio::test]
async fn second_arrival_is_rejected_and_cost_unchanged() {
    let fixture = fixture();
    let (ride, _, driver) = matched_ride(&fixture.rides).await;

    fixture
        .coordinator
        .trigger_arrived(&driver, ride.id)
        .await
        .unwrap();
    let first_cost = fixture.rides.get(ride.id).await.unwrap().unwrap().cost;

    let err = fixture
        .coordinator
        .trigger_arrived(&driver, ride.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::AlreadyArrived)
    ));
    assert_eq!(
        fixture.rides.get(ride.id).await.unwrap().unwrap().cost,
        first_cost
    );
}

#[tokio::test]
async fn only_the_rides_driver_can_trigger_arrival() {
    let fixture = fixture();
    let (ride, rider, _) = matched_ride(&fixture.rides).await;
    let other_driver = Identity::driver(
        UserId::new(Uuid::new_v4()),
        VehicleClass::parse("sedan").unwrap(),
    );

    for identity in [&rider, &other_driver] {
        let err = fixture
            .coordinator
            .trigger_arrived(identity, ride.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::Unauthorized)
        ));
    }
}

#[tokio::test]
async fn arrival_notifies_the_rider_with_the_invoice() {
    let fixture = fixture();
    let (ride, _, driver) = matched_ride(&fixture.rides).await;

    fixture
        .coordinator
        .trigger_arrived(&driver, ride.id)
        .await
        .unwrap();

    let sent = fixture.notifier.sent.lock().await;
    let cost = fixture
        .rides
        .get(ride.id)
        .await
        .unwrap()
        .unwrap()
        .cost
        .unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, ride.rider_id);
    assert_eq!(sent[0].1, "Ride completed!");
    assert_eq!(sent[0].2, format!("Hello! You owe {cost}$ to your driver!"));
}

#[tokio::test]
async fn notification_failure_does_not_abort_the_arrival() {
    let rides = Arc::new(MemoryRideStore::new());
    let coordinator = RideSessionCoordinator::new(RideSessionDependencies {
        sessions: Arc::new(SessionDirectory::new()),
        rides: rides.clone(),
        notifier: Arc::new(FailingNotifier),
    });
    let (ride, _, driver) = matched_ride(&rides).await;

    coordinator.trigger_arrived(&driver, ride.id).await.unwrap();

    let stored = rides.get(ride.id).await.unwrap().unwrap();
    assert!(stored.arrived);
    assert!(stored.cost.is_some());
}
