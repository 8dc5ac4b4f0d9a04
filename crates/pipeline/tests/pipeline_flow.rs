//! End-to-end pipeline tests over the in-memory store with fake
//! directory and push gateway.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use pulsewatch_core::types::UserId;
use pulsewatch_core::{DeviceLimit, LimitKind, LimitSet, Observation};
use pulsewatch_db::models::Device;
use pulsewatch_pipeline::{
    keys, Directory, MarkerRateLimiter, NotificationDispatcher, NotificationTask,
    ObservationProcessor, PipelineError, PushGateway, PushOutcome, PushPayload,
};
use pulsewatch_store::{LeaseQueue, MemoryStore, QueueStore};

const DEVICE: &str = "ABCD1234";
const TIMEOUT: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeDirectory {
    devices: HashMap<String, Device>,
    limits: HashMap<String, Vec<DeviceLimit>>,
    endpoints: HashMap<UserId, Vec<String>>,
    chat: Mutex<Vec<(String, String)>>,
}

impl FakeDirectory {
    fn chat_lines(&self) -> Vec<(String, String)> {
        self.chat.lock().unwrap().clone()
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn device(&self, device_id: &str) -> Result<Option<Device>, PipelineError> {
        Ok(self.devices.get(device_id).cloned())
    }

    async fn limits_for(
        &self,
        device_id: &str,
        _user_id: UserId,
    ) -> Result<LimitSet, PipelineError> {
        Ok(LimitSet::new(
            self.limits.get(device_id).cloned().unwrap_or_default(),
        ))
    }

    async fn push_endpoints(&self, user_id: UserId) -> Result<Vec<String>, PipelineError> {
        Ok(self.endpoints.get(&user_id).cloned().unwrap_or_default())
    }

    async fn append_chat_log(
        &self,
        topic: &str,
        _poster: &str,
        content: &str,
    ) -> Result<(), PipelineError> {
        self.chat
            .lock()
            .unwrap()
            .push((topic.to_string(), content.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct FakeGateway {
    sent: Mutex<Vec<(Vec<String>, PushPayload)>>,
}

impl FakeGateway {
    fn deliveries(&self) -> Vec<(Vec<String>, PushPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for FakeGateway {
    async fn send(
        &self,
        endpoints: &[String],
        payload: &PushPayload,
    ) -> Result<Vec<PushOutcome>, PipelineError> {
        self.sent
            .lock()
            .unwrap()
            .push((endpoints.to_vec(), payload.clone()));
        Ok(vec![PushOutcome::Delivered; endpoints.len()])
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

struct Fixture {
    store: Arc<MemoryStore>,
    directory: Arc<FakeDirectory>,
    gateway: Arc<FakeGateway>,
}

impl Fixture {
    fn new(limits: Vec<DeviceLimit>) -> Self {
        let owner = Uuid::new_v4();
        let mut directory = FakeDirectory::default();
        directory.devices.insert(
            DEVICE.to_string(),
            Device {
                id: DEVICE.to_string(),
                name: "Fridge".to_string(),
                owner_id: Some(owner),
                flags: 0,
            },
        );
        directory.limits.insert(DEVICE.to_string(), limits);
        directory
            .endpoints
            .insert(owner, vec!["token-1".to_string(), "token-2".to_string()]);
        Self {
            store: Arc::new(MemoryStore::new()),
            directory: Arc::new(directory),
            gateway: Arc::new(FakeGateway::default()),
        }
    }

    fn observations(&self) -> LeaseQueue<MemoryStore> {
        LeaseQueue::new(self.store.clone(), keys::OBS_PENDING, keys::OBS_IN_PROGRESS)
    }

    fn notifications(&self) -> LeaseQueue<MemoryStore> {
        LeaseQueue::new(
            self.store.clone(),
            keys::NOTE_PENDING,
            keys::NOTE_IN_PROGRESS,
        )
    }

    fn processor(&self) -> ObservationProcessor<MemoryStore> {
        ObservationProcessor::new(
            self.observations(),
            self.notifications(),
            self.directory.clone(),
            Arc::new(MarkerRateLimiter::new(self.store.clone())),
            TIMEOUT,
            Duration::from_secs(5),
        )
    }

    fn dispatcher(&self) -> NotificationDispatcher<MemoryStore> {
        NotificationDispatcher::new(
            self.notifications(),
            self.directory.clone(),
            self.gateway.clone(),
            TIMEOUT,
            Duration::from_secs(5),
        )
    }

    async fn submit(&self, obs: &Observation) {
        self.observations()
            .enqueue(&format!("obs:{}", Uuid::new_v4()), &obs.to_fields())
            .await
            .unwrap();
    }

    async fn pending_tasks(&self) -> Vec<NotificationTask> {
        let mut tasks = Vec::new();
        for key in self.store.list_values(keys::NOTE_PENDING).await.unwrap() {
            let fields = self.store.hash_get_all(&key).await.unwrap();
            tasks.push(NotificationTask::from_fields(&key, &fields).unwrap());
        }
        tasks
    }
}

fn limit(owner: UserId, kind: LimitKind, value: f64) -> DeviceLimit {
    DeviceLimit {
        user_id: owner,
        device_id: DEVICE.to_string(),
        kind,
        value,
        value_str: None,
        flag: 0,
    }
}

fn observation(temp: f64, accel: (i32, i32, i32)) -> Observation {
    Observation {
        device_id: DEVICE.to_string(),
        obs_time: 1_700_000_000_000.0,
        charging: true,
        firmware: "1.0.3".to_string(),
        battery: 3.9,
        temp,
        light: 0,
        humidity: 0,
        accel_x: accel.0,
        accel_y: accel.1,
        accel_z: accel.2,
    }
}

fn alert_limits(owner: UserId) -> Vec<DeviceLimit> {
    vec![
        limit(owner, LimitKind::TempLow, 10.0),
        limit(owner, LimitKind::TempHigh, 30.0),
        limit(owner, LimitKind::Notifications, 300.0),
    ]
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn temperature_alert_flows_to_push() {
    let fx = Fixture::new(alert_limits(Uuid::new_v4()));

    fx.submit(&observation(35.0, (0, 0, 0))).await;
    fx.processor().drain().await.unwrap();

    // Chat line written against the device topic.
    let chat = fx.directory.chat_lines();
    assert_eq!(chat.len(), 1);
    assert_eq!(chat[0].0, DEVICE);
    assert!(chat[0].1.contains("temperature is reaching 35.0°C"), "{}", chat[0].1);

    // One task queued, observation queue fully drained.
    let tasks = fx.pending_tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].kind, LimitKind::TempHigh);
    assert_eq!(tasks[0].device_id, DEVICE);
    assert!(fx
        .store
        .list_values(keys::OBS_PENDING)
        .await
        .unwrap()
        .is_empty());
    assert!(fx
        .store
        .list_values(keys::OBS_IN_PROGRESS)
        .await
        .unwrap()
        .is_empty());

    fx.dispatcher().drain().await.unwrap();
    let deliveries = fx.gateway.deliveries();
    assert_eq!(deliveries.len(), 1);
    let (endpoints, payload) = &deliveries[0];
    assert_eq!(endpoints, &["token-1".to_string(), "token-2".to_string()]);
    assert_eq!(payload.device_name, "Fridge");
    assert_eq!(payload.colour, "4c96fc");
    assert!(!payload.shared);
    assert_eq!(payload.title, "High Temperature Alert");
    assert_eq!(payload.formatted_value, "35.0°C");

    // Notification queue fully drained too.
    assert!(fx
        .store
        .list_values(keys::NOTE_PENDING)
        .await
        .unwrap()
        .is_empty());
    assert!(fx
        .store
        .list_values(keys::NOTE_IN_PROGRESS)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn cooldown_suppresses_second_notification() {
    let owner = Uuid::new_v4();
    let fx = Fixture::new(alert_limits(owner));

    fx.submit(&observation(35.0, (0, 0, 0))).await;
    fx.submit(&observation(36.0, (0, 0, 0))).await;
    fx.processor().drain().await.unwrap();

    // Both alerts land in the chat log; only the first is notified.
    assert_eq!(fx.directory.chat_lines().len(), 2);
    assert_eq!(fx.pending_tasks().await.len(), 1);
}

#[tokio::test]
async fn motion_wins_over_temperature() {
    let owner = Uuid::new_v4();
    let fx = Fixture::new(alert_limits(owner));

    fx.submit(&observation(35.0, (2, 1, 0))).await;
    fx.processor().drain().await.unwrap();

    let chat = fx.directory.chat_lines();
    assert_eq!(chat.len(), 1);
    assert!(chat[0].1.contains("has been moved"), "{}", chat[0].1);

    let tasks = fx.pending_tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].kind, LimitKind::MovementLevel);
    assert_eq!(tasks[0].observed_value, 3.0);
}

#[tokio::test]
async fn unowned_device_drains_silently() {
    let mut directory = FakeDirectory::default();
    directory.devices.insert(
        DEVICE.to_string(),
        Device {
            id: DEVICE.to_string(),
            name: "Fridge".to_string(),
            owner_id: None,
            flags: 0,
        },
    );
    let fx = Fixture {
        directory: Arc::new(directory),
        ..Fixture::new(Vec::new())
    };

    fx.submit(&observation(35.0, (0, 0, 0))).await;
    fx.processor().drain().await.unwrap();

    assert!(fx.directory.chat_lines().is_empty());
    assert!(fx.pending_tasks().await.is_empty());
    assert!(fx
        .store
        .list_values(keys::OBS_PENDING)
        .await
        .unwrap()
        .is_empty());
    assert!(fx
        .store
        .list_values(keys::OBS_IN_PROGRESS)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn zero_cooldown_logs_but_never_notifies() {
    let owner = Uuid::new_v4();
    let fx = Fixture::new(vec![
        limit(owner, LimitKind::TempLow, 10.0),
        limit(owner, LimitKind::TempHigh, 30.0),
    ]);

    fx.submit(&observation(35.0, (0, 0, 0))).await;
    fx.processor().drain().await.unwrap();

    assert_eq!(fx.directory.chat_lines().len(), 1);
    assert!(fx.pending_tasks().await.is_empty());
}

#[tokio::test]
async fn unusable_cooldown_value_logs_alert_but_never_notifies() {
    // All of these are storable in the limits table; none may panic the
    // drain or produce a task.
    for bad_cooldown in [f64::NAN, f64::INFINITY, -300.0, 1e300] {
        let owner = Uuid::new_v4();
        let fx = Fixture::new(vec![
            limit(owner, LimitKind::TempLow, 10.0),
            limit(owner, LimitKind::TempHigh, 30.0),
            limit(owner, LimitKind::Notifications, bad_cooldown),
        ]);

        fx.submit(&observation(35.0, (0, 0, 0))).await;
        fx.processor().drain().await.unwrap();

        assert_eq!(fx.directory.chat_lines().len(), 1, "{bad_cooldown}");
        assert!(fx.pending_tasks().await.is_empty(), "{bad_cooldown}");
        // The observation itself is still completed.
        assert!(fx
            .store
            .list_values(keys::OBS_IN_PROGRESS)
            .await
            .unwrap()
            .is_empty());
    }
}

#[tokio::test]
async fn corrupt_task_is_discarded_without_push() {
    let owner = Uuid::new_v4();
    let fx = Fixture::new(alert_limits(owner));

    // Hand-queue a task record missing most of its fields.
    fx.notifications()
        .enqueue(
            "note:broken",
            &[("userId".to_string(), "not-a-uuid".to_string())],
        )
        .await
        .unwrap();
    fx.dispatcher().drain().await.unwrap();

    assert!(fx.gateway.deliveries().is_empty());
    assert!(fx
        .store
        .list_values(keys::NOTE_PENDING)
        .await
        .unwrap()
        .is_empty());
    assert!(fx
        .store
        .list_values(keys::NOTE_IN_PROGRESS)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn shared_viewer_sees_shared_flag_and_custom_colour() {
    let owner = Uuid::new_v4();
    let viewer = Uuid::new_v4();
    let mut directory = FakeDirectory::default();
    directory.devices.insert(
        DEVICE.to_string(),
        Device {
            id: DEVICE.to_string(),
            name: "Fridge".to_string(),
            owner_id: Some(owner),
            flags: 0,
        },
    );
    directory.limits.insert(
        DEVICE.to_string(),
        vec![DeviceLimit {
            user_id: viewer,
            device_id: DEVICE.to_string(),
            kind: LimitKind::Colour,
            value: 0.0,
            value_str: Some("ff8800".to_string()),
            flag: 0,
        }],
    );
    directory
        .endpoints
        .insert(viewer, vec!["viewer-token".to_string()]);
    let fx = Fixture {
        directory: Arc::new(directory),
        ..Fixture::new(Vec::new())
    };

    // Queue a task addressed to the viewer, not the owner.
    let task = NotificationTask::new(viewer, DEVICE, LimitKind::TempHigh, 35.0, 3.9, false);
    fx.notifications()
        .enqueue(&task.key, &task.to_fields())
        .await
        .unwrap();
    fx.dispatcher().drain().await.unwrap();

    let deliveries = fx.gateway.deliveries();
    assert_eq!(deliveries.len(), 1);
    let (endpoints, payload) = &deliveries[0];
    assert_eq!(endpoints, &["viewer-token".to_string()]);
    assert!(payload.shared);
    assert_eq!(payload.colour, "ff8800");
}
