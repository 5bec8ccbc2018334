// User notifications and lock-free channels

pub mod channels;
pub mod notification;

pub use channels::{
    EngineConsumer, EngineProducer, NotificationConsumer, NotificationProducer,
    create_engine_channel, create_notification_channel,
};
pub use notification::{Notification, NotificationCategory, NotificationLevel};
