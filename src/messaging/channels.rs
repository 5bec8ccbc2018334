// Lock-free communication channels

use crate::engine::EngineMessage;
use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

pub type EngineProducer = ringbuf::HeapProd<EngineMessage>;
pub type EngineConsumer = ringbuf::HeapCons<EngineMessage>;

pub fn create_engine_channel(capacity: usize) -> (EngineProducer, EngineConsumer) {
    let rb = HeapRb::<EngineMessage>::new(capacity);
    rb.split()
}
