//! Alarm store interface

use super::command::{Field, Payload, Selector};
use super::types::Alarm;
use async_trait::async_trait;

/// Keyed alarm storage the dialogue's commands are executed against
#[async_trait]
pub trait AlarmStore: Send + Sync {
    /// Insert a new alarm built from `fields`
    async fn create(&self, fields: &Payload) -> crate::Result<Alarm>;

    /// Apply `payload` to every alarm matching `selector`, returning the count
    async fn update(&self, selector: &Selector, payload: &Payload) -> crate::Result<usize>;

    /// Remove every alarm matching `selector`, returning the count
    async fn delete(&self, selector: &Selector) -> crate::Result<usize>;

    /// Alarms matching `selector`, sorted by `order_by` (newest first when empty)
    async fn query(&self, selector: &Selector, order_by: &[Field]) -> crate::Result<Vec<Alarm>>;
}
