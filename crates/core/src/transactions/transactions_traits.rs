use async_trait::async_trait;

use super::transactions_model::{OrderedTransactionRequest, OrderedTransactionResult};
use crate::errors::Result;

#[async_trait]
pub trait OrderedTransactionServiceTrait: Send + Sync {
    /// Validates, writes activities then valuations, and recalculates affected IRRs.
    ///
    /// Malformed payloads are rejected with a validation error before any write.
    /// Failures after that point are reported per item in the result.
    async fn save(&self, request: OrderedTransactionRequest) -> Result<OrderedTransactionResult>;
}
