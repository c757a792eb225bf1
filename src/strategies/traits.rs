// src/strategies/traits.rs
use crate::errors::Result;
use crate::strategies::momentum::RunOutcome;
use crate::types::Side;
use async_trait::async_trait;

#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> String;

    // Evaluate the product once; `side` is the side requested upstream, if any
    async fn run(&self, side: Option<Side>) -> Result<RunOutcome>;
}
