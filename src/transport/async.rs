use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::Error;

/// Asynchronous request/response exchange with the bank.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    /// Send one message and return the reply.
    async fn send(&self, message: &str) -> Result<String, Error>;
}

#[async_trait]
impl<F> AsyncTransport for F
where
    F: Fn(&str) -> BoxFuture<'static, Result<String, Error>> + Send + Sync,
{
    async fn send(&self, message: &str) -> Result<String, Error> {
        self(message).await
    }
}
