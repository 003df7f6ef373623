use async_trait::async_trait;
use futures::future::BoxFuture;
use log::warn;
use tokio::sync::{mpsc, oneshot};

use super::{TanChallenge, TanResponse};
use crate::Error;

/// Supplies TAN responses to an asynchronous [Dialog](crate::dialog::Dialog).
#[async_trait]
pub trait AsyncTanProvider: Send {
    async fn request_tan(&mut self, challenge: &TanChallenge) -> Result<TanResponse, Error>;
}

#[async_trait]
impl<F> AsyncTanProvider for F
where
    F: FnMut(&TanChallenge) -> BoxFuture<'static, TanResponse> + Send,
{
    async fn request_tan(&mut self, challenge: &TanChallenge) -> Result<TanResponse, Error> {
        Ok(self(challenge).await)
    }
}

/// A challenge waiting for an answer on the receiving side of a [tan_channel].
#[derive(Debug)]
pub struct TanRequest {
    challenge: TanChallenge,
    reply: oneshot::Sender<TanResponse>,
}

impl TanRequest {
    pub fn challenge(&self) -> &TanChallenge {
        &self.challenge
    }

    /// Answer the challenge. Dropping the request without answering cancels it.
    pub fn respond(self, response: TanResponse) -> Result<(), Error> {
        self.reply.send(response).map_err(|_| Error::TanChannelClosed)
    }
}

/// Forwards challenges to a receiver and waits for the answer.
#[derive(Debug, Clone)]
pub struct ChannelTanProvider {
    requests: mpsc::UnboundedSender<TanRequest>,
}

/// Creates a provider and the receiver its challenges are delivered to.
pub fn tan_channel() -> (ChannelTanProvider, mpsc::UnboundedReceiver<TanRequest>) {
    let (requests, receiver) = mpsc::unbounded_channel();
    (ChannelTanProvider { requests }, receiver)
}

#[async_trait]
impl AsyncTanProvider for ChannelTanProvider {
    async fn request_tan(&mut self, challenge: &TanChallenge) -> Result<TanResponse, Error> {
        let (reply, response) = oneshot::channel();

        self.requests
            .send(TanRequest {
                challenge: challenge.clone(),
                reply,
            })
            .map_err(|_| Error::TanChannelClosed)?;

        match response.await {
            Ok(response) => Ok(response),
            Err(_) => {
                warn!("TAN request dropped without answer, cancelling");
                Ok(TanResponse::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;
    use crate::messages::decode;
    use crate::responses::{DialogResult, ScaCodes};
    use crate::testdata::responses::SCA_REQUIRED;

    fn challenge() -> TanChallenge {
        let result = DialogResult::from_segments(SCA_REQUIRED, decode(SCA_REQUIRED).unwrap(), &ScaCodes::default());
        TanChallenge::new(result, None, Some("ORDERREF1".into()))
    }

    #[tokio::test]
    async fn test_closure_provider() {
        let mut provider = |_: &TanChallenge| async { TanResponse::Tan("123456".into()) }.boxed();

        let response = provider.request_tan(&challenge()).await.unwrap();

        assert_eq!(response, TanResponse::Tan("123456".into()));
    }

    #[tokio::test]
    async fn test_channel_provider_round_trip() {
        let (mut provider, mut requests) = tan_channel();

        let answering = tokio::spawn(async move {
            let request = requests.recv().await.unwrap();
            assert_eq!(request.challenge().order_reference(), Some("ORDERREF1"));
            request.respond(TanResponse::Tan("654321".into())).unwrap();
        });

        let response = provider.request_tan(&challenge()).await.unwrap();
        answering.await.unwrap();

        assert_eq!(response, TanResponse::Tan("654321".into()));
    }

    #[tokio::test]
    async fn test_dropped_request_cancels() {
        let (mut provider, mut requests) = tan_channel();

        let answering = tokio::spawn(async move {
            drop(requests.recv().await);
        });

        let response = provider.request_tan(&challenge()).await.unwrap();
        answering.await.unwrap();

        assert_eq!(response, TanResponse::Cancelled);
    }

    #[tokio::test]
    async fn test_closed_channel() {
        let (mut provider, requests) = tan_channel();
        drop(requests);

        assert!(matches!(provider.request_tan(&challenge()).await, Err(Error::TanChannelClosed)));
    }
}
