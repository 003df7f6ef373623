use crossbeam::channel::{self, Receiver, Sender};
use log::warn;

use super::{TanChallenge, TanResponse};
use crate::Error;

/// Supplies TAN responses to a blocking [Dialog](crate::dialog::Dialog).
pub trait TanProvider {
    fn request_tan(&mut self, challenge: &TanChallenge) -> Result<TanResponse, Error>;
}

impl<F> TanProvider for F
where
    F: FnMut(&TanChallenge) -> TanResponse,
{
    fn request_tan(&mut self, challenge: &TanChallenge) -> Result<TanResponse, Error> {
        Ok(self(challenge))
    }
}

/// A challenge waiting for an answer on the receiving side of a [tan_channel].
#[derive(Debug)]
pub struct TanRequest {
    challenge: TanChallenge,
    reply: Sender<TanResponse>,
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

/// Forwards challenges to a [Receiver] and blocks until the answer arrives.
#[derive(Debug, Clone)]
pub struct ChannelTanProvider {
    requests: Sender<TanRequest>,
}

/// Creates a provider and the receiver its challenges are delivered to.
pub fn tan_channel() -> (ChannelTanProvider, Receiver<TanRequest>) {
    let (requests, receiver) = channel::unbounded();
    (ChannelTanProvider { requests }, receiver)
}

impl TanProvider for ChannelTanProvider {
    fn request_tan(&mut self, challenge: &TanChallenge) -> Result<TanResponse, Error> {
        let (reply, response) = channel::bounded(1);

        self.requests
            .send(TanRequest {
                challenge: challenge.clone(),
                reply,
            })
            .map_err(|_| Error::TanChannelClosed)?;

        match response.recv() {
            Ok(response) => Ok(response),
            Err(_) => {
                warn!("TAN request dropped without answer, cancelling");
                Ok(TanResponse::Cancelled)
            }
        }
    }
}
