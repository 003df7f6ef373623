use crate::Error;

/// Blocking request/response exchange with the bank.
pub trait Transport {
    /// Send one message and return the reply.
    fn send(&self, message: &str) -> Result<String, Error>;
}

impl<F> Transport for F
where
    F: Fn(&str) -> Result<String, Error>,
{
    fn send(&self, message: &str) -> Result<String, Error> {
        self(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_transport() {
        let transport = |message: &str| -> Result<String, Error> { Ok(format!("echo {message}")) };

        assert_eq!(transport.send("HNHBK").unwrap(), "echo HNHBK");
    }

    #[test]
    fn test_closure_transport_failure() {
        let transport = |_: &str| -> Result<String, Error> { Err(Error::Transport("connection refused".into())) };

        assert!(transport.send("HNHBK").unwrap_err().is_transport());
    }
}
