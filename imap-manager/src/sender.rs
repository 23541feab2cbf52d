//! # Mail sender
//!
//! The sender capability used by the redirect operation. A
//! [`MailSender`] opens [`SenderSession`]s which resend raw messages
//! using an explicit [`Envelope`].

use async_trait::async_trait;

use crate::{smtp::config::SmtpConfig, AnyResult};

/// The SMTP envelope.
///
/// The envelope is independent from the message headers: it defines
/// where the message is actually delivered.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Envelope {
    /// The envelope sender, `None` for the null sender.
    pub from: Option<String>,

    /// The envelope recipients.
    pub to: Vec<String>,
}

/// The mail sender, able to open sending sessions.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Connect then authenticate to the server.
    async fn connect(&self, config: &SmtpConfig) -> AnyResult<Box<dyn SenderSession>>;
}

/// A live connection to a sending server.
#[async_trait]
pub trait SenderSession: Send {
    /// Send the raw message unmodified, using the given envelope.
    ///
    /// Returns the identifier of the sent message, if available.
    async fn send_raw_message(&mut self, envelope: &Envelope, raw: &[u8])
        -> AnyResult<Option<String>>;

    /// Close the connection.
    async fn quit(&mut self) -> AnyResult<()>;
}
