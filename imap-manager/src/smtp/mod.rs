//! # SMTP
//!
//! Module dedicated to SMTP. The credentials are always available,
//! while the [`SmtpSender`] capability requires the `smtp` cargo
//! feature.

pub mod config;
#[cfg(feature = "smtp")]
mod error;

#[cfg(feature = "smtp")]
#[doc(inline)]
pub use self::error::{Error, Result};
#[cfg(feature = "smtp")]
pub use self::sender::*;

#[cfg(feature = "smtp")]
mod sender {
    use async_trait::async_trait;
    use mail_parser::MessageParser;
    use mail_send::{
        smtp::message::{Address, IntoMessage, Message},
        SmtpClient, SmtpClientBuilder,
    };
    use tokio::net::TcpStream;
    use tokio_rustls::client::TlsStream;
    use tracing::{debug, info, instrument};

    use super::{config::SmtpConfig, Error, Result};
    use crate::{
        sender::{Envelope, MailSender, SenderSession},
        AnyResult,
    };

    /// The SMTP implementation of the mail sender capability.
    #[derive(Clone, Debug, Default)]
    pub struct SmtpSender;

    impl SmtpSender {
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait]
    impl MailSender for SmtpSender {
        #[instrument(name = "smtp::connect", skip_all, fields(host = %config.host, port = config.port))]
        async fn connect(&self, config: &SmtpConfig) -> AnyResult<Box<dyn SenderSession>> {
            let client = build_client(config).await?;
            info!("connected to SMTP server");

            Ok(Box::new(SmtpSession {
                client: Some(client),
            }))
        }
    }

    pub enum SmtpClientStream {
        Tcp(SmtpClient<TcpStream>),
        Tls(SmtpClient<TlsStream<TcpStream>>),
    }

    impl SmtpClientStream {
        pub async fn send(&mut self, msg: impl IntoMessage<'_>) -> mail_send::Result<()> {
            match self {
                Self::Tcp(client) => client.send(msg).await,
                Self::Tls(client) => client.send(msg).await,
            }
        }

        pub async fn quit(self) -> mail_send::Result<()> {
            match self {
                Self::Tcp(client) => client.quit().await,
                Self::Tls(client) => client.quit().await,
            }
        }
    }

    /// Connect then authenticate to the SMTP server.
    ///
    /// Credentials are only sent when a login is defined.
    pub async fn build_client(config: &SmtpConfig) -> Result<SmtpClientStream> {
        let host = config.host.clone();
        let port = config.port;

        let mut builder = SmtpClientBuilder::new(host.clone(), port)
            .implicit_tls(!config.is_start_tls_encryption_enabled());

        if !config.login.is_empty() {
            builder = builder.credentials((config.login.clone(), config.passwd.clone()));
        }

        if config.is_encryption_disabled() {
            debug!("connecting to SMTP server using TCP");
            match builder.connect_plain().await {
                Ok(client) => Ok(SmtpClientStream::Tcp(client)),
                Err(err) => Err(Error::ConnectTcpError(err, host, port)),
            }
        } else {
            debug!("connecting to SMTP server using TLS");
            match builder.connect().await {
                Ok(client) => Ok(SmtpClientStream::Tls(client)),
                Err(err) => Err(Error::ConnectTlsError(err, host, port)),
            }
        }
    }

    /// A live SMTP session.
    pub struct SmtpSession {
        client: Option<SmtpClientStream>,
    }

    #[async_trait]
    impl SenderSession for SmtpSession {
        async fn send_raw_message(
            &mut self,
            envelope: &Envelope,
            raw: &[u8],
        ) -> AnyResult<Option<String>> {
            let client = self.client.as_mut().ok_or(Error::SessionClosedError)?;
            let msg = into_smtp_msg(envelope, raw)?;

            client.send(msg).await.map_err(Error::SendMessageError)?;

            let message_id = find_message_id(raw);
            debug!("message sent with id {message_id:?}");

            Ok(message_id)
        }

        async fn quit(&mut self) -> AnyResult<()> {
            if let Some(client) = self.client.take() {
                client.quit().await.map_err(Error::QuitError)?;
            }
            Ok(())
        }
    }

    /// Build an SMTP message sending the raw bytes unmodified, using
    /// the given envelope.
    fn into_smtp_msg<'a>(envelope: &'a Envelope, raw: &'a [u8]) -> Result<Message<'a>> {
        if envelope.to.is_empty() {
            return Err(Error::SendMessageMissingRecipientError);
        }

        let mail_from = Address {
            email: envelope.from.as_deref().unwrap_or_default().into(),
            ..Default::default()
        };

        let rcpt_to = envelope
            .to
            .iter()
            .map(|email| Address {
                email: email.as_str().into(),
                ..Default::default()
            })
            .collect();

        Ok(Message {
            mail_from,
            rcpt_to,
            body: raw.into(),
        })
    }

    /// Find the angle-bracketed `Message-ID` header of the given raw
    /// message.
    pub fn find_message_id(raw: &[u8]) -> Option<String> {
        MessageParser::new()
            .parse(raw)
            .and_then(|msg| msg.message_id().map(|id| format!("<{id}>")))
    }

}
