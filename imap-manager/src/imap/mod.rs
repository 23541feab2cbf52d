//! # IMAP
//!
//! Module dedicated to IMAP. The credentials are always available,
//! while the [`ImapClient`] capability requires the `imap` cargo
//! feature.

pub mod config;
#[cfg(feature = "imap")]
mod error;

#[cfg(feature = "imap")]
pub use self::client::*;
#[cfg(feature = "imap")]
#[doc(inline)]
pub use self::error::{Error, Result};

#[cfg(feature = "imap")]
mod client {
    use std::{fmt, sync::Arc};

    use async_imap::types::{Fetch, Name, NameAttribute};
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use tokio::{
        io::{AsyncRead, AsyncWrite},
        net::TcpStream,
    };
    use tokio_rustls::{
        client::TlsStream,
        rustls::{pki_types::ServerName, ClientConfig, RootCertStore},
        TlsConnector,
    };
    use rip_starttls::imap::tokio::RipStarttls;
    use tracing::{debug, info, instrument, trace};
    use utf7_imap::{decode_utf7_imap as decode_utf7, encode_utf7_imap as encode_utf7};

    use super::{config::ImapConfig, Error, Result};
    use crate::{
        client::{MailClient, MailSession, MailboxInfo, MessageTransfer, Uid},
        config::EncryptionKind,
        AnyResult,
    };

    /// The streams an IMAP session can run on.
    pub trait ImapStream: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug + 'static {}

    impl<T: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug + 'static> ImapStream for T {}

    /// The IMAP implementation of the mail client capability.
    ///
    /// SSL/TLS connections are verified against the Mozilla root
    /// certificates.
    ///
    /// STARTTLS connections read the greeting and issue `STARTTLS`
    /// over plain TCP, then negotiate TLS without checking the tagged
    /// status of the command: a server refusing STARTTLS surfaces as
    /// a TLS negotiation error.
    #[derive(Clone)]
    pub struct ImapClient {
        tls: Arc<ClientConfig>,
    }

    impl ImapClient {
        pub fn new() -> Self {
            Self::with_tls_config(default_tls_config())
        }

        pub fn with_tls_config(tls: Arc<ClientConfig>) -> Self {
            Self { tls }
        }

        async fn connect_tls(&self, host: &str, tcp: TcpStream) -> Result<TlsStream<TcpStream>> {
            let domain = ServerName::try_from(host.to_owned())
                .map_err(|_| Error::InvalidServerNameError(host.to_owned()))?;

            TlsConnector::from(self.tls.clone())
                .connect(domain, tcp)
                .await
                .map_err(|err| Error::ConnectTlsError(err, host.to_owned()))
        }
    }

    impl Default for ImapClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl fmt::Debug for ImapClient {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("ImapClient").finish_non_exhaustive()
        }
    }

    #[async_trait]
    impl MailClient for ImapClient {
        #[instrument(name = "imap::connect", skip_all, fields(host = %config.host, port = config.port))]
        async fn connect(&self, config: &ImapConfig) -> AnyResult<Box<dyn MailSession>> {
            let host = config.host.as_str();
            let port = config.port;
            let encryption = config.encryption();

            debug!("connecting to IMAP server using {encryption}");

            let tcp = TcpStream::connect((host, port))
                .await
                .map_err(|err| Error::ConnectTcpError(err, host.to_owned(), port))?;

            let session: Box<dyn MailSession> = match encryption {
                EncryptionKind::Tls => {
                    let tls = self.connect_tls(host, tcp).await?;
                    Box::new(login(tls, config, true).await?)
                }
                EncryptionKind::StartTls => {
                    let tcp = RipStarttls::new(false)
                        .do_starttls_prefix(tcp)
                        .await
                        .map_err(Error::StartTlsError)?;
                    let tls = self.connect_tls(host, tcp).await?;
                    Box::new(login(tls, config, false).await?)
                }
                EncryptionKind::None => Box::new(login(tcp, config, true).await?),
            };

            info!("authenticated to IMAP server as {}", config.login);

            Ok(session)
        }
    }

    /// Build the TLS configuration trusting the Mozilla root
    /// certificates.
    pub fn default_tls_config() -> Arc<ClientConfig> {
        let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Arc::new(config)
    }

    async fn login<S: ImapStream>(
        stream: S,
        config: &ImapConfig,
        read_greeting: bool,
    ) -> Result<ImapSession<S>> {
        let mut client = async_imap::Client::new(stream);

        if read_greeting {
            let _greeting = client
                .read_response()
                .await
                .transpose()
                .map_err(|err| Error::ReadGreetingError(err.into()))?
                .ok_or(Error::MissingGreetingError)?;
            trace!("IMAP greeting read");
        }

        let session = client
            .login(&config.login, &config.passwd)
            .await
            .map_err(|(err, _)| Error::LoginError(err, config.login.clone()))?;

        Ok(ImapSession::new(session))
    }

    /// The IMAP implementation of the mail session capability.
    ///
    /// Locking a mailbox selects it: message commands always apply to
    /// the last selected mailbox.
    pub struct ImapSession<S: ImapStream> {
        session: async_imap::Session<S>,
        selected: Option<String>,
    }

    impl<S: ImapStream> ImapSession<S> {
        pub fn new(session: async_imap::Session<S>) -> Self {
            Self {
                session,
                selected: None,
            }
        }

        fn selected(&self) -> Result<&str> {
            self.selected
                .as_deref()
                .ok_or(Error::NoMailboxSelectedError)
        }

        async fn store(&mut self, uid: Uid, query: &str) -> async_imap::error::Result<()> {
            let fetches: Vec<Fetch> = self
                .session
                .uid_store(uid.to_string(), query)
                .await?
                .try_collect()
                .await?;
            trace!("{} fetch response(s) to {query}", fetches.len());
            Ok(())
        }
    }

    #[async_trait]
    impl<S: ImapStream> MailSession for ImapSession<S> {
        async fn list_mailboxes(&mut self) -> AnyResult<Vec<MailboxInfo>> {
            let names: Vec<Name> = self
                .session
                .list(Some(""), Some("*"))
                .await
                .map_err(Error::ListMailboxesError)?
                .try_collect()
                .await
                .map_err(Error::ListMailboxesError)?;

            debug!("listed {} IMAP mailbox(es)", names.len());

            Ok(names.iter().map(mailbox_info).collect())
        }

        async fn lock_mailbox(&mut self, mailbox: &str) -> AnyResult<()> {
            let encoded = encode_utf7(mailbox.to_owned());
            trace!("utf7 encoded mailbox: {encoded}");

            let mbox = self
                .session
                .select(&encoded)
                .await
                .map_err(|err| Error::SelectMailboxError(err, mailbox.to_owned()))?;
            debug!("selected mailbox {mailbox} ({} message(s))", mbox.exists);

            self.selected = Some(mailbox.to_owned());
            Ok(())
        }

        fn unlock_mailbox(&mut self, mailbox: &str) {
            if self.selected.as_deref() == Some(mailbox) {
                self.selected = None;
            }
        }

        async fn search_header(&mut self, header: &str, value: &str) -> AnyResult<Vec<Uid>> {
            let query = format!("HEADER {header} {}", quote(value));
            trace!("search query: {query}");

            let uids = self.session.uid_search(&query).await.map_err(|err| {
                Error::SearchHeaderError(err, header.to_owned(), value.to_owned())
            })?;

            Ok(uids.into_iter().collect())
        }

        async fn add_flags(&mut self, uid: Uid, flags: &[String]) -> AnyResult<()> {
            let flags = flags.join(" ");
            self.store(uid, &format!("+FLAGS.SILENT ({flags})"))
                .await
                .map_err(|err| Error::AddFlagsError(err, flags, uid))?;
            Ok(())
        }

        async fn remove_flags(&mut self, uid: Uid, flags: &[String]) -> AnyResult<()> {
            let flags = flags.join(" ");
            self.store(uid, &format!("-FLAGS.SILENT ({flags})"))
                .await
                .map_err(|err| Error::RemoveFlagsError(err, flags, uid))?;
            Ok(())
        }

        async fn move_message(&mut self, uid: Uid, destination: &str) -> AnyResult<MessageTransfer> {
            let path = self.selected()?.to_owned();

            self.session
                .uid_mv(uid.to_string(), encode_utf7(destination.to_owned()))
                .await
                .map_err(|err| Error::MoveMessageError(err, uid, destination.to_owned()))?;

            Ok(MessageTransfer {
                path,
                destination: destination.to_owned(),
            })
        }

        async fn copy_message(&mut self, uid: Uid, destination: &str) -> AnyResult<MessageTransfer> {
            let path = self.selected()?.to_owned();

            self.session
                .uid_copy(uid.to_string(), encode_utf7(destination.to_owned()))
                .await
                .map_err(|err| Error::CopyMessageError(err, uid, destination.to_owned()))?;

            Ok(MessageTransfer {
                path,
                destination: destination.to_owned(),
            })
        }

        async fn delete_message(&mut self, uid: Uid) -> AnyResult<()> {
            self.store(uid, "+FLAGS.SILENT (\\Deleted)")
                .await
                .map_err(|err| Error::MarkDeletedError(err, uid))?;

            let expunged: Vec<u32> = self
                .session
                .uid_expunge(uid.to_string())
                .await
                .map_err(|err| Error::ExpungeError(err, uid))?
                .try_collect()
                .await
                .map_err(|err| Error::ExpungeError(err, uid))?;
            debug!("expunged {} message(s)", expunged.len());

            Ok(())
        }

        async fn fetch_raw_message(&mut self, uid: Uid) -> AnyResult<Option<Vec<u8>>> {
            let fetches: Vec<Fetch> = self
                .session
                .uid_fetch(uid.to_string(), "BODY.PEEK[]")
                .await
                .map_err(|err| Error::FetchMessageError(err, uid))?
                .try_collect()
                .await
                .map_err(|err| Error::FetchMessageError(err, uid))?;

            let raw = fetches
                .iter()
                .filter(|fetch| fetch.uid.map_or(true, |fetched| fetched == uid))
                .find_map(|fetch| fetch.body())
                .map(ToOwned::to_owned);

            Ok(raw)
        }

        async fn logout(&mut self) -> AnyResult<()> {
            self.session.logout().await.map_err(Error::LogoutError)?;
            Ok(())
        }
    }

    fn mailbox_info(name: &Name) -> MailboxInfo {
        let path = decode_utf7(name.name().to_owned());
        let delimiter = name.delimiter().map(ToOwned::to_owned);

        let short_name = match &delimiter {
            Some(delim) if !delim.is_empty() => path.rsplit(delim.as_str()).next(),
            _ => None,
        }
        .unwrap_or(&path)
        .to_owned();

        let mut special_use = None;
        let mut flags = Vec::with_capacity(name.attributes().len());

        for attr in name.attributes() {
            let (flag, is_special_use) = attribute(attr);
            if is_special_use && special_use.is_none() {
                special_use = Some(flag.clone());
            }
            flags.push(flag);
        }

        if special_use.is_none() && path.eq_ignore_ascii_case("INBOX") {
            special_use = Some(String::from("\\Inbox"));
        }

        MailboxInfo {
            path,
            name: short_name,
            flags,
            special_use,
            delimiter,
        }
    }

    /// Render a mailbox attribute, and tell if it is a special use
    /// attribute (RFC 6154).
    fn attribute(attr: &NameAttribute<'_>) -> (String, bool) {
        #[allow(unreachable_patterns)]
        match attr {
            NameAttribute::NoInferiors => ("\\Noinferiors".into(), false),
            NameAttribute::NoSelect => ("\\Noselect".into(), false),
            NameAttribute::Marked => ("\\Marked".into(), false),
            NameAttribute::Unmarked => ("\\Unmarked".into(), false),
            NameAttribute::All => ("\\All".into(), true),
            NameAttribute::Archive => ("\\Archive".into(), true),
            NameAttribute::Drafts => ("\\Drafts".into(), true),
            NameAttribute::Flagged => ("\\Flagged".into(), true),
            NameAttribute::Junk => ("\\Junk".into(), true),
            NameAttribute::Sent => ("\\Sent".into(), true),
            NameAttribute::Trash => ("\\Trash".into(), true),
            NameAttribute::Extension(ext) => (ext.to_string(), false),
            attr => (format!("{attr:?}"), false),
        }
    }

    /// Quote the given value as an IMAP quoted string.
    fn quote(value: &str) -> String {
        let mut quoted = String::with_capacity(value.len() + 2);
        quoted.push('"');
        for c in value.chars() {
            if c == '"' || c == '\\' {
                quoted.push('\\');
            }
            quoted.push(c);
        }
        quoted.push('"');
        quoted
    }

}
