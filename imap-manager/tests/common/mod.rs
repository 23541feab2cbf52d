#![allow(dead_code)]

use std::{
    any::Any,
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use imap_manager::{
    client::{MailClient, MailSession, MailboxInfo, MessageTransfer, Uid},
    imap::config::ImapConfig,
    sender::{Envelope, MailSender, SenderSession},
    smtp::config::SmtpConfig,
    AnyBoxedError, AnyError, AnyResult,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FakeError {
    #[error("authentication failed for {0}")]
    AuthenticationError(String),
    #[error("mailbox {0} does not exist")]
    NoSuchMailboxError(String),
    #[error("no mailbox selected")]
    NoMailboxSelectedError,
    #[error("logout failed")]
    LogoutError,
}

impl AnyError for FakeError {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<FakeError> for AnyBoxedError {
    fn from(err: FakeError) -> Self {
        Box::new(err)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeMessage {
    pub message_id: String,
    pub flags: BTreeSet<String>,
    pub raw: Vec<u8>,
}

/// The state shared by the in-memory IMAP and SMTP servers.
#[derive(Debug, Default)]
pub struct State {
    pub imap_opened: usize,
    pub imap_closed: usize,
    pub smtp_opened: usize,
    pub smtp_closed: usize,
    pub fail_logout: bool,
    pub events: Vec<String>,
    pub mailboxes: Vec<MailboxInfo>,
    pub messages: BTreeMap<String, BTreeMap<Uid, FakeMessage>>,
    pub sent: Vec<(Envelope, Vec<u8>)>,
}

/// An instrumented, in-memory mail server.
#[derive(Clone, Debug, Default)]
pub struct FakeServer(Arc<Mutex<State>>);

impl FakeServer {
    pub fn new() -> Self {
        let server = Self::default();
        server.add_mailbox("INBOX", &["\\HasNoChildren"], Some("\\Inbox"));
        server
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }

    pub fn add_mailbox(&self, path: &str, flags: &[&str], special_use: Option<&str>) {
        let name = path.rsplit('/').next().unwrap_or(path).to_owned();

        let mut state = self.state();
        state.mailboxes.push(MailboxInfo {
            path: path.to_owned(),
            name,
            flags: flags.iter().map(ToString::to_string).collect(),
            special_use: special_use.map(ToOwned::to_owned),
            delimiter: Some("/".into()),
        });
        state.messages.entry(path.to_owned()).or_default();
    }

    pub fn add_message(&self, mailbox: &str, uid: Uid, message_id: &str, raw: &[u8]) {
        self.state()
            .messages
            .entry(mailbox.to_owned())
            .or_default()
            .insert(
                uid,
                FakeMessage {
                    message_id: message_id.to_owned(),
                    flags: BTreeSet::new(),
                    raw: raw.to_vec(),
                },
            );
    }

    pub fn flags(&self, mailbox: &str, uid: Uid) -> Vec<String> {
        self.state()
            .messages
            .get(mailbox)
            .and_then(|msgs| msgs.get(&uid))
            .map(|msg| msg.flags.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_message(&self, mailbox: &str, uid: Uid) -> bool {
        self.state()
            .messages
            .get(mailbox)
            .map_or(false, |msgs| msgs.contains_key(&uid))
    }

    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    pub fn sessions(&self) -> (usize, usize) {
        let state = self.state();
        (state.imap_opened, state.imap_closed)
    }

    pub fn smtp_sessions(&self) -> (usize, usize) {
        let state = self.state();
        (state.smtp_opened, state.smtp_closed)
    }
}

#[async_trait]
impl MailClient for FakeServer {
    async fn connect(&self, config: &ImapConfig) -> AnyResult<Box<dyn MailSession>> {
        if config.passwd != "password" {
            return Err(FakeError::AuthenticationError(config.login.clone()).into());
        }

        let mut state = self.state();
        state.imap_opened += 1;
        state.events.push(format!("connect {}", config.login));

        Ok(Box::new(FakeSession {
            server: self.clone(),
            selected: None,
        }))
    }
}

pub struct FakeSession {
    server: FakeServer,
    selected: Option<String>,
}

impl FakeSession {
    fn push(&self, event: String) {
        self.server.state().events.push(event);
    }

    fn selected(&self) -> AnyResult<String> {
        Ok(self
            .selected
            .clone()
            .ok_or(FakeError::NoMailboxSelectedError)?)
    }

    fn with_message<T>(&self, uid: Uid, f: impl FnOnce(&mut FakeMessage) -> T) -> AnyResult<Option<T>> {
        let mailbox = self.selected()?;
        let mut state = self.server.state();
        Ok(state
            .messages
            .get_mut(&mailbox)
            .and_then(|msgs| msgs.get_mut(&uid))
            .map(f))
    }
}

#[async_trait]
impl MailSession for FakeSession {
    async fn list_mailboxes(&mut self) -> AnyResult<Vec<MailboxInfo>> {
        self.push("list".into());
        Ok(self.server.state().mailboxes.clone())
    }

    async fn lock_mailbox(&mut self, mailbox: &str) -> AnyResult<()> {
        if !self.server.state().messages.contains_key(mailbox) {
            return Err(FakeError::NoSuchMailboxError(mailbox.to_owned()).into());
        }

        self.push(format!("lock {mailbox}"));
        self.selected = Some(mailbox.to_owned());
        Ok(())
    }

    fn unlock_mailbox(&mut self, mailbox: &str) {
        self.push(format!("unlock {mailbox}"));
        self.selected = None;
    }

    async fn search_header(&mut self, header: &str, value: &str) -> AnyResult<Vec<Uid>> {
        let mailbox = self.selected()?;
        self.push(format!("search {header} {value}"));

        // Reverse order, so that callers have to sort.
        let uids = self
            .server
            .state()
            .messages
            .get(&mailbox)
            .map(|msgs| {
                msgs.iter()
                    .rev()
                    .filter(|(_, msg)| msg.message_id == value)
                    .map(|(uid, _)| *uid)
                    .collect()
            })
            .unwrap_or_default();

        Ok(uids)
    }

    async fn add_flags(&mut self, uid: Uid, flags: &[String]) -> AnyResult<()> {
        self.push(format!("add flags {uid} {}", flags.join(",")));
        self.with_message(uid, |msg| msg.flags.extend(flags.iter().cloned()))?;
        Ok(())
    }

    async fn remove_flags(&mut self, uid: Uid, flags: &[String]) -> AnyResult<()> {
        self.push(format!("remove flags {uid} {}", flags.join(",")));
        self.with_message(uid, |msg| {
            for flag in flags {
                msg.flags.remove(flag);
            }
        })?;
        Ok(())
    }

    async fn move_message(&mut self, uid: Uid, destination: &str) -> AnyResult<MessageTransfer> {
        let path = self.selected()?;
        self.push(format!("move {uid} {destination}"));

        let mut state = self.server.state();
        if let Some(msg) = state.messages.get_mut(&path).and_then(|msgs| msgs.remove(&uid)) {
            state
                .messages
                .entry(destination.to_owned())
                .or_default()
                .insert(uid, msg);
        }

        Ok(MessageTransfer {
            path,
            destination: destination.to_owned(),
        })
    }

    async fn copy_message(&mut self, uid: Uid, destination: &str) -> AnyResult<MessageTransfer> {
        let path = self.selected()?;
        self.push(format!("copy {uid} {destination}"));

        let mut state = self.server.state();
        if let Some(msg) = state.messages.get(&path).and_then(|msgs| msgs.get(&uid)).cloned() {
            state
                .messages
                .entry(destination.to_owned())
                .or_default()
                .insert(uid, msg);
        }

        Ok(MessageTransfer {
            path,
            destination: destination.to_owned(),
        })
    }

    async fn delete_message(&mut self, uid: Uid) -> AnyResult<()> {
        let mailbox = self.selected()?;
        self.push(format!("delete {uid}"));

        if let Some(msgs) = self.server.state().messages.get_mut(&mailbox) {
            msgs.remove(&uid);
        }

        Ok(())
    }

    async fn fetch_raw_message(&mut self, uid: Uid) -> AnyResult<Option<Vec<u8>>> {
        self.push(format!("fetch {uid}"));
        self.with_message(uid, |msg| msg.raw.clone())
    }

    async fn logout(&mut self) -> AnyResult<()> {
        self.push("logout".into());

        let mut state = self.server.state();
        state.imap_closed += 1;

        if state.fail_logout {
            return Err(FakeError::LogoutError.into());
        }

        Ok(())
    }
}

#[async_trait]
impl MailSender for FakeServer {
    async fn connect(&self, config: &SmtpConfig) -> AnyResult<Box<dyn SenderSession>> {
        if config.passwd != "password" {
            return Err(FakeError::AuthenticationError(config.login.clone()).into());
        }

        let mut state = self.state();
        state.smtp_opened += 1;
        state.events.push("smtp connect".into());

        Ok(Box::new(FakeSenderSession {
            server: self.clone(),
        }))
    }
}

pub struct FakeSenderSession {
    server: FakeServer,
}

#[async_trait]
impl SenderSession for FakeSenderSession {
    async fn send_raw_message(
        &mut self,
        envelope: &Envelope,
        raw: &[u8],
    ) -> AnyResult<Option<String>> {
        let mut state = self.server.state();
        state.events.push(format!("smtp send {}", envelope.to.join(",")));
        state.sent.push((envelope.clone(), raw.to_vec()));
        Ok(Some("<resent@fake.local>".into()))
    }

    async fn quit(&mut self) -> AnyResult<()> {
        let mut state = self.server.state();
        state.smtp_closed += 1;
        state.events.push("smtp quit".into());
        Ok(())
    }
}

pub fn imap_config(login: &str) -> ImapConfig {
    ImapConfig {
        host: "localhost".into(),
        login: login.into(),
        passwd: "password".into(),
        ..Default::default()
    }
}

pub fn smtp_config(from: Option<&str>) -> SmtpConfig {
    SmtpConfig {
        host: "localhost".into(),
        login: "alice@example.com".into(),
        passwd: "password".into(),
        from: from.map(ToOwned::to_owned),
        ..Default::default()
    }
}
