//! In-memory `UserApi` with a scripted reply queue, for driving the
//! session state machines in unit tests.

use super::{ProfileUpdate, UserApi};
use crate::session::UserRecord;
use anyhow::{anyhow, Result};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

#[derive(Debug, Clone)]
pub enum Reply {
    User(UserRecord),
    NotFound,
    Fail(&'static str),
}

#[derive(Debug, Default)]
pub struct ScriptedApi {
    replies: Mutex<VecDeque<Reply>>,
    fetch_calls: AtomicUsize,
    last_user: Mutex<Option<UserRecord>>,
    verified: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn verified_ids(&self) -> Vec<String> {
        self.verified.lock().unwrap().clone()
    }

    fn next(&self) -> Result<Option<UserRecord>> {
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::User(record)) => {
                *self.last_user.lock().unwrap() = Some(record.clone());
                Ok(Some(record))
            }
            Some(Reply::NotFound) => Ok(None),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted replies exhausted")),
        }
    }

    fn last(&self) -> Result<UserRecord> {
        self.last_user
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("no user fetched yet"))
    }
}

impl UserApi for ScriptedApi {
    async fn fetch_user_by_id(&self, _id: &str) -> Result<Option<UserRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.next()
    }

    async fn mark_user_verified(&self, id: &str) -> Result<UserRecord> {
        self.verified.lock().unwrap().push(id.to_string());

        let mut record = self.last()?;
        record.is_verified = true;
        *self.last_user.lock().unwrap() = Some(record.clone());

        Ok(record)
    }

    async fn upsert_user_by_phone(&self, _phone_number: &str) -> Result<UserRecord> {
        self.next()?.ok_or_else(|| anyhow!("upsert returned no record"))
    }

    async fn upsert_user_by_email(&self, _email: &str) -> Result<UserRecord> {
        self.next()?.ok_or_else(|| anyhow!("upsert returned no record"))
    }

    async fn update_user_profile(&self, _id: &str, update: ProfileUpdate) -> Result<UserRecord> {
        let mut record = self.last()?;

        if let Some(nom) = update.nom {
            record.nom = Some(nom);
        }
        if let Some(email) = update.email {
            record.email = Some(email);
        }

        *self.last_user.lock().unwrap() = Some(record.clone());

        Ok(record)
    }
}
