// ── Typed collection handle ──

use std::marker::PhantomData;

use serde_json::Value;

use crate::directory::{Directory, Fields, Query};
use crate::error::Error;
use crate::records::Resource;

/// Typed view of one remote collection.
///
/// Wraps a borrowed [`Directory`] and decodes every returned record into
/// `R`, so callers never read fields off raw JSON.
pub struct Collection<'a, R> {
    directory: &'a dyn Directory,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: Resource> Collection<'a, R> {
    pub fn new(directory: &'a dyn Directory) -> Self {
        Self {
            directory,
            _record: PhantomData,
        }
    }

    pub async fn find_one(&self, query: &Query) -> Result<Option<R>, Error> {
        self.directory
            .find_one(R::ENDPOINT, query)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn find_many(&self, query: &Query) -> Result<Vec<R>, Error> {
        self.directory
            .find_many(R::ENDPOINT, query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn create(&self, fields: &Fields) -> Result<R, Error> {
        decode(self.directory.create(R::ENDPOINT, fields).await?)
    }

    pub async fn update(&self, id: u64, fields: &Fields) -> Result<R, Error> {
        decode(self.directory.update(R::ENDPOINT, id, fields).await?)
    }
}

fn decode<R: Resource>(value: Value) -> Result<R, Error> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
        message: format!("{}: {e}", R::ENDPOINT),
        body: value.to_string(),
    })
}
