// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GridFS-backed profile image store.
//!
//! Images go to the `profile_images` bucket of the same database that holds
//! the accounts. Blob ids are the hex form of the GridFS file `ObjectId`.

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson};
use futures_util::io::{AsyncReadExt, AsyncWriteExt};
use mongodb::{
    error::{Error as MongoError, ErrorKind, GridFsErrorKind},
    gridfs::GridFsBucket,
    options::GridFsBucketOptions,
    Database,
};

use super::{ImageStore, StoreError, StoreResult};

/// Bucket name for profile images.
pub const IMAGE_BUCKET: &str = "profile_images";

#[derive(Clone)]
pub struct GridFsImageStore {
    bucket: GridFsBucket,
}

impl GridFsImageStore {
    pub fn new(db: &Database) -> Self {
        let options = GridFsBucketOptions::builder()
            .bucket_name(IMAGE_BUCKET.to_string())
            .build();
        Self {
            bucket: db.gridfs_bucket(options),
        }
    }
}

fn parse_blob_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

fn is_file_not_found(error: &MongoError) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::GridFs(GridFsErrorKind::FileNotFound { .. })
    )
}

fn backend(error: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("GridFS: {error}"))
}

#[async_trait]
impl ImageStore for GridFsImageStore {
    async fn put(&self, filename: &str, bytes: Vec<u8>) -> StoreResult<String> {
        let mut upload = self
            .bucket
            .open_upload_stream(filename)
            .await
            .map_err(backend)?;
        upload.write_all(&bytes).await.map_err(backend)?;
        upload.close().await.map_err(backend)?;

        match upload.id() {
            Bson::ObjectId(oid) => Ok(oid.to_hex()),
            other => Err(StoreError::Backend(format!(
                "GridFS returned unexpected file id {other}"
            ))),
        }
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Vec<u8>>> {
        let Some(oid) = parse_blob_id(id) else {
            return Ok(None);
        };

        let mut download = match self.bucket.open_download_stream(Bson::ObjectId(oid)).await {
            Ok(stream) => stream,
            Err(e) if is_file_not_found(&e) => return Ok(None),
            Err(e) => return Err(backend(e)),
        };

        let mut bytes = Vec::new();
        download.read_to_end(&mut bytes).await.map_err(backend)?;
        Ok(Some(bytes))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let oid = parse_blob_id(id).ok_or_else(|| StoreError::NotFound(format!("Image {id}")))?;

        match self.bucket.delete(Bson::ObjectId(oid)).await {
            Ok(()) => Ok(()),
            Err(e) if is_file_not_found(&e) => Err(StoreError::NotFound(format!("Image {id}"))),
            Err(e) => Err(backend(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_ids_are_object_id_hex() {
        let oid = ObjectId::new();
        assert_eq!(parse_blob_id(&oid.to_hex()), Some(oid));
    }

    #[test]
    fn foreign_ids_do_not_parse() {
        assert_eq!(parse_blob_id("not-an-object-id"), None);
        assert_eq!(parse_blob_id("7c9e6679-7425-40de-944b-e07fc1f90ae7"), None);
        assert_eq!(parse_blob_id(""), None);
    }
}
