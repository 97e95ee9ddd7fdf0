//! User profile and photo use-cases.
//!
//! # Invariants
//! - The main photo is the profile's `photoURL`; photos carry no flag.
//! - The main photo cannot be deleted.
//! - Changing the main photo rewrites the denormalized copies on upcoming
//!   events in the same batch as the profile.

use super::{OperationScope, ServiceContext, ServiceError, ServiceResult, StatusTracking};
use crate::model::attendance::AttendanceRecord;
use crate::model::event::event_ref;
use crate::model::user::{photos_collection, Actor, Photo, UserProfile};
use crate::model::{ATTENDANCE_COLLECTION, USERS_COLLECTION};
use crate::store::{
    to_document, DocRef, Direction, DocumentStore, FieldPath, FieldUpdate, FilterOp, Query,
    StoreError, WriteBatch,
};
use log::debug;

/// Profile and photo service over a document store.
pub struct UserService<S: DocumentStore> {
    store: S,
    ctx: ServiceContext,
}

impl<S: DocumentStore> UserService<S> {
    pub fn new(store: S, ctx: ServiceContext) -> Self {
        Self { store, ctx }
    }

    /// Writes the actor's profile document, stamping `createdAt` when unset.
    pub fn register_profile(&self, actor: &Actor) -> bool {
        let scope = OperationScope::begin(&self.ctx, "user_register", StatusTracking::Tracked);
        let mut profile = actor.profile.clone();
        if profile.created_at.is_none() {
            profile.created_at = Some(self.ctx.clock.now());
        }
        let result = to_document(&profile)
            .and_then(|body| self.store.set(&user_ref(actor.uid()), body))
            .map_err(ServiceError::from);
        scope.finish(result, None).is_some()
    }

    /// Reads the stored profile of `uid`.
    pub fn get_profile(&self, uid: &str) -> Option<UserProfile> {
        let scope = OperationScope::begin(&self.ctx, "user_profile_get", StatusTracking::Untracked);
        let reference = user_ref(uid);
        let result = match self.load_profile(&reference) {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(ServiceError::Store(StoreError::NotFound(reference))),
            Err(err) => Err(err),
        };
        scope.finish_quietly(result)
    }

    /// Records an uploaded photo. The first photo of a user without a main
    /// photo becomes the main photo.
    pub fn add_photo(&self, actor: &Actor, name: &str, url: &str) -> Option<Photo> {
        let scope = OperationScope::begin(&self.ctx, "user_photo_add", StatusTracking::Tracked);
        let result = self.try_add_photo(actor, name, url);
        scope.finish(result, Some(("Success!", "Photo has been uploaded")))
    }

    /// Lists a user's photos by name.
    pub fn list_photos(&self, uid: &str) -> Option<Vec<Photo>> {
        let scope = OperationScope::begin(&self.ctx, "user_photo_list", StatusTracking::Untracked);
        let result = self.try_list_photos(uid);
        scope.finish_quietly(result)
    }

    /// Deletes one photo unless it is the current main photo.
    pub fn delete_photo(&self, actor: &Actor, photo: &Photo) -> bool {
        let scope = OperationScope::begin(&self.ctx, "user_photo_delete", StatusTracking::Tracked);
        let result = self.try_delete_photo(actor, photo);
        scope.finish(result, None).is_some()
    }

    /// Makes `photo` the main photo and refreshes it on upcoming events the
    /// user attends.
    pub fn set_main_photo(&self, actor: &Actor, photo: &Photo) -> bool {
        let scope = OperationScope::begin(&self.ctx, "user_photo_main", StatusTracking::Tracked);
        let result = self.try_set_main_photo(actor, photo);
        scope.finish(result, None).is_some()
    }

    fn load_profile(&self, reference: &DocRef) -> ServiceResult<Option<UserProfile>> {
        match self.store.get(reference)? {
            Some(snapshot) => Ok(Some(snapshot.decode()?)),
            None => Ok(None),
        }
    }

    fn try_add_photo(&self, actor: &Actor, name: &str, url: &str) -> ServiceResult<Photo> {
        let mut photo = Photo {
            id: String::new(),
            name: name.to_string(),
            url: url.to_string(),
        };
        let reference = self
            .store
            .add(&photos_collection(actor.uid()), to_document(&photo)?)?;
        photo.id = reference.id().to_string();

        let profile_reference = user_ref(actor.uid());
        match self.load_profile(&profile_reference)? {
            Some(profile) if profile.photo_url.as_deref().is_some_and(has_url) => {}
            Some(_) => {
                self.store.update(
                    &profile_reference,
                    &[FieldUpdate::set(FieldPath::parse("photoURL")?, url)],
                )?;
            }
            None => {
                let profile = actor.profile.clone().with_photo(url);
                self.store.set(&profile_reference, to_document(&profile)?)?;
            }
        }
        Ok(photo)
    }

    fn try_list_photos(&self, uid: &str) -> ServiceResult<Vec<Photo>> {
        let query =
            Query::new(photos_collection(uid)).order_by(FieldPath::parse("name")?, Direction::Asc);
        let mut photos = Vec::new();
        for snapshot in self.store.query(&query)? {
            let mut photo: Photo = snapshot.decode()?;
            photo.id = snapshot.reference.id().to_string();
            photos.push(photo);
        }
        Ok(photos)
    }

    fn try_delete_photo(&self, actor: &Actor, photo: &Photo) -> ServiceResult<()> {
        let main_photo = self
            .load_profile(&user_ref(actor.uid()))?
            .and_then(|profile| profile.photo_url)
            .or_else(|| actor.profile.photo_url.clone())
            .filter(|url| has_url(url));
        if main_photo.as_deref() == Some(photo.url.as_str()) {
            return Err(ServiceError::MainPhotoDeletion);
        }
        self.store
            .delete(&DocRef::new(photos_collection(actor.uid()), photo.id.as_str()))?;
        Ok(())
    }

    fn try_set_main_photo(&self, actor: &Actor, photo: &Photo) -> ServiceResult<()> {
        let uid = actor.uid();
        let profile_reference = user_ref(uid);
        let photo_path = FieldPath::parse("photoURL")?;

        let mut batch = WriteBatch::new();
        if self.load_profile(&profile_reference)?.is_some() {
            batch.update(
                profile_reference,
                vec![FieldUpdate::set(photo_path, photo.url.as_str())],
            );
        } else {
            let profile = actor.profile.clone().with_photo(photo.url.as_str());
            batch.set(profile_reference, to_document(&profile)?);
        }

        let upcoming = self.store.query(
            &Query::new(ATTENDANCE_COLLECTION)
                .filter(FieldPath::parse("userUID")?, FilterOp::Eq, uid)
                .filter(
                    FieldPath::parse("eventDate")?,
                    FilterOp::Gte,
                    self.ctx.clock.now().timestamp_millis(),
                ),
        )?;
        let attendee_photo = FieldPath::from_segments(["attendees", uid, "photoURL"])?;
        let host_photo = FieldPath::parse("hostPhotoURL")?;
        for snapshot in upcoming {
            let record: AttendanceRecord = snapshot.decode()?;
            let mut updates = vec![FieldUpdate::set(attendee_photo.clone(), photo.url.as_str())];
            if record.is_host {
                updates.push(FieldUpdate::set(host_photo.clone(), photo.url.as_str()));
            }
            batch.update(event_ref(&record.event_id), updates);
        }

        debug!(
            "event=user_photo_main module=service status=batch writes={}",
            batch.len()
        );
        self.store.commit_batch(batch)?;
        Ok(())
    }
}

fn has_url(url: &str) -> bool {
    !url.trim().is_empty()
}

fn user_ref(uid: &str) -> DocRef {
    DocRef::new(USERS_COLLECTION, uid)
}
