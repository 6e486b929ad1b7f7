use std::borrow::Cow;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use time::PrimitiveDateTime;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::core::config::Settings;
use crate::core::{metrics, security, time::primitive_now_utc};
use crate::db::models::{Account, Student};
use crate::repositories;
use crate::services::phone::{is_valid_phone, normalize_phone};
use crate::services::photos::{photo_key, PhotoStore, PhotoUpload};

/// Self-service registration input. Text fields are trimmed by [`RegistrationForm::normalized`].
#[derive(Clone, Default, Validate)]
pub(crate) struct RegistrationForm {
    #[validate(
        length(min = 1, max = 20, message = "Student ID must be 1 to 20 characters"),
        custom(function = "validate_student_id")
    )]
    pub(crate) student_id: String,
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub(crate) first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub(crate) last_name: String,
    #[validate(
        length(max = 254, message = "Email must not exceed 254 characters"),
        email(message = "Enter a valid email address")
    )]
    pub(crate) email: String,
    /// Empty when not supplied.
    #[validate(
        length(max = 20, message = "Phone must not exceed 20 characters"),
        custom(function = "validate_phone")
    )]
    pub(crate) phone: String,
    #[validate(length(min = 1, max = 50, message = "Group must be 1 to 50 characters"))]
    pub(crate) group: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub(crate) password: String,
    pub(crate) password_confirm: String,
    pub(crate) photo: Option<PhotoUpload>,
}

impl RegistrationForm {
    pub(crate) fn normalized(self) -> Self {
        Self {
            student_id: self.student_id.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_ascii_lowercase(),
            phone: self.phone.trim().to_string(),
            group: self.group.trim().to_string(),
            ..self
        }
    }

    pub(crate) fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn validate_student_id(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Ok(())
    } else {
        Err(ValidationError::new("student_id_charset").with_message(Cow::Borrowed(
            "Student ID may contain only Latin letters, digits, '-' and '_'",
        )))
    }
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || is_valid_phone(value) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_format").with_message(Cow::Borrowed(
            "Phone may contain digits, spaces, '-', '(' and ')' with an optional leading '+'",
        )))
    }
}

/// Per-field error messages, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(crate) struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub(crate) fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    #[cfg(test)]
    pub(crate) fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub(crate) fn from_validation(errors: &ValidationErrors) -> Self {
        let mut result = Self::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"));
                result.add(field.as_ref(), message);
            }
        }
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CollisionField {
    Email,
    StudentId,
}

impl CollisionField {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::StudentId => "student_id",
        }
    }

    /// Maps a unique index name to the form field it guards.
    pub(crate) fn from_constraint(constraint: Option<&str>) -> Self {
        match constraint {
            Some("students_student_id_key") => Self::StudentId,
            _ => Self::Email,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum RegistrationError {
    #[error("registration form has invalid fields")]
    Fields(FieldErrors),
    #[error("a student with these details is already registered ({})", .0.as_str())]
    Collision(CollisionField),
    #[error("registered account could not be authenticated")]
    Authentication,
    #[error("registration failed: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl RegistrationError {
    fn outcome(&self) -> &'static str {
        match self {
            Self::Fields(_) => "invalid",
            Self::Collision(_) => "collision",
            Self::Authentication => "auth_failed",
            Self::Persistence(_) => "error",
        }
    }
}

/// Failure of the atomic account + student insert.
#[derive(Debug, Error)]
pub(crate) enum CreateError {
    #[error("unique constraint violated on {}", .0.as_str())]
    Collision(CollisionField),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub(crate) struct NewStudentAccount<'a> {
    pub(crate) account_id: &'a str,
    pub(crate) student_pk: &'a str,
    pub(crate) email: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) first_name: &'a str,
    pub(crate) last_name: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) full_name: &'a str,
    pub(crate) phone: &'a str,
    pub(crate) group: &'a str,
    pub(crate) photo: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

/// Persistence used by [`register`].
#[async_trait]
pub(crate) trait RegistrationStore: Send + Sync {
    /// True when an account or a student already uses `email` (case-insensitive).
    async fn email_taken(&self, email: &str) -> anyhow::Result<bool>;

    async fn student_id_taken(&self, student_id: &str) -> anyhow::Result<bool>;

    /// Creates both records or neither.
    async fn create_student_account(
        &self,
        record: NewStudentAccount<'_>,
    ) -> Result<(Account, Student), CreateError>;

    async fn find_account(&self, username: &str) -> anyhow::Result<Option<Account>>;
}

pub(crate) struct PgRegistrationStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgRegistrationStore<'a> {
    pub(crate) fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

fn create_error(err: sqlx::Error) -> CreateError {
    if crate::db::is_unique_violation(&err) {
        CreateError::Collision(CollisionField::from_constraint(crate::db::violated_constraint(&err)))
    } else {
        CreateError::Other(err.into())
    }
}

#[async_trait]
impl RegistrationStore for PgRegistrationStore<'_> {
    async fn email_taken(&self, email: &str) -> anyhow::Result<bool> {
        if repositories::accounts::email_exists(self.pool, email).await? {
            return Ok(true);
        }
        Ok(repositories::students::email_exists(self.pool, email).await?)
    }

    async fn student_id_taken(&self, student_id: &str) -> anyhow::Result<bool> {
        Ok(repositories::students::student_id_exists(self.pool, student_id).await?)
    }

    async fn create_student_account(
        &self,
        record: NewStudentAccount<'_>,
    ) -> Result<(Account, Student), CreateError> {
        let mut tx = self.pool.begin().await.map_err(create_error)?;

        let account = repositories::accounts::create(
            &mut *tx,
            repositories::accounts::CreateAccount {
                id: record.account_id,
                username: record.email,
                email: record.email,
                hashed_password: record.hashed_password,
                first_name: record.first_name,
                last_name: record.last_name,
                is_staff: false,
                created_at: record.now,
            },
        )
        .await
        .map_err(create_error)?;

        let student = repositories::students::create(
            &mut *tx,
            repositories::students::CreateStudent {
                id: record.student_pk,
                account_id: &account.id,
                student_id: record.student_id,
                full_name: record.full_name,
                email: record.email,
                phone: record.phone,
                group_name: record.group,
                photo: record.photo,
                registered_at: record.now,
            },
        )
        .await
        .map_err(create_error)?;

        tx.commit().await.map_err(create_error)?;
        Ok((account, student))
    }

    async fn find_account(&self, username: &str) -> anyhow::Result<Option<Account>> {
        Ok(repositories::accounts::find_by_username(self.pool, username).await?)
    }
}

#[derive(Debug)]
pub(crate) struct Registered {
    pub(crate) account: Account,
    pub(crate) student: Student,
    pub(crate) access_token: String,
}

/// Runs the registration workflow: field checks, password confirmation, collision checks,
/// atomic creation, then re-authentication of the new account.
pub(crate) async fn register(
    store: &dyn RegistrationStore,
    photos: Option<&dyn PhotoStore>,
    settings: &Settings,
    form: RegistrationForm,
) -> Result<Registered, RegistrationError> {
    let result = run(store, photos, settings, form.normalized()).await;
    match &result {
        Ok(registered) => {
            metrics::record_registration("created");
            tracing::info!(
                account_id = %registered.account.id,
                student_id = %registered.student.student_id,
                "Student registered"
            );
        }
        Err(err) => metrics::record_registration(err.outcome()),
    }
    result
}

async fn run(
    store: &dyn RegistrationStore,
    photos: Option<&dyn PhotoStore>,
    settings: &Settings,
    form: RegistrationForm,
) -> Result<Registered, RegistrationError> {
    let mut errors = match form.validate() {
        Ok(()) => FieldErrors::default(),
        Err(err) => FieldErrors::from_validation(&err),
    };

    let photo_extension = match (&form.photo, photos) {
        (None, _) => None,
        (Some(_), None) => {
            errors.add("photo", "Photo uploads are not available right now");
            None
        }
        (Some(photo), Some(_)) => {
            let storage = settings.storage();
            let max_bytes = (storage.max_upload_size_mb as usize) * 1024 * 1024;
            match photo.checked_extension(&storage.allowed_image_extensions, max_bytes) {
                Ok(extension) => Some(extension),
                Err(message) => {
                    errors.add("photo", message);
                    None
                }
            }
        }
    };

    if !errors.is_empty() {
        return Err(RegistrationError::Fields(errors));
    }

    if form.password != form.password_confirm {
        let mut mismatch = FieldErrors::default();
        mismatch.add("password_confirm", "Passwords do not match");
        return Err(RegistrationError::Fields(mismatch));
    }

    if store.email_taken(&form.email).await? {
        tracing::info!(field = "email", "Registration rejected: already registered");
        return Err(RegistrationError::Collision(CollisionField::Email));
    }

    if store.student_id_taken(&form.student_id).await? {
        tracing::info!(field = "student_id", "Registration rejected: already registered");
        return Err(RegistrationError::Collision(CollisionField::StudentId));
    }

    let hashed_password = security::hash_password(&form.password)
        .map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))?;

    let stored_photo = match (form.photo.clone(), photo_extension, photos) {
        (Some(photo), Some(extension), Some(photo_store)) => {
            let key = photo_key(&extension);
            photo_store
                .put(&key, &photo.content_type, photo.bytes)
                .await
                .map_err(|err| err.context("failed to store student photo"))?;
            Some((key, photo_store))
        }
        _ => None,
    };

    let account_id = Uuid::new_v4().to_string();
    let student_pk = Uuid::new_v4().to_string();
    let full_name = form.full_name();
    let phone = normalize_phone(&form.phone);

    let created = store
        .create_student_account(NewStudentAccount {
            account_id: &account_id,
            student_pk: &student_pk,
            email: &form.email,
            hashed_password,
            first_name: &form.first_name,
            last_name: &form.last_name,
            student_id: &form.student_id,
            full_name: &full_name,
            phone: &phone,
            group: &form.group,
            photo: stored_photo.as_ref().map(|(key, _)| key.as_str()),
            now: primitive_now_utc(),
        })
        .await;

    let (account, student) = match created {
        Ok(records) => records,
        Err(err) => {
            if let Some((key, photo_store)) = &stored_photo {
                if let Err(remove_err) = photo_store.remove(key).await {
                    tracing::warn!(key = %key, error = %remove_err, "Failed to remove orphaned photo");
                }
            }
            return Err(match err {
                CreateError::Collision(field) => {
                    tracing::info!(field = field.as_str(), "Registration lost a uniqueness race");
                    RegistrationError::Collision(field)
                }
                CreateError::Other(err) => RegistrationError::Persistence(err),
            });
        }
    };

    let access_token = authenticate(store, settings, &account.username, &form.password)
        .await
        .ok_or(RegistrationError::Authentication)?;

    Ok(Registered { account, student, access_token })
}

async fn authenticate(
    store: &dyn RegistrationStore,
    settings: &Settings,
    username: &str,
    password: &str,
) -> Option<String> {
    let account = match store.find_account(username).await {
        Ok(Some(account)) if account.is_active => account,
        Ok(_) => {
            tracing::error!(username, "Registered account is missing or inactive");
            return None;
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to load registered account");
            return None;
        }
    };

    match security::verify_password(password, &account.hashed_password) {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            tracing::error!(account_id = %account.id, "Registered account failed password check");
            return None;
        }
    }

    match security::create_access_token(&account.id, settings, None) {
        Ok(token) => Some(token),
        Err(err) => {
            tracing::error!(error = %err, "Failed to issue access token after registration");
            None
        }
    }
}
