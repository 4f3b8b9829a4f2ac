use validator::Validate;

use crate::{
    error::AppError,
    subscribers::{
        model::{SubscribeRequest, Subscriber, SubscriberResponse},
        repository::SubscriberRepository,
    },
};

#[derive(Clone)]
pub struct SubscriberService {
    repository: SubscriberRepository,
}

impl SubscriberService {
    pub fn new(repository: SubscriberRepository) -> Self {
        Self { repository }
    }

    pub async fn subscribe(&self, req: SubscribeRequest) -> Result<SubscriberResponse, AppError> {
        let email = normalize_email(req)?;
        let subscriber = self.repository.create(Subscriber::new(email)).await?;
        Ok(subscriber.into())
    }

    pub async fn unsubscribe(&self, email: &str) -> Result<(), AppError> {
        let email = normalize_email(SubscribeRequest { email: email.to_string() })?;

        if !self.repository.delete_by_email(&email).await? {
            return Err(AppError::NotFoundError(format!("Subscriber {} not found", email)));
        }

        Ok(())
    }
}

/// Validates the request and returns the email trimmed and lowercased, the
/// form stored in the database.
pub fn normalize_email(req: SubscribeRequest) -> Result<String, AppError> {
    let req = SubscribeRequest {
        email: req.email.trim().to_lowercase(),
    };
    req.validate()?;
    Ok(req.email)
}
