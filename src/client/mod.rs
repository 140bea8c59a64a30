//! Submitting side of the rating flow: window check, daily guard, then the
//! HTTP call. Nothing reaches the network unless both local checks pass.

pub mod guard;

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    ratings::{
        aggregator::{InvalidRating, Stars},
        repo_types::MealRating,
        window::is_within_window,
    },
};

use guard::SubmissionLedger;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] InvalidRating),

    #[error("You can rate {0} only during its respective time.")]
    NotEligible(String),

    #[error("You have already rated {0} today.")]
    AlreadySubmitted(String),

    #[error("server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
pub struct SubmitOutcome {
    pub message: String,
    pub rating: MealRating,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct RatingClient {
    http: reqwest::Client,
    base_url: String,
    ledger: SubmissionLedger,
    clock: Arc<dyn Clock>,
}

impl RatingClient {
    pub fn new(
        base_url: &str,
        ledger: SubmissionLedger,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            ledger,
            clock,
        })
    }

    pub fn ledger(&self) -> &SubmissionLedger {
        &self.ledger
    }

    pub async fn submit(&mut self, meal: &str, rating: i64) -> Result<SubmitOutcome, ClientError> {
        let stars = Stars::try_from(rating)?;
        let now = self.clock.now();

        if !is_within_window(meal, now) {
            return Err(ClientError::NotEligible(meal.to_string()));
        }

        let today = now.date();
        self.ledger.purge_stale(today);
        if self.ledger.has_rated_today(meal, today) {
            debug!(meal, "already rated today; not sending");
            return Err(ClientError::AlreadySubmitted(meal.to_string()));
        }

        let res = self
            .http
            .post(format!("{}/api/ratings/update", self.base_url))
            .json(&json!({ "meal": meal, "newRating": stars.get() }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(rejection(res).await);
        }
        let outcome: SubmitOutcome = res.json().await?;

        self.ledger.mark_rated(meal, stars, today);
        if let Err(e) = self.ledger.save() {
            warn!(error = %e, "could not persist submission ledger");
        }
        info!(meal, stars = stars.get(), "rating submitted");
        Ok(outcome)
    }

    pub async fn ratings(&self) -> Result<Vec<MealRating>, ClientError> {
        let res = self
            .http
            .get(format!("{}/api/ratings", self.base_url))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(rejection(res).await);
        }
        Ok(res.json().await?)
    }
}

async fn rejection(res: reqwest::Response) -> ClientError {
    let status = res.status().as_u16();
    let message = match res.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => "unexpected response".to_string(),
    };
    ClientError::Rejected { status, message }
}
