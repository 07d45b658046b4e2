use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::error::ErrorResponse;
use crate::config::ClientConfig;
use crate::db::{
    AttendanceResponse, AttendanceWithStudent, CreateAttendanceRequest, CreateStudentRequest,
    CreateStudentResponse, DeleteResult, MessageResponse, StudentLoginRequest,
    StudentLoginResponse, StudentResponse, UpdateResult, UpdateStudentRequest,
};

use super::{AttendanceApi, ClientError, ClientResult, RosterApi};

/// REST client for a running clubroster server
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.api_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a success body, or turn a failure into a [`ClientError`].
///
/// Only a 4xx answer carrying the error envelope counts as a server verdict.
/// Anything else is reported without its body.
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(ClientError::from);
    }

    let body = response.text().await.unwrap_or_default();
    let envelope = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(envelope) if status.is_client_error() => envelope,
        _ => {
            tracing::warn!(status = %status, "Server answered without an error envelope");
            return Err(ClientError::Server {
                status: status.as_u16(),
            });
        }
    };

    let message = match envelope.error.details {
        Some(details) if !details.is_empty() => {
            let fields: Vec<String> = details
                .iter()
                .map(|(field, msg)| format!("{}: {}", field, msg))
                .collect();
            format!("{} ({})", envelope.error.message, fields.join("; "))
        }
        _ => envelope.error.message,
    };

    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RosterApi for HttpClient {
    async fn list_students(&self) -> ClientResult<Vec<StudentResponse>> {
        let response = self.client.get(self.url("/student")).send().await?;
        decode(response).await
    }

    async fn create_student(
        &self,
        req: &CreateStudentRequest,
    ) -> ClientResult<CreateStudentResponse> {
        let response = self
            .client
            .post(self.url("/student"))
            .json(req)
            .send()
            .await?;
        decode(response).await
    }

    async fn update_student(
        &self,
        id: &str,
        req: &UpdateStudentRequest,
    ) -> ClientResult<MessageResponse<UpdateResult>> {
        let response = self
            .client
            .patch(self.url(&format!("/student/{}", id)))
            .json(req)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete_student(&self, id: &str) -> ClientResult<MessageResponse<DeleteResult>> {
        let response = self
            .client
            .delete(self.url(&format!("/student/{}", id)))
            .send()
            .await?;
        decode(response).await
    }

    async fn login(&self, email: &str, password: &str) -> ClientResult<StudentLoginResponse> {
        let body = StudentLoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        let response = self
            .client
            .post(self.url("/student/login"))
            .json(&body)
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl AttendanceApi for HttpClient {
    async fn create_attendance(
        &self,
        req: &CreateAttendanceRequest,
    ) -> ClientResult<AttendanceResponse> {
        let response = self
            .client
            .post(self.url("/attendance"))
            .json(req)
            .send()
            .await?;
        decode(response).await
    }

    async fn list_attendance(&self) -> ClientResult<Vec<AttendanceWithStudent>> {
        let response = self.client.get(self.url("/attendance")).send().await?;
        decode(response).await
    }

    async fn student_attendance(&self, student_id: &str) -> ClientResult<Vec<AttendanceResponse>> {
        let response = self
            .client
            .get(self.url(&format!("/attendance/student/{}", student_id)))
            .send()
            .await?;
        decode(response).await
    }
}
