//! Servicio de notificaciones
//!
//! Cliente fire-and-forget hacia el webhook de notificaciones (emails de
//! verificación y avisos de reservas). Un fallo de entrega se loguea y
//! jamás bloquea ni revierte una mutación de reserva o vehículo.

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::EnvironmentConfig;
use crate::utils::errors::{AppError, AppResult};

/// Cliente del servicio de notificaciones
#[derive(Clone)]
pub struct NotificationClient {
    http_client: Client,
    webhook_url: Option<String>,
    sender: String,
    frontend_url: String,
}

impl NotificationClient {
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self {
            http_client: Client::new(),
            webhook_url: config.notification_webhook_url.clone(),
            sender: config.notification_sender.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }

    /// Entregar un payload al webhook configurado
    async fn deliver(&self, payload: serde_json::Value) -> AppResult<()> {
        let Some(url) = &self.webhook_url else {
            debug!("Notification webhook not configured, skipping delivery");
            return Ok(());
        };

        let response = self
            .http_client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Notification delivery failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Notification webhook returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Email de verificación de cuenta
    pub async fn send_verification_email(
        &self,
        to: &str,
        full_name: &str,
        token: &str,
    ) -> AppResult<()> {
        let verification_link = format!("{}/verify-email/{}", self.frontend_url, token);

        self.deliver(json!({
            "from": self.sender,
            "to": to,
            "subject": "Verify your account",
            "template": "email-verification",
            "data": {
                "full_name": full_name,
                "verification_link": verification_link,
            },
        }))
        .await
    }

    /// Aviso de evento de reserva (creación / cambio de estado)
    pub async fn send_booking_event(
        &self,
        to: &str,
        subject: &str,
        message: &str,
    ) -> AppResult<()> {
        self.deliver(json!({
            "from": self.sender,
            "to": to,
            "subject": subject,
            "template": "booking-event",
            "data": { "message": message },
        }))
        .await
    }

    /// Envío en background: nunca propaga el error al caller
    pub fn spawn_verification_email(&self, to: String, full_name: String, token: String) {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client
                .send_verification_email(&to, &full_name, &token)
                .await
            {
                warn!("Verification email delivery failed: {}", e);
            }
        });
    }

    /// Envío en background de un evento de reserva
    pub fn spawn_booking_event(&self, to: String, subject: String, message: String) {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.send_booking_event(&to, &subject, &message).await {
                warn!("Booking notification delivery failed: {}", e);
            }
        });
    }
}
