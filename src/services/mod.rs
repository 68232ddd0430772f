//! Business logic services

pub mod approval_tokens;
pub mod audit;
pub mod email;
pub mod external_movements;
pub mod notifications;
pub mod vehicles;
pub mod visits;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub visits: visits::VisitsService,
    pub approval_tokens: approval_tokens::ApprovalTokenService,
    pub vehicles: vehicles::VehiclesService,
    pub external_movements: external_movements::ExternalMovementsService,
    pub audit: audit::AuditService,
    pub notifications: notifications::NotificationDispatcher,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository, sending notifications by email
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let notifier = Arc::new(email::EmailService::new(config.email.clone()));
        Self::with_notifier(repository, config, notifier)
    }

    /// Create all services with a custom notification transport
    pub fn with_notifier(
        repository: Repository,
        config: &AppConfig,
        notifier: Arc<dyn notifications::Notifier>,
    ) -> Self {
        let notifications = notifications::NotificationDispatcher::new(notifier);
        let approval_tokens =
            approval_tokens::ApprovalTokenService::new(repository.clone(), config.approval.clone());

        Self {
            visits: visits::VisitsService::new(
                repository.clone(),
                approval_tokens.clone(),
                notifications.clone(),
                config.site.default_location.clone(),
            ),
            approval_tokens,
            vehicles: vehicles::VehiclesService::new(repository.clone()),
            external_movements: external_movements::ExternalMovementsService::new(repository.clone()),
            audit: audit::AuditService::new(repository.clone()),
            notifications,
            repository,
        }
    }
}
