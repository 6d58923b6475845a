pub mod activity;
pub mod clients;
pub mod common;
pub mod invoices;
pub mod leads;
pub mod portal;
pub mod properties;

use std::sync::Arc;

use crate::db::DbPool;
use crate::notifications::{Mailer, NotificationService};
use crate::services::activity::ActivityLogService;
use crate::services::clients::ClientService;
use crate::services::invoices::InvoiceRequestService;
use crate::services::leads::LeadService;
use crate::services::properties::PropertyService;
use crate::storage::ObjectStorage;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub properties: PropertyService,
    pub clients: ClientService,
    pub leads: LeadService,
    pub invoices: InvoiceRequestService,
    pub activity: ActivityLogService,
    pub notifications: Arc<NotificationService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        storage: Arc<dyn ObjectStorage>,
        mailer: Arc<dyn Mailer>,
        staff_to: String,
    ) -> Self {
        let activity = ActivityLogService::new(db.clone());
        let properties = PropertyService::new(db.clone(), activity.clone(), storage);
        let clients = ClientService::new(db.clone());
        let leads = LeadService::new(db.clone(), activity.clone());
        let invoices = InvoiceRequestService::new(db, activity.clone());
        let notifications = Arc::new(NotificationService::new(mailer, staff_to));

        Self {
            properties,
            clients,
            leads,
            invoices,
            activity,
            notifications,
        }
    }
}
