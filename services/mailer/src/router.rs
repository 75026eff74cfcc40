use axum::{
    Router,
    routing::{get, post},
};

use mailcraft_core::health::healthz;
use mailcraft_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    auth::{exchange, login, logout, test_nylas},
    campaigns::{
        bulk_email_status, campaign_options, create_campaign, schedule_campaign, send_bulk_email,
        view_campaigns,
    },
    email::{
        categorize_emails, compose_email, generate_email, get_email, list_drafts, recent_emails,
        refine_reply, send_reply, suggest_reply,
    },
    health::readyz,
    recipients::{import_contacts, import_csv, list_recipients, upsert_recipient},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // OAuth
        .route("/nylas/auth", get(login).delete(logout))
        .route("/oauth/exchange", get(exchange))
        .route("/test-nylas", get(test_nylas))
        // Inbox & replies
        .route("/nylas/recent-emails", get(recent_emails))
        .route("/nylas/categorize-emails", get(categorize_emails))
        .route("/nylas/email/{id}", get(get_email).post(suggest_reply))
        .route("/nylas/email/{id}/refine", post(refine_reply))
        .route("/nylas/email/{id}/send", post(send_reply))
        // Outgoing mail
        .route("/nylas/send-email", get(list_drafts).post(compose_email))
        .route("/nylas/generate-email", post(generate_email))
        .route(
            "/nylas/send-bulk-email",
            get(bulk_email_status).post(send_bulk_email),
        )
        // Recipients
        .route(
            "/nylas/manage-recepients",
            get(list_recipients).post(upsert_recipient),
        )
        .route("/nylas/import-csv", post(import_csv))
        .route("/nylas/import-contacts", post(import_contacts))
        // Campaigns
        .route(
            "/nylas/create-campaign",
            get(campaign_options).post(create_campaign),
        )
        .route("/nylas/view-campaigns", get(view_campaigns))
        .route("/nylas/schedule-campaign/{id}", post(schedule_campaign))
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
        .with_state(state)
}
