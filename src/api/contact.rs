use axum::{Json, Router, extract::State, routing::post};

use super::extract;
use crate::{
    app::App,
    content::{Contact, NewContact},
    error::Result,
};

pub fn setup_route() -> Router<App> {
    Router::new().route("/contact", post(submit))
}

async fn submit(
    State(app): State<App>,
    extract::Json(form): extract::Json<NewContact>,
) -> Result<Json<Contact>> {
    let contact = app.submit_contact(form).await?;
    tracing::info!(id = %contact.id, company_type = %contact.company_type, "contact submitted");
    Ok(Json(contact))
}
