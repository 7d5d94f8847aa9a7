//! HTTP request handlers

pub mod download;
pub mod error;
pub mod upload;
pub mod upload_form;

use actix_web::web;
use common::UPLOAD_ENDPOINT;

/// Register the upload endpoint and the catch-all download route.
///
/// `/upload` must be registered first so it is never treated as a filename.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource(UPLOAD_ENDPOINT).to(upload::upload))
        .service(web::resource("/{filename:.*}").to(download::download));
}
