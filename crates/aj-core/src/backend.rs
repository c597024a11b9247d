mod config;
mod jobs;
mod models;
pub mod schemas;

pub use config::ApiConfig;
pub use jobs::{GenerationApi, GenerationJobClient, JobStatusSnapshot, QueuePosition};
pub use models::{ModelCatalog, ModelCatalogClient, ModelResolution};

use reqwest::{Client, Method, Response};
use crate::error::{Error, Result};

/// Send an authenticated request and reject any non-success status.
async fn send_authorized<F>(
    client: &Client,
    config: &ApiConfig,
    method: Method,
    path: &str,
    build: F,
) -> Result<Response>
where
    F: FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
{
    let url = config.endpoint(path);

    let request = client
        .request(method.clone(), &url)
        .bearer_auth(&config.bearer_token);

    let response = build(request).send().await?;

    if !response.status().is_success() {
        return Err(Error::BadStatus {
            method: method_name(&method),
            url,
            status: response.status(),
        });
    }

    Ok(response)
}

fn method_name(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        _ => "HTTP",
    }
}
