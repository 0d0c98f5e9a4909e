//! Provider client for the Sinch Fax API v3.

use async_trait::async_trait;
use faxgate_domain::constants::FAX_MIME_TYPE;
use faxgate_domain::{
    AuthMethod, FaxConfig, FaxError, FaxListFilters, FaxPage, ProviderFax, Result, SendFaxRequest,
};
use reqwest::multipart::{Form, Part};
use reqwest::{header, Method, RequestBuilder, Response};
use tracing::{debug, instrument};

use super::types::{SinchFax, SinchFaxListResponse};
use crate::http::HttpClient;
use faxgate_core::fax::FaxProviderClient;

/// HTTP client for the provider's fax endpoints.
///
/// Holds a copy of the resolved configuration; the base URL is derived from
/// the configured region once at construction.
pub struct SinchFaxClient {
    http_client: HttpClient,
    config: FaxConfig,
    base_url: String,
}

impl SinchFaxClient {
    /// Create a new provider client.
    pub fn new(config: &FaxConfig, http_client: HttpClient) -> Self {
        Self { http_client, config: config.clone(), base_url: config.region.base_url() }
    }

    /// Override the base URL (for testing against a local server).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn faxes_url(&self) -> String {
        format!("{}/v3/projects/{}/faxes", self.base_url, self.config.project_id)
    }

    fn fax_url(&self, fax_id: &str) -> String {
        format!("{}/{}", self.faxes_url(), fax_id)
    }

    /// Base request with the Accept header and configured credentials.
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder =
            self.http_client.request(method, url).header(header::ACCEPT, "application/json");
        match self.config.auth_method {
            AuthMethod::Basic => {
                builder.basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            }
            AuthMethod::Oauth => builder.bearer_auth(&self.config.oauth_token),
        }
    }

    /// Consume a non-2xx response into a provider failure carrying the body.
    async fn error_from_response(&self, response: Response) -> FaxError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = body.trim();
        let message =
            if message.is_empty() { "provider returned no error detail" } else { message };
        FaxError::provider_status(status, message)
    }

    async fn build_send_form(&self, request: &SendFaxRequest) -> Result<Form> {
        let mut form = Form::new().text("to", request.to.clone());

        if let Some(from) = &request.from {
            form = form.text("from", from.clone());
        }

        for path in &request.files {
            let bytes = tokio::fs::read(path).await.map_err(|err| {
                FaxError::InvalidInput(format!("cannot read attachment {}: {err}", path.display()))
            })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "fax.pdf".to_string());
            let part = Part::bytes(bytes).file_name(file_name).mime_str(FAX_MIME_TYPE).map_err(
                |err| FaxError::InvalidInput(format!("invalid attachment content type: {err}")),
            )?;
            form = form.part("file", part);
        }

        if let Some(content_url) = &request.content_url {
            form = form.text("contentUrl", content_url.clone());
        }
        if let Some(callback_url) = &request.callback_url {
            form = form.text("callbackUrl", callback_url.clone());
        }
        if let Some(cover_page_id) = &request.cover_page_id {
            form = form.text("coverPageId", cover_page_id.clone());
        }
        if let Some(max_retries) = request.max_retries {
            form = form.text("maxRetries", max_retries.to_string());
        }

        Ok(form)
    }
}

#[async_trait]
impl FaxProviderClient for SinchFaxClient {
    #[instrument(skip(self, request), fields(to = %request.to))]
    async fn send_fax(&self, request: &SendFaxRequest) -> Result<ProviderFax> {
        let form = self.build_send_form(request).await?;

        debug!(files = request.files.len(), content_url = request.content_url.is_some(), "submitting fax");

        let builder = self.request(Method::POST, &self.faxes_url()).multipart(form);
        let response = self.http_client.send(builder).await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let fax: SinchFax = response.json().await.map_err(|err| {
            FaxError::Serialization(format!("invalid provider response: {err}"))
        })?;

        debug!(fax_id = %fax.id, status = %fax.status, "provider accepted fax");

        Ok(fax.into_domain())
    }

    #[instrument(skip(self))]
    async fn get_fax(&self, fax_id: &str) -> Result<ProviderFax> {
        let builder = self.request(Method::GET, &self.fax_url(fax_id));
        let response = self.http_client.send(builder).await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let fax: SinchFax = response.json().await.map_err(|err| {
            FaxError::Serialization(format!("invalid provider response: {err}"))
        })?;

        Ok(fax.into_domain())
    }

    #[instrument(skip(self, filters))]
    async fn list_faxes(&self, filters: &FaxListFilters) -> Result<FaxPage> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(service_id) = &filters.service_id {
            query.push(("serviceId", service_id.clone()));
        }
        if let Some(direction) = filters.direction {
            query.push(("direction", direction.as_str().to_string()));
        }
        if let Some(status) = &filters.status {
            query.push(("status", status.clone()));
        }
        if let Some(to) = &filters.to {
            query.push(("to", to.clone()));
        }
        if let Some(from) = &filters.from {
            query.push(("from", from.clone()));
        }
        if let Some(create_time) = filters.create_time {
            query.push(("createTime", create_time.to_rfc3339()));
        }
        if let Some(page) = filters.page {
            query.push(("page", page.to_string()));
        }
        if let Some(page_size) = filters.page_size {
            query.push(("pageSize", page_size.to_string()));
        }

        let builder = self.request(Method::GET, &self.faxes_url()).query(&query);
        let response = self.http_client.send(builder).await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let page: SinchFaxListResponse = response.json().await.map_err(|err| {
            FaxError::Serialization(format!("invalid provider listing: {err}"))
        })?;

        debug!(
            page_number = page.page_number,
            total_pages = page.total_pages,
            faxes = page.faxes.len(),
            "listed provider faxes"
        );

        Ok(page.into_domain())
    }

    #[instrument(skip(self))]
    async fn download_fax(&self, fax_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/file", self.fax_url(fax_id));
        let builder = self.request(Method::GET, &url);
        let response = self.http_client.send(builder).await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let bytes = response.bytes().await.map_err(|err| {
            FaxError::provider_transport(format!("failed to read fax content: {err}"))
        })?;

        debug!(fax_id, bytes = bytes.len(), "downloaded fax content");

        Ok(bytes.to_vec())
    }

    #[instrument(skip(self))]
    async fn delete_fax(&self, fax_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &self.fax_url(fax_id));
        let response = self.http_client.send(builder).await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        debug!(fax_id, "deleted provider fax");

        Ok(())
    }
}
