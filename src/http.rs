use gloo_net::http::{Request, Response};
use web_sys::FormData;

use crate::api::{Endpoints, FileApi, FileContent, OCTET_STREAM};
use crate::upload::content_type_for;
use crate::{FileError, FileRecord, HostConfig, Result};

/// [`FileApi`] over the browser's fetch, via gloo-net.
#[derive(Debug, Clone)]
pub struct HttpFileApi {
    endpoints: Endpoints,
}

impl HttpFileApi {
    pub fn new(api_base: &str) -> Self {
        Self {
            endpoints: Endpoints::new(api_base),
        }
    }

    async fn fetch_content(&self, url: &str, filename: &str) -> Result<FileContent> {
        let response = Request::get(url)
            .send()
            .await
            .map_err(|e| FileError::transport(format!("request for {filename} failed: {e}")))?;
        let response = check_status(response, filename)?;

        let content_type = response
            .headers()
            .get("content-type")
            .unwrap_or_else(|| OCTET_STREAM.to_string());
        let bytes = response
            .binary()
            .await
            .map_err(|e| FileError::transport(format!("reading {filename} failed: {e}")))?;

        Ok(FileContent {
            bytes,
            content_type,
        })
    }
}

/// 404 on a per-file endpoint means the file is gone; on `list`/`upload` it
/// would mean the endpoint is missing, so those check `ok()` instead.
fn check_status(response: Response, filename: &str) -> Result<Response> {
    match response.status() {
        200..=299 => Ok(response),
        404 => Err(FileError::NotFound(filename.to_string())),
        status => Err(FileError::status(status, response.status_text())),
    }
}

impl FileApi for HttpFileApi {
    async fn list(&self) -> Result<Vec<FileRecord>> {
        let response = Request::get(&self.endpoints.list())
            .send()
            .await
            .map_err(|e| FileError::transport(format!("listing files failed: {e}")))?;
        if !response.ok() {
            return Err(FileError::status(response.status(), response.status_text()));
        }

        response
            .json::<Vec<FileRecord>>()
            .await
            .map_err(|e| FileError::transport(format!("failed to parse file list: {e}")))
    }

    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<FileRecord> {
        let form_data =
            FormData::new().map_err(|_| FileError::transport("failed to create FormData"))?;
        let blob: web_sys::Blob =
            gloo_file::Blob::new_with_options(bytes.as_slice(), Some(content_type_for(name)))
                .into();
        form_data
            .append_with_blob_and_filename("file", &blob, name)
            .map_err(|_| FileError::transport("failed to append file to FormData"))?;

        let response = Request::post(&self.endpoints.upload())
            .body(form_data)
            .map_err(|e| FileError::transport(format!("failed to set body: {e}")))?
            .send()
            .await
            .map_err(|e| FileError::transport(format!("upload of {name} failed: {e}")))?;
        if !response.ok() {
            return Err(FileError::status(response.status(), response.status_text()));
        }

        response
            .json::<FileRecord>()
            .await
            .map_err(|e| FileError::transport(format!("failed to parse upload response: {e}")))
    }

    async fn download(&self, filename: &str) -> Result<FileContent> {
        self.fetch_content(&self.endpoints.file(filename), filename)
            .await
    }

    async fn delete(&self, filename: &str) -> Result<()> {
        let response = Request::delete(&self.endpoints.file(filename))
            .send()
            .await
            .map_err(|e| FileError::transport(format!("delete of {filename} failed: {e}")))?;
        check_status(response, filename)?;
        Ok(())
    }

    async fn preview(&self, filename: &str) -> Result<FileContent> {
        self.fetch_content(&self.endpoints.preview(filename), filename)
            .await
    }
}

/// Runtime configuration from the host; defaults when it can't be fetched.
pub async fn load_host_config() -> HostConfig {
    match Request::get("/config").send().await {
        Ok(response) if response.ok() => match response.json::<HostConfig>().await {
            Ok(config) => config,
            Err(e) => {
                log::warn!("failed to parse host config: {}", e);
                HostConfig::default()
            }
        },
        Ok(response) => {
            log::warn!("host config request failed with status: {}", response.status());
            HostConfig::default()
        }
        Err(e) => {
            log::warn!("host config request failed: {}", e);
            HostConfig::default()
        }
    }
}
