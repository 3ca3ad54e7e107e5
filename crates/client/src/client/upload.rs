//! Multipart file upload.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::client::{FiscalClient, RequestOptions};
use crate::error::RequestResult;

impl FiscalClient {
    /// Upload `file_bytes` with PUT as a `multipart/form-data` body.
    ///
    /// The form carries a `file` part named `file_name` followed by one text
    /// part per entry of `additional_fields`. Classification and the 401
    /// invalidation are the same as for [`Self::request`].
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file_bytes: Vec<u8>,
        file_name: &str,
        additional_fields: &[(&str, &str)],
    ) -> RequestResult<T> {
        self.upload_file_with(
            path,
            file_bytes,
            file_name,
            additional_fields,
            &RequestOptions::default(),
        )
        .await
    }

    /// [`Self::upload_file`] with per-call timeout and cancellation.
    #[tracing::instrument(skip(self, file_bytes, additional_fields, options), fields(size = file_bytes.len()))]
    pub async fn upload_file_with<T: DeserializeOwned>(
        &self,
        path: &str,
        file_bytes: Vec<u8>,
        file_name: &str,
        additional_fields: &[(&str, &str)],
        options: &RequestOptions,
    ) -> RequestResult<T> {
        self.execute(Method::PUT, path, options, |builder| {
            builder.multipart(build_form(&file_bytes, file_name, additional_fields))
        })
        .await
    }
}

fn build_form(file_bytes: &[u8], file_name: &str, additional_fields: &[(&str, &str)]) -> Form {
    let file = Part::bytes(file_bytes.to_vec()).file_name(file_name.to_string());
    additional_fields
        .iter()
        .fold(Form::new().part("file", file), |form, (name, value)| {
            form.text(name.to_string(), value.to_string())
        })
}
