use std::time::Instant;

use log::{debug, trace};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};

use crate::core::GenericResult;
use crate::util;

pub fn send_request<U: AsRef<str>>(client: &Client, url: U) -> GenericResult<Response> {
    let response = send_request_raw(client, url)?;
    if !response.status().is_success() {
        return Err!("Server returned an error: {}", response.status());
    }
    Ok(response)
}

/// Same as `send_request()`, but returns `None` on HTTP 404.
pub fn send_optional_request<U: AsRef<str>>(client: &Client, url: U) -> GenericResult<Option<Response>> {
    let response = send_request_raw(client, url)?;

    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => Ok(Some(response)),
        status => Err!("Server returned an error: {}", status),
    }
}

fn send_request_raw<U: AsRef<str>>(client: &Client, url: U) -> GenericResult<Response> {
    let url = url.as_ref();

    debug!("Sending request to {url}...");
    let start = Instant::now();
    let response = client.get(url).send().map_err(util::humanize_reqwest_error)?;
    let duration = start.elapsed();
    trace!("Got response from {url} ({duration:?}): {}.", response.status());

    Ok(response)
}
