/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Request parsing and response writing for the control plane.
//!
//! One request per connection; every response closes the connection.

use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;

pub(crate) const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub(crate) const APPLICATION_JSON: &str = "application/json";

#[derive(Debug)]
pub(crate) struct HttpRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpResponse {
    pub(crate) status: u16,
    pub(crate) content_type: &'static str,
    pub(crate) body: Vec<u8>,
}

impl HttpResponse {
    pub(crate) fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN,
            body: body.into().into_bytes(),
        }
    }

    pub(crate) fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: APPLICATION_JSON,
            body: body.into().into_bytes(),
        }
    }
}

/// A request that could not be read; answered with `status` and `message`.
#[derive(Debug)]
pub(crate) struct RequestError {
    pub(crate) status: u16,
    pub(crate) message: String,
}

impl RequestError {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

pub(crate) async fn read_request<R>(reader: &mut R) -> Result<HttpRequest, RequestError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let read = reader
            .read(&mut chunk)
            .await
            .map_err(|err| RequestError::new(400, format!("failed to read request: {err}")))?;
        if read == 0 {
            return Err(RequestError::new(400, "empty request"));
        }
        buffer.extend_from_slice(&chunk[..read]);
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(RequestError::new(413, "request too large"));
        }
        if let Some(position) = find_header_end(&buffer) {
            break position;
        }
    };

    let header_text = std::str::from_utf8(&buffer[..header_end])
        .map_err(|err| RequestError::new(400, format!("invalid request encoding: {err}")))?;
    let mut lines = header_text.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| RequestError::new(400, "missing request line"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| RequestError::new(400, "missing HTTP method"))?;
    let target = parts
        .next()
        .ok_or_else(|| RequestError::new(400, "missing request path"))?;
    let path = target.split('?').next().unwrap_or(target);

    let mut headers = HashMap::new();
    for line in lines.filter(|line| !line.is_empty()) {
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| RequestError::new(400, "malformed header"))?;
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    let content_length = match headers.get("content-length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| RequestError::new(400, "invalid content-length"))?,
        None => 0,
    };
    if content_length > MAX_REQUEST_BYTES {
        return Err(RequestError::new(413, "request body too large"));
    }

    let mut body = buffer[header_end + 4..].to_vec();
    while body.len() < content_length {
        let read = reader
            .read(&mut chunk)
            .await
            .map_err(|err| RequestError::new(400, format!("failed to read body: {err}")))?;
        if read == 0 {
            return Err(RequestError::new(400, "request body truncated"));
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(HttpRequest {
        method: method.to_string(),
        path: path.to_string(),
        body,
    })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

pub(crate) const fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

pub(crate) async fn write_response<W>(
    writer: &mut W,
    response: &HttpResponse,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        status_text(response.status),
        response.content_type,
        response.body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(&response.body).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::{read_request, write_response, HttpResponse};

    #[tokio::test]
    async fn parses_request_line_headers_and_body() {
        let raw = b"PUT /update?dry=1 HTTP/1.1\r\nHost: localhost\r\n\
                    Content-Length: 13\r\n\r\n{\"rate\": 100}";
        let mut reader: &[u8] = raw;

        let request = read_request(&mut reader).await.expect("request should parse");

        assert_eq!(request.method, "PUT");
        assert_eq!(request.path, "/update");
        assert_eq!(request.body, b"{\"rate\": 100}");
    }

    #[tokio::test]
    async fn request_without_body_has_empty_body() {
        let mut reader: &[u8] = b"GET /stats HTTP/1.1\r\n\r\n";

        let request = read_request(&mut reader).await.expect("request should parse");

        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/stats");
        assert!(request.body.is_empty());
    }

    #[tokio::test]
    async fn truncated_body_is_a_bad_request() {
        let mut reader: &[u8] = b"PUT /update HTTP/1.1\r\nContent-Length: 50\r\n\r\n{}";

        let err = read_request(&mut reader).await.expect_err("body is short");

        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn empty_connection_is_a_bad_request() {
        let mut reader: &[u8] = b"";

        let err = read_request(&mut reader).await.expect_err("nothing was sent");

        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn oversized_content_length_is_rejected() {
        let mut reader: &[u8] = b"PUT /update HTTP/1.1\r\nContent-Length: 99999999\r\n\r\n";

        let err = read_request(&mut reader).await.expect_err("too large");

        assert_eq!(err.status, 413);
    }

    #[tokio::test]
    async fn response_carries_status_type_and_length() {
        let mut out: Vec<u8> = Vec::new();

        write_response(&mut out, &HttpResponse::json(200, r#"{"status":"ok"}"#))
            .await
            .expect("write to vec");

        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.contains("Content-Length: 15\r\n"));
        assert!(text.ends_with("\r\n\r\n{\"status\":\"ok\"}"));
    }
}
