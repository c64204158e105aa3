// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Best-effort client identity from reverse proxy headers.

use axum::http::HeaderMap;

/// Shared key for every client no header identifies.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// First `x-forwarded-for` entry, else `x-real-ip`, else [`UNKNOWN_CLIENT`].
pub fn client_identity(headers: &HeaderMap) -> String {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| header_str(headers, "x-real-ip").map(str::trim).filter(|v| !v.is_empty()))
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
