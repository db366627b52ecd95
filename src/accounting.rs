//! Byte accounting for responses received through a proxy.
//!
//! The sizes reconstruct what the response occupied on the wire from its
//! parsed parts. Bandwidth billing downstream depends on these exact
//! numbers, so the arithmetic must not change.

use std::collections::BTreeMap;

/// Response headers: each name maps to every value received for it.
pub type Headers = BTreeMap<String, Vec<Vec<u8>>>;

const HEADER_SEPARATOR: usize = ": ".len();
const LINE_TERMINATOR: usize = "\r\n".len();
const STATUS_LINE_OVERHEAD: usize = 15;
const RESPONSE_FRAMING: usize = 4;

/// Reason phrase for a status code, empty when the code is unknown.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Time-out",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range not satisfiable",
        417 => "Expectation Failed",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Time-out",
        505 => "HTTP Version not supported",
        507 => "Insufficient Storage Space",
        510 => "Not Extended",
        _ => "",
    }
}

pub fn header_block_size(headers: &Headers) -> usize {
    let fields: usize = headers
        .iter()
        .map(|(name, values)| {
            values
                .iter()
                .map(|value| HEADER_SEPARATOR + name.len() + value.len())
                .sum::<usize>()
        })
        .sum();

    fields + LINE_TERMINATOR * headers.len().saturating_sub(1)
}

pub fn status_line_size(status: u16) -> usize {
    reason_phrase(status).len() + STATUS_LINE_OVERHEAD
}

/// Total bytes attributed to one response.
pub fn response_byte_tally(body: &[u8], headers: &Headers, status: u16) -> u64 {
    (body.len() + header_block_size(headers) + status_line_size(status) + RESPONSE_FRAMING) as u64
}
