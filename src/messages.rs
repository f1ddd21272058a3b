// Request and response types for the command listener

use serde::{Deserialize, Serialize};

use crate::motor::SpeedPercent;

/// Request-line prefixes and the speed each one selects.
/// Checked in order; the first match wins.
pub const SPEED_ROUTES: [(&str, u8); 6] = [
    ("GET /Motor/on1", 100),
    ("GET /Motor/on2", 90),
    ("GET /Motor/on3", 80),
    ("GET /Motor/on4", 70),
    ("GET /Motor/on5", 60),
    ("GET /Motor/off", 0),
];

pub const STATUS_ROUTE: &str = "GET /status";

/// Command decoded from the first line of an inbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    SetSpeed(SpeedPercent),
    Status,
    /// Anything else; served the control page with no state change
    Other,
}

impl Request {
    /// Decode a request line such as `GET /Motor/on3 HTTP/1.1`
    pub fn parse(request_line: &str) -> Self {
        if let Some(&(_, speed)) = SPEED_ROUTES
            .iter()
            .find(|(route, _)| request_line.contains(route))
        {
            return Request::SetSpeed(SpeedPercent::from(speed));
        }
        if request_line.contains(STATUS_ROUTE) {
            return Request::Status;
        }
        Request::Other
    }
}

/// JSON body served on `/status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
    pub requested_speed: u8,
}

/// Response written before the connection is closed
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Page,
    Status(StatusReport),
}

impl Response {
    /// Serialize as `HTTP/1.1 200 OK` with `Connection: close`
    pub fn to_bytes(&self, page: &str) -> Result<Vec<u8>, serde_json::Error> {
        let (content_type, body) = match self {
            Response::Page => ("text/html", page.to_string()),
            Response::Status(report) => ("application/json", serde_json::to_string(report)?),
        };

        let mut out = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            content_type,
            body.len()
        )
        .into_bytes();
        out.extend_from_slice(body.as_bytes());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_routes() {
        let cases = [
            ("GET /Motor/on1 HTTP/1.1", 100),
            ("GET /Motor/on2 HTTP/1.1", 90),
            ("GET /Motor/on3 HTTP/1.1", 80),
            ("GET /Motor/on4 HTTP/1.1", 70),
            ("GET /Motor/on5? HTTP/1.1", 60),
            ("GET /Motor/off HTTP/1.1", 0),
        ];
        for (line, speed) in cases {
            assert_eq!(
                Request::parse(line),
                Request::SetSpeed(SpeedPercent::from(speed as u8)),
                "{}",
                line
            );
        }
    }

    #[test]
    fn test_unrecognised_requests() {
        assert_eq!(Request::parse("GET / HTTP/1.1"), Request::Other);
        assert_eq!(Request::parse("GET /favicon.ico HTTP/1.1"), Request::Other);
        assert_eq!(Request::parse("POST /Motor/on1 HTTP/1.1"), Request::Other);
        assert_eq!(Request::parse(""), Request::Other);
        assert_eq!(Request::parse("GET /status HTTP/1.1"), Request::Status);
    }

    #[test]
    fn test_page_response_headers() {
        let bytes = Response::Page.to_bytes("<h1>hi</h1>").unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\n<h1>hi</h1>"));
    }

    #[test]
    fn test_status_response_body() {
        let response = Response::Status(StatusReport { requested_speed: 80 });
        let text = String::from_utf8(response.to_bytes("unused").unwrap()).unwrap();
        assert!(text.contains("Content-Type: application/json\r\n"));
        let body = text.split("\r\n\r\n").nth(1).unwrap();
        let report: StatusReport = serde_json::from_str(body).unwrap();
        assert_eq!(report.requested_speed, 80);
    }
}
