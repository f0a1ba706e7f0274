//! Transport boundary — header emission, process halt, mail, HTTP.
//!
//! The core never touches the network directly; everything goes through
//! [`TransportPort`] so tests (and embedders' tests) can substitute
//! [`RecordingTransport`] for the real [`SystemTransport`].

use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::error::TransportError;

/// Mail headers attached to every outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailHeaders {
    pub from: String,
    pub reply_to: String,
}

/// The injected boundary the processor delegates all side effects to.
pub trait TransportPort {
    /// Emit one response header (`"Name: value"` form).
    fn set_header(&mut self, header: &str) -> Result<(), TransportError>;

    /// Terminate the request unconditionally. The production
    /// implementation exits the process and never returns.
    fn halt_process(&mut self, code: i32) -> Result<(), TransportError>;

    /// Send one plain-text mail.
    fn send_mail(
        &mut self,
        to: &str,
        subject: &str,
        body: &str,
        headers: &MailHeaders,
    ) -> Result<bool, TransportError>;

    /// POST a JSON body, returning the raw response body.
    fn http_post(
        &mut self,
        url: &str,
        headers: &[(String, String)],
        json_body: &str,
    ) -> Result<String, TransportError>;

    /// Set the HTTP response status code.
    fn set_response_status(&mut self, code: u16) -> Result<(), TransportError>;
}

// ── Production transport ────────────────────────────────────────────

/// SMTP relay settings for [`SystemTransport`].
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Real transport: lettre for mail, blocking reqwest for HTTP.
///
/// Response headers and status are buffered in public fields; the
/// embedding server flushes them onto its own response. `halt_process`
/// exits the process, matching the redirect-and-stop contract.
pub struct SystemTransport {
    smtp: SmtpConfig,
    http: reqwest::blocking::Client,
    /// Headers emitted so far, in order.
    pub headers: Vec<String>,
    /// Response status, if the processor set one.
    pub status: Option<u16>,
}

impl SystemTransport {
    pub fn new(smtp: SmtpConfig) -> Self {
        Self {
            smtp,
            http: reqwest::blocking::Client::new(),
            headers: Vec::new(),
            status: None,
        }
    }
}

impl TransportPort for SystemTransport {
    fn set_header(&mut self, header: &str) -> Result<(), TransportError> {
        self.headers.push(header.to_string());
        Ok(())
    }

    fn halt_process(&mut self, code: i32) -> Result<(), TransportError> {
        tracing::info!(code, "Halting request processing");
        std::process::exit(code);
    }

    fn send_mail(
        &mut self,
        to: &str,
        subject: &str,
        body: &str,
        headers: &MailHeaders,
    ) -> Result<bool, TransportError> {
        let from = headers
            .from
            .parse()
            .map_err(|e| TransportError::InvalidAddress {
                address: headers.from.clone(),
                reason: format!("{e}"),
            })?;
        let reply_to = headers
            .reply_to
            .parse()
            .map_err(|e| TransportError::InvalidAddress {
                address: headers.reply_to.clone(),
                reason: format!("{e}"),
            })?;
        let to_addr = to.parse().map_err(|e| TransportError::InvalidAddress {
            address: to.to_string(),
            reason: format!("{e}"),
        })?;

        let email = Message::builder()
            .from(from)
            .reply_to(reply_to)
            .to(to_addr)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| TransportError::SendFailed {
                to: to.to_string(),
                reason: format!("Failed to build email: {e}"),
            })?;

        let creds = Credentials::new(self.smtp.username.clone(), self.smtp.password.clone());
        let transport = SmtpTransport::relay(&self.smtp.host)
            .map_err(|e| TransportError::SendFailed {
                to: to.to_string(),
                reason: format!("SMTP relay error: {e}"),
            })?
            .port(self.smtp.port)
            .credentials(creds)
            .build();

        transport
            .send(&email)
            .map_err(|e| TransportError::SendFailed {
                to: to.to_string(),
                reason: format!("SMTP send failed: {e}"),
            })?;

        tracing::info!(to, subject, "Mail sent");
        Ok(true)
    }

    fn http_post(
        &mut self,
        url: &str,
        headers: &[(String, String)],
        json_body: &str,
    ) -> Result<String, TransportError> {
        let mut request = self.http.post(url).body(json_body.to_string());
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .map_err(|e| TransportError::Http(format!("POST {url} failed: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TransportError::Http(format!("Failed to read response: {e}")))?;

        tracing::info!(url, status = status.as_u16(), "Archive POST issued");
        Ok(body)
    }

    fn set_response_status(&mut self, code: u16) -> Result<(), TransportError> {
        self.status = Some(code);
        Ok(())
    }
}

// ── Test double ─────────────────────────────────────────────────────

/// One recorded transport interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    SetHeader(String),
    HaltProcess(i32),
    SendMail {
        to: String,
        subject: String,
        body: String,
        headers: MailHeaders,
    },
    HttpPost {
        url: String,
        headers: Vec<(String, String)>,
        body: String,
    },
    SetResponseStatus(u16),
}

/// Transport double that records every call in order and returns canned
/// results. Unlike [`SystemTransport`], `halt_process` records and
/// returns, so a halted pipeline can be observed from a test.
///
/// Failures are opt-in: `fail_mail_to` makes `send_mail` to that address
/// fail, `fail_http` makes `http_post` fail. The failing call is still
/// recorded, like a real transport that attempted and lost.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub calls: Vec<TransportCall>,
    /// Body returned from `http_post`. Defaults to empty.
    pub http_response: String,
    /// When set, `send_mail` to this address returns an error.
    pub fail_mail_to: Option<String>,
    /// When true, `http_post` returns an error.
    pub fail_http: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            http_response: "{}".to_string(),
            fail_mail_to: None,
            fail_http: false,
        }
    }

    /// Recorded headers, in emission order.
    pub fn headers(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::SetHeader(h) => Some(h.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Recorded mail destinations, in send order.
    pub fn mail_recipients(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::SendMail { to, .. } => Some(to.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl TransportPort for RecordingTransport {
    fn set_header(&mut self, header: &str) -> Result<(), TransportError> {
        self.calls.push(TransportCall::SetHeader(header.to_string()));
        Ok(())
    }

    fn halt_process(&mut self, code: i32) -> Result<(), TransportError> {
        self.calls.push(TransportCall::HaltProcess(code));
        Ok(())
    }

    fn send_mail(
        &mut self,
        to: &str,
        subject: &str,
        body: &str,
        headers: &MailHeaders,
    ) -> Result<bool, TransportError> {
        self.calls.push(TransportCall::SendMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            headers: headers.clone(),
        });
        if self.fail_mail_to.as_deref() == Some(to) {
            return Err(TransportError::SendFailed {
                to: to.to_string(),
                reason: "mail transport unavailable".to_string(),
            });
        }
        Ok(true)
    }

    fn http_post(
        &mut self,
        url: &str,
        headers: &[(String, String)],
        json_body: &str,
    ) -> Result<String, TransportError> {
        self.calls.push(TransportCall::HttpPost {
            url: url.to_string(),
            headers: headers.to_vec(),
            body: json_body.to_string(),
        });
        if self.fail_http {
            return Err(TransportError::Http(format!("POST {url} failed: connection refused")));
        }
        Ok(self.http_response.clone())
    }

    fn set_response_status(&mut self, code: u16) -> Result<(), TransportError> {
        self.calls.push(TransportCall::SetResponseStatus(code));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_transport_keeps_call_order() {
        let mut transport = RecordingTransport::new();
        transport.set_header("X-One: 1").unwrap();
        transport.set_response_status(422).unwrap();
        assert_eq!(
            transport.calls,
            vec![
                TransportCall::SetHeader("X-One: 1".into()),
                TransportCall::SetResponseStatus(422),
            ]
        );
    }

    #[test]
    fn recording_transport_returns_canned_http_response() {
        let mut transport = RecordingTransport::new();
        transport.http_response = r#"{"id":"page"}"#.to_string();
        let body = transport.http_post("https://x.example", &[], "{}").unwrap();
        assert_eq!(body, r#"{"id":"page"}"#);
    }

    #[test]
    fn recording_transport_can_fail_mail_to_one_address() {
        let mut transport = RecordingTransport::new();
        transport.fail_mail_to = Some("down@foo.example".into());
        let headers = MailHeaders {
            from: "noreply@foo.example".into(),
            reply_to: "hello@foo.example".into(),
        };

        assert!(transport.send_mail("up@foo.example", "s", "b", &headers).is_ok());
        let err = transport
            .send_mail("down@foo.example", "s", "b", &headers)
            .unwrap_err();
        assert!(matches!(err, TransportError::SendFailed { to, .. } if to == "down@foo.example"));
        // The failed attempt is still recorded.
        assert_eq!(transport.mail_recipients(), ["up@foo.example", "down@foo.example"]);
    }

    #[test]
    fn recording_transport_can_fail_http() {
        let mut transport = RecordingTransport::new();
        transport.fail_http = true;
        let err = transport.http_post("https://x.example", &[], "{}").unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
        assert_eq!(transport.calls.len(), 1);
    }

    #[test]
    fn system_transport_buffers_headers_and_status() {
        let mut transport = SystemTransport::new(SmtpConfig {
            host: "smtp.foo.example".into(),
            port: 587,
            username: "user".into(),
            password: "pass".into(),
        });
        transport.set_header("X-Frame-Options: DENY").unwrap();
        transport.set_response_status(422).unwrap();
        assert_eq!(transport.headers, vec!["X-Frame-Options: DENY"]);
        assert_eq!(transport.status, Some(422));
    }
}
