//! Submission processor — the request pipeline.
//!
//! Flow:
//! 1. Security headers (non-POST gets a redirect and a halt)
//! 2. Ingest + validate against the field schema
//! 3. Valid: notify mail → reply mail → archive to Notion, in that order
//! 4. Invalid: HTTP 422 + error envelope
//!
//! Everything is derived from the ordered [`FieldSpec`] list: the error
//! list, the mail body lines, and the Notion properties all follow field
//! declaration order.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::config::{Config, PropertyKind};
use crate::envelope::ResponseEnvelope;
use crate::error::{ConfigError, Result, TransportError};
use crate::notion;
use crate::transport::{MailHeaders, TransportPort};

/// Raw submission data, keyed by field key. Stored verbatim; nothing is
/// coerced or trimmed.
pub type Submission = HashMap<String, String>;

/// Outcome of the security-header step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Request method acceptable, headers emitted, carry on.
    Proceed,
    /// Non-POST request: redirect emitted and the transport was told to
    /// halt. Nothing further may touch the transport.
    Halted,
}

/// Processes one contact-form submission against a validated [`Config`],
/// delegating all side effects to the injected transport.
#[derive(Debug)]
pub struct SubmissionProcessor<'a, T: TransportPort> {
    config: Config,
    transport: &'a mut T,
    data: Submission,
    errors: Vec<String>,
}

impl<'a, T: TransportPort> SubmissionProcessor<'a, T> {
    /// Build a processor. Fails if any config value is empty — an
    /// incomplete config is a deployment error, so this is checked before
    /// any request data is looked at.
    pub fn new(config: Config, transport: &'a mut T) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            data: Submission::new(),
            errors: Vec::new(),
        })
    }

    /// The fixed hardening header set, in emission order. Only the CORS
    /// origin varies with configuration.
    fn security_headers(&self) -> [String; 10] {
        let domain = &self.config.site_domain;
        [
            "Strict-Transport-Security: max-age=31536000; includeSubdomains; preload".to_string(),
            "X-Frame-Options: DENY".to_string(),
            "Vary: Accept, Accept-Encoding, Accept, X-Requested-With".to_string(),
            "Content-Security-Policy: default-src 'none'".to_string(),
            format!("Access-Control-Allow-Origin: https://{domain}"),
            "Access-Control-Allow-Headers: Authorization, Content-Type, If-Match, \
             If-Modified-Since, If-None-Match, If-Unmodified-Since, Accept-Encoding, \
             X-Requested-With, User-Agent"
                .to_string(),
            "Access-Control-Allow-Methods: POST, OPTIONS".to_string(),
            "Referrer-Policy: origin-when-cross-origin, strict-origin-when-cross-origin"
                .to_string(),
            "X-Content-Type-Options: nosniff".to_string(),
            "Content-Type: application/json; charset=utf-8".to_string(),
        ]
    }

    /// Emit response headers. A present, non-POST request method gets a
    /// redirect to the site and a process halt instead of the header set.
    pub fn emit_security_headers(
        &mut self,
        request_method: Option<&str>,
    ) -> std::result::Result<Gate, TransportError> {
        if let Some(method) = request_method
            && method != "POST"
        {
            self.transport
                .set_header(&format!("Location: https://{}", self.config.site_domain))?;
            self.transport.halt_process(1)?;
            return Ok(Gate::Halted);
        }

        for header in self.security_headers() {
            self.transport.set_header(&header)?;
        }
        Ok(Gate::Proceed)
    }

    /// Store the submission verbatim.
    pub fn ingest(&mut self, data: Submission) -> &mut Self {
        self.data = data;
        self
    }

    fn value(&self, key: &str) -> &str {
        self.data.get(key).map(String::as_str).unwrap_or("")
    }

    /// Validate required fields. Rebuilds the error list from scratch, so
    /// repeated calls reproduce the same result. Errors follow field
    /// declaration order.
    pub fn is_valid(&mut self) -> bool {
        self.errors.clear();
        for field in &self.config.fields {
            if field.required && self.data.get(&field.key).is_none_or(String::is_empty) {
                self.errors.push(format!("{} is required", field.key));
            }
        }
        self.errors.is_empty()
    }

    /// Accumulated errors: validation failures, plus any unrecognized
    /// property types reported while building the archive record.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// The data block shared by both mails: one label/value pair per
    /// field, preceded by a blank line.
    fn render_body(&self) -> String {
        let mut body = String::from("\n");
        for field in &self.config.fields {
            body.push_str(&field.display_name);
            body.push_str(":\n  ");
            body.push_str(self.value(&field.key));
            body.push('\n');
        }
        body
    }

    /// Two-line mail signature.
    fn render_footer(&self) -> String {
        format!(
            "--\n{}\nhttps://{}",
            self.config.site_name, self.config.site_domain
        )
    }

    /// Send the notification mail to the site owner.
    pub fn notify(&mut self) -> Result<()> {
        let domain = &self.config.site_domain;
        let subject = format!("Contact from {domain}");
        let body = format!(
            "Contact from {domain} here:\n{}\n{}",
            self.render_body(),
            self.render_footer()
        );
        let headers = MailHeaders {
            from: self.config.mail_from.clone(),
            reply_to: self.config.reply_to.clone(),
        };
        self.transport
            .send_mail(&self.config.notify_to, &subject, &body, &headers)?;
        Ok(())
    }

    /// Send the acknowledgement mail back to the submitter, addressed to
    /// the submission value under `mail_to_key`.
    pub fn reply(&mut self) -> Result<()> {
        let domain = &self.config.site_domain;
        let subject = format!("Thanks for your message from {domain}");
        let body = format!(
            "It has accepted a your message to {domain}.\n{}\n{}",
            self.render_body(),
            self.render_footer()
        );
        let headers = MailHeaders {
            from: self.config.mail_from.clone(),
            reply_to: self.config.reply_to.clone(),
        };
        let to = self.value(&self.config.mail_to_key).to_string();
        self.transport.send_mail(&to, &subject, &body, &headers)?;
        Ok(())
    }

    /// Database properties for the archive record, keyed by display name.
    /// `Block` fields belong to the page body and are skipped here; an
    /// unrecognized kind is recorded in the error list but does not stop
    /// the archive call.
    fn archive_properties(&mut self) -> Map<String, Value> {
        let mut properties = Map::new();
        for field in &self.config.fields {
            let content = self.data.get(&field.key).map(String::as_str).unwrap_or("");
            let shape = match &field.kind {
                PropertyKind::Title => notion::title_property(content),
                PropertyKind::Email => notion::email_property(content),
                PropertyKind::RichText => notion::rich_text_property(content),
                PropertyKind::Block => continue,
                PropertyKind::Other(kind) => {
                    warn!(kind = %kind, key = %field.key, "Skipping unknown notion property type");
                    self.errors
                        .push(format!("{kind} is undefined notion property type"));
                    continue;
                }
            };
            properties.insert(field.display_name.clone(), shape);
        }
        properties
    }

    /// Page-body paragraphs from `Block` fields. The value is split on
    /// the literal backslash-n sequence, not a real newline.
    fn archive_blocks(&self) -> Vec<Value> {
        let mut blocks = Vec::new();
        for field in &self.config.fields {
            if field.kind != PropertyKind::Block {
                continue;
            }
            for line in self.value(&field.key).split("\\n") {
                blocks.push(notion::paragraph_block(line));
            }
        }
        blocks
    }

    /// Archive the submission as a Notion page. Returns the raw response
    /// body; nothing in it is parsed or checked here.
    pub fn archive(&mut self) -> Result<String> {
        let properties = self.archive_properties();
        let children = self.archive_blocks();
        let page = notion::page(
            &self.config.notion_db_id,
            &self.config.notion_emoji,
            properties,
            children,
        );

        let headers = vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.config.notion_token),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Notion-Version".to_string(), notion::NOTION_VERSION.to_string()),
        ];
        let body = serde_json::to_string(&page)?;
        let response = self
            .transport
            .http_post(&self.config.notion_endpoint, &headers, &body)?;
        Ok(response)
    }
}

/// Run the whole pipeline for one request.
///
/// On a valid submission the notify mail, the reply mail, and the archive
/// POST happen strictly in that order; the archive response body is
/// forwarded to `on_archived` if a sink is supplied. On validation
/// failure the transport gets a 422 and the envelope carries the errors.
pub fn process_request<T: TransportPort>(
    config: Config,
    request_method: Option<&str>,
    data: Submission,
    transport: &mut T,
    mut on_archived: Option<&mut dyn FnMut(&str)>,
) -> Result<ResponseEnvelope> {
    let mut slot = SubmissionProcessor::new(config, transport)?;

    if slot.emit_security_headers(request_method)? == Gate::Halted {
        // In production halt_process never returns; with a test double it
        // does, and nothing further may happen.
        return Ok(ResponseEnvelope::ok());
    }

    slot.ingest(data);
    if slot.is_valid() {
        slot.notify()?;
        slot.reply()?;
        let response = slot.archive()?;
        if let Some(sink) = on_archived.as_mut() {
            sink(&response);
        }
        Ok(ResponseEnvelope::ok())
    } else {
        slot.transport.set_response_status(422)?;
        Ok(ResponseEnvelope::invalid(slot.errors.clone()))
    }
}

// ── Tests ───────────────────────────────────────────────────────────
