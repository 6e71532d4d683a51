//! HTTP transport for the SugarCRM SOAP endpoint

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};

use super::envelope::Envelope;
use super::response::{self, FromSoap};
use crate::api::error::{ClientError, Result};
use crate::api::models::{
    ErrorValue, GetEntryListResult, GetEntryResult, GetRelationshipsResult, ModuleFields,
    ModuleList, NameValue, ReturnNoteAttachment, SetEntryResult, SetRelationshipValue, UserAuth,
};
use crate::api::query::ListQuery;
use crate::api::service::SugarService;

const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Longest response body kept in an HTTP error
const ERROR_BODY_LIMIT: usize = 512;

/// [`SugarService`] over HTTP POSTs of SOAP envelopes
#[derive(Debug, Clone)]
pub struct SoapTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl SoapTransport {
    /// Transport for `endpoint` (the full `soap.php` URL) with default settings
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::builder(endpoint).build()
    }

    pub fn builder(endpoint: impl Into<String>) -> SoapTransportBuilder {
        SoapTransportBuilder {
            endpoint: endpoint.into(),
            timeout: None,
            user_agent: concat!("sugar-cli/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: FromSoap>(&self, envelope: Envelope) -> Result<T> {
        let operation = envelope.operation();
        let body = envelope.to_xml()?;
        let start = Instant::now();

        debug!("SOAP {} -> {}", operation, self.endpoint);
        trace!("SOAP request body: {}", body);

        let reply = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", envelope.soap_action())
            .body(body)
            .send()
            .await?;

        let status = reply.status();
        let text = reply.text().await?;

        debug!(
            "SOAP {} <- HTTP {} in {:?}",
            operation,
            status.as_u16(),
            start.elapsed()
        );
        trace!("SOAP response body: {}", text);

        if !status.is_success() {
            // Servers report faults with a 500, prefer the fault when there is one
            return Err(response::fault(&text).unwrap_or_else(|| ClientError::Http {
                status: status.as_u16(),
                body: truncate(&text, ERROR_BODY_LIMIT),
            }));
        }

        response::decode(&text)
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Builder for [`SoapTransport`]
#[derive(Debug)]
pub struct SoapTransportBuilder {
    endpoint: String,
    timeout: Option<Duration>,
    user_agent: String,
}

impl SoapTransportBuilder {
    /// Per-request timeout. Unset means calls may wait forever.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<SoapTransport> {
        if self.endpoint.trim().is_empty() {
            return Err(ClientError::Config("endpoint URL is empty".to_string()));
        }

        let mut http = reqwest::Client::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        Ok(SoapTransport {
            http: http.build()?,
            endpoint: self.endpoint,
        })
    }
}

#[async_trait]
impl SugarService for SoapTransport {
    async fn probe(&self) -> Result<()> {
        debug!("Probing {}", self.endpoint);
        self.http
            .get(&self.endpoint)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| ClientError::Unreachable {
                url: self.endpoint.clone(),
                source,
            })?;
        Ok(())
    }

    async fn login(&self, auth: &UserAuth, application_name: &str) -> Result<SetEntryResult> {
        self.call(
            Envelope::new("login")
                .user_auth("user_auth", auth)
                .string("application_name", application_name),
        )
        .await
    }

    async fn logout(&self, session: &str) -> Result<ErrorValue> {
        self.call(Envelope::new("logout").string("session", session))
            .await
    }

    async fn seamless_login(&self, session: &str) -> Result<i32> {
        self.call(Envelope::new("seamless_login").string("session", session))
            .await
    }

    async fn create_session(&self, user_name: &str, password: &str) -> Result<String> {
        self.call(
            Envelope::new("create_session")
                .string("user_name", user_name)
                .string("password", password),
        )
        .await
    }

    async fn end_session(&self, user_name: &str) -> Result<String> {
        self.call(Envelope::new("end_session").string("user_name", user_name))
            .await
    }

    async fn get_entry(
        &self,
        session: &str,
        module_name: &str,
        id: &str,
        select_fields: &[String],
    ) -> Result<GetEntryResult> {
        self.call(
            Envelope::new("get_entry")
                .string("session", session)
                .string("module_name", module_name)
                .string("id", id)
                .string_array("select_fields", select_fields),
        )
        .await
    }

    async fn get_entry_list(
        &self,
        session: &str,
        module_name: &str,
        query: &ListQuery,
        select_fields: &[String],
    ) -> Result<GetEntryListResult> {
        self.call(
            Envelope::new("get_entry_list")
                .string("session", session)
                .string("module_name", module_name)
                .string("query", &query.query)
                .string("order_by", &query.order_by)
                .int("offset", query.offset)
                .string_array("select_fields", select_fields)
                .int("max_results", query.max_results)
                .int("deleted", query.deleted_flag()),
        )
        .await
    }

    async fn set_entry(
        &self,
        session: &str,
        module_name: &str,
        name_value_list: &[NameValue],
    ) -> Result<SetEntryResult> {
        self.call(
            Envelope::new("set_entry")
                .string("session", session)
                .string("module_name", module_name)
                .name_values("name_value_list", name_value_list),
        )
        .await
    }

    async fn search_by_module(
        &self,
        user_name: &str,
        password: &str,
        search_string: &str,
        modules: &[String],
        offset: i32,
        max_results: i32,
    ) -> Result<GetEntryListResult> {
        self.call(
            Envelope::new("search_by_module")
                .string("user_name", user_name)
                .string("password", password)
                .string("search_string", search_string)
                .string_array("modules", modules)
                .int("offset", offset)
                .int("max_results", max_results),
        )
        .await
    }

    async fn get_note_attachment(&self, session: &str, id: &str) -> Result<ReturnNoteAttachment> {
        self.call(
            Envelope::new("get_note_attachment")
                .string("session", session)
                .string("id", id),
        )
        .await
    }

    async fn get_available_modules(&self, session: &str) -> Result<ModuleList> {
        self.call(Envelope::new("get_available_modules").string("session", session))
            .await
    }

    async fn get_module_fields(&self, session: &str, module_name: &str) -> Result<ModuleFields> {
        self.call(
            Envelope::new("get_module_fields")
                .string("session", session)
                .string("module_name", module_name),
        )
        .await
    }

    async fn set_relationship(
        &self,
        session: &str,
        value: &SetRelationshipValue,
    ) -> Result<ErrorValue> {
        self.call(
            Envelope::new("set_relationship")
                .string("session", session)
                .relationship("set_relationship_value", value),
        )
        .await
    }

    async fn get_relationships(
        &self,
        session: &str,
        module_name: &str,
        module_id: &str,
        related_module: &str,
        related_module_query: &str,
        deleted: i32,
    ) -> Result<GetRelationshipsResult> {
        self.call(
            Envelope::new("get_relationships")
                .string("session", session)
                .string("module_name", module_name)
                .string("module_id", module_id)
                .string("related_module", related_module)
                .string("related_module_query", related_module_query)
                .int("deleted", deleted),
        )
        .await
    }

    async fn create_account(
        &self,
        user_name: &str,
        password: &str,
        name: &str,
        phone: &str,
        website: &str,
    ) -> Result<String> {
        self.call(
            Envelope::new("create_account")
                .string("user_name", user_name)
                .string("password", password)
                .string("name", name)
                .string("phone", phone)
                .string("website", website),
        )
        .await
    }

    async fn create_case(&self, user_name: &str, password: &str, name: &str) -> Result<String> {
        self.call(
            Envelope::new("create_case")
                .string("user_name", user_name)
                .string("password", password)
                .string("name", name),
        )
        .await
    }

    async fn create_contact(
        &self,
        user_name: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        email_address: &str,
    ) -> Result<String> {
        self.call(
            Envelope::new("create_contact")
                .string("user_name", user_name)
                .string("password", password)
                .string("first_name", first_name)
                .string("last_name", last_name)
                .string("email_address", email_address),
        )
        .await
    }

    async fn create_lead(
        &self,
        user_name: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        email_address: &str,
    ) -> Result<String> {
        self.call(
            Envelope::new("create_lead")
                .string("user_name", user_name)
                .string("password", password)
                .string("first_name", first_name)
                .string("last_name", last_name)
                .string("email_address", email_address),
        )
        .await
    }

    async fn create_opportunity(
        &self,
        user_name: &str,
        password: &str,
        name: &str,
        amount: &str,
    ) -> Result<String> {
        self.call(
            Envelope::new("create_opportunity")
                .string("user_name", user_name)
                .string("password", password)
                .string("name", name)
                .string("amount", amount),
        )
        .await
    }

    async fn get_server_time(&self) -> Result<String> {
        self.call(Envelope::new("get_server_time")).await
    }

    async fn get_gmt_time(&self) -> Result<String> {
        self.call(Envelope::new("get_gmt_time")).await
    }

    async fn get_server_version(&self) -> Result<String> {
        self.call(Envelope::new("get_server_version")).await
    }

    async fn get_sugar_flavor(&self) -> Result<String> {
        self.call(Envelope::new("get_sugar_flavor")).await
    }

    async fn is_loopback(&self) -> Result<i32> {
        self.call(Envelope::new("is_loopback")).await
    }

    async fn get_user_id(&self, session: &str) -> Result<String> {
        self.call(Envelope::new("get_user_id").string("session", session))
            .await
    }

    async fn get_user_team_id(&self, session: &str) -> Result<String> {
        self.call(Envelope::new("get_user_team_id").string("session", session))
            .await
    }

    async fn is_user_admin(&self, session: &str) -> Result<i32> {
        self.call(Envelope::new("is_user_admin").string("session", session))
            .await
    }
}
