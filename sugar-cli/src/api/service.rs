//! The remote SugarCRM operation set
//!
//! One method per `soap.php` operation, taking and returning the raw wire
//! models. Implementations only move data; error signals embedded in the
//! results are interpreted by [`SugarClient`](super::SugarClient).

use async_trait::async_trait;

use super::error::Result;
use super::models::{
    ErrorValue, GetEntryListResult, GetEntryResult, GetRelationshipsResult, ModuleFields,
    ModuleList, NameValue, ReturnNoteAttachment, SetEntryResult, SetRelationshipValue, UserAuth,
};
use super::query::ListQuery;

#[async_trait]
pub trait SugarService: Send + Sync + 'static {
    /// Check that the endpoint answers at all
    async fn probe(&self) -> Result<()>;

    // Session management

    async fn login(&self, auth: &UserAuth, application_name: &str) -> Result<SetEntryResult>;
    async fn logout(&self, session: &str) -> Result<ErrorValue>;
    async fn seamless_login(&self, session: &str) -> Result<i32>;
    async fn create_session(&self, user_name: &str, password: &str) -> Result<String>;
    async fn end_session(&self, user_name: &str) -> Result<String>;

    // Records

    async fn get_entry(
        &self,
        session: &str,
        module_name: &str,
        id: &str,
        select_fields: &[String],
    ) -> Result<GetEntryResult>;

    async fn get_entry_list(
        &self,
        session: &str,
        module_name: &str,
        query: &ListQuery,
        select_fields: &[String],
    ) -> Result<GetEntryListResult>;

    async fn set_entry(
        &self,
        session: &str,
        module_name: &str,
        name_value_list: &[NameValue],
    ) -> Result<SetEntryResult>;

    async fn search_by_module(
        &self,
        user_name: &str,
        password: &str,
        search_string: &str,
        modules: &[String],
        offset: i32,
        max_results: i32,
    ) -> Result<GetEntryListResult>;

    async fn get_note_attachment(&self, session: &str, id: &str) -> Result<ReturnNoteAttachment>;

    // Schema

    async fn get_available_modules(&self, session: &str) -> Result<ModuleList>;
    async fn get_module_fields(&self, session: &str, module_name: &str) -> Result<ModuleFields>;

    // Relationships

    async fn set_relationship(
        &self,
        session: &str,
        value: &SetRelationshipValue,
    ) -> Result<ErrorValue>;

    async fn get_relationships(
        &self,
        session: &str,
        module_name: &str,
        module_id: &str,
        related_module: &str,
        related_module_query: &str,
        deleted: i32,
    ) -> Result<GetRelationshipsResult>;

    // Quick-create helpers authenticated by user name and password digest

    async fn create_account(
        &self,
        user_name: &str,
        password: &str,
        name: &str,
        phone: &str,
        website: &str,
    ) -> Result<String>;

    async fn create_case(&self, user_name: &str, password: &str, name: &str) -> Result<String>;

    async fn create_contact(
        &self,
        user_name: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        email_address: &str,
    ) -> Result<String>;

    async fn create_lead(
        &self,
        user_name: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        email_address: &str,
    ) -> Result<String>;

    async fn create_opportunity(
        &self,
        user_name: &str,
        password: &str,
        name: &str,
        amount: &str,
    ) -> Result<String>;

    // Server and user information

    async fn get_server_time(&self) -> Result<String>;
    async fn get_gmt_time(&self) -> Result<String>;
    async fn get_server_version(&self) -> Result<String>;
    async fn get_sugar_flavor(&self) -> Result<String>;
    async fn is_loopback(&self) -> Result<i32>;
    async fn get_user_id(&self, session: &str) -> Result<String>;
    async fn get_user_team_id(&self, session: &str) -> Result<String>;
    async fn is_user_admin(&self, session: &str) -> Result<i32>;
}
