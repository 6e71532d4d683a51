//! In-memory [`SugarService`] for tests
//!
//! Records every call it receives and answers from canned data configured
//! through builder methods.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::error::{ClientError, Result};
use super::models::{
    EntryValue, ErrorValue, GetEntryListResult, GetEntryResult, GetRelationshipsResult, IdMod,
    ModuleField, ModuleFields, ModuleList, NameValue, NoteAttachment, ReturnNoteAttachment,
    SetEntryResult, SetRelationshipValue, UserAuth,
};
use super::query::ListQuery;
use super::service::SugarService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Probe,
    Login {
        user_name: String,
        password: String,
        version: String,
        application_name: String,
    },
    Logout {
        session: String,
    },
    GetEntry {
        module: String,
        id: String,
        fields: Vec<String>,
    },
    GetEntryList {
        module: String,
        max_results: i32,
        fields: Vec<String>,
    },
    SetEntry {
        module: String,
        pairs: Vec<(String, String)>,
    },
    Search {
        user_name: String,
        password: String,
        modules: Vec<String>,
    },
    GetModuleFields {
        module: String,
    },
    SetRelationship {
        module1: String,
        module2: String,
    },
    GetRelationships {
        module: String,
        related: String,
    },
    QuickCreate {
        operation: String,
        user_name: String,
        password: String,
    },
    Other(&'static str),
}

/// Shared view of the calls a [`FakeSugar`] received
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    /// Drain the recorded calls
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[derive(Debug, Default)]
pub struct FakeSugar {
    calls: CallLog,
    unreachable: bool,
    login_error: Option<ErrorValue>,
    logout_error: Option<ErrorValue>,
    list_error: Option<ErrorValue>,
    relationship_error: Option<ErrorValue>,
    module_fields: HashMap<String, Vec<String>>,
    entries: Vec<(String, Vec<NameValue>)>,
    search_hits: Vec<EntryValue>,
    related_ids: Vec<String>,
    modules: Vec<String>,
    describe_delay: Option<Duration>,
    failing_describes: Mutex<usize>,
}

impl FakeSugar {
    pub const SESSION: &'static str = "fake-session-0001";
    pub const NEW_ID: &'static str = "new-record-0001";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    /// Fail the probe with an HTTP 503
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn login_error(mut self, error: ErrorValue) -> Self {
        self.login_error = Some(error);
        self
    }

    pub fn logout_error(mut self, error: ErrorValue) -> Self {
        self.logout_error = Some(error);
        self
    }

    pub fn list_error(mut self, error: ErrorValue) -> Self {
        self.list_error = Some(error);
        self
    }

    pub fn relationship_error(mut self, error: ErrorValue) -> Self {
        self.relationship_error = Some(error);
        self
    }

    pub fn module_fields(mut self, module: &str, fields: &[&str]) -> Self {
        self.module_fields.insert(
            module.to_string(),
            fields.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    /// A record served by `get_entry` (by id) and `get_entry_list`
    pub fn entry(mut self, id: &str, pairs: &[(&str, &str)]) -> Self {
        self.entries.push((id.to_string(), name_values(pairs)));
        self
    }

    pub fn search_hit(mut self, module: &str, pairs: &[(&str, &str)]) -> Self {
        self.search_hits.push(EntryValue {
            id: String::new(),
            module_name: module.to_string(),
            name_value_list: name_values(pairs),
        });
        self
    }

    pub fn related_ids(mut self, ids: &[&str]) -> Self {
        self.related_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn modules(mut self, modules: &[&str]) -> Self {
        self.modules = modules.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn describe_delay_ms(mut self, millis: u64) -> Self {
        self.describe_delay = Some(Duration::from_millis(millis));
        self
    }

    /// Answer the next `count` describes with a "no such module" signal
    pub fn fail_describes(self, count: usize) -> Self {
        *self.failing_describes.lock().unwrap_or_else(PoisonError::into_inner) = count;
        self
    }

    fn quick_create(&self, operation: &str, user_name: &str, password: &str) -> Result<String> {
        self.calls.push(Call::QuickCreate {
            operation: operation.to_string(),
            user_name: user_name.to_string(),
            password: password.to_string(),
        });
        Ok(Self::NEW_ID.to_string())
    }
}

fn name_values(pairs: &[(&str, &str)]) -> Vec<NameValue> {
    pairs.iter().map(|(n, v)| NameValue::new(*n, *v)).collect()
}

#[async_trait]
impl SugarService for FakeSugar {
    async fn probe(&self) -> Result<()> {
        self.calls.push(Call::Probe);
        if self.unreachable {
            return Err(ClientError::Http {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn login(&self, auth: &UserAuth, application_name: &str) -> Result<SetEntryResult> {
        self.calls.push(Call::Login {
            user_name: auth.user_name.clone(),
            password: auth.password.clone(),
            version: auth.version.clone(),
            application_name: application_name.to_string(),
        });
        Ok(match &self.login_error {
            Some(error) => SetEntryResult {
                id: "-1".to_string(),
                error: error.clone(),
            },
            None => SetEntryResult {
                id: Self::SESSION.to_string(),
                error: ErrorValue::no_error(),
            },
        })
    }

    async fn logout(&self, session: &str) -> Result<ErrorValue> {
        self.calls.push(Call::Logout {
            session: session.to_string(),
        });
        Ok(self.logout_error.clone().unwrap_or_default())
    }

    async fn seamless_login(&self, _session: &str) -> Result<i32> {
        self.calls.push(Call::Other("seamless_login"));
        Ok(1)
    }

    async fn create_session(&self, user_name: &str, password: &str) -> Result<String> {
        self.quick_create("create_session", user_name, password)?;
        Ok("Success".to_string())
    }

    async fn end_session(&self, _user_name: &str) -> Result<String> {
        self.calls.push(Call::Other("end_session"));
        Ok("Success".to_string())
    }

    async fn get_entry(
        &self,
        _session: &str,
        module_name: &str,
        id: &str,
        select_fields: &[String],
    ) -> Result<GetEntryResult> {
        self.calls.push(Call::GetEntry {
            module: module_name.to_string(),
            id: id.to_string(),
            fields: select_fields.to_vec(),
        });
        let entry_list = self
            .entries
            .iter()
            .filter(|(entry_id, _)| entry_id == id)
            .map(|(entry_id, pairs)| EntryValue {
                id: entry_id.clone(),
                module_name: module_name.to_string(),
                name_value_list: pairs.clone(),
            })
            .collect();
        Ok(GetEntryResult {
            entry_list,
            ..Default::default()
        })
    }

    async fn get_entry_list(
        &self,
        _session: &str,
        module_name: &str,
        query: &ListQuery,
        select_fields: &[String],
    ) -> Result<GetEntryListResult> {
        self.calls.push(Call::GetEntryList {
            module: module_name.to_string(),
            max_results: query.max_results,
            fields: select_fields.to_vec(),
        });
        if let Some(error) = &self.list_error {
            return Ok(GetEntryListResult {
                error: error.clone(),
                ..Default::default()
            });
        }
        let entry_list: Vec<EntryValue> = self
            .entries
            .iter()
            .map(|(id, pairs)| EntryValue {
                id: id.clone(),
                module_name: module_name.to_string(),
                name_value_list: pairs.clone(),
            })
            .collect();
        Ok(GetEntryListResult {
            result_count: entry_list.len() as i32,
            next_offset: query.offset + entry_list.len() as i32,
            entry_list,
            ..Default::default()
        })
    }

    async fn set_entry(
        &self,
        _session: &str,
        module_name: &str,
        name_value_list: &[NameValue],
    ) -> Result<SetEntryResult> {
        self.calls.push(Call::SetEntry {
            module: module_name.to_string(),
            pairs: name_value_list
                .iter()
                .map(|nv| (nv.name.clone(), nv.value.clone()))
                .collect(),
        });
        Ok(SetEntryResult {
            id: Self::NEW_ID.to_string(),
            error: ErrorValue::no_error(),
        })
    }

    async fn search_by_module(
        &self,
        user_name: &str,
        password: &str,
        _search_string: &str,
        modules: &[String],
        _offset: i32,
        _max_results: i32,
    ) -> Result<GetEntryListResult> {
        self.calls.push(Call::Search {
            user_name: user_name.to_string(),
            password: password.to_string(),
            modules: modules.to_vec(),
        });
        Ok(GetEntryListResult {
            result_count: self.search_hits.len() as i32,
            entry_list: self.search_hits.clone(),
            ..Default::default()
        })
    }

    async fn get_note_attachment(&self, _session: &str, id: &str) -> Result<ReturnNoteAttachment> {
        self.calls.push(Call::Other("get_note_attachment"));
        Ok(ReturnNoteAttachment {
            note_attachment: NoteAttachment {
                id: id.to_string(),
                filename: "notes.txt".to_string(),
                file: "aGVsbG8=".to_string(),
            },
            error: ErrorValue::no_error(),
        })
    }

    async fn get_available_modules(&self, _session: &str) -> Result<ModuleList> {
        self.calls.push(Call::Other("get_available_modules"));
        Ok(ModuleList {
            modules: self.modules.clone(),
            error: ErrorValue::no_error(),
        })
    }

    async fn get_module_fields(&self, _session: &str, module_name: &str) -> Result<ModuleFields> {
        self.calls.push(Call::GetModuleFields {
            module: module_name.to_string(),
        });
        if let Some(delay) = self.describe_delay {
            tokio::time::sleep(delay).await;
        }

        let fail = {
            let mut remaining = self
                .failing_describes
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let fail = *remaining > 0;
            *remaining = remaining.saturating_sub(1);
            fail
        };
        if fail {
            return Ok(ModuleFields {
                module_name: module_name.to_string(),
                module_fields: Vec::new(),
                error: ErrorValue::new("20", "Module Does Not Exist", "This module is not available"),
            });
        }

        let module_fields = self
            .module_fields
            .get(module_name)
            .map(|names| {
                names
                    .iter()
                    .map(|name| ModuleField {
                        name: name.clone(),
                        field_type: "varchar".to_string(),
                        label: format!("{name}:"),
                        ..Default::default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(ModuleFields {
            module_name: module_name.to_string(),
            module_fields,
            error: ErrorValue::no_error(),
        })
    }

    async fn set_relationship(
        &self,
        _session: &str,
        value: &SetRelationshipValue,
    ) -> Result<ErrorValue> {
        self.calls.push(Call::SetRelationship {
            module1: value.module1.clone(),
            module2: value.module2.clone(),
        });
        Ok(self.relationship_error.clone().unwrap_or_default())
    }

    async fn get_relationships(
        &self,
        _session: &str,
        module_name: &str,
        _module_id: &str,
        related_module: &str,
        _related_module_query: &str,
        _deleted: i32,
    ) -> Result<GetRelationshipsResult> {
        self.calls.push(Call::GetRelationships {
            module: module_name.to_string(),
            related: related_module.to_string(),
        });
        Ok(GetRelationshipsResult {
            ids: self
                .related_ids
                .iter()
                .map(|id| IdMod {
                    id: id.clone(),
                    ..Default::default()
                })
                .collect(),
            error: ErrorValue::no_error(),
        })
    }

    async fn create_account(
        &self,
        user_name: &str,
        password: &str,
        _name: &str,
        _phone: &str,
        _website: &str,
    ) -> Result<String> {
        self.quick_create("create_account", user_name, password)
    }

    async fn create_case(&self, user_name: &str, password: &str, _name: &str) -> Result<String> {
        self.quick_create("create_case", user_name, password)
    }

    async fn create_contact(
        &self,
        user_name: &str,
        password: &str,
        _first_name: &str,
        _last_name: &str,
        _email_address: &str,
    ) -> Result<String> {
        self.quick_create("create_contact", user_name, password)
    }

    async fn create_lead(
        &self,
        user_name: &str,
        password: &str,
        _first_name: &str,
        _last_name: &str,
        _email_address: &str,
    ) -> Result<String> {
        self.quick_create("create_lead", user_name, password)
    }

    async fn create_opportunity(
        &self,
        user_name: &str,
        password: &str,
        _name: &str,
        _amount: &str,
    ) -> Result<String> {
        self.quick_create("create_opportunity", user_name, password)
    }

    async fn get_server_time(&self) -> Result<String> {
        self.calls.push(Call::Other("get_server_time"));
        Ok("2026-01-01 12:00:00".to_string())
    }

    async fn get_gmt_time(&self) -> Result<String> {
        self.calls.push(Call::Other("get_gmt_time"));
        Ok("2026-01-01 12:00:00".to_string())
    }

    async fn get_server_version(&self) -> Result<String> {
        self.calls.push(Call::Other("get_server_version"));
        Ok("6.5.26".to_string())
    }

    async fn get_sugar_flavor(&self) -> Result<String> {
        self.calls.push(Call::Other("get_sugar_flavor"));
        Ok("CE".to_string())
    }

    async fn is_loopback(&self) -> Result<i32> {
        self.calls.push(Call::Other("is_loopback"));
        Ok(0)
    }

    async fn get_user_id(&self, _session: &str) -> Result<String> {
        self.calls.push(Call::Other("get_user_id"));
        Ok("1".to_string())
    }

    async fn get_user_team_id(&self, _session: &str) -> Result<String> {
        self.calls.push(Call::Other("get_user_team_id"));
        Ok("1".to_string())
    }

    async fn is_user_admin(&self, _session: &str) -> Result<i32> {
        self.calls.push(Call::Other("is_user_admin"));
        Ok(1)
    }
}
