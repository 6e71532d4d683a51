//! Session-bound SugarCRM client
//!
//! [`SugarClient`] owns the credentials and session token of one login and
//! exposes one method per remote operation. Module names are normalized once
//! per call, domain error signals are checked before results are reshaped,
//! and the session is released by [`SugarClient::logout`] or, failing that,
//! when the client is dropped. On a multi-thread runtime the drop waits for
//! the logout; on a current-thread runtime it is only spawned and is lost if
//! the runtime shuts down first.

use futures::future::BoxFuture;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};

use super::auth::Credentials;
use super::cache::ModuleFieldCache;
use super::entry::SugarEntry;
use super::error::{ClientError, Result};
use super::models::{ErrorValue, ModuleField, NoteAttachment, SetRelationshipValue};
use super::module_name::ModuleName;
use super::query::ListQuery;
use super::service::SugarService;
use super::soap::SoapTransport;
use crate::config::ClientConfig;

/// Outcome of ending a session.
///
/// Unlike every other operation, a non-zero error signal from `logout` is
/// reported here instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutStatus {
    LoggedOut,
    Failed(ErrorValue),
}

impl LogoutStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::LoggedOut)
    }
}

impl fmt::Display for LogoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedOut => write!(f, "Logout Successful!"),
            Self::Failed(error) => write!(f, "Logout Error: {}\n{}", error.number, error.description),
        }
    }
}

/// Builder for [`SugarClient`]
pub struct SugarClientBuilder<S: SugarService> {
    service: S,
    credentials: Credentials,
    application_name: String,
    cache: Option<Arc<ModuleFieldCache>>,
}

impl<S: SugarService> SugarClientBuilder<S> {
    /// Application name reported with the login call
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Share a field cache between clients
    pub fn cache(mut self, cache: Arc<ModuleFieldCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Probe the endpoint, then log in.
    ///
    /// Fails fast when the endpoint is unreachable. A failed login leaves no
    /// session behind, so there is nothing to release on error.
    pub async fn connect(self) -> Result<SugarClient<S>> {
        self.service.probe().await?;

        let result = self
            .service
            .login(&self.credentials.user_auth(), &self.application_name)
            .await?;
        result.error.check()?;

        info!("Logged in to SugarCRM as {}", self.credentials.username());
        debug!("Session id: {}", result.id);

        Ok(SugarClient {
            service: Arc::new(self.service),
            credentials: self.credentials,
            session: result.id,
            cache: self.cache.unwrap_or_default(),
        })
    }
}

/// A logged-in SugarCRM session
pub struct SugarClient<S: SugarService = SoapTransport> {
    service: Arc<S>,
    credentials: Credentials,
    session: String,
    cache: Arc<ModuleFieldCache>,
}

impl SugarClient<SoapTransport> {
    /// Build a SOAP transport from `config` and log in
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = SoapTransport::builder(config.url.clone())
            .timeout(config.timeout)
            .build()?;

        SugarClient::builder(transport, config.credentials()?)
            .application_name(config.application_name.clone())
            .connect()
            .await
    }
}

impl<S: SugarService> SugarClient<S> {
    pub fn builder(service: S, credentials: Credentials) -> SugarClientBuilder<S> {
        SugarClientBuilder {
            service,
            credentials,
            application_name: String::new(),
            cache: None,
        }
    }

    /// Log in with default options and a private field cache
    pub async fn connect(service: S, credentials: Credentials) -> Result<Self> {
        Self::builder(service, credentials).connect().await
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    pub fn field_cache(&self) -> &Arc<ModuleFieldCache> {
        &self.cache
    }

    // --- records -----------------------------------------------------------

    /// Fetch one record with the given fields
    pub async fn get_entry(&self, module: &str, id: &str, fields: &[String]) -> Result<SugarEntry> {
        self.fetch_entry(&ModuleName::new(module), id, fields).await
    }

    /// Fetch one record with every field of its module
    pub async fn get_entry_all_fields(&self, module: &str, id: &str) -> Result<SugarEntry> {
        let module = ModuleName::new(module);
        let fields = self.module_field_list(&module).await?;
        self.fetch_entry(&module, id, &fields).await
    }

    /// Fetch a page of records with the given fields
    pub async fn get_entry_list(
        &self,
        module: &str,
        query: &ListQuery,
        fields: &[String],
    ) -> Result<Vec<SugarEntry>> {
        self.fetch_entry_list(&ModuleName::new(module), query, fields)
            .await
    }

    /// Fetch a page of records with every field of their module
    pub async fn get_entry_list_all_fields(
        &self,
        module: &str,
        query: &ListQuery,
    ) -> Result<Vec<SugarEntry>> {
        let module = ModuleName::new(module);
        let fields = self.module_field_list(&module).await?;
        self.fetch_entry_list(&module, query, &fields).await
    }

    /// Create or update a record; returns its id
    pub async fn set_entry(&self, entry: &SugarEntry) -> Result<String> {
        let module = ModuleName::new(entry.module());
        debug!("set_entry {} ({} fields)", module, entry.len());

        let result = self
            .service
            .set_entry(&self.session, module.as_str(), &entry.to_name_values())
            .await?;
        result.error.check()?;
        Ok(result.id)
    }

    /// Full-text search across `modules`; each record is tagged with the
    /// module it was found in
    pub async fn search_by_module<M: AsRef<str>>(
        &self,
        search: &str,
        modules: &[M],
        offset: i32,
        max_results: i32,
    ) -> Result<Vec<SugarEntry>> {
        let modules: Vec<String> = modules
            .iter()
            .map(|m| ModuleName::new(m.as_ref()).into_string())
            .collect();
        debug!("search_by_module {:?} in {:?}", search, modules);

        let result = self
            .service
            .search_by_module(
                self.credentials.username(),
                self.credentials.password_digest(),
                search,
                &modules,
                offset,
                max_results,
            )
            .await?;
        result.error.check()?;

        Ok(result
            .entry_list
            .into_iter()
            .map(|entry| SugarEntry::from_name_values(entry.module_name, entry.name_value_list))
            .collect())
    }

    pub async fn get_note_attachment(&self, id: &str) -> Result<NoteAttachment> {
        let result = self.service.get_note_attachment(&self.session, id).await?;
        result.error.check()?;
        Ok(result.note_attachment)
    }

    // --- schema ------------------------------------------------------------

    /// Field names of `module`, straight from the server (not cached)
    pub async fn get_module_fields(&self, module: &str) -> Result<Vec<String>> {
        let fields = self.describe(&ModuleName::new(module)).await?;
        Ok(fields.into_iter().map(|f| f.name).collect())
    }

    /// Full field descriptions of `module`
    pub async fn get_module_field_details(&self, module: &str) -> Result<Vec<ModuleField>> {
        self.describe(&ModuleName::new(module)).await
    }

    pub async fn get_available_modules(&self) -> Result<Vec<String>> {
        let result = self.service.get_available_modules(&self.session).await?;
        result.error.check()?;
        Ok(result.modules)
    }

    // --- relationships -----------------------------------------------------

    /// Link `child_id` in `child` to `parent_id` in `parent`
    pub async fn relate_record(
        &self,
        parent: &str,
        parent_id: &str,
        child: &str,
        child_id: &str,
    ) -> Result<()> {
        let value = SetRelationshipValue {
            module1: ModuleName::new(parent).into_string(),
            module1_id: parent_id.to_string(),
            module2: ModuleName::new(child).into_string(),
            module2_id: child_id.to_string(),
        };
        debug!(
            "set_relationship {}:{} -> {}:{}",
            value.module1, value.module1_id, value.module2, value.module2_id
        );

        self.service
            .set_relationship(&self.session, &value)
            .await?
            .check()?;
        Ok(())
    }

    /// Ids of the `related` records linked to `id` in `module`
    pub async fn get_relationships(
        &self,
        module: &str,
        id: &str,
        related: &str,
        related_query: &str,
        deleted: bool,
    ) -> Result<Vec<String>> {
        let module = ModuleName::new(module);
        let related = ModuleName::new(related);

        let result = self
            .service
            .get_relationships(
                &self.session,
                module.as_str(),
                id,
                related.as_str(),
                related_query,
                i32::from(deleted),
            )
            .await?;
        result.error.check()?;
        Ok(result.ids.into_iter().map(|m| m.id).collect())
    }

    // --- quick create ------------------------------------------------------

    pub async fn create_account(&self, name: &str, phone: &str, website: &str) -> Result<String> {
        let (user, password) = self.quick_auth();
        self.service
            .create_account(user, password, name, phone, website)
            .await
    }

    pub async fn create_case(&self, name: &str) -> Result<String> {
        let (user, password) = self.quick_auth();
        self.service.create_case(user, password, name).await
    }

    pub async fn create_contact(&self, first_name: &str, last_name: &str, email: &str) -> Result<String> {
        let (user, password) = self.quick_auth();
        self.service
            .create_contact(user, password, first_name, last_name, email)
            .await
    }

    pub async fn create_lead(&self, first_name: &str, last_name: &str, email: &str) -> Result<String> {
        let (user, password) = self.quick_auth();
        self.service
            .create_lead(user, password, first_name, last_name, email)
            .await
    }

    pub async fn create_opportunity(&self, name: &str, amount: &str) -> Result<String> {
        let (user, password) = self.quick_auth();
        self.service
            .create_opportunity(user, password, name, amount)
            .await
    }

    /// Open an additional server-side session for this user
    pub async fn create_session(&self) -> Result<String> {
        let (user, password) = self.quick_auth();
        self.service.create_session(user, password).await
    }

    pub async fn end_session(&self) -> Result<String> {
        self.service.end_session(self.credentials.username()).await
    }

    // --- server and user info ----------------------------------------------

    pub async fn server_time(&self) -> Result<String> {
        self.service.get_server_time().await
    }

    pub async fn gmt_time(&self) -> Result<String> {
        self.service.get_gmt_time().await
    }

    pub async fn server_version(&self) -> Result<String> {
        self.service.get_server_version().await
    }

    pub async fn sugar_flavor(&self) -> Result<String> {
        self.service.get_sugar_flavor().await
    }

    pub async fn is_loopback(&self) -> Result<bool> {
        Ok(self.service.is_loopback().await? != 0)
    }

    pub async fn user_id(&self) -> Result<String> {
        self.service.get_user_id(&self.session).await
    }

    pub async fn user_team_id(&self) -> Result<String> {
        self.service.get_user_team_id(&self.session).await
    }

    pub async fn is_user_admin(&self) -> Result<bool> {
        Ok(self.service.is_user_admin(&self.session).await? != 0)
    }

    pub async fn seamless_login(&self) -> Result<bool> {
        Ok(self.service.seamless_login(&self.session).await? != 0)
    }

    // --- session release ---------------------------------------------------

    /// End the session.
    ///
    /// A server-side logout failure comes back as [`LogoutStatus::Failed`];
    /// only transport errors are returned as `Err`.
    pub async fn logout(mut self) -> Result<LogoutStatus> {
        let session = std::mem::take(&mut self.session);
        release_session(self.service.as_ref(), &session).await
    }

    /// Run `work` against this client, then log out whatever it returned.
    ///
    /// The logout outcome is logged; the result of `work` is passed through.
    pub async fn scoped<T, F>(self, work: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c Self) -> BoxFuture<'c, Result<T>>,
    {
        let outcome = work(&self).await;
        match self.logout().await {
            Ok(status) if status.is_success() => info!("{status}"),
            Ok(status) => warn!("{status}"),
            Err(err) => warn!("Logout failed: {err}"),
        }
        outcome
    }

    // --- internals ---------------------------------------------------------

    fn quick_auth(&self) -> (&str, &str) {
        (
            self.credentials.username(),
            self.credentials.password_digest(),
        )
    }

    async fn fetch_entry(&self, module: &ModuleName, id: &str, fields: &[String]) -> Result<SugarEntry> {
        debug!("get_entry {} {} ({} fields)", module, id, fields.len());

        let result = self
            .service
            .get_entry(&self.session, module.as_str(), id, fields)
            .await?;
        result.error.check()?;

        let entry = result
            .entry_list
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::EntryNotFound {
                module: module.to_string(),
                id: id.to_string(),
            })?;
        Ok(SugarEntry::from_name_values(
            module.as_str(),
            entry.name_value_list,
        ))
    }

    async fn fetch_entry_list(
        &self,
        module: &ModuleName,
        query: &ListQuery,
        fields: &[String],
    ) -> Result<Vec<SugarEntry>> {
        debug!(
            "get_entry_list {} offset={} max={} ({} fields)",
            module,
            query.offset,
            query.max_results,
            fields.len()
        );

        let result = self
            .service
            .get_entry_list(&self.session, module.as_str(), query, fields)
            .await?;
        result.error.check()?;

        Ok(result
            .entry_list
            .into_iter()
            .map(|entry| SugarEntry::from_name_values(module.as_str(), entry.name_value_list))
            .collect())
    }

    async fn describe(&self, module: &ModuleName) -> Result<Vec<ModuleField>> {
        let result = self
            .service
            .get_module_fields(&self.session, module.as_str())
            .await?;
        result.error.check()?;
        Ok(result.module_fields)
    }

    async fn module_field_list(&self, module: &ModuleName) -> Result<Arc<[String]>> {
        self.cache
            .get_or_load(module, || async {
                let fields = self.describe(module).await?;
                Ok(fields.into_iter().map(|f| f.name).collect())
            })
            .await
    }
}

async fn release_session<S: SugarService + ?Sized>(service: &S, session: &str) -> Result<LogoutStatus> {
    let error = service.logout(session).await?;
    let status = if error.is_success() {
        LogoutStatus::LoggedOut
    } else {
        LogoutStatus::Failed(error)
    };
    info!("{}", status.to_string().replace('\n', ": "));
    Ok(status)
}

impl<S: SugarService> Drop for SugarClient<S> {
    fn drop(&mut self) {
        if self.session.is_empty() {
            return;
        }

        let session = std::mem::take(&mut self.session);
        let service = Arc::clone(&self.service);
        let Ok(handle) = Handle::try_current() else {
            warn!("SugarClient dropped outside a tokio runtime, session left open");
            return;
        };

        match handle.runtime_flavor() {
            RuntimeFlavor::CurrentThread => {
                // Cannot block the only worker; lost if the runtime shuts down first
                warn!("SugarClient dropped without logout on a current-thread runtime, session may be left open");
                handle.spawn(async move {
                    if let Err(err) = release_session(service.as_ref(), &session).await {
                        warn!("Background logout failed: {err}");
                    }
                });
            }
            _ => {
                debug!("SugarClient dropped without logout, ending session");
                let released = tokio::task::block_in_place(|| {
                    handle.block_on(release_session(service.as_ref(), &session))
                });
                if let Err(err) = released {
                    warn!("Logout on drop failed: {err}");
                }
            }
        }
    }
}

impl<S: SugarService> fmt::Debug for SugarClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SugarClient")
            .field("credentials", &self.credentials)
            .field("logged_in", &!self.session.is_empty())
            .field("cached_modules", &self.cache.len())
            .finish()
    }
}
