//! Command handlers

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs;

use super::{Command, CreateCommand};
use crate::api::{ListQuery, SugarClient, SugarEntry, SugarService};
use crate::cli::output::Output;

/// Run one command against a logged-in client
pub async fn execute<S: SugarService>(client: &SugarClient<S>, command: Command) -> Result<Output> {
    let output = match command {
        Command::Modules => Output::Values {
            header: "module",
            values: client
                .get_available_modules()
                .await
                .context("Failed to list modules")?,
        },

        Command::Fields { module, details } => {
            if details {
                Output::Fields(
                    client
                        .get_module_field_details(&module)
                        .await
                        .with_context(|| format!("Failed to describe {module}"))?,
                )
            } else {
                Output::Values {
                    header: "field",
                    values: client
                        .get_module_fields(&module)
                        .await
                        .with_context(|| format!("Failed to describe {module}"))?,
                }
            }
        }

        Command::Get { module, id, fields } => {
            let entry = if fields.is_empty() {
                client.get_entry_all_fields(&module, &id).await
            } else {
                client.get_entry(&module, &id, &fields).await
            }
            .with_context(|| format!("Failed to fetch {module} {id}"))?;

            Output::Records {
                entries: vec![entry],
                show_module: false,
            }
        }

        Command::List {
            module,
            query,
            order,
            offset,
            limit,
            deleted,
            fields,
        } => {
            let list_query = ListQuery::new()
                .query(query)
                .order_by(order)
                .offset(offset)
                .max_results(limit)
                .deleted(deleted);

            let entries = if fields.is_empty() {
                client.get_entry_list_all_fields(&module, &list_query).await
            } else {
                client.get_entry_list(&module, &list_query, &fields).await
            }
            .with_context(|| format!("Failed to list {module}"))?;

            Output::Records {
                entries,
                show_module: false,
            }
        }

        Command::Search {
            text,
            modules,
            offset,
            limit,
        } => Output::Records {
            entries: client
                .search_by_module(&text, &modules, offset, limit)
                .await
                .with_context(|| format!("Search for '{text}' failed"))?,
            show_module: true,
        },

        Command::Set { module, values } => {
            let mut entry = SugarEntry::new(module.as_str());
            for (name, value) in values {
                entry.insert(name, value);
            }
            let id = client
                .set_entry(&entry)
                .await
                .with_context(|| format!("Failed to save {module} record"))?;
            Output::Message(id)
        }

        Command::Relate {
            parent,
            parent_id,
            child,
            child_id,
        } => {
            client
                .relate_record(&parent, &parent_id, &child, &child_id)
                .await
                .with_context(|| format!("Failed to relate {child} {child_id} to {parent} {parent_id}"))?;
            Output::Message(format!(
                "Related {child} {child_id} to {parent} {parent_id}"
            ))
        }

        Command::Relationships {
            module,
            id,
            related,
            query,
            deleted,
        } => Output::Values {
            header: "id",
            values: client
                .get_relationships(&module, &id, &related, &query, deleted)
                .await
                .with_context(|| format!("Failed to list {related} related to {module} {id}"))?,
        },

        Command::Attachment { id, output } => {
            let attachment = client
                .get_note_attachment(&id)
                .await
                .with_context(|| format!("Failed to fetch attachment of note {id}"))?;
            let bytes = STANDARD
                .decode(attachment.file.trim())
                .context("Attachment is not valid base64")?;

            match output {
                Some(path) => {
                    fs::write(&path, &bytes)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    Output::Message(format!(
                        "Saved {} ({} bytes) to {}",
                        attachment.filename,
                        bytes.len(),
                        path.display()
                    ))
                }
                None => Output::Properties(vec![
                    ("id", attachment.id),
                    ("filename", attachment.filename),
                    ("size", bytes.len().to_string()),
                ]),
            }
        }

        Command::Create(create) => Output::Message(create_record(client, create).await?),

        Command::Server => Output::Properties(vec![
            ("version", client.server_version().await?),
            ("flavor", client.sugar_flavor().await?),
            ("server_time", client.server_time().await?),
            ("gmt_time", client.gmt_time().await?),
        ]),

        Command::Whoami => Output::Properties(vec![
            ("username", client.username().to_string()),
            ("user_id", client.user_id().await?),
            ("team_id", client.user_team_id().await?),
            ("admin", yes_no(client.is_user_admin().await?)),
        ]),
    };

    Ok(output)
}

async fn create_record<S: SugarService>(
    client: &SugarClient<S>,
    command: CreateCommand,
) -> Result<String> {
    let id = match command {
        CreateCommand::Account {
            name,
            phone,
            website,
        } => client.create_account(&name, &phone, &website).await,
        CreateCommand::Case { name } => client.create_case(&name).await,
        CreateCommand::Contact {
            first_name,
            last_name,
            email,
        } => client.create_contact(&first_name, &last_name, &email).await,
        CreateCommand::Lead {
            first_name,
            last_name,
            email,
        } => client.create_lead(&first_name, &last_name, &email).await,
        CreateCommand::Opportunity { name, amount } => {
            client.create_opportunity(&name, &amount).await
        }
    }
    .context("Quick create failed")?;

    Ok(id)
}

fn yes_no(flag: bool) -> String {
    let word = if flag { "yes" } else { "no" };
    word.to_string()
}
